use sea_orm::{
    ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};

use crate::{
    EngineError, Machine, MachineModel, MachineModelNew, MachineModelPatch, MachineNew,
    MachinePatch, ResultEngine, machine_models, machines, part_usage,
    util::{Pagination, normalize_optional, normalize_required, patch_optional, patch_required},
    work_orders,
};

use super::{Engine, paginate, with_tx};

impl Engine {
    // ── machine models ─────────────────────────────────────────────────────

    pub async fn list_machine_models(
        &self,
        pagination: Pagination,
    ) -> ResultEngine<Vec<MachineModel>> {
        with_tx!(self, |db_tx| {
            let models = paginate(
                machine_models::Entity::find().order_by_asc(machine_models::Column::Id),
                pagination,
            )
            .all(&db_tx)
            .await?;
            Ok(models.into_iter().map(MachineModel::from).collect())
        })
    }

    pub async fn machine_model(&self, model_id: i32) -> ResultEngine<MachineModel> {
        with_tx!(self, |db_tx| {
            let model = self.require_machine_model(&db_tx, model_id).await?;
            Ok(MachineModel::from(model))
        })
    }

    /// Create a machine model. `(fabricante, modelo)` is unique.
    pub async fn new_machine_model(&self, input: MachineModelNew) -> ResultEngine<MachineModel> {
        let model_name = normalize_required(&input.model, "modelo")?;
        let manufacturer = normalize_optional(input.manufacturer.as_deref());
        with_tx!(self, |db_tx| {
            self.ensure_machine_model_free(&db_tx, manufacturer.as_deref(), &model_name, None)
                .await?;
            let model = machine_models::ActiveModel {
                id: ActiveValue::NotSet,
                manufacturer: ActiveValue::Set(manufacturer),
                model: ActiveValue::Set(model_name),
                detail: ActiveValue::Set(normalize_optional(input.detail.as_deref())),
            }
            .insert(&db_tx)
            .await?;
            tracing::info!(machine_model_id = model.id, "machine model created");
            Ok(MachineModel::from(model))
        })
    }

    pub async fn update_machine_model(
        &self,
        model_id: i32,
        patch: MachineModelPatch,
    ) -> ResultEngine<MachineModel> {
        with_tx!(self, |db_tx| {
            let current = self.require_machine_model(&db_tx, model_id).await?;
            let mut model_name = current.model.clone();
            let mut changed = patch_required(&mut model_name, patch.model.as_deref(), "modelo")?;
            let mut manufacturer = current.manufacturer.clone();
            if patch.manufacturer.is_some() {
                patch_optional(&mut manufacturer, patch.manufacturer.as_deref());
                changed |= manufacturer != current.manufacturer;
            }
            if changed {
                self.ensure_machine_model_free(
                    &db_tx,
                    manufacturer.as_deref(),
                    &model_name,
                    Some(model_id),
                )
                .await?;
            }
            let mut detail = current.detail.clone();
            patch_optional(&mut detail, patch.detail.as_deref());

            let mut active: machine_models::ActiveModel = current.into();
            active.manufacturer = ActiveValue::Set(manufacturer);
            active.model = ActiveValue::Set(model_name);
            active.detail = ActiveValue::Set(detail);
            let model = active.update(&db_tx).await?;
            Ok(MachineModel::from(model))
        })
    }

    /// Delete a machine model no machine points to.
    pub async fn delete_machine_model(&self, model_id: i32) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_machine_model(&db_tx, model_id).await?;
            let machines = machines::Entity::find()
                .filter(machines::Column::ModelId.eq(model_id))
                .count(&db_tx)
                .await?;
            if machines > 0 {
                return Err(EngineError::InUse(format!(
                    "machine model {model_id} ({machines} machines)"
                )));
            }
            machine_models::Entity::delete_by_id(model_id)
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    async fn ensure_machine_model_free(
        &self,
        db_tx: &DatabaseTransaction,
        manufacturer: Option<&str>,
        model_name: &str,
        except: Option<i32>,
    ) -> ResultEngine<()> {
        let mut query = machine_models::Entity::find()
            .filter(machine_models::Column::Model.eq(model_name));
        query = match manufacturer {
            Some(manufacturer) => {
                query.filter(machine_models::Column::Manufacturer.eq(manufacturer))
            }
            None => query.filter(machine_models::Column::Manufacturer.is_null()),
        };
        if let Some(id) = except {
            query = query.filter(machine_models::Column::Id.ne(id));
        }
        if query.one(db_tx).await?.is_some() {
            return Err(EngineError::ExistingKey(format!(
                "{} {model_name}",
                manufacturer.unwrap_or_default()
            )));
        }
        Ok(())
    }

    // ── machines ───────────────────────────────────────────────────────────

    pub async fn list_machines(&self, pagination: Pagination) -> ResultEngine<Vec<Machine>> {
        with_tx!(self, |db_tx| {
            let models = paginate(
                machines::Entity::find().order_by_asc(machines::Column::Id),
                pagination,
            )
            .all(&db_tx)
            .await?;
            Ok(models.into_iter().map(Machine::from).collect())
        })
    }

    pub async fn machine(&self, machine_id: i32) -> ResultEngine<Machine> {
        with_tx!(self, |db_tx| {
            let model = self.require_machine(&db_tx, machine_id).await?;
            Ok(Machine::from(model))
        })
    }

    pub async fn machine_by_serial(&self, serial_number: &str) -> ResultEngine<Machine> {
        let serial_number = normalize_required(serial_number, "numero_serie")?;
        with_tx!(self, |db_tx| {
            machines::Entity::find()
                .filter(machines::Column::SerialNumber.eq(serial_number.as_str()))
                .one(&db_tx)
                .await?
                .map(Machine::from)
                .ok_or_else(|| EngineError::KeyNotFound(format!("machine {serial_number}")))
        })
    }

    pub async fn machine_by_alias(&self, alias: &str) -> ResultEngine<Machine> {
        let alias = normalize_required(alias, "alias")?;
        with_tx!(self, |db_tx| {
            machines::Entity::find()
                .filter(machines::Column::Alias.eq(alias.as_str()))
                .one(&db_tx)
                .await?
                .map(Machine::from)
                .ok_or_else(|| EngineError::KeyNotFound(format!("machine {alias}")))
        })
    }

    pub async fn machines_by_model(
        &self,
        model_id: i32,
        pagination: Pagination,
    ) -> ResultEngine<Vec<Machine>> {
        with_tx!(self, |db_tx| {
            self.require_machine_model(&db_tx, model_id).await?;
            let models = paginate(
                machines::Entity::find()
                    .filter(machines::Column::ModelId.eq(model_id))
                    .order_by_asc(machines::Column::Id),
                pagination,
            )
            .all(&db_tx)
            .await?;
            Ok(models.into_iter().map(Machine::from).collect())
        })
    }

    pub async fn new_machine(&self, input: MachineNew) -> ResultEngine<Machine> {
        let serial_number = normalize_required(&input.serial_number, "numero_serie")?;
        with_tx!(self, |db_tx| {
            if let Some(model_id) = input.model_id {
                self.require_machine_model(&db_tx, model_id).await?;
            }
            self.ensure_serial_free(&db_tx, &serial_number, None).await?;
            let model = machines::ActiveModel {
                id: ActiveValue::NotSet,
                model_id: ActiveValue::Set(input.model_id),
                serial_number: ActiveValue::Set(serial_number),
                alias: ActiveValue::Set(normalize_optional(input.alias.as_deref())),
                location: ActiveValue::Set(normalize_optional(input.location.as_deref())),
            }
            .insert(&db_tx)
            .await?;
            tracing::info!(machine_id = model.id, "machine created");
            Ok(Machine::from(model))
        })
    }

    pub async fn update_machine(
        &self,
        machine_id: i32,
        patch: MachinePatch,
    ) -> ResultEngine<Machine> {
        with_tx!(self, |db_tx| {
            let current = self.require_machine(&db_tx, machine_id).await?;
            if let Some(model_id) = patch.model_id {
                self.require_machine_model(&db_tx, model_id).await?;
            }
            let mut serial_number = current.serial_number.clone();
            if patch_required(
                &mut serial_number,
                patch.serial_number.as_deref(),
                "numero_serie",
            )? {
                self.ensure_serial_free(&db_tx, &serial_number, Some(machine_id))
                    .await?;
            }
            let mut alias = current.alias.clone();
            patch_optional(&mut alias, patch.alias.as_deref());
            let mut location = current.location.clone();
            patch_optional(&mut location, patch.location.as_deref());
            let model_id = patch.model_id.or(current.model_id);

            let mut active: machines::ActiveModel = current.into();
            active.model_id = ActiveValue::Set(model_id);
            active.serial_number = ActiveValue::Set(serial_number);
            active.alias = ActiveValue::Set(alias);
            active.location = ActiveValue::Set(location);
            let model = active.update(&db_tx).await?;
            Ok(Machine::from(model))
        })
    }

    /// Delete a machine without usage history or work orders.
    pub async fn delete_machine(&self, machine_id: i32) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_machine(&db_tx, machine_id).await?;
            let usages = part_usage::Entity::find()
                .filter(part_usage::Column::MachineId.eq(machine_id))
                .count(&db_tx)
                .await?;
            let work_orders = work_orders::Entity::find()
                .filter(work_orders::Column::MachineId.eq(machine_id))
                .count(&db_tx)
                .await?;
            if usages > 0 || work_orders > 0 {
                return Err(EngineError::InUse(format!(
                    "machine {machine_id} ({usages} usages, {work_orders} work orders)"
                )));
            }
            machines::Entity::delete_by_id(machine_id)
                .exec(&db_tx)
                .await?;
            tracing::info!(machine_id, "machine deleted");
            Ok(())
        })
    }

    async fn ensure_serial_free(
        &self,
        db_tx: &DatabaseTransaction,
        serial_number: &str,
        except: Option<i32>,
    ) -> ResultEngine<()> {
        let mut query =
            machines::Entity::find().filter(machines::Column::SerialNumber.eq(serial_number));
        if let Some(id) = except {
            query = query.filter(machines::Column::Id.ne(id));
        }
        if query.one(db_tx).await?.is_some() {
            return Err(EngineError::ExistingKey(serial_number.to_string()));
        }
        Ok(())
    }
}
