use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
    sea_query::{Expr, Func},
};

use crate::{
    EngineError, ResultEngine, StorageLocation, StorageLocationNew, StorageLocationPatch,
    storage_locations,
    util::{Pagination, normalize_optional, normalize_required, patch_optional, patch_required},
};

use super::{Engine, paginate, with_tx};

impl Engine {
    /// List active storage locations, optionally filtered by a case-insensitive
    /// search over code, name, description and physical location.
    pub async fn list_storage_locations(
        &self,
        search: Option<&str>,
        pagination: Pagination,
    ) -> ResultEngine<Vec<StorageLocation>> {
        let search = normalize_optional(search).map(|term| format!("%{}%", term.to_lowercase()));
        with_tx!(self, |db_tx| {
            let mut query = storage_locations::Entity::find()
                .filter(storage_locations::Column::Active.eq(true))
                .order_by_asc(storage_locations::Column::Code);
            if let Some(pattern) = search.as_deref() {
                let condition = [
                    storage_locations::Column::Code,
                    storage_locations::Column::Name,
                    storage_locations::Column::Description,
                    storage_locations::Column::PhysicalLocation,
                ]
                .into_iter()
                .fold(Condition::any(), |condition, column| {
                    condition.add(Expr::expr(Func::lower(Expr::col(column))).like(pattern))
                });
                query = query.filter(condition);
            }
            let models = paginate(query, pagination).all(&db_tx).await?;
            Ok(models.into_iter().map(StorageLocation::from).collect())
        })
    }

    /// Return an active storage location.
    pub async fn storage_location(&self, storage_id: i32) -> ResultEngine<StorageLocation> {
        with_tx!(self, |db_tx| {
            let model = self.require_active_storage(&db_tx, storage_id).await?;
            Ok(StorageLocation::from(model))
        })
    }

    pub async fn new_storage_location(
        &self,
        input: StorageLocationNew,
    ) -> ResultEngine<StorageLocation> {
        let code = normalize_required(&input.code, "codigo")?;
        let name = normalize_required(&input.name, "nombre")?;
        with_tx!(self, |db_tx| {
            self.ensure_storage_code_free(&db_tx, &code, None).await?;
            let model = storage_locations::ActiveModel {
                id: ActiveValue::NotSet,
                code: ActiveValue::Set(code),
                name: ActiveValue::Set(name),
                description: ActiveValue::Set(normalize_optional(input.description.as_deref())),
                physical_location: ActiveValue::Set(normalize_optional(
                    input.physical_location.as_deref(),
                )),
                active: ActiveValue::Set(true),
            }
            .insert(&db_tx)
            .await?;
            tracing::info!(storage_id = model.id, "storage location created");
            Ok(StorageLocation::from(model))
        })
    }

    pub async fn update_storage_location(
        &self,
        storage_id: i32,
        patch: StorageLocationPatch,
    ) -> ResultEngine<StorageLocation> {
        with_tx!(self, |db_tx| {
            let current = self.require_active_storage(&db_tx, storage_id).await?;
            let mut code = current.code.clone();
            if patch_required(&mut code, patch.code.as_deref(), "codigo")? {
                self.ensure_storage_code_free(&db_tx, &code, Some(storage_id))
                    .await?;
            }
            let mut name = current.name.clone();
            patch_required(&mut name, patch.name.as_deref(), "nombre")?;
            let mut description = current.description.clone();
            patch_optional(&mut description, patch.description.as_deref());
            let mut physical_location = current.physical_location.clone();
            patch_optional(&mut physical_location, patch.physical_location.as_deref());
            let active_flag = patch.active.unwrap_or(current.active);

            let mut active: storage_locations::ActiveModel = current.into();
            active.code = ActiveValue::Set(code);
            active.name = ActiveValue::Set(name);
            active.description = ActiveValue::Set(description);
            active.physical_location = ActiveValue::Set(physical_location);
            active.active = ActiveValue::Set(active_flag);
            let model = active.update(&db_tx).await?;
            Ok(StorageLocation::from(model))
        })
    }

    /// Soft delete: the row stays, flagged inactive.
    pub async fn delete_storage_location(&self, storage_id: i32) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let current = self.require_active_storage(&db_tx, storage_id).await?;
            let mut active: storage_locations::ActiveModel = current.into();
            active.active = ActiveValue::Set(false);
            active.update(&db_tx).await?;
            tracing::info!(storage_id, "storage location deactivated");
            Ok(())
        })
    }

    async fn require_active_storage(
        &self,
        db_tx: &DatabaseTransaction,
        storage_id: i32,
    ) -> ResultEngine<storage_locations::Model> {
        let model = self.require_storage(db_tx, storage_id).await?;
        if !model.active {
            return Err(EngineError::KeyNotFound(format!(
                "storage location {storage_id}"
            )));
        }
        Ok(model)
    }

    async fn ensure_storage_code_free(
        &self,
        db_tx: &DatabaseTransaction,
        code: &str,
        except: Option<i32>,
    ) -> ResultEngine<()> {
        let mut query = storage_locations::Entity::find()
            .filter(storage_locations::Column::Code.eq(code));
        if let Some(id) = except {
            query = query.filter(storage_locations::Column::Id.ne(id));
        }
        if query.one(db_tx).await?.is_some() {
            return Err(EngineError::ExistingKey(code.to_string()));
        }
        Ok(())
    }
}
