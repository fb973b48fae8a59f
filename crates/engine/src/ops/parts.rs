use sea_orm::{
    ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
    sea_query::{Expr, Func},
};

use crate::{
    DEFAULT_LOW_STOCK_THRESHOLD, EngineError, Part, PartNew, PartPatch, ResultEngine, part_usage,
    parts, purchase_order_items,
    util::{
        Pagination, ensure_non_negative, normalize_optional, normalize_required, patch_optional,
        patch_required,
    },
};

use super::{Engine, paginate, with_tx};

impl Engine {
    pub async fn list_parts(&self, pagination: Pagination) -> ResultEngine<Vec<Part>> {
        with_tx!(self, |db_tx| {
            let models = paginate(
                parts::Entity::find().order_by_asc(parts::Column::Id),
                pagination,
            )
            .all(&db_tx)
            .await?;
            Ok(models.into_iter().map(Part::from).collect())
        })
    }

    pub async fn part(&self, part_id: i32) -> ResultEngine<Part> {
        with_tx!(self, |db_tx| {
            let model = self.require_part(&db_tx, part_id).await?;
            Ok(Part::from(model))
        })
    }

    pub async fn part_by_code(&self, code: &str) -> ResultEngine<Part> {
        let code = normalize_required(code, "codigo")?;
        with_tx!(self, |db_tx| {
            self.find_part_by_code(&db_tx, &code)
                .await?
                .map(Part::from)
                .ok_or_else(|| EngineError::KeyNotFound(format!("part {code}")))
        })
    }

    pub async fn parts_by_supplier(
        &self,
        supplier_id: i32,
        pagination: Pagination,
    ) -> ResultEngine<Vec<Part>> {
        with_tx!(self, |db_tx| {
            self.require_supplier(&db_tx, supplier_id).await?;
            let models = paginate(
                parts::Entity::find()
                    .filter(parts::Column::SupplierId.eq(supplier_id))
                    .order_by_asc(parts::Column::Id),
                pagination,
            )
            .all(&db_tx)
            .await?;
            Ok(models.into_iter().map(Part::from).collect())
        })
    }

    /// Parts at or below their minimum (or the default threshold when unset).
    pub async fn low_stock_parts(&self, pagination: Pagination) -> ResultEngine<Vec<Part>> {
        // cantidad <= COALESCE(cantidad_minima, threshold)
        let threshold = Func::coalesce([
            Expr::col(parts::Column::MinQuantity).into(),
            Expr::val(DEFAULT_LOW_STOCK_THRESHOLD).into(),
        ]);
        with_tx!(self, |db_tx| {
            let models = paginate(
                parts::Entity::find()
                    .filter(Expr::col(parts::Column::Quantity).lte(threshold))
                    .order_by_asc(parts::Column::Quantity)
                    .order_by_asc(parts::Column::Id),
                pagination,
            )
            .all(&db_tx)
            .await?;
            Ok(models.into_iter().map(Part::from).collect())
        })
    }

    pub async fn new_part(&self, input: PartNew) -> ResultEngine<Part> {
        let code = normalize_required(&input.code, "codigo")?;
        let name = normalize_required(&input.name, "nombre")?;
        ensure_non_negative(input.quantity, "cantidad")?;
        if let Some(min_quantity) = input.min_quantity {
            ensure_non_negative(min_quantity, "cantidad_minima")?;
        }
        with_tx!(self, |db_tx| {
            self.ensure_part_references(&db_tx, input.supplier_id, input.storage_id)
                .await?;
            if self.find_part_by_code(&db_tx, &code).await?.is_some() {
                return Err(EngineError::ExistingKey(code));
            }
            let model = parts::ActiveModel {
                id: ActiveValue::NotSet,
                code: ActiveValue::Set(code),
                name: ActiveValue::Set(name),
                detail: ActiveValue::Set(normalize_optional(input.detail.as_deref())),
                location: ActiveValue::Set(normalize_optional(input.location.as_deref())),
                storage_id: ActiveValue::Set(input.storage_id),
                quantity: ActiveValue::Set(input.quantity),
                min_quantity: ActiveValue::Set(input.min_quantity),
                supplier_id: ActiveValue::Set(input.supplier_id),
                kind: ActiveValue::Set(normalize_optional(input.kind.as_deref())),
                customs_description: ActiveValue::Set(normalize_optional(
                    input.customs_description.as_deref(),
                )),
            }
            .insert(&db_tx)
            .await?;
            tracing::info!(part_id = model.id, code = %model.code, "part created");
            Ok(Part::from(model))
        })
    }

    pub async fn update_part(&self, part_id: i32, patch: PartPatch) -> ResultEngine<Part> {
        if let Some(quantity) = patch.quantity {
            ensure_non_negative(quantity, "cantidad")?;
        }
        if let Some(min_quantity) = patch.min_quantity {
            ensure_non_negative(min_quantity, "cantidad_minima")?;
        }
        with_tx!(self, |db_tx| {
            let current = self.require_part(&db_tx, part_id).await?;
            self.ensure_part_references(&db_tx, patch.supplier_id, patch.storage_id)
                .await?;

            let mut code = current.code.clone();
            if patch_required(&mut code, patch.code.as_deref(), "codigo")? {
                let taken = self
                    .find_part_by_code(&db_tx, &code)
                    .await?
                    .is_some_and(|other| other.id != part_id);
                if taken {
                    return Err(EngineError::ExistingKey(code));
                }
            }
            let mut name = current.name.clone();
            patch_required(&mut name, patch.name.as_deref(), "nombre")?;
            let mut detail = current.detail.clone();
            patch_optional(&mut detail, patch.detail.as_deref());
            let mut location = current.location.clone();
            patch_optional(&mut location, patch.location.as_deref());
            let mut kind = current.kind.clone();
            patch_optional(&mut kind, patch.kind.as_deref());
            let mut customs_description = current.customs_description.clone();
            patch_optional(
                &mut customs_description,
                patch.customs_description.as_deref(),
            );
            let quantity = patch.quantity.unwrap_or(current.quantity);
            let min_quantity = patch.min_quantity.or(current.min_quantity);
            let supplier_id = patch.supplier_id.or(current.supplier_id);
            let storage_id = patch.storage_id.or(current.storage_id);

            let mut active: parts::ActiveModel = current.into();
            active.code = ActiveValue::Set(code);
            active.name = ActiveValue::Set(name);
            active.detail = ActiveValue::Set(detail);
            active.location = ActiveValue::Set(location);
            active.storage_id = ActiveValue::Set(storage_id);
            active.quantity = ActiveValue::Set(quantity);
            active.min_quantity = ActiveValue::Set(min_quantity);
            active.supplier_id = ActiveValue::Set(supplier_id);
            active.kind = ActiveValue::Set(kind);
            active.customs_description = ActiveValue::Set(customs_description);
            let model = active.update(&db_tx).await?;
            Ok(Part::from(model))
        })
    }

    /// Overwrite the stock of a part.
    pub async fn set_part_stock(&self, part_id: i32, quantity: i32) -> ResultEngine<Part> {
        ensure_non_negative(quantity, "cantidad")?;
        with_tx!(self, |db_tx| {
            let current = self.require_part(&db_tx, part_id).await?;
            let previous = current.quantity;
            let mut active: parts::ActiveModel = current.into();
            active.quantity = ActiveValue::Set(quantity);
            let model = active.update(&db_tx).await?;
            tracing::info!(part_id, previous, quantity, "part stock set");
            Ok(Part::from(model))
        })
    }

    /// Delete a part with no usage history and no purchase-order lines.
    pub async fn delete_part(&self, part_id: i32) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_part(&db_tx, part_id).await?;
            let usages = part_usage::Entity::find()
                .filter(part_usage::Column::PartId.eq(part_id))
                .count(&db_tx)
                .await?;
            let items = purchase_order_items::Entity::find()
                .filter(purchase_order_items::Column::PartId.eq(part_id))
                .count(&db_tx)
                .await?;
            if usages > 0 || items > 0 {
                return Err(EngineError::InUse(format!(
                    "part {part_id} ({usages} usages, {items} order items)"
                )));
            }
            parts::Entity::delete_by_id(part_id).exec(&db_tx).await?;
            tracing::info!(part_id, "part deleted");
            Ok(())
        })
    }

    pub(super) async fn find_part_by_code(
        &self,
        db_tx: &DatabaseTransaction,
        code: &str,
    ) -> ResultEngine<Option<parts::Model>> {
        parts::Entity::find()
            .filter(parts::Column::Code.eq(code))
            .one(db_tx)
            .await
            .map_err(Into::into)
    }

    /// Add (or remove, with a negative delta) stock, refusing to go below zero.
    pub(super) async fn adjust_part_stock(
        &self,
        db_tx: &DatabaseTransaction,
        part: parts::Model,
        delta: i32,
    ) -> ResultEngine<parts::Model> {
        let quantity = part
            .quantity
            .checked_add(delta)
            .filter(|quantity| *quantity >= 0)
            .ok_or_else(|| {
                EngineError::InsufficientStock(format!(
                    "part {} has {} units, cannot apply {delta}",
                    part.code, part.quantity
                ))
            })?;
        let mut active: parts::ActiveModel = part.into();
        active.quantity = ActiveValue::Set(quantity);
        active.update(db_tx).await.map_err(Into::into)
    }

    async fn ensure_part_references(
        &self,
        db_tx: &DatabaseTransaction,
        supplier_id: Option<i32>,
        storage_id: Option<i32>,
    ) -> ResultEngine<()> {
        if let Some(supplier_id) = supplier_id {
            self.require_supplier(db_tx, supplier_id).await?;
        }
        if let Some(storage_id) = storage_id {
            self.require_storage(db_tx, storage_id).await?;
        }
        Ok(())
    }
}
