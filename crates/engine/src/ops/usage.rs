use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, Select, TransactionTrait,
    prelude::*,
};

use crate::{
    ConsumptionStats, EngineError, PartUsage, PartUsageNew, PartUsagePatch, ResultEngine,
    part_usage,
    util::{Pagination, ensure_positive, normalize_optional, patch_optional},
};

use super::{Engine, paginate, with_tx};

fn newest_first(select: Select<part_usage::Entity>) -> Select<part_usage::Entity> {
    select
        .order_by_desc(part_usage::Column::UsedAt)
        .order_by_desc(part_usage::Column::Id)
}

fn ensure_range(start: DateTime<Utc>, end: DateTime<Utc>) -> ResultEngine<()> {
    if start > end {
        return Err(EngineError::Invalid(
            "fecha_inicio must not be after fecha_fin".to_string(),
        ));
    }
    Ok(())
}

impl Engine {
    pub async fn list_usage(&self, pagination: Pagination) -> ResultEngine<Vec<PartUsage>> {
        with_tx!(self, |db_tx| {
            let models = paginate(newest_first(part_usage::Entity::find()), pagination)
                .all(&db_tx)
                .await?;
            Ok(models.into_iter().map(PartUsage::from).collect())
        })
    }

    pub async fn usage(&self, usage_id: i32) -> ResultEngine<PartUsage> {
        with_tx!(self, |db_tx| {
            let model = self.require_usage(&db_tx, usage_id).await?;
            Ok(PartUsage::from(model))
        })
    }

    pub async fn usage_by_part(
        &self,
        part_id: i32,
        pagination: Pagination,
    ) -> ResultEngine<Vec<PartUsage>> {
        with_tx!(self, |db_tx| {
            self.require_part(&db_tx, part_id).await?;
            let query = part_usage::Entity::find().filter(part_usage::Column::PartId.eq(part_id));
            let models = paginate(newest_first(query), pagination)
                .all(&db_tx)
                .await?;
            Ok(models.into_iter().map(PartUsage::from).collect())
        })
    }

    pub async fn usage_by_machine(
        &self,
        machine_id: i32,
        pagination: Pagination,
    ) -> ResultEngine<Vec<PartUsage>> {
        with_tx!(self, |db_tx| {
            self.require_machine(&db_tx, machine_id).await?;
            let query =
                part_usage::Entity::find().filter(part_usage::Column::MachineId.eq(machine_id));
            let models = paginate(newest_first(query), pagination)
                .all(&db_tx)
                .await?;
            Ok(models.into_iter().map(PartUsage::from).collect())
        })
    }

    /// Usage recorded between `start` and `end`, both inclusive.
    pub async fn usage_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        pagination: Pagination,
    ) -> ResultEngine<Vec<PartUsage>> {
        ensure_range(start, end)?;
        with_tx!(self, |db_tx| {
            let query = part_usage::Entity::find()
                .filter(part_usage::Column::UsedAt.between(start, end));
            let models = paginate(newest_first(query), pagination)
                .all(&db_tx)
                .await?;
            Ok(models.into_iter().map(PartUsage::from).collect())
        })
    }

    /// Record a usage and take the quantity out of stock.
    pub async fn new_usage(&self, input: PartUsageNew) -> ResultEngine<PartUsage> {
        ensure_positive(input.quantity_used, "cantidad_usada")?;
        with_tx!(self, |db_tx| {
            let part = self.require_part(&db_tx, input.part_id).await?;
            self.require_machine(&db_tx, input.machine_id).await?;
            self.adjust_part_stock(&db_tx, part, -input.quantity_used)
                .await?;
            let model = part_usage::ActiveModel {
                id: ActiveValue::NotSet,
                part_id: ActiveValue::Set(input.part_id),
                machine_id: ActiveValue::Set(input.machine_id),
                quantity_used: ActiveValue::Set(input.quantity_used),
                used_at: ActiveValue::Set(input.used_at.unwrap_or_else(Utc::now)),
                notes: ActiveValue::Set(normalize_optional(input.notes.as_deref())),
            }
            .insert(&db_tx)
            .await?;
            tracing::info!(
                usage_id = model.id,
                part_id = model.part_id,
                quantity = model.quantity_used,
                "part usage recorded"
            );
            Ok(PartUsage::from(model))
        })
    }

    /// Update a usage, moving stock between parts when needed.
    pub async fn update_usage(
        &self,
        usage_id: i32,
        patch: PartUsagePatch,
    ) -> ResultEngine<PartUsage> {
        if let Some(quantity) = patch.quantity_used {
            ensure_positive(quantity, "cantidad_usada")?;
        }
        with_tx!(self, |db_tx| {
            let current = self.require_usage(&db_tx, usage_id).await?;
            let part_id = patch.part_id.unwrap_or(current.part_id);
            let machine_id = patch.machine_id.unwrap_or(current.machine_id);
            let quantity = patch.quantity_used.unwrap_or(current.quantity_used);
            if machine_id != current.machine_id {
                self.require_machine(&db_tx, machine_id).await?;
            }

            if part_id != current.part_id {
                let old_part = self.require_part(&db_tx, current.part_id).await?;
                let new_part = self.require_part(&db_tx, part_id).await?;
                self.adjust_part_stock(&db_tx, old_part, current.quantity_used)
                    .await?;
                self.adjust_part_stock(&db_tx, new_part, -quantity).await?;
            } else if quantity != current.quantity_used {
                let part = self.require_part(&db_tx, part_id).await?;
                self.adjust_part_stock(&db_tx, part, current.quantity_used - quantity)
                    .await?;
            }

            let mut notes = current.notes.clone();
            patch_optional(&mut notes, patch.notes.as_deref());
            let used_at = patch.used_at.unwrap_or(current.used_at);

            let mut active: part_usage::ActiveModel = current.into();
            active.part_id = ActiveValue::Set(part_id);
            active.machine_id = ActiveValue::Set(machine_id);
            active.quantity_used = ActiveValue::Set(quantity);
            active.used_at = ActiveValue::Set(used_at);
            active.notes = ActiveValue::Set(notes);
            let model = active.update(&db_tx).await?;
            Ok(PartUsage::from(model))
        })
    }

    /// Delete a usage and give the quantity back to the part.
    pub async fn delete_usage(&self, usage_id: i32) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let current = self.require_usage(&db_tx, usage_id).await?;
            let part = self.require_part(&db_tx, current.part_id).await?;
            self.adjust_part_stock(&db_tx, part, current.quantity_used)
                .await?;
            part_usage::Entity::delete_by_id(usage_id)
                .exec(&db_tx)
                .await?;
            tracing::info!(usage_id, "part usage deleted");
            Ok(())
        })
    }

    /// Total, count and average consumption of a part, optionally restricted
    /// to a date range.
    pub async fn consumption_stats(
        &self,
        part_id: i32,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> ResultEngine<ConsumptionStats> {
        if let (Some(start), Some(end)) = (start, end) {
            ensure_range(start, end)?;
        }
        with_tx!(self, |db_tx| {
            self.require_part(&db_tx, part_id).await?;
            let mut query =
                part_usage::Entity::find().filter(part_usage::Column::PartId.eq(part_id));
            if let Some(start) = start {
                query = query.filter(part_usage::Column::UsedAt.gte(start));
            }
            if let Some(end) = end {
                query = query.filter(part_usage::Column::UsedAt.lte(end));
            }
            let models = query.all(&db_tx).await?;
            let total_used: i64 = models
                .iter()
                .map(|usage| i64::from(usage.quantity_used))
                .sum();
            let uses = models.len() as u64;
            let average_per_use = if uses == 0 {
                0.0
            } else {
                total_used as f64 / uses as f64
            };
            Ok(ConsumptionStats {
                part_id,
                total_used,
                uses,
                average_per_use,
            })
        })
    }

    async fn require_usage(
        &self,
        db_tx: &DatabaseTransaction,
        usage_id: i32,
    ) -> ResultEngine<part_usage::Model> {
        part_usage::Entity::find_by_id(usage_id)
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("usage {usage_id}")))
    }
}
