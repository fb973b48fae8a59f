//! Part usage ledger (`historial_repuestos`).
//!
//! Each row records parts consumed on a machine; creating, editing and
//! deleting rows keeps the part's stock in sync.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartUsage {
    pub id: i32,
    pub part_id: i32,
    pub machine_id: i32,
    pub quantity_used: i32,
    pub used_at: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct PartUsageNew {
    pub part_id: i32,
    pub machine_id: i32,
    pub quantity_used: i32,
    /// Defaults to now.
    pub used_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct PartUsagePatch {
    pub part_id: Option<i32>,
    pub machine_id: Option<i32>,
    pub quantity_used: Option<i32>,
    pub used_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Aggregated consumption for one part.
#[derive(Clone, Debug, PartialEq)]
pub struct ConsumptionStats {
    pub part_id: i32,
    pub total_used: i64,
    pub uses: u64,
    pub average_per_use: f64,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "historial_repuestos")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_name = "repuesto_id")]
    pub part_id: i32,
    #[sea_orm(column_name = "maquina_id")]
    pub machine_id: i32,
    #[sea_orm(column_name = "cantidad_usada")]
    pub quantity_used: i32,
    #[sea_orm(column_name = "fecha")]
    pub used_at: DateTimeUtc,
    #[sea_orm(column_name = "observaciones", column_type = "Text", nullable)]
    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::parts::Entity",
        from = "Column::PartId",
        to = "super::parts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Part,
    #[sea_orm(
        belongs_to = "super::machines::Entity",
        from = "Column::MachineId",
        to = "super::machines::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Machine,
}

impl Related<super::parts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Part.def()
    }
}

impl Related<super::machines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Machine.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for PartUsage {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            part_id: model.part_id,
            machine_id: model.machine_id,
            quantity_used: model.quantity_used,
            used_at: model.used_at,
            notes: model.notes,
        }
    }
}
