//! Spare parts inventory.
//!
//! `quantity` is the stock on hand. It is moved by usage records (down),
//! purchase order receipts (up) and explicit stock edits, and is never
//! allowed below zero.

use sea_orm::entity::prelude::*;

/// Threshold applied by the low-stock report when a part has no minimum.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Part {
    pub id: i32,
    /// Unique catalog code.
    pub code: String,
    pub name: String,
    pub detail: Option<String>,
    pub location: Option<String>,
    pub storage_id: Option<i32>,
    pub quantity: i32,
    pub min_quantity: Option<i32>,
    pub supplier_id: Option<i32>,
    pub kind: Option<String>,
    pub customs_description: Option<String>,
}

impl Part {
    /// Whether the part is at or below its restock threshold.
    pub fn is_low_stock(&self, default_threshold: i32) -> bool {
        self.quantity <= self.min_quantity.unwrap_or(default_threshold)
    }
}

#[derive(Clone, Debug, Default)]
pub struct PartNew {
    pub code: String,
    pub name: String,
    pub detail: Option<String>,
    pub location: Option<String>,
    pub storage_id: Option<i32>,
    pub quantity: i32,
    pub min_quantity: Option<i32>,
    pub supplier_id: Option<i32>,
    pub kind: Option<String>,
    pub customs_description: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct PartPatch {
    pub code: Option<String>,
    pub name: Option<String>,
    pub detail: Option<String>,
    pub location: Option<String>,
    pub storage_id: Option<i32>,
    pub quantity: Option<i32>,
    pub min_quantity: Option<i32>,
    pub supplier_id: Option<i32>,
    pub kind: Option<String>,
    pub customs_description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "repuestos")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_name = "codigo", unique)]
    pub code: String,
    #[sea_orm(column_name = "nombre")]
    pub name: String,
    #[sea_orm(column_name = "detalle", column_type = "Text", nullable)]
    pub detail: Option<String>,
    #[sea_orm(column_name = "ubicacion")]
    pub location: Option<String>,
    #[sea_orm(column_name = "almacenamiento_id")]
    pub storage_id: Option<i32>,
    #[sea_orm(column_name = "cantidad")]
    pub quantity: i32,
    #[sea_orm(column_name = "cantidad_minima")]
    pub min_quantity: Option<i32>,
    #[sea_orm(column_name = "proveedor_id")]
    pub supplier_id: Option<i32>,
    #[sea_orm(column_name = "tipo")]
    pub kind: Option<String>,
    #[sea_orm(column_name = "descripcion_aduana", column_type = "Text", nullable)]
    pub customs_description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::suppliers::Entity",
        from = "Column::SupplierId",
        to = "super::suppliers::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Supplier,
    #[sea_orm(
        belongs_to = "super::storage_locations::Entity",
        from = "Column::StorageId",
        to = "super::storage_locations::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    StorageLocation,
    #[sea_orm(has_many = "super::part_usage::Entity")]
    Usage,
}

impl Related<super::suppliers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl Related<super::storage_locations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StorageLocation.def()
    }
}

impl Related<super::part_usage::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Usage.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Part {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            code: model.code,
            name: model.name,
            detail: model.detail,
            location: model.location,
            storage_id: model.storage_id,
            quantity: model.quantity,
            min_quantity: model.min_quantity,
            supplier_id: model.supplier_id,
            kind: model.kind,
            customs_description: model.customs_description,
        }
    }
}
