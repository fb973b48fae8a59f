//! Files attached to purchase orders (quotes, invoices, delivery notes).
//!
//! Only metadata lives here; the bytes are stored by the server under its
//! upload directory.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderDocument {
    pub id: i32,
    pub order_id: i32,
    pub file_name: String,
    pub stored_path: String,
    pub file_type: String,
    pub size_bytes: i64,
    pub uploaded_by: Option<i32>,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct OrderDocumentNew {
    pub file_name: String,
    pub stored_path: String,
    pub file_type: String,
    pub size_bytes: i64,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "documentos_orden")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_name = "orden_id")]
    pub order_id: i32,
    #[sea_orm(column_name = "nombre_archivo")]
    pub file_name: String,
    #[sea_orm(column_name = "ruta_archivo")]
    pub stored_path: String,
    #[sea_orm(column_name = "tipo_archivo")]
    pub file_type: String,
    #[sea_orm(column_name = "tamano_archivo")]
    pub size_bytes: i64,
    #[sea_orm(column_name = "usuario_subida_id")]
    pub uploaded_by: Option<i32>,
    #[sea_orm(column_name = "fecha_subida")]
    pub uploaded_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::purchase_orders::Entity",
        from = "Column::OrderId",
        to = "super::purchase_orders::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Order,
}

impl Related<super::purchase_orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for OrderDocument {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            file_name: model.file_name,
            stored_path: model.stored_path,
            file_type: model.file_type,
            size_bytes: model.size_bytes,
            uploaded_by: model.uploaded_by,
            uploaded_at: model.uploaded_at,
        }
    }
}
