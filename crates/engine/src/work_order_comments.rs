//! Comments left on work orders.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkOrderComment {
    pub id: i32,
    pub work_order_id: i32,
    pub author_id: i32,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "comentarios_ot")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_name = "orden_trabajo_id")]
    pub work_order_id: i32,
    #[sea_orm(column_name = "usuario_id")]
    pub author_id: i32,
    #[sea_orm(column_name = "comentario", column_type = "Text")]
    pub body: String,
    #[sea_orm(column_name = "fecha_creacion")]
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::work_orders::Entity",
        from = "Column::WorkOrderId",
        to = "super::work_orders::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    WorkOrder,
    #[sea_orm(has_many = "super::work_order_files::Entity")]
    Files,
}

impl Related<super::work_orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkOrder.def()
    }
}

impl Related<super::work_order_files::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Files.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for WorkOrderComment {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            work_order_id: model.work_order_id,
            author_id: model.author_id,
            body: model.body,
            created_at: model.created_at,
        }
    }
}
