//! Files attached to a work order, or to one of its comments.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkOrderFile {
    pub id: i32,
    pub work_order_id: i32,
    /// Set when the file belongs to a comment rather than the order itself.
    pub comment_id: Option<i32>,
    pub uploaded_by: i32,
    pub file_name: String,
    pub stored_name: String,
    pub stored_path: String,
    pub mime_type: Option<String>,
    pub size_bytes: i64,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct WorkOrderFileNew {
    pub file_name: String,
    pub stored_name: String,
    pub stored_path: String,
    pub mime_type: Option<String>,
    pub size_bytes: i64,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "archivos_ot")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_name = "orden_trabajo_id")]
    pub work_order_id: i32,
    #[sea_orm(column_name = "comentario_id")]
    pub comment_id: Option<i32>,
    #[sea_orm(column_name = "usuario_id")]
    pub uploaded_by: i32,
    #[sea_orm(column_name = "nombre_archivo")]
    pub file_name: String,
    #[sea_orm(column_name = "nombre_archivo_sistema")]
    pub stored_name: String,
    #[sea_orm(column_name = "ruta_archivo")]
    pub stored_path: String,
    #[sea_orm(column_name = "tipo_mime")]
    pub mime_type: Option<String>,
    #[sea_orm(column_name = "tamano_bytes")]
    pub size_bytes: i64,
    #[sea_orm(column_name = "fecha_subida")]
    pub uploaded_at: DateTimeUtc,
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
    #[sea_orm(
        belongs_to = "super::work_order_comments::Entity",
        from = "Column::CommentId",
        to = "super::work_order_comments::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Comment,
}

impl Related<super::work_orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkOrder.def()
    }
}

impl Related<super::work_order_comments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for WorkOrderFile {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            work_order_id: model.work_order_id,
            comment_id: model.comment_id,
            uploaded_by: model.uploaded_by,
            file_name: model.file_name,
            stored_name: model.stored_name,
            stored_path: model.stored_path,
            mime_type: model.mime_type,
            size_bytes: model.size_bytes,
            uploaded_at: model.uploaded_at,
        }
    }
}
