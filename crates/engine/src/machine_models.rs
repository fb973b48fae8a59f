//! Machine models (manufacturer + model name).

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MachineModel {
    pub id: i32,
    pub manufacturer: Option<String>,
    pub model: String,
    pub detail: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct MachineModelNew {
    pub manufacturer: Option<String>,
    pub model: String,
    pub detail: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct MachineModelPatch {
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub detail: Option<String>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "modelos_maquinas")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_name = "fabricante")]
    pub manufacturer: Option<String>,
    #[sea_orm(column_name = "modelo")]
    pub model: String,
    #[sea_orm(column_name = "detalle", column_type = "Text", nullable)]
    pub detail: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::machines::Entity")]
    Machines,
}

impl Related<super::machines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Machines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for MachineModel {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            manufacturer: model.manufacturer,
            model: model.model,
            detail: model.detail,
        }
    }
}
