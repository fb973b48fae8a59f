//! Individual machines on the plant floor.

use sea_orm::entity::prelude::*;

/// A physical machine, identified by its serial number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Machine {
    pub id: i32,
    pub model_id: Option<i32>,
    pub serial_number: String,
    pub alias: Option<String>,
    pub location: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct MachineNew {
    pub model_id: Option<i32>,
    pub serial_number: String,
    pub alias: Option<String>,
    pub location: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct MachinePatch {
    pub model_id: Option<i32>,
    pub serial_number: Option<String>,
    pub alias: Option<String>,
    pub location: Option<String>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "maquinas")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_name = "modelo_id")]
    pub model_id: Option<i32>,
    #[sea_orm(column_name = "numero_serie", unique)]
    pub serial_number: String,
    pub alias: Option<String>,
    #[sea_orm(column_name = "ubicacion")]
    pub location: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::machine_models::Entity",
        from = "Column::ModelId",
        to = "super::machine_models::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    MachineModel,
}

impl Related<super::machine_models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MachineModel.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Machine {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            model_id: model.model_id,
            serial_number: model.serial_number,
            alias: model.alias,
            location: model.location,
        }
    }
}
