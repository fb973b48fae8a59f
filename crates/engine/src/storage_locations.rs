//! Storage locations (shelves, cabinets) where parts are kept.
//!
//! Locations are never hard deleted: deleting one clears `active`.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageLocation {
    pub id: i32,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub physical_location: Option<String>,
    pub active: bool,
}

#[derive(Clone, Debug, Default)]
pub struct StorageLocationNew {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub physical_location: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct StorageLocationPatch {
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub physical_location: Option<String>,
    pub active: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "almacenamientos")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_name = "codigo", unique)]
    pub code: String,
    #[sea_orm(column_name = "nombre")]
    pub name: String,
    #[sea_orm(column_name = "descripcion", column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(column_name = "ubicacion_fisica")]
    pub physical_location: Option<String>,
    #[sea_orm(column_name = "activo")]
    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::parts::Entity")]
    Parts,
}

impl Related<super::parts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Parts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for StorageLocation {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            code: model.code,
            name: model.name,
            description: model.description,
            physical_location: model.physical_location,
            active: model.active,
        }
    }
}
