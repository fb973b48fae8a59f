//! Named permissions (`recurso` + `accion`) granted through roles.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Permission {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub resource: String,
    pub action: String,
    pub active: bool,
}

#[derive(Clone, Debug, Default)]
pub struct PermissionNew {
    pub name: String,
    pub description: Option<String>,
    pub resource: String,
    pub action: String,
    pub active: bool,
}

#[derive(Clone, Debug, Default)]
pub struct PermissionPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub resource: Option<String>,
    pub action: Option<String>,
    pub active: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "permisos")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_name = "nombre", unique)]
    pub name: String,
    #[sea_orm(column_name = "descripcion")]
    pub description: Option<String>,
    #[sea_orm(column_name = "recurso")]
    pub resource: String,
    #[sea_orm(column_name = "accion")]
    pub action: String,
    #[sea_orm(column_name = "activo")]
    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::role_permissions::Entity")]
    RolePermissions,
}

impl Related<super::role_permissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RolePermissions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Permission {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            resource: model.resource,
            action: model.action,
            active: model.active,
        }
    }
}
