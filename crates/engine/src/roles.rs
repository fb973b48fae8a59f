//! Roles group permissions; users hold at most one role.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

use crate::permissions::Permission;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Role {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub permissions: Vec<Permission>,
}

#[derive(Clone, Debug, Default)]
pub struct RoleNew {
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
    pub permission_ids: Vec<i32>,
}

#[derive(Clone, Debug, Default)]
pub struct RolePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub active: Option<bool>,
    /// Replaces the whole permission set when present.
    pub permission_ids: Option<Vec<i32>>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "roles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_name = "nombre", unique)]
    pub name: String,
    #[sea_orm(column_name = "descripcion")]
    pub description: Option<String>,
    #[sea_orm(column_name = "activo")]
    pub active: bool,
    #[sea_orm(column_name = "fecha_creacion")]
    pub created_at: DateTimeUtc,
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

impl Related<super::permissions::Entity> for Entity {
    fn to() -> RelationDef {
        super::role_permissions::Relation::Permission.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::role_permissions::Relation::Role.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Role {
    pub(crate) fn from_model(model: Model, permissions: Vec<Permission>) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            active: model.active,
            created_at: model.created_at,
            permissions,
        }
    }
}
