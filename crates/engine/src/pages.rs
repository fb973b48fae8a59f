//! Frontend pages a user may be granted access to.
//!
//! Access to the business endpoints is gated by page: a non-admin user must
//! hold the page (and the page must be active) to call its endpoints.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    pub id: i32,
    pub name: String,
    pub route: String,
    pub title: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub order: i32,
    pub active: bool,
    pub admin_only: bool,
}

#[derive(Clone, Debug, Default)]
pub struct PageNew {
    pub name: String,
    pub route: String,
    pub title: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub order: i32,
    pub active: bool,
    pub admin_only: bool,
}

#[derive(Clone, Debug, Default)]
pub struct PagePatch {
    pub name: Option<String>,
    pub route: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub order: Option<i32>,
    pub active: Option<bool>,
    pub admin_only: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "paginas")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_name = "nombre", unique)]
    pub name: String,
    #[sea_orm(column_name = "ruta", unique)]
    pub route: String,
    #[sea_orm(column_name = "titulo")]
    pub title: String,
    #[sea_orm(column_name = "descripcion")]
    pub description: Option<String>,
    #[sea_orm(column_name = "icono")]
    pub icon: Option<String>,
    #[sea_orm(column_name = "orden")]
    pub order: i32,
    #[sea_orm(column_name = "activa")]
    pub active: bool,
    #[sea_orm(column_name = "solo_admin")]
    pub admin_only: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_pages::Entity")]
    UserPages,
}

impl Related<super::user_pages::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserPages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Page {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            route: model.route,
            title: model.title,
            description: model.description,
            icon: model.icon,
            order: model.order,
            active: model.active,
            admin_only: model.admin_only,
        }
    }
}
