//! Users table.
//!
//! The password hash never leaves the engine: [`User`] carries everything
//! else, including the lockout counters maintained by authentication.

use chrono::{DateTime, Duration, Utc};
use sea_orm::entity::prelude::*;

/// Consecutive failed logins that lock an account.
pub const MAX_FAILED_ATTEMPTS: i32 = 5;
/// How long a locked account stays locked.
pub const LOCKOUT_MINUTES: i64 = 30;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub active: bool,
    pub is_admin: bool,
    pub role_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub must_change_password: bool,
    pub password_changed_at: Option<DateTime<Utc>>,
    pub failed_attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }
}

#[derive(Clone, Debug)]
pub struct UserNew {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub active: bool,
    pub is_admin: bool,
    pub role_id: Option<i32>,
    pub must_change_password: bool,
}

#[derive(Clone, Debug, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub active: Option<bool>,
    pub is_admin: Option<bool>,
    pub role_id: Option<i32>,
}

/// Outcome of a failed login attempt, computed before it is persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct FailedLogin {
    pub(crate) attempts: i32,
    pub(crate) locked_until: Option<DateTime<Utc>>,
}

/// Count one more failure; the fifth in a row locks the account.
pub(crate) fn register_failure(previous_attempts: i32, now: DateTime<Utc>) -> FailedLogin {
    let attempts = previous_attempts.saturating_add(1);
    let locked_until =
        (attempts >= MAX_FAILED_ATTEMPTS).then(|| now + Duration::minutes(LOCKOUT_MINUTES));
    FailedLogin {
        attempts,
        locked_until,
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "usuarios")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    pub hashed_password: String,
    #[sea_orm(column_name = "nombre_completo")]
    pub full_name: Option<String>,
    #[sea_orm(column_name = "activo")]
    pub active: bool,
    #[sea_orm(column_name = "es_admin")]
    pub is_admin: bool,
    #[sea_orm(column_name = "rol_id")]
    pub role_id: Option<i32>,
    #[sea_orm(column_name = "fecha_creacion")]
    pub created_at: DateTimeUtc,
    #[sea_orm(column_name = "ultima_conexion")]
    pub last_login: Option<DateTimeUtc>,
    #[sea_orm(column_name = "debe_cambiar_password")]
    pub must_change_password: bool,
    #[sea_orm(column_name = "fecha_cambio_password")]
    pub password_changed_at: Option<DateTimeUtc>,
    #[sea_orm(column_name = "intentos_fallidos")]
    pub failed_attempts: i32,
    #[sea_orm(column_name = "bloqueado_hasta")]
    pub locked_until: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::roles::Entity",
        from = "Column::RoleId",
        to = "super::roles::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Role,
}

impl Related<super::roles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Role.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for User {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            full_name: model.full_name,
            active: model.active,
            is_admin: model.is_admin,
            role_id: model.role_id,
            created_at: model.created_at,
            last_login: model.last_login,
            must_change_password: model.must_change_password,
            password_changed_at: model.password_changed_at,
            failed_attempts: model.failed_attempts,
            locked_until: model.locked_until,
        }
    }
}
