//! User administration endpoints. Admin only.

use api_types::{
    ListQuery, Message,
    admin::PaginaView,
    user::{AsignarPaginas, UsuarioNew, UsuarioUpdate, UsuarioView},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{Pagination, User, UserNew, UserPatch};

use crate::{ServerError, admin::map_page, server::ServerState};

pub(crate) fn map_user(user: User) -> UsuarioView {
    UsuarioView {
        id: user.id,
        username: user.username,
        email: user.email,
        nombre_completo: user.full_name,
        activo: user.active,
        es_admin: user.is_admin,
        rol_id: user.role_id,
        fecha_creacion: user.created_at,
        ultima_conexion: user.last_login,
        debe_cambiar_password: user.must_change_password,
        intentos_fallidos: user.failed_attempts,
        bloqueado_hasta: user.locked_until,
    }
}

pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<UsuarioView>>, ServerError> {
    let users = state
        .engine
        .list_users(Pagination::new(query.skip, query.limit))
        .await?
        .into_iter()
        .map(map_user)
        .collect();
    Ok(Json(users))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(user_id): Path<i32>,
) -> Result<Json<UsuarioView>, ServerError> {
    Ok(Json(map_user(state.engine.user(user_id).await?)))
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<UsuarioNew>,
) -> Result<(StatusCode, Json<UsuarioView>), ServerError> {
    let user = state
        .engine
        .new_user(UserNew {
            username: payload.username,
            email: payload.email,
            password: payload.password,
            full_name: payload.nombre_completo,
            active: payload.activo,
            is_admin: payload.es_admin,
            role_id: payload.rol_id,
            must_change_password: payload.debe_cambiar_password,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(map_user(user))))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(user_id): Path<i32>,
    Json(payload): Json<UsuarioUpdate>,
) -> Result<Json<UsuarioView>, ServerError> {
    let user = state
        .engine
        .update_user(
            user_id,
            UserPatch {
                username: payload.username,
                email: payload.email,
                full_name: payload.nombre_completo,
                active: payload.activo,
                is_admin: payload.es_admin,
                role_id: payload.rol_id,
            },
        )
        .await?;
    Ok(Json(map_user(user)))
}

/// Users are never removed, only deactivated.
pub async fn deactivate(
    Extension(actor): Extension<User>,
    State(state): State<ServerState>,
    Path(user_id): Path<i32>,
) -> Result<Json<Message>, ServerError> {
    state.engine.deactivate_user(user_id, actor.id).await?;
    Ok(Json(Message::new("user deactivated")))
}

pub async fn activate(
    State(state): State<ServerState>,
    Path(user_id): Path<i32>,
) -> Result<Json<Message>, ServerError> {
    state.engine.activate_user(user_id).await?;
    Ok(Json(Message::new("user activated")))
}

pub async fn unlock(
    State(state): State<ServerState>,
    Path(user_id): Path<i32>,
) -> Result<Json<Message>, ServerError> {
    state.engine.unlock_user(user_id).await?;
    Ok(Json(Message::new("user unlocked")))
}

pub async fn assign_pages(
    State(state): State<ServerState>,
    Path(user_id): Path<i32>,
    Json(payload): Json<AsignarPaginas>,
) -> Result<Json<Vec<PaginaView>>, ServerError> {
    let pages = state
        .engine
        .assign_pages(user_id, &payload.pagina_ids)
        .await?
        .into_iter()
        .map(map_page)
        .collect();
    Ok(Json(pages))
}

pub async fn pages(
    State(state): State<ServerState>,
    Path(user_id): Path<i32>,
) -> Result<Json<Vec<PaginaView>>, ServerError> {
    let pages = state
        .engine
        .user_pages(user_id)
        .await?
        .into_iter()
        .map(map_page)
        .collect();
    Ok(Json(pages))
}
