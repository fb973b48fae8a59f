//! Role, permission and page administration. Admin only.

use api_types::{
    ListQuery, Message,
    admin::{
        PaginaNew, PaginaUpdate, PaginaView, PermisoNew, PermisoUpdate, PermisoView, RolNew,
        RolUpdate, RolView,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{Pagination, PageNew, PagePatch, PermissionNew, PermissionPatch, RoleNew, RolePatch};

use crate::{ServerError, server::ServerState};

fn map_permission(permission: engine::Permission) -> PermisoView {
    PermisoView {
        id: permission.id,
        nombre: permission.name,
        descripcion: permission.description,
        recurso: permission.resource,
        accion: permission.action,
        activo: permission.active,
    }
}

fn map_role(role: engine::Role) -> RolView {
    RolView {
        id: role.id,
        nombre: role.name,
        descripcion: role.description,
        activo: role.active,
        fecha_creacion: role.created_at,
        permisos: role.permissions.into_iter().map(map_permission).collect(),
    }
}

pub(crate) fn map_page(page: engine::Page) -> PaginaView {
    PaginaView {
        id: page.id,
        nombre: page.name,
        ruta: page.route,
        titulo: page.title,
        descripcion: page.description,
        icono: page.icon,
        orden: page.order,
        activa: page.active,
        solo_admin: page.admin_only,
    }
}

// ── roles ──────────────────────────────────────────────────────────────────

pub async fn list_roles(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<RolView>>, ServerError> {
    let roles = state
        .engine
        .list_roles(Pagination::new(query.skip, query.limit))
        .await?
        .into_iter()
        .map(map_role)
        .collect();
    Ok(Json(roles))
}

pub async fn get_role(
    State(state): State<ServerState>,
    Path(role_id): Path<i32>,
) -> Result<Json<RolView>, ServerError> {
    Ok(Json(map_role(state.engine.role(role_id).await?)))
}

pub async fn create_role(
    State(state): State<ServerState>,
    Json(payload): Json<RolNew>,
) -> Result<(StatusCode, Json<RolView>), ServerError> {
    let role = state
        .engine
        .new_role(RoleNew {
            name: payload.nombre,
            description: payload.descripcion,
            active: payload.activo,
            permission_ids: payload.permiso_ids,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(map_role(role))))
}

pub async fn update_role(
    State(state): State<ServerState>,
    Path(role_id): Path<i32>,
    Json(payload): Json<RolUpdate>,
) -> Result<Json<RolView>, ServerError> {
    let role = state
        .engine
        .update_role(
            role_id,
            RolePatch {
                name: payload.nombre,
                description: payload.descripcion,
                active: payload.activo,
                permission_ids: payload.permiso_ids,
            },
        )
        .await?;
    Ok(Json(map_role(role)))
}

pub async fn delete_role(
    State(state): State<ServerState>,
    Path(role_id): Path<i32>,
) -> Result<Json<Message>, ServerError> {
    state.engine.delete_role(role_id).await?;
    Ok(Json(Message::new("role deactivated")))
}

// ── permissions ────────────────────────────────────────────────────────────

pub async fn list_permissions(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<PermisoView>>, ServerError> {
    let permissions = state
        .engine
        .list_permissions(Pagination::new(query.skip, query.limit))
        .await?
        .into_iter()
        .map(map_permission)
        .collect();
    Ok(Json(permissions))
}

pub async fn get_permission(
    State(state): State<ServerState>,
    Path(permission_id): Path<i32>,
) -> Result<Json<PermisoView>, ServerError> {
    Ok(Json(map_permission(
        state.engine.permission(permission_id).await?,
    )))
}

pub async fn create_permission(
    State(state): State<ServerState>,
    Json(payload): Json<PermisoNew>,
) -> Result<(StatusCode, Json<PermisoView>), ServerError> {
    let permission = state
        .engine
        .new_permission(PermissionNew {
            name: payload.nombre,
            description: payload.descripcion,
            resource: payload.recurso,
            action: payload.accion,
            active: payload.activo,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(map_permission(permission))))
}

pub async fn update_permission(
    State(state): State<ServerState>,
    Path(permission_id): Path<i32>,
    Json(payload): Json<PermisoUpdate>,
) -> Result<Json<PermisoView>, ServerError> {
    let permission = state
        .engine
        .update_permission(
            permission_id,
            PermissionPatch {
                name: payload.nombre,
                description: payload.descripcion,
                resource: payload.recurso,
                action: payload.accion,
                active: payload.activo,
            },
        )
        .await?;
    Ok(Json(map_permission(permission)))
}

pub async fn delete_permission(
    State(state): State<ServerState>,
    Path(permission_id): Path<i32>,
) -> Result<Json<Message>, ServerError> {
    state.engine.delete_permission(permission_id).await?;
    Ok(Json(Message::new("permission deactivated")))
}

// ── pages ──────────────────────────────────────────────────────────────────

pub async fn list_pages(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<PaginaView>>, ServerError> {
    let pages = state
        .engine
        .list_pages(Pagination::new(query.skip, query.limit))
        .await?
        .into_iter()
        .map(map_page)
        .collect();
    Ok(Json(pages))
}

pub async fn get_page(
    State(state): State<ServerState>,
    Path(page_id): Path<i32>,
) -> Result<Json<PaginaView>, ServerError> {
    Ok(Json(map_page(state.engine.page(page_id).await?)))
}

pub async fn create_page(
    State(state): State<ServerState>,
    Json(payload): Json<PaginaNew>,
) -> Result<(StatusCode, Json<PaginaView>), ServerError> {
    let page = state
        .engine
        .new_page(PageNew {
            name: payload.nombre,
            route: payload.ruta,
            title: payload.titulo,
            description: payload.descripcion,
            icon: payload.icono,
            order: payload.orden,
            active: payload.activa,
            admin_only: payload.solo_admin,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(map_page(page))))
}

pub async fn update_page(
    State(state): State<ServerState>,
    Path(page_id): Path<i32>,
    Json(payload): Json<PaginaUpdate>,
) -> Result<Json<PaginaView>, ServerError> {
    let page = state
        .engine
        .update_page(
            page_id,
            PagePatch {
                name: payload.nombre,
                route: payload.ruta,
                title: payload.titulo,
                description: payload.descripcion,
                icon: payload.icono,
                order: payload.orden,
                active: payload.activa,
                admin_only: payload.solo_admin,
            },
        )
        .await?;
    Ok(Json(map_page(page)))
}

pub async fn delete_page(
    State(state): State<ServerState>,
    Path(page_id): Path<i32>,
) -> Result<Json<Message>, ServerError> {
    state.engine.delete_page(page_id).await?;
    Ok(Json(Message::new("page deactivated")))
}
