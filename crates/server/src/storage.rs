//! Storage location endpoints.

use api_types::{
    Message,
    storage::{AlmacenamientoNew, AlmacenamientoQuery, AlmacenamientoUpdate, AlmacenamientoView},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{Pagination, StorageLocationNew, StorageLocationPatch};

use crate::{ServerError, server::ServerState};

fn map_storage(location: engine::StorageLocation) -> AlmacenamientoView {
    AlmacenamientoView {
        id: location.id,
        codigo: location.code,
        nombre: location.name,
        descripcion: location.description,
        ubicacion_fisica: location.physical_location,
        activo: location.active,
    }
}

pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<AlmacenamientoQuery>,
) -> Result<Json<Vec<AlmacenamientoView>>, ServerError> {
    let locations = state
        .engine
        .list_storage_locations(
            query.search.as_deref(),
            Pagination::new(query.skip, query.limit),
        )
        .await?
        .into_iter()
        .map(map_storage)
        .collect();
    Ok(Json(locations))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(storage_id): Path<i32>,
) -> Result<Json<AlmacenamientoView>, ServerError> {
    Ok(Json(map_storage(state.engine.storage_location(storage_id).await?)))
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<AlmacenamientoNew>,
) -> Result<(StatusCode, Json<AlmacenamientoView>), ServerError> {
    let location = state
        .engine
        .new_storage_location(StorageLocationNew {
            code: payload.codigo,
            name: payload.nombre,
            description: payload.descripcion,
            physical_location: payload.ubicacion_fisica,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(map_storage(location))))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(storage_id): Path<i32>,
    Json(payload): Json<AlmacenamientoUpdate>,
) -> Result<Json<AlmacenamientoView>, ServerError> {
    let location = state
        .engine
        .update_storage_location(
            storage_id,
            StorageLocationPatch {
                code: payload.codigo,
                name: payload.nombre,
                description: payload.descripcion,
                physical_location: payload.ubicacion_fisica,
                active: payload.activo,
            },
        )
        .await?;
    Ok(Json(map_storage(location)))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(storage_id): Path<i32>,
) -> Result<Json<Message>, ServerError> {
    state.engine.delete_storage_location(storage_id).await?;
    Ok(Json(Message::new("storage location deactivated")))
}
