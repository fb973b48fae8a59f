//! Spare part endpoints.

use api_types::{
    ListQuery, Message,
    part::{RepuestoNew, RepuestoUpdate, RepuestoView, StockUpdate},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{Pagination, PartNew, PartPatch};

use crate::{ServerError, server::ServerState};

fn map_part(part: engine::Part) -> RepuestoView {
    RepuestoView {
        id: part.id,
        codigo: part.code,
        nombre: part.name,
        detalle: part.detail,
        ubicacion: part.location,
        almacenamiento_id: part.storage_id,
        cantidad: part.quantity,
        cantidad_minima: part.min_quantity,
        proveedor_id: part.supplier_id,
        tipo: part.kind,
        descripcion_aduana: part.customs_description,
    }
}

fn map_parts(parts: Vec<engine::Part>) -> Json<Vec<RepuestoView>> {
    Json(parts.into_iter().map(map_part).collect())
}

pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<RepuestoView>>, ServerError> {
    let parts = state
        .engine
        .list_parts(Pagination::new(query.skip, query.limit))
        .await?;
    Ok(map_parts(parts))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(part_id): Path<i32>,
) -> Result<Json<RepuestoView>, ServerError> {
    Ok(Json(map_part(state.engine.part(part_id).await?)))
}

pub async fn by_code(
    State(state): State<ServerState>,
    Path(code): Path<String>,
) -> Result<Json<RepuestoView>, ServerError> {
    Ok(Json(map_part(state.engine.part_by_code(&code).await?)))
}

pub async fn by_supplier(
    State(state): State<ServerState>,
    Path(supplier_id): Path<i32>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<RepuestoView>>, ServerError> {
    let parts = state
        .engine
        .parts_by_supplier(supplier_id, Pagination::new(query.skip, query.limit))
        .await?;
    Ok(map_parts(parts))
}

pub async fn low_stock(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<RepuestoView>>, ServerError> {
    let parts = state
        .engine
        .low_stock_parts(Pagination::new(query.skip, query.limit))
        .await?;
    Ok(map_parts(parts))
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<RepuestoNew>,
) -> Result<(StatusCode, Json<RepuestoView>), ServerError> {
    let part = state
        .engine
        .new_part(PartNew {
            code: payload.codigo,
            name: payload.nombre,
            detail: payload.detalle,
            location: payload.ubicacion,
            storage_id: payload.almacenamiento_id,
            quantity: payload.cantidad,
            min_quantity: payload.cantidad_minima,
            supplier_id: payload.proveedor_id,
            kind: payload.tipo,
            customs_description: payload.descripcion_aduana,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(map_part(part))))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(part_id): Path<i32>,
    Json(payload): Json<RepuestoUpdate>,
) -> Result<Json<RepuestoView>, ServerError> {
    let part = state
        .engine
        .update_part(
            part_id,
            PartPatch {
                code: payload.codigo,
                name: payload.nombre,
                detail: payload.detalle,
                location: payload.ubicacion,
                storage_id: payload.almacenamiento_id,
                quantity: payload.cantidad,
                min_quantity: payload.cantidad_minima,
                supplier_id: payload.proveedor_id,
                kind: payload.tipo,
                customs_description: payload.descripcion_aduana,
            },
        )
        .await?;
    Ok(Json(map_part(part)))
}

pub async fn set_stock(
    State(state): State<ServerState>,
    Path(part_id): Path<i32>,
    Json(payload): Json<StockUpdate>,
) -> Result<Json<RepuestoView>, ServerError> {
    let part = state.engine.set_part_stock(part_id, payload.cantidad).await?;
    Ok(Json(map_part(part)))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(part_id): Path<i32>,
) -> Result<Json<Message>, ServerError> {
    state.engine.delete_part(part_id).await?;
    Ok(Json(Message::new("part deleted")))
}
