//! Supplier endpoints.

use api_types::{
    ListQuery, Message,
    supplier::{ProveedorNew, ProveedorUpdate, ProveedorView},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{Pagination, SupplierNew, SupplierPatch};

use crate::{ServerError, server::ServerState};

fn map_supplier(supplier: engine::Supplier) -> ProveedorView {
    ProveedorView {
        id: supplier.id,
        nombre: supplier.name,
        contacto: supplier.contact,
        telefono: supplier.phone,
        email: supplier.email,
    }
}

pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ProveedorView>>, ServerError> {
    let suppliers = state
        .engine
        .list_suppliers(Pagination::new(query.skip, query.limit))
        .await?
        .into_iter()
        .map(map_supplier)
        .collect();
    Ok(Json(suppliers))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(supplier_id): Path<i32>,
) -> Result<Json<ProveedorView>, ServerError> {
    let supplier = state.engine.supplier(supplier_id).await?;
    Ok(Json(map_supplier(supplier)))
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ProveedorNew>,
) -> Result<(StatusCode, Json<ProveedorView>), ServerError> {
    let supplier = state
        .engine
        .new_supplier(SupplierNew {
            name: payload.nombre,
            contact: payload.contacto,
            phone: payload.telefono,
            email: payload.email,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(map_supplier(supplier))))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(supplier_id): Path<i32>,
    Json(payload): Json<ProveedorUpdate>,
) -> Result<Json<ProveedorView>, ServerError> {
    let supplier = state
        .engine
        .update_supplier(
            supplier_id,
            SupplierPatch {
                name: payload.nombre,
                contact: payload.contacto,
                phone: payload.telefono,
                email: payload.email,
            },
        )
        .await?;
    Ok(Json(map_supplier(supplier)))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(supplier_id): Path<i32>,
) -> Result<Json<Message>, ServerError> {
    state.engine.delete_supplier(supplier_id).await?;
    Ok(Json(Message::new("supplier deleted")))
}
