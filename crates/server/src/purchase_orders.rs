//! Purchase order endpoints: lifecycle, lines, documents and receiving.

use api_types::{
    Message,
    purchase_order::{
        ConfirmarLlegada, DocumentoView, EstadisticasOrdenes, ItemOrdenNew,
        ItemOrdenUpdate, ItemOrdenView, OrdenCompraNew, OrdenCompraQuery, OrdenCompraUpdate,
        OrdenCompraView,
    },
    work_order::ArchivoContenido,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{
    OrderDocumentNew, OrderItemNew, OrderItemPatch, OrderState, Pagination, PurchaseOrderNew,
    PurchaseOrderPatch, ReceivedItem, User,
};

use crate::{
    ServerError,
    server::ServerState,
    uploads::{self, Upload},
};

const DOCUMENTS_DIR: &str = "ordenes_compra";

fn map_item(item: engine::OrderItem) -> ItemOrdenView {
    ItemOrdenView {
        id: item.id,
        orden_id: item.order_id,
        repuesto_id: item.part_id,
        cantidad_pedida: item.quantity_ordered,
        cantidad_recibida: item.quantity_received,
        descripcion_aduana: item.customs_description,
        precio_unitario: item.unit_price,
        es_item_manual: item.is_manual,
        nombre_manual: item.manual_name,
        codigo_manual: item.manual_code,
        detalle_manual: item.manual_detail,
        cantidad_minima_manual: item.manual_min_quantity,
    }
}

fn map_document(document: engine::OrderDocument) -> DocumentoView {
    DocumentoView {
        id: document.id,
        orden_id: document.order_id,
        nombre_archivo: document.file_name,
        tipo_archivo: document.file_type,
        tamano_archivo: document.size_bytes,
        usuario_subida_id: document.uploaded_by,
        fecha_subida: document.uploaded_at,
    }
}

fn map_order(order: engine::PurchaseOrder) -> OrdenCompraView {
    OrdenCompraView {
        id: order.id,
        proveedor_id: order.supplier_id,
        estado: order.state.as_str().to_string(),
        numero_requisicion: order.requisition_number,
        legajo: order.legajo,
        observaciones: order.notes,
        usuario_creador_id: order.created_by,
        fecha_creacion: order.created_at,
        fecha_actualizacion: order.updated_at,
        items: order.items.into_iter().map(map_item).collect(),
        documentos: order.documents.into_iter().map(map_document).collect(),
    }
}

fn item_new(item: ItemOrdenNew) -> OrderItemNew {
    OrderItemNew {
        part_id: item.repuesto_id,
        quantity_ordered: item.cantidad_pedida,
        customs_description: item.descripcion_aduana,
        unit_price: item.precio_unitario,
        is_manual: item.es_item_manual,
        manual_name: item.nombre_manual,
        manual_code: item.codigo_manual,
        manual_detail: item.detalle_manual,
        manual_min_quantity: item.cantidad_minima_manual,
    }
}

pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<OrdenCompraQuery>,
) -> Result<Json<Vec<OrdenCompraView>>, ServerError> {
    let order_state = query
        .estado
        .as_deref()
        .map(OrderState::try_from)
        .transpose()?;
    let orders = state
        .engine
        .list_purchase_orders(order_state, Pagination::new(query.skip, query.limit))
        .await?
        .into_iter()
        .map(map_order)
        .collect();
    Ok(Json(orders))
}

pub async fn stats(
    State(state): State<ServerState>,
) -> Result<Json<EstadisticasOrdenes>, ServerError> {
    let stats = state.engine.purchase_order_stats().await?;
    Ok(Json(EstadisticasOrdenes {
        total: stats.total,
        borradores: stats.borrador,
        cotizados: stats.cotizado,
        confirmados: stats.confirmado,
        completados: stats.completado,
    }))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(order_id): Path<i32>,
) -> Result<Json<OrdenCompraView>, ServerError> {
    Ok(Json(map_order(state.engine.purchase_order(order_id).await?)))
}

pub async fn by_requisition(
    State(state): State<ServerState>,
    Path(number): Path<String>,
) -> Result<Json<OrdenCompraView>, ServerError> {
    let order = state.engine.purchase_order_by_requisition(&number).await?;
    Ok(Json(map_order(order)))
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<OrdenCompraNew>,
) -> Result<(StatusCode, Json<OrdenCompraView>), ServerError> {
    let order = state
        .engine
        .new_purchase_order(
            PurchaseOrderNew {
                supplier_id: payload.proveedor_id,
                requisition_number: payload.numero_requisicion,
                legajo: payload.legajo,
                notes: payload.observaciones,
                items: payload.items.into_iter().map(item_new).collect(),
            },
            Some(user.id),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(map_order(order))))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(order_id): Path<i32>,
    Json(payload): Json<OrdenCompraUpdate>,
) -> Result<Json<OrdenCompraView>, ServerError> {
    let order_state = payload
        .estado
        .as_deref()
        .map(OrderState::try_from)
        .transpose()?;
    let order = state
        .engine
        .update_purchase_order(
            order_id,
            PurchaseOrderPatch {
                supplier_id: payload.proveedor_id,
                state: order_state,
                requisition_number: payload.numero_requisicion,
                legajo: payload.legajo,
                notes: payload.observaciones,
            },
        )
        .await?;
    Ok(Json(map_order(order)))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(order_id): Path<i32>,
) -> Result<Json<Message>, ServerError> {
    let documents = state.engine.delete_purchase_order(order_id).await?;
    for document in &documents {
        state.uploads.remove(&document.stored_path).await;
    }
    Ok(Json(Message::new("purchase order deleted")))
}

pub async fn list_items(
    State(state): State<ServerState>,
    Path(order_id): Path<i32>,
) -> Result<Json<Vec<ItemOrdenView>>, ServerError> {
    let items = state
        .engine
        .order_items(order_id)
        .await?
        .into_iter()
        .map(map_item)
        .collect();
    Ok(Json(items))
}

pub async fn add_item(
    State(state): State<ServerState>,
    Path(order_id): Path<i32>,
    Json(payload): Json<ItemOrdenNew>,
) -> Result<(StatusCode, Json<ItemOrdenView>), ServerError> {
    let item = state
        .engine
        .add_order_item(order_id, item_new(payload))
        .await?;
    Ok((StatusCode::CREATED, Json(map_item(item))))
}

pub async fn update_item(
    State(state): State<ServerState>,
    Path(item_id): Path<i32>,
    Json(payload): Json<ItemOrdenUpdate>,
) -> Result<Json<ItemOrdenView>, ServerError> {
    let item = state
        .engine
        .update_order_item(
            item_id,
            OrderItemPatch {
                part_id: payload.repuesto_id,
                quantity_ordered: payload.cantidad_pedida,
                quantity_received: payload.cantidad_recibida,
                customs_description: payload.descripcion_aduana,
                unit_price: payload.precio_unitario,
                manual_name: payload.nombre_manual,
                manual_code: payload.codigo_manual,
                manual_detail: payload.detalle_manual,
                manual_min_quantity: payload.cantidad_minima_manual,
            },
        )
        .await?;
    Ok(Json(map_item(item)))
}

pub async fn delete_item(
    State(state): State<ServerState>,
    Path(item_id): Path<i32>,
) -> Result<Json<Message>, ServerError> {
    state.engine.delete_order_item(item_id).await?;
    Ok(Json(Message::new("order item deleted")))
}

pub async fn list_documents(
    State(state): State<ServerState>,
    Path(order_id): Path<i32>,
) -> Result<Json<Vec<DocumentoView>>, ServerError> {
    let documents = state
        .engine
        .order_documents(order_id)
        .await?
        .into_iter()
        .map(map_document)
        .collect();
    Ok(Json(documents))
}

pub async fn upload_document(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(order_id): Path<i32>,
    upload: Upload,
) -> Result<(StatusCode, Json<DocumentoView>), ServerError> {
    let ext = uploads::check_order_document(&upload.file_name)?;
    uploads::check_size(&upload.bytes, uploads::ORDER_DOCUMENT_MAX_BYTES)?;
    // Fail before touching the disk when the order is gone.
    state.engine.purchase_order(order_id).await?;

    let stored = state
        .uploads
        .save(DOCUMENTS_DIR, Some(&ext), &upload.bytes)
        .await?;
    let stored_path = stored.path.to_string_lossy().into_owned();
    let added = state
        .engine
        .add_order_document(
            order_id,
            OrderDocumentNew {
                file_name: upload.file_name,
                stored_path: stored_path.clone(),
                file_type: ext,
                size_bytes: stored.size as i64,
            },
            Some(user.id),
        )
        .await;
    match added {
        Ok(document) => Ok((StatusCode::CREATED, Json(map_document(document)))),
        Err(err) => {
            state.uploads.remove(&stored_path).await;
            Err(err.into())
        }
    }
}

pub async fn download_document(
    State(state): State<ServerState>,
    Path(document_id): Path<i32>,
) -> Result<Json<ArchivoContenido>, ServerError> {
    let document = state.engine.order_document(document_id).await?;
    let bytes = state.uploads.read(&document.stored_path).await?;
    Ok(Json(ArchivoContenido {
        tipo_mime: Some(uploads::mime_for_extension(&document.file_type).to_string()),
        nombre_archivo: document.file_name,
        contenido_base64: uploads::encode(&bytes),
    }))
}

pub async fn delete_document(
    State(state): State<ServerState>,
    Path(document_id): Path<i32>,
) -> Result<Json<Message>, ServerError> {
    let document = state.engine.delete_order_document(document_id).await?;
    state.uploads.remove(&document.stored_path).await;
    Ok(Json(Message::new("document deleted")))
}

pub async fn receive(
    State(state): State<ServerState>,
    Path(order_id): Path<i32>,
    Json(payload): Json<ConfirmarLlegada>,
) -> Result<Json<OrdenCompraView>, ServerError> {
    let received: Vec<ReceivedItem> = payload
        .items_recibidos
        .iter()
        .map(|item| ReceivedItem {
            item_id: item.item_id,
            quantity_received: item.cantidad_recibida,
        })
        .collect();
    let order = state
        .engine
        .receive_purchase_order(order_id, &received)
        .await?;
    Ok(Json(map_order(order)))
}
