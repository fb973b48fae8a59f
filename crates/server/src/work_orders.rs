//! Work order endpoints, including comments and attachments.

use api_types::{
    ListQuery, Message,
    work_order::{
        ArchivoContenido, ArchivoView, ComentarioNew, ComentarioView,
        EstadisticasOrdenesTrabajo, EstadoUpdate, MisOrdenesQuery, OrdenTrabajoNew,
        OrdenTrabajoQuery, OrdenTrabajoUpdate, OrdenTrabajoView,
    },
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use engine::{
    Criticality, EngineError, Pagination, User, WorkOrderFileNew, WorkOrderFilter, WorkOrderNew,
    WorkOrderPatch, WorkOrderSort, WorkOrderState,
};

use crate::{
    ServerError,
    server::ServerState,
    uploads::{self, Upload},
};

const FILES_DIR: &str = "ordenes_trabajo";
const COMMENT_FILES_DIR: &str = "comentarios";

fn map_work_order(order: engine::WorkOrder) -> OrdenTrabajoView {
    OrdenTrabajoView {
        id: order.id,
        titulo: order.title,
        descripcion: order.description,
        maquina_id: order.machine_id,
        usuario_asignado_id: order.assignee_id,
        usuario_creador_id: order.created_by,
        nivel_criticidad: order.criticality.as_str().to_string(),
        estado: order.state.as_str().to_string(),
        fecha_programada: order.scheduled_for,
        tiempo_estimado_horas: order.estimated_hours,
        fecha_creacion: order.created_at,
        fecha_inicio: order.started_at,
        fecha_finalizacion: order.finished_at,
    }
}

fn map_comment(comment: engine::WorkOrderComment) -> ComentarioView {
    ComentarioView {
        id: comment.id,
        orden_trabajo_id: comment.work_order_id,
        usuario_id: comment.author_id,
        comentario: comment.body,
        fecha_creacion: comment.created_at,
    }
}

fn map_file(file: engine::WorkOrderFile) -> ArchivoView {
    ArchivoView {
        id: file.id,
        orden_trabajo_id: file.work_order_id,
        comentario_id: file.comment_id,
        usuario_id: file.uploaded_by,
        nombre_archivo: file.file_name,
        tipo_mime: file.mime_type,
        tamano_bytes: file.size_bytes,
        fecha_subida: file.uploaded_at,
    }
}

fn parse_state(value: Option<&str>) -> Result<Option<WorkOrderState>, ServerError> {
    Ok(value.map(WorkOrderState::try_from).transpose()?)
}

fn parse_criticality(value: Option<&str>) -> Result<Option<Criticality>, ServerError> {
    Ok(value.map(Criticality::try_from).transpose()?)
}

fn descending(sort_order: Option<&str>) -> Result<bool, ServerError> {
    match sort_order {
        None | Some("desc") => Ok(true),
        Some("asc") => Ok(false),
        Some(other) => Err(ServerError::Generic(format!(
            "invalid sort_order: {other}; expected asc or desc"
        ))),
    }
}

pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<OrdenTrabajoQuery>,
) -> Result<Json<Vec<OrdenTrabajoView>>, ServerError> {
    let filter = WorkOrderFilter {
        search: query.search,
        state: parse_state(query.estado.as_deref())?,
        criticality: parse_criticality(query.nivel_criticidad.as_deref())?,
        assignee_id: query.usuario_asignado_id,
        machine_id: query.maquina_id,
        scheduled_from: query.fecha_desde,
        scheduled_to: query.fecha_hasta,
        sort: query
            .sort_by
            .as_deref()
            .map(WorkOrderSort::try_from)
            .transpose()?
            .unwrap_or_default(),
        descending: descending(query.sort_order.as_deref())?,
    };
    let orders = state
        .engine
        .list_work_orders(filter, Pagination::new(query.skip, query.limit))
        .await?
        .into_iter()
        .map(map_work_order)
        .collect();
    Ok(Json(orders))
}

/// Orders assigned to the caller.
pub async fn mine(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Query(query): Query<MisOrdenesQuery>,
) -> Result<Json<Vec<OrdenTrabajoView>>, ServerError> {
    let orders = state
        .engine
        .assigned_work_orders(
            user.id,
            parse_state(query.estado.as_deref())?,
            Pagination::new(query.skip, query.limit),
        )
        .await?
        .into_iter()
        .map(map_work_order)
        .collect();
    Ok(Json(orders))
}

pub async fn stats(
    State(state): State<ServerState>,
) -> Result<Json<EstadisticasOrdenesTrabajo>, ServerError> {
    let stats = state.engine.work_order_stats().await?;
    Ok(Json(EstadisticasOrdenesTrabajo {
        total: stats.total,
        pendiente: stats.pendiente,
        en_proceso: stats.en_proceso,
        completada: stats.completada,
        cancelada: stats.cancelada,
        baja: stats.baja,
        media: stats.media,
        alta: stats.alta,
        critica: stats.critica,
        vencidas: stats.overdue,
    }))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(work_order_id): Path<i32>,
) -> Result<Json<OrdenTrabajoView>, ServerError> {
    let order = state.engine.work_order(work_order_id).await?;
    Ok(Json(map_work_order(order)))
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<OrdenTrabajoNew>,
) -> Result<(StatusCode, Json<OrdenTrabajoView>), ServerError> {
    let order = state
        .engine
        .new_work_order(
            WorkOrderNew {
                title: payload.titulo,
                description: payload.descripcion,
                machine_id: payload.maquina_id,
                assignee_id: payload.usuario_asignado_id,
                criticality: Criticality::try_from(payload.nivel_criticidad.as_str())?,
                scheduled_for: payload.fecha_programada,
                estimated_hours: payload.tiempo_estimado_horas,
            },
            user.id,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(map_work_order(order))))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(work_order_id): Path<i32>,
    Json(payload): Json<OrdenTrabajoUpdate>,
) -> Result<Json<OrdenTrabajoView>, ServerError> {
    let order = state
        .engine
        .update_work_order(
            work_order_id,
            WorkOrderPatch {
                title: payload.titulo,
                description: payload.descripcion,
                machine_id: payload.maquina_id,
                assignee_id: payload.usuario_asignado_id,
                criticality: parse_criticality(payload.nivel_criticidad.as_deref())?,
                state: parse_state(payload.estado.as_deref())?,
                scheduled_for: payload.fecha_programada,
                estimated_hours: payload.tiempo_estimado_horas,
            },
        )
        .await?;
    Ok(Json(map_work_order(order)))
}

pub async fn set_state(
    State(state): State<ServerState>,
    Path(work_order_id): Path<i32>,
    Json(payload): Json<EstadoUpdate>,
) -> Result<Json<OrdenTrabajoView>, ServerError> {
    let target = WorkOrderState::try_from(payload.estado.as_str())?;
    let order = state
        .engine
        .set_work_order_state(work_order_id, target)
        .await?;
    Ok(Json(map_work_order(order)))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(work_order_id): Path<i32>,
) -> Result<Json<Message>, ServerError> {
    let files = state.engine.delete_work_order(work_order_id).await?;
    for file in &files {
        state.uploads.remove(&file.stored_path).await;
    }
    Ok(Json(Message::new("work order deleted")))
}

pub async fn add_comment(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(work_order_id): Path<i32>,
    Json(payload): Json<ComentarioNew>,
) -> Result<(StatusCode, Json<ComentarioView>), ServerError> {
    let comment = state
        .engine
        .add_work_order_comment(work_order_id, user.id, &payload.comentario)
        .await?;
    Ok((StatusCode::CREATED, Json(map_comment(comment))))
}

pub async fn list_comments(
    State(state): State<ServerState>,
    Path(work_order_id): Path<i32>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ComentarioView>>, ServerError> {
    let comments = state
        .engine
        .work_order_comments(work_order_id, Pagination::new(query.skip, query.limit))
        .await?
        .into_iter()
        .map(map_comment)
        .collect();
    Ok(Json(comments))
}

async fn store_attachment(
    state: &ServerState,
    subdir: &str,
    upload: Upload,
    max_bytes: usize,
) -> Result<WorkOrderFileNew, ServerError> {
    let mime_type = uploads::check_attachment_mime(upload.mime_type.as_deref())?;
    uploads::check_size(&upload.bytes, max_bytes)?;
    let ext = uploads::extension(&upload.file_name);
    let stored = state
        .uploads
        .save(subdir, ext.as_deref(), &upload.bytes)
        .await?;
    Ok(WorkOrderFileNew {
        file_name: upload.file_name,
        stored_name: stored.stored_name,
        stored_path: stored.path.to_string_lossy().into_owned(),
        mime_type: Some(mime_type),
        size_bytes: stored.size as i64,
    })
}

/// Drop the stored copy when the row could not be written.
async fn discard_on_error(
    state: &ServerState,
    stored_path: String,
    result: Result<engine::WorkOrderFile, EngineError>,
) -> Result<(StatusCode, Json<ArchivoView>), ServerError> {
    match result {
        Ok(file) => Ok((StatusCode::CREATED, Json(map_file(file)))),
        Err(err) => {
            state.uploads.remove(&stored_path).await;
            Err(err.into())
        }
    }
}

pub async fn upload_file(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(work_order_id): Path<i32>,
    upload: Upload,
) -> Result<(StatusCode, Json<ArchivoView>), ServerError> {
    state.engine.work_order(work_order_id).await?;
    let file = store_attachment(
        &state,
        FILES_DIR,
        upload,
        uploads::WORK_ORDER_FILE_MAX_BYTES,
    )
    .await?;
    let stored_path = file.stored_path.clone();
    let result = state
        .engine
        .add_work_order_file(work_order_id, user.id, file)
        .await;
    discard_on_error(&state, stored_path, result).await
}

pub async fn list_files(
    State(state): State<ServerState>,
    Path(work_order_id): Path<i32>,
) -> Result<Json<Vec<ArchivoView>>, ServerError> {
    let files = state
        .engine
        .work_order_files(work_order_id)
        .await?
        .into_iter()
        .map(map_file)
        .collect();
    Ok(Json(files))
}

pub async fn upload_comment_file(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(comment_id): Path<i32>,
    upload: Upload,
) -> Result<(StatusCode, Json<ArchivoView>), ServerError> {
    let comment = state.engine.work_order_comment(comment_id).await?;
    if comment.author_id != user.id && !user.is_admin {
        return Err(EngineError::Forbidden(
            "only the comment author can attach files to it".to_string(),
        )
        .into());
    }
    let file = store_attachment(
        &state,
        COMMENT_FILES_DIR,
        upload,
        uploads::COMMENT_FILE_MAX_BYTES,
    )
    .await?;
    let stored_path = file.stored_path.clone();
    let result = state
        .engine
        .add_comment_file(comment_id, user.id, user.is_admin, file)
        .await;
    discard_on_error(&state, stored_path, result).await
}

pub async fn list_comment_files(
    State(state): State<ServerState>,
    Path(comment_id): Path<i32>,
) -> Result<Json<Vec<ArchivoView>>, ServerError> {
    let files = state
        .engine
        .comment_files(comment_id)
        .await?
        .into_iter()
        .map(map_file)
        .collect();
    Ok(Json(files))
}

pub async fn download_file(
    State(state): State<ServerState>,
    Path(file_id): Path<i32>,
) -> Result<Json<ArchivoContenido>, ServerError> {
    let file = state.engine.work_order_file(file_id).await?;
    let bytes = state.uploads.read(&file.stored_path).await?;
    Ok(Json(ArchivoContenido {
        nombre_archivo: file.file_name,
        tipo_mime: file.mime_type,
        contenido_base64: uploads::encode(&bytes),
    }))
}

/// Raw file bytes, served as an attachment.
pub async fn download_file_raw(
    State(state): State<ServerState>,
    Path(file_id): Path<i32>,
) -> Result<impl IntoResponse, ServerError> {
    let file = state.engine.work_order_file(file_id).await?;
    let bytes = state.uploads.read(&file.stored_path).await?;
    let mime_type = file
        .mime_type
        .unwrap_or_else(|| "application/octet-stream".to_string());
    let disposition = format!(
        "attachment; filename=\"{}\"",
        file.file_name.replace(['"', '\\', '\r', '\n'], "_")
    );
    Ok((
        [
            (header::CONTENT_TYPE, mime_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

pub async fn delete_file(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(file_id): Path<i32>,
) -> Result<Json<Message>, ServerError> {
    let file = state
        .engine
        .delete_work_order_file(file_id, user.id, user.is_admin)
        .await?;
    state.uploads.remove(&file.stored_path).await;
    Ok(Json(Message::new("file deleted")))
}
