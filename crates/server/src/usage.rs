//! Part usage history endpoints.

use api_types::{
    ListQuery, Message,
    usage::{
        ConsumoQuery, EstadisticasConsumo, HistorialNew, HistorialUpdate, HistorialView,
        RangoFechas,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{Pagination, PartUsageNew, PartUsagePatch};

use crate::{ServerError, server::ServerState};

fn map_usage(usage: engine::PartUsage) -> HistorialView {
    HistorialView {
        id: usage.id,
        repuesto_id: usage.part_id,
        maquina_id: usage.machine_id,
        cantidad_usada: usage.quantity_used,
        fecha: usage.used_at,
        observaciones: usage.notes,
    }
}

fn map_history(history: Vec<engine::PartUsage>) -> Json<Vec<HistorialView>> {
    Json(history.into_iter().map(map_usage).collect())
}

pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<HistorialView>>, ServerError> {
    let history = state
        .engine
        .list_usage(Pagination::new(query.skip, query.limit))
        .await?;
    Ok(map_history(history))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(usage_id): Path<i32>,
) -> Result<Json<HistorialView>, ServerError> {
    Ok(Json(map_usage(state.engine.usage(usage_id).await?)))
}

pub async fn by_part(
    State(state): State<ServerState>,
    Path(part_id): Path<i32>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<HistorialView>>, ServerError> {
    let history = state
        .engine
        .usage_by_part(part_id, Pagination::new(query.skip, query.limit))
        .await?;
    Ok(map_history(history))
}

pub async fn by_machine(
    State(state): State<ServerState>,
    Path(machine_id): Path<i32>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<HistorialView>>, ServerError> {
    let history = state
        .engine
        .usage_by_machine(machine_id, Pagination::new(query.skip, query.limit))
        .await?;
    Ok(map_history(history))
}

pub async fn by_date_range(
    State(state): State<ServerState>,
    Query(query): Query<RangoFechas>,
) -> Result<Json<Vec<HistorialView>>, ServerError> {
    let history = state
        .engine
        .usage_by_date_range(
            query.fecha_inicio,
            query.fecha_fin,
            Pagination::new(query.skip, query.limit),
        )
        .await?;
    Ok(map_history(history))
}

pub async fn consumption_stats(
    State(state): State<ServerState>,
    Path(part_id): Path<i32>,
    Query(query): Query<ConsumoQuery>,
) -> Result<Json<EstadisticasConsumo>, ServerError> {
    let stats = state
        .engine
        .consumption_stats(part_id, query.fecha_inicio, query.fecha_fin)
        .await?;
    Ok(Json(EstadisticasConsumo {
        repuesto_id: stats.part_id,
        total_usado: stats.total_used,
        numero_usos: stats.uses,
        promedio_por_uso: stats.average_per_use,
    }))
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<HistorialNew>,
) -> Result<(StatusCode, Json<HistorialView>), ServerError> {
    let usage = state
        .engine
        .new_usage(PartUsageNew {
            part_id: payload.repuesto_id,
            machine_id: payload.maquina_id,
            quantity_used: payload.cantidad_usada,
            used_at: payload.fecha,
            notes: payload.observaciones,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(map_usage(usage))))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(usage_id): Path<i32>,
    Json(payload): Json<HistorialUpdate>,
) -> Result<Json<HistorialView>, ServerError> {
    let usage = state
        .engine
        .update_usage(
            usage_id,
            PartUsagePatch {
                part_id: payload.repuesto_id,
                machine_id: payload.maquina_id,
                quantity_used: payload.cantidad_usada,
                used_at: payload.fecha,
                notes: payload.observaciones,
            },
        )
        .await?;
    Ok(Json(map_usage(usage)))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(usage_id): Path<i32>,
) -> Result<Json<Message>, ServerError> {
    state.engine.delete_usage(usage_id).await?;
    Ok(Json(Message::new("usage record deleted, stock restored")))
}
