//! Machine model and machine endpoints.

use api_types::{
    ListQuery, Message,
    machine::{
        MaquinaNew, MaquinaUpdate, MaquinaView, ModeloMaquinaNew, ModeloMaquinaUpdate,
        ModeloMaquinaView,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{MachineModelNew, MachineModelPatch, MachineNew, MachinePatch, Pagination};

use crate::{ServerError, server::ServerState};

fn map_model(model: engine::MachineModel) -> ModeloMaquinaView {
    ModeloMaquinaView {
        id: model.id,
        fabricante: model.manufacturer,
        modelo: model.model,
        detalle: model.detail,
    }
}

fn map_machine(machine: engine::Machine) -> MaquinaView {
    MaquinaView {
        id: machine.id,
        modelo_id: machine.model_id,
        numero_serie: machine.serial_number,
        alias: machine.alias,
        ubicacion: machine.location,
    }
}

pub async fn list_models(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ModeloMaquinaView>>, ServerError> {
    let models = state
        .engine
        .list_machine_models(Pagination::new(query.skip, query.limit))
        .await?
        .into_iter()
        .map(map_model)
        .collect();
    Ok(Json(models))
}

pub async fn get_model(
    State(state): State<ServerState>,
    Path(model_id): Path<i32>,
) -> Result<Json<ModeloMaquinaView>, ServerError> {
    Ok(Json(map_model(state.engine.machine_model(model_id).await?)))
}

pub async fn create_model(
    State(state): State<ServerState>,
    Json(payload): Json<ModeloMaquinaNew>,
) -> Result<(StatusCode, Json<ModeloMaquinaView>), ServerError> {
    let model = state
        .engine
        .new_machine_model(MachineModelNew {
            manufacturer: payload.fabricante,
            model: payload.modelo,
            detail: payload.detalle,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(map_model(model))))
}

pub async fn update_model(
    State(state): State<ServerState>,
    Path(model_id): Path<i32>,
    Json(payload): Json<ModeloMaquinaUpdate>,
) -> Result<Json<ModeloMaquinaView>, ServerError> {
    let model = state
        .engine
        .update_machine_model(
            model_id,
            MachineModelPatch {
                manufacturer: payload.fabricante,
                model: payload.modelo,
                detail: payload.detalle,
            },
        )
        .await?;
    Ok(Json(map_model(model)))
}

pub async fn delete_model(
    State(state): State<ServerState>,
    Path(model_id): Path<i32>,
) -> Result<Json<Message>, ServerError> {
    state.engine.delete_machine_model(model_id).await?;
    Ok(Json(Message::new("machine model deleted")))
}

pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<MaquinaView>>, ServerError> {
    let machines = state
        .engine
        .list_machines(Pagination::new(query.skip, query.limit))
        .await?
        .into_iter()
        .map(map_machine)
        .collect();
    Ok(Json(machines))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(machine_id): Path<i32>,
) -> Result<Json<MaquinaView>, ServerError> {
    Ok(Json(map_machine(state.engine.machine(machine_id).await?)))
}

pub async fn by_serial(
    State(state): State<ServerState>,
    Path(serial): Path<String>,
) -> Result<Json<MaquinaView>, ServerError> {
    Ok(Json(map_machine(state.engine.machine_by_serial(&serial).await?)))
}

pub async fn by_alias(
    State(state): State<ServerState>,
    Path(alias): Path<String>,
) -> Result<Json<MaquinaView>, ServerError> {
    Ok(Json(map_machine(state.engine.machine_by_alias(&alias).await?)))
}

pub async fn by_model(
    State(state): State<ServerState>,
    Path(model_id): Path<i32>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<MaquinaView>>, ServerError> {
    let machines = state
        .engine
        .machines_by_model(model_id, Pagination::new(query.skip, query.limit))
        .await?
        .into_iter()
        .map(map_machine)
        .collect();
    Ok(Json(machines))
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<MaquinaNew>,
) -> Result<(StatusCode, Json<MaquinaView>), ServerError> {
    let machine = state
        .engine
        .new_machine(MachineNew {
            model_id: payload.modelo_id,
            serial_number: payload.numero_serie,
            alias: payload.alias,
            location: payload.ubicacion,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(map_machine(machine))))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(machine_id): Path<i32>,
    Json(payload): Json<MaquinaUpdate>,
) -> Result<Json<MaquinaView>, ServerError> {
    let machine = state
        .engine
        .update_machine(
            machine_id,
            MachinePatch {
                model_id: payload.modelo_id,
                serial_number: payload.numero_serie,
                alias: payload.alias,
                location: payload.ubicacion,
            },
        )
        .await?;
    Ok(Json(map_machine(machine)))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(machine_id): Path<i32>,
) -> Result<Json<Message>, ServerError> {
    state.engine.delete_machine(machine_id).await?;
    Ok(Json(Message::new("machine deleted")))
}
