//! Maintenance work orders ("OT").

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderState {
    Pendiente,
    EnProceso,
    Completada,
    Cancelada,
}

impl WorkOrderState {
    pub const ALL: [WorkOrderState; 4] = [
        Self::Pendiente,
        Self::EnProceso,
        Self::Completada,
        Self::Cancelada,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pendiente => "pendiente",
            Self::EnProceso => "en_proceso",
            Self::Completada => "completada",
            Self::Cancelada => "cancelada",
        }
    }

    /// Orders still expected to be worked on.
    pub fn is_open(self) -> bool {
        matches!(self, Self::Pendiente | Self::EnProceso)
    }
}

impl TryFrom<&str> for WorkOrderState {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pendiente" => Ok(Self::Pendiente),
            "en_proceso" => Ok(Self::EnProceso),
            "completada" => Ok(Self::Completada),
            "cancelada" => Ok(Self::Cancelada),
            other => Err(EngineError::Invalid(format!(
                "estado must be one of: pendiente, en_proceso, completada, cancelada (got {other})"
            ))),
        }
    }
}

/// Criticality, ordered from least to most urgent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criticality {
    Baja,
    Media,
    Alta,
    Critica,
}

impl Criticality {
    pub const ALL: [Criticality; 4] = [Self::Baja, Self::Media, Self::Alta, Self::Critica];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Baja => "baja",
            Self::Media => "media",
            Self::Alta => "alta",
            Self::Critica => "critica",
        }
    }

    pub fn rank(self) -> u8 {
        match self {
            Self::Baja => 1,
            Self::Media => 2,
            Self::Alta => 3,
            Self::Critica => 4,
        }
    }
}

impl TryFrom<&str> for Criticality {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "baja" => Ok(Self::Baja),
            "media" => Ok(Self::Media),
            "alta" => Ok(Self::Alta),
            "critica" => Ok(Self::Critica),
            other => Err(EngineError::Invalid(format!(
                "nivel_criticidad must be one of: baja, media, alta, critica (got {other})"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WorkOrder {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub machine_id: i32,
    pub assignee_id: i32,
    pub created_by: i32,
    pub criticality: Criticality,
    pub state: WorkOrderState,
    pub scheduled_for: DateTime<Utc>,
    pub estimated_hours: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl WorkOrder {
    /// Scheduled before `now` and still open.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.state.is_open() && self.scheduled_for < now
    }
}

#[derive(Clone, Debug)]
pub struct WorkOrderNew {
    pub title: String,
    pub description: Option<String>,
    pub machine_id: i32,
    pub assignee_id: i32,
    pub criticality: Criticality,
    pub scheduled_for: DateTime<Utc>,
    pub estimated_hours: Option<f64>,
}

#[derive(Clone, Debug, Default)]
pub struct WorkOrderPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub machine_id: Option<i32>,
    pub assignee_id: Option<i32>,
    pub criticality: Option<Criticality>,
    pub state: Option<WorkOrderState>,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub estimated_hours: Option<f64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WorkOrderSort {
    #[default]
    CreatedAt,
    ScheduledFor,
    Criticality,
}

impl TryFrom<&str> for WorkOrderSort {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "fecha_creacion" => Ok(Self::CreatedAt),
            "fecha_programada" => Ok(Self::ScheduledFor),
            "nivel_criticidad" => Ok(Self::Criticality),
            other => Err(EngineError::Invalid(format!("invalid order_by: {other}"))),
        }
    }
}

/// Filters for the work order listing. Empty filter lists everything.
#[derive(Clone, Debug, Default)]
pub struct WorkOrderFilter {
    /// Case-insensitive match on title or description.
    pub search: Option<String>,
    pub state: Option<WorkOrderState>,
    pub criticality: Option<Criticality>,
    pub assignee_id: Option<i32>,
    pub machine_id: Option<i32>,
    pub scheduled_from: Option<DateTime<Utc>>,
    pub scheduled_to: Option<DateTime<Utc>>,
    pub sort: WorkOrderSort,
    pub descending: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkOrderStats {
    pub total: u64,
    pub pendiente: u64,
    pub en_proceso: u64,
    pub completada: u64,
    pub cancelada: u64,
    pub baja: u64,
    pub media: u64,
    pub alta: u64,
    pub critica: u64,
    pub overdue: u64,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ordenes_trabajo")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_name = "titulo")]
    pub title: String,
    #[sea_orm(column_name = "descripcion", column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(column_name = "maquina_id")]
    pub machine_id: i32,
    #[sea_orm(column_name = "usuario_asignado_id")]
    pub assignee_id: i32,
    #[sea_orm(column_name = "usuario_creador_id")]
    pub created_by: i32,
    #[sea_orm(column_name = "nivel_criticidad")]
    pub criticality: String,
    #[sea_orm(column_name = "estado")]
    pub state: String,
    #[sea_orm(column_name = "fecha_programada")]
    pub scheduled_for: DateTimeUtc,
    #[sea_orm(column_name = "tiempo_estimado_horas", column_type = "Double", nullable)]
    pub estimated_hours: Option<f64>,
    #[sea_orm(column_name = "fecha_creacion")]
    pub created_at: DateTimeUtc,
    #[sea_orm(column_name = "fecha_inicio")]
    pub started_at: Option<DateTimeUtc>,
    #[sea_orm(column_name = "fecha_finalizacion")]
    pub finished_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::machines::Entity",
        from = "Column::MachineId",
        to = "super::machines::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Machine,
    #[sea_orm(has_many = "super::work_order_comments::Entity")]
    Comments,
    #[sea_orm(has_many = "super::work_order_files::Entity")]
    Files,
}

impl Related<super::machines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Machine.def()
    }
}

impl Related<super::work_order_comments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl Related<super::work_order_files::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Files.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for WorkOrder {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            criticality: Criticality::try_from(model.criticality.as_str())?,
            state: WorkOrderState::try_from(model.state.as_str())?,
            id: model.id,
            title: model.title,
            description: model.description,
            machine_id: model.machine_id,
            assignee_id: model.assignee_id,
            created_by: model.created_by,
            scheduled_for: model.scheduled_for,
            estimated_hours: model.estimated_hours,
            created_at: model.created_at,
            started_at: model.started_at,
            finished_at: model.finished_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn criticality_ranks_follow_urgency() {
        let mut levels = Criticality::ALL.to_vec();
        levels.reverse();
        levels.sort();
        assert_eq!(levels, Criticality::ALL.to_vec());
        assert!(Criticality::Critica.rank() > Criticality::Alta.rank());
    }

    #[test]
    fn unknown_values_are_rejected() {
        assert!(WorkOrderState::try_from("abierta").is_err());
        assert!(Criticality::try_from("urgente").is_err());
        assert!(WorkOrderSort::try_from("titulo").is_err());
    }

    #[test]
    fn only_open_orders_are_overdue() {
        let now = Utc::now();
        let mut order = WorkOrder {
            id: 1,
            title: "Cambio de correa".to_string(),
            description: None,
            machine_id: 1,
            assignee_id: 1,
            created_by: 1,
            criticality: Criticality::Media,
            state: WorkOrderState::Pendiente,
            scheduled_for: now - Duration::days(1),
            estimated_hours: None,
            created_at: now - Duration::days(2),
            started_at: None,
            finished_at: None,
        };
        assert!(order.is_overdue(now));
        order.state = WorkOrderState::Completada;
        assert!(!order.is_overdue(now));
        order.state = WorkOrderState::EnProceso;
        order.scheduled_for = now + Duration::days(1);
        assert!(!order.is_overdue(now));
    }
}
