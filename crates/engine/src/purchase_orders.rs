//! Purchase orders and their lifecycle.
//!
//! An order moves strictly forward through
//! `borrador -> cotizado -> confirmado -> completado`. The last step is
//! normally taken by receiving the goods, which also reconciles stock.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    EngineError, ResultEngine,
    order_documents::OrderDocument,
    purchase_order_items::{OrderItem, OrderItemNew},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    /// Draft, freely editable.
    Borrador,
    /// Quoted; requires a requisition number.
    Cotizado,
    /// Confirmed with the supplier; requires a `legajo`. Lines are frozen.
    Confirmado,
    /// Goods received. Terminal.
    Completado,
}

impl OrderState {
    pub const ALL: [OrderState; 4] = [
        Self::Borrador,
        Self::Cotizado,
        Self::Confirmado,
        Self::Completado,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Borrador => "borrador",
            Self::Cotizado => "cotizado",
            Self::Confirmado => "confirmado",
            Self::Completado => "completado",
        }
    }

    /// The only state this one may move to.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Borrador => Some(Self::Cotizado),
            Self::Cotizado => Some(Self::Confirmado),
            Self::Confirmado => Some(Self::Completado),
            Self::Completado => None,
        }
    }

    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }

    /// Confirmed and completed orders keep their lines and cannot be deleted.
    pub fn is_locked(self) -> bool {
        matches!(self, Self::Confirmado | Self::Completado)
    }

    pub(crate) fn ensure_transition(self, target: Self) -> ResultEngine<()> {
        if self.can_transition_to(target) {
            return Ok(());
        }
        let allowed = self
            .next()
            .map(|next| next.as_str().to_string())
            .unwrap_or_else(|| "none".to_string());
        Err(EngineError::InvalidState(format!(
            "cannot move order from {} to {}; allowed: {allowed}",
            self.as_str(),
            target.as_str()
        )))
    }
}

impl TryFrom<&str> for OrderState {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "borrador" => Ok(Self::Borrador),
            "cotizado" => Ok(Self::Cotizado),
            "confirmado" => Ok(Self::Confirmado),
            "completado" => Ok(Self::Completado),
            other => Err(EngineError::Invalid(format!("invalid order state: {other}"))),
        }
    }
}

/// A purchase order with its lines and attached documents.
#[derive(Clone, Debug, PartialEq)]
pub struct PurchaseOrder {
    pub id: i32,
    pub supplier_id: Option<i32>,
    pub state: OrderState,
    pub requisition_number: Option<String>,
    pub legajo: Option<String>,
    pub notes: Option<String>,
    pub created_by: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
    pub documents: Vec<OrderDocument>,
}

#[derive(Clone, Debug, Default)]
pub struct PurchaseOrderNew {
    pub supplier_id: Option<i32>,
    pub requisition_number: Option<String>,
    pub legajo: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<OrderItemNew>,
}

#[derive(Clone, Debug, Default)]
pub struct PurchaseOrderPatch {
    pub supplier_id: Option<i32>,
    pub state: Option<OrderState>,
    pub requisition_number: Option<String>,
    pub legajo: Option<String>,
    pub notes: Option<String>,
}

/// Order counts per state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrderStats {
    pub total: u64,
    pub borrador: u64,
    pub cotizado: u64,
    pub confirmado: u64,
    pub completado: u64,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ordenes_compra")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_name = "proveedor_id")]
    pub supplier_id: Option<i32>,
    #[sea_orm(column_name = "estado")]
    pub state: String,
    #[sea_orm(column_name = "numero_requisicion")]
    pub requisition_number: Option<String>,
    pub legajo: Option<String>,
    #[sea_orm(column_name = "observaciones", column_type = "Text", nullable)]
    pub notes: Option<String>,
    #[sea_orm(column_name = "usuario_creador_id")]
    pub created_by: Option<i32>,
    #[sea_orm(column_name = "fecha_creacion")]
    pub created_at: DateTimeUtc,
    #[sea_orm(column_name = "fecha_actualizacion")]
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::suppliers::Entity",
        from = "Column::SupplierId",
        to = "super::suppliers::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Supplier,
    #[sea_orm(has_many = "super::purchase_order_items::Entity")]
    Items,
    #[sea_orm(has_many = "super::order_documents::Entity")]
    Documents,
}

impl Related<super::suppliers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl Related<super::purchase_order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl Related<super::order_documents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Documents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub(crate) fn order_state(&self) -> ResultEngine<OrderState> {
        OrderState::try_from(self.state.as_str())
    }
}

impl PurchaseOrder {
    pub(crate) fn from_parts(
        model: Model,
        items: Vec<OrderItem>,
        documents: Vec<OrderDocument>,
    ) -> ResultEngine<Self> {
        Ok(Self {
            state: model.order_state()?,
            id: model.id,
            supplier_id: model.supplier_id,
            requisition_number: model.requisition_number,
            legajo: model.legajo,
            notes: model.notes,
            created_by: model.created_by,
            created_at: model.created_at,
            updated_at: model.updated_at,
            items,
            documents,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_forward_single_steps_are_allowed() {
        for from in OrderState::ALL {
            for to in OrderState::ALL {
                let expected = matches!(
                    (from, to),
                    (OrderState::Borrador, OrderState::Cotizado)
                        | (OrderState::Cotizado, OrderState::Confirmado)
                        | (OrderState::Confirmado, OrderState::Completado)
                );
                assert_eq!(from.can_transition_to(to), expected, "{from:?} -> {to:?}");
            }
        }
    }

    #[test]
    fn completed_is_terminal() {
        assert_eq!(OrderState::Completado.next(), None);
        assert!(matches!(
            OrderState::Completado.ensure_transition(OrderState::Borrador),
            Err(EngineError::InvalidState(_))
        ));
    }

    #[test]
    fn state_names_round_trip() {
        for state in OrderState::ALL {
            assert_eq!(OrderState::try_from(state.as_str()).unwrap(), state);
        }
        assert!(OrderState::try_from("cancelado").is_err());
    }

    #[test]
    fn confirmed_and_completed_are_locked() {
        assert!(!OrderState::Borrador.is_locked());
        assert!(!OrderState::Cotizado.is_locked());
        assert!(OrderState::Confirmado.is_locked());
        assert!(OrderState::Completado.is_locked());
    }
}
