//! Purchase order lines.
//!
//! A line either points at a catalog part (`part_id`), or is *manual*: it
//! carries its own code and name and becomes a catalog part when received.
//! Lines with neither get a generated part on receipt.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq)]
pub struct OrderItem {
    pub id: i32,
    pub order_id: i32,
    pub part_id: Option<i32>,
    pub quantity_ordered: i32,
    pub quantity_received: i32,
    pub customs_description: Option<String>,
    pub unit_price: Option<f64>,
    pub is_manual: bool,
    pub manual_name: Option<String>,
    pub manual_code: Option<String>,
    pub manual_detail: Option<String>,
    pub manual_min_quantity: Option<i32>,
}

#[derive(Clone, Debug, Default)]
pub struct OrderItemNew {
    pub part_id: Option<i32>,
    pub quantity_ordered: i32,
    pub customs_description: Option<String>,
    pub unit_price: Option<f64>,
    pub is_manual: bool,
    pub manual_name: Option<String>,
    pub manual_code: Option<String>,
    pub manual_detail: Option<String>,
    pub manual_min_quantity: Option<i32>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct OrderItemPatch {
    pub part_id: Option<i32>,
    pub quantity_ordered: Option<i32>,
    pub quantity_received: Option<i32>,
    pub customs_description: Option<String>,
    pub unit_price: Option<f64>,
    pub manual_name: Option<String>,
    pub manual_code: Option<String>,
    pub manual_detail: Option<String>,
    pub manual_min_quantity: Option<i32>,
}

impl OrderItemPatch {
    /// True when the patch touches nothing but the received quantity.
    pub fn only_received_quantity(&self) -> bool {
        let Self {
            quantity_received: _,
            part_id,
            quantity_ordered,
            customs_description,
            unit_price,
            manual_name,
            manual_code,
            manual_detail,
            manual_min_quantity,
        } = self;
        part_id.is_none()
            && quantity_ordered.is_none()
            && customs_description.is_none()
            && unit_price.is_none()
            && manual_name.is_none()
            && manual_code.is_none()
            && manual_detail.is_none()
            && manual_min_quantity.is_none()
    }
}

/// One received line: which item and how many units arrived.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReceivedItem {
    pub item_id: i32,
    pub quantity_received: i32,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "items_orden_compra")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_name = "orden_id")]
    pub order_id: i32,
    #[sea_orm(column_name = "repuesto_id")]
    pub part_id: Option<i32>,
    #[sea_orm(column_name = "cantidad_pedida")]
    pub quantity_ordered: i32,
    #[sea_orm(column_name = "cantidad_recibida")]
    pub quantity_received: i32,
    #[sea_orm(column_name = "descripcion_aduana", column_type = "Text", nullable)]
    pub customs_description: Option<String>,
    #[sea_orm(column_name = "precio_unitario", column_type = "Double", nullable)]
    pub unit_price: Option<f64>,
    #[sea_orm(column_name = "es_item_manual")]
    pub is_manual: bool,
    #[sea_orm(column_name = "nombre_manual")]
    pub manual_name: Option<String>,
    #[sea_orm(column_name = "codigo_manual")]
    pub manual_code: Option<String>,
    #[sea_orm(column_name = "detalle_manual", column_type = "Text", nullable)]
    pub manual_detail: Option<String>,
    #[sea_orm(column_name = "cantidad_minima_manual")]
    pub manual_min_quantity: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::purchase_orders::Entity",
        from = "Column::OrderId",
        to = "super::purchase_orders::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Order,
    #[sea_orm(
        belongs_to = "super::parts::Entity",
        from = "Column::PartId",
        to = "super::parts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Part,
}

impl Related<super::purchase_orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::parts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Part.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for OrderItem {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            part_id: model.part_id,
            quantity_ordered: model.quantity_ordered,
            quantity_received: model.quantity_received,
            customs_description: model.customs_description,
            unit_price: model.unit_price,
            is_manual: model.is_manual,
            manual_name: model.manual_name,
            manual_code: model.manual_code,
            manual_detail: model.manual_detail,
            manual_min_quantity: model.manual_min_quantity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn received_only_patch_is_detected() {
        let patch = OrderItemPatch {
            quantity_received: Some(4),
            ..Default::default()
        };
        assert!(patch.only_received_quantity());

        let patch = OrderItemPatch {
            quantity_received: Some(4),
            unit_price: Some(1.5),
            ..Default::default()
        };
        assert!(!patch.only_received_quantity());
    }
}
