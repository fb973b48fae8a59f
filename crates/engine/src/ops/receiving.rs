//! Receiving goods for a confirmed purchase order.
//!
//! Every received line updates stock: catalog lines add to their part, manual
//! lines become (or top up) a part keyed by their code, and lines with neither
//! get an auto-generated part. The order ends up `completado`.

use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseTransaction, TransactionTrait, prelude::*};

use crate::{
    EngineError, OrderState, PurchaseOrder, ReceivedItem, ResultEngine, parts,
    purchase_order_items, purchase_orders,
};

use super::{Engine, with_tx};

/// Stock movement produced by one received line.
enum Receipt {
    /// Add to a part that already exists.
    Restock(parts::Model),
    /// Create a part from scratch.
    Create(parts::ActiveModel),
    /// Nothing can be done for the line.
    Skip(&'static str),
}

impl Engine {
    /// Record the goods received for a confirmed order and complete it.
    ///
    /// Fails with `InvalidState` unless the order is `confirmado`, and with
    /// `Invalid` for negative quantities. Both checks happen before anything
    /// is written.
    pub async fn receive_purchase_order(
        &self,
        order_id: i32,
        received: &[ReceivedItem],
    ) -> ResultEngine<PurchaseOrder> {
        if let Some(entry) = received.iter().find(|entry| entry.quantity_received < 0) {
            return Err(EngineError::Invalid(format!(
                "cantidad_recibida must be >= 0 (item {})",
                entry.item_id
            )));
        }
        with_tx!(self, |db_tx| {
            let order = self.require_purchase_order(&db_tx, order_id).await?;
            let state = order.order_state()?;
            if state != OrderState::Confirmado {
                return Err(EngineError::InvalidState(format!(
                    "purchase order {order_id} is {}; only confirmado orders can be received",
                    state.as_str()
                )));
            }

            tracing::info!(order_id, lines = received.len(), "receiving purchase order");
            for entry in received {
                self.receive_line(&db_tx, &order, *entry).await?;
            }

            let mut active: purchase_orders::ActiveModel = order.into();
            active.state = ActiveValue::Set(OrderState::Completado.as_str().to_string());
            active.updated_at = ActiveValue::Set(Utc::now());
            let model = active.update(&db_tx).await?;
            tracing::info!(order_id, "purchase order completed");
            self.load_purchase_order(&db_tx, model).await
        })
    }

    async fn receive_line(
        &self,
        db_tx: &DatabaseTransaction,
        order: &purchase_orders::Model,
        entry: ReceivedItem,
    ) -> ResultEngine<()> {
        let Some(item) = purchase_order_items::Entity::find_by_id(entry.item_id)
            .one(db_tx)
            .await?
            .filter(|item| item.order_id == order.id)
        else {
            tracing::warn!(
                order_id = order.id,
                item_id = entry.item_id,
                "received item does not belong to the order, skipped"
            );
            return Ok(());
        };

        let quantity = entry.quantity_received;
        let receipt = if quantity > 0 {
            self.plan_receipt(db_tx, order, &item, quantity).await?
        } else {
            Receipt::Skip("nothing received")
        };

        let mut part_id = item.part_id;
        match receipt {
            Receipt::Restock(part) => {
                let part = self.adjust_part_stock(db_tx, part, quantity).await?;
                tracing::info!(
                    item_id = item.id,
                    part_id = part.id,
                    quantity,
                    stock = part.quantity,
                    "stock received"
                );
                part_id = Some(part.id);
            }
            Receipt::Create(new_part) => {
                let part = new_part.insert(db_tx).await?;
                tracing::info!(
                    item_id = item.id,
                    part_id = part.id,
                    code = %part.code,
                    quantity,
                    "part created from received item"
                );
                part_id = Some(part.id);
            }
            Receipt::Skip(reason) if quantity > 0 => {
                tracing::warn!(item_id = item.id, reason, "received item not added to stock");
            }
            Receipt::Skip(_) => {}
        }

        let mut active: purchase_order_items::ActiveModel = item.into();
        active.quantity_received = ActiveValue::Set(quantity);
        active.part_id = ActiveValue::Set(part_id);
        active.update(db_tx).await?;
        Ok(())
    }

    async fn plan_receipt(
        &self,
        db_tx: &DatabaseTransaction,
        order: &purchase_orders::Model,
        item: &purchase_order_items::Model,
        quantity: i32,
    ) -> ResultEngine<Receipt> {
        if item.is_manual {
            let (Some(code), Some(name)) = (item.manual_code.as_deref(), item.manual_name.as_deref())
            else {
                return Ok(Receipt::Skip("manual item without code or name"));
            };
            if let Some(part) = self.find_part_by_code(db_tx, code).await? {
                return Ok(Receipt::Restock(part));
            }
            return Ok(Receipt::Create(parts::ActiveModel {
                id: ActiveValue::NotSet,
                code: ActiveValue::Set(code.to_string()),
                name: ActiveValue::Set(name.to_string()),
                detail: ActiveValue::Set(item.manual_detail.clone()),
                location: ActiveValue::Set(None),
                storage_id: ActiveValue::Set(None),
                quantity: ActiveValue::Set(quantity),
                min_quantity: ActiveValue::Set(item.manual_min_quantity),
                supplier_id: ActiveValue::Set(order.supplier_id),
                kind: ActiveValue::Set(None),
                customs_description: ActiveValue::Set(item.customs_description.clone()),
            }));
        }

        if let Some(part_id) = item.part_id {
            return Ok(match parts::Entity::find_by_id(part_id).one(db_tx).await? {
                Some(part) => Receipt::Restock(part),
                None => Receipt::Skip("linked part not found"),
            });
        }

        let code = format!(
            "AUTO-{}-{}-{}",
            order.id,
            item.id,
            Utc::now().timestamp()
        );
        let mut detail = format!(
            "Creado automáticamente desde orden {}, item {}",
            order.id, item.id
        );
        let name = match item.customs_description.as_deref() {
            Some(description) => {
                detail.push_str(&format!(" - Descripción: {description}"));
                description.to_string()
            }
            None => format!("Item de orden {}", order.id),
        };
        Ok(Receipt::Create(parts::ActiveModel {
            id: ActiveValue::NotSet,
            code: ActiveValue::Set(code),
            name: ActiveValue::Set(name),
            detail: ActiveValue::Set(Some(detail)),
            location: ActiveValue::Set(None),
            storage_id: ActiveValue::Set(None),
            quantity: ActiveValue::Set(quantity),
            min_quantity: ActiveValue::Set(None),
            supplier_id: ActiveValue::Set(order.supplier_id),
            kind: ActiveValue::Set(None),
            customs_description: ActiveValue::Set(item.customs_description.clone()),
        }))
    }
}
