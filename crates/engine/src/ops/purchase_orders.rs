use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};

use crate::{
    EngineError, OrderDocument, OrderDocumentNew, OrderItem, OrderItemNew, OrderItemPatch,
    OrderState, OrderStats, PurchaseOrder, PurchaseOrderNew, PurchaseOrderPatch, ResultEngine,
    order_documents, purchase_order_items, purchase_orders,
    util::{
        Pagination, ensure_non_negative, ensure_positive, normalize_optional, normalize_required,
        patch_optional,
    },
};

use super::{Engine, paginate, with_tx};

impl Engine {
    /// List purchase orders, newest first, optionally restricted to one state.
    pub async fn list_purchase_orders(
        &self,
        state: Option<OrderState>,
        pagination: Pagination,
    ) -> ResultEngine<Vec<PurchaseOrder>> {
        with_tx!(self, |db_tx| {
            let mut query = purchase_orders::Entity::find()
                .order_by_desc(purchase_orders::Column::CreatedAt)
                .order_by_desc(purchase_orders::Column::Id);
            if let Some(state) = state {
                query = query.filter(purchase_orders::Column::State.eq(state.as_str()));
            }
            let models = paginate(query, pagination).all(&db_tx).await?;
            self.assemble_purchase_orders(&db_tx, models).await
        })
    }

    pub async fn purchase_order(&self, order_id: i32) -> ResultEngine<PurchaseOrder> {
        with_tx!(self, |db_tx| {
            let model = self.require_purchase_order(&db_tx, order_id).await?;
            self.load_purchase_order(&db_tx, model).await
        })
    }

    pub async fn purchase_order_by_requisition(
        &self,
        requisition_number: &str,
    ) -> ResultEngine<PurchaseOrder> {
        let requisition_number = normalize_required(requisition_number, "numero_requisicion")?;
        with_tx!(self, |db_tx| {
            let model = purchase_orders::Entity::find()
                .filter(purchase_orders::Column::RequisitionNumber.eq(requisition_number.as_str()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| {
                    EngineError::KeyNotFound(format!("purchase order {requisition_number}"))
                })?;
            self.load_purchase_order(&db_tx, model).await
        })
    }

    pub async fn purchase_order_stats(&self) -> ResultEngine<OrderStats> {
        with_tx!(self, |db_tx| {
            let mut stats = OrderStats::default();
            for state in OrderState::ALL {
                let count = purchase_orders::Entity::find()
                    .filter(purchase_orders::Column::State.eq(state.as_str()))
                    .count(&db_tx)
                    .await?;
                match state {
                    OrderState::Borrador => stats.borrador = count,
                    OrderState::Cotizado => stats.cotizado = count,
                    OrderState::Confirmado => stats.confirmado = count,
                    OrderState::Completado => stats.completado = count,
                }
                stats.total += count;
            }
            Ok(stats)
        })
    }

    /// Create a draft order, with its initial lines.
    pub async fn new_purchase_order(
        &self,
        input: PurchaseOrderNew,
        created_by: Option<i32>,
    ) -> ResultEngine<PurchaseOrder> {
        let requisition_number = normalize_optional(input.requisition_number.as_deref());
        with_tx!(self, |db_tx| {
            if let Some(supplier_id) = input.supplier_id {
                self.require_supplier(&db_tx, supplier_id).await?;
            }
            if let Some(number) = requisition_number.as_deref() {
                self.ensure_requisition_free(&db_tx, number, None).await?;
            }
            let now = Utc::now();
            let model = purchase_orders::ActiveModel {
                id: ActiveValue::NotSet,
                supplier_id: ActiveValue::Set(input.supplier_id),
                state: ActiveValue::Set(OrderState::Borrador.as_str().to_string()),
                requisition_number: ActiveValue::Set(requisition_number),
                legajo: ActiveValue::Set(normalize_optional(input.legajo.as_deref())),
                notes: ActiveValue::Set(normalize_optional(input.notes.as_deref())),
                created_by: ActiveValue::Set(created_by),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;
            for item in input.items {
                self.insert_order_item(&db_tx, model.id, item).await?;
            }
            tracing::info!(order_id = model.id, "purchase order created");
            self.load_purchase_order(&db_tx, model).await
        })
    }

    /// Update an order header and, optionally, advance its state.
    ///
    /// A requested state must be the next one in the chain; asking for the
    /// current state is an `InvalidState` error. Moving to `cotizado` needs a
    /// requisition number and moving to `confirmado` needs a `legajo`, either
    /// in the patch or already stored.
    pub async fn update_purchase_order(
        &self,
        order_id: i32,
        patch: PurchaseOrderPatch,
    ) -> ResultEngine<PurchaseOrder> {
        with_tx!(self, |db_tx| {
            let current = self.require_purchase_order(&db_tx, order_id).await?;
            let state = current.order_state()?;
            if state == OrderState::Completado {
                return Err(EngineError::InvalidState(format!(
                    "purchase order {order_id} is completado and cannot be modified"
                )));
            }
            if let Some(supplier_id) = patch.supplier_id {
                self.require_supplier(&db_tx, supplier_id).await?;
            }

            let mut requisition_number = current.requisition_number.clone();
            patch_optional(
                &mut requisition_number,
                patch.requisition_number.as_deref(),
            );
            if requisition_number != current.requisition_number
                && let Some(number) = requisition_number.as_deref()
            {
                self.ensure_requisition_free(&db_tx, number, Some(order_id))
                    .await?;
            }
            let mut legajo = current.legajo.clone();
            patch_optional(&mut legajo, patch.legajo.as_deref());
            let mut notes = current.notes.clone();
            patch_optional(&mut notes, patch.notes.as_deref());

            let target = match patch.state {
                Some(target) => {
                    state.ensure_transition(target)?;
                    if target == OrderState::Cotizado && requisition_number.is_none() {
                        return Err(EngineError::Invalid(
                            "numero_requisicion is required to move to cotizado".to_string(),
                        ));
                    }
                    if target == OrderState::Confirmado && legajo.is_none() {
                        return Err(EngineError::Invalid(
                            "legajo is required to move to confirmado".to_string(),
                        ));
                    }
                    tracing::info!(
                        order_id,
                        from = state.as_str(),
                        to = target.as_str(),
                        "purchase order state changed"
                    );
                    target
                }
                None => state,
            };
            let supplier_id = patch.supplier_id.or(current.supplier_id);

            let mut active: purchase_orders::ActiveModel = current.into();
            active.supplier_id = ActiveValue::Set(supplier_id);
            active.state = ActiveValue::Set(target.as_str().to_string());
            active.requisition_number = ActiveValue::Set(requisition_number);
            active.legajo = ActiveValue::Set(legajo);
            active.notes = ActiveValue::Set(notes);
            active.updated_at = ActiveValue::Set(Utc::now());
            let model = active.update(&db_tx).await?;
            self.load_purchase_order(&db_tx, model).await
        })
    }

    /// Delete a draft or quoted order with its lines. The removed documents
    /// are returned so their stored files can be cleaned up.
    pub async fn delete_purchase_order(&self, order_id: i32) -> ResultEngine<Vec<OrderDocument>> {
        with_tx!(self, |db_tx| {
            let current = self.require_purchase_order(&db_tx, order_id).await?;
            let state = current.order_state()?;
            if state.is_locked() {
                return Err(EngineError::InvalidState(format!(
                    "purchase order {order_id} is {} and cannot be deleted",
                    state.as_str()
                )));
            }
            let documents = self.order_documents_of(&db_tx, order_id).await?;
            order_documents::Entity::delete_many()
                .filter(order_documents::Column::OrderId.eq(order_id))
                .exec(&db_tx)
                .await?;
            purchase_order_items::Entity::delete_many()
                .filter(purchase_order_items::Column::OrderId.eq(order_id))
                .exec(&db_tx)
                .await?;
            purchase_orders::Entity::delete_by_id(order_id)
                .exec(&db_tx)
                .await?;
            tracing::info!(order_id, "purchase order deleted");
            Ok(documents)
        })
    }

    // ── items ──────────────────────────────────────────────────────────────

    pub async fn order_items(&self, order_id: i32) -> ResultEngine<Vec<OrderItem>> {
        with_tx!(self, |db_tx| {
            self.require_purchase_order(&db_tx, order_id).await?;
            self.order_items_of(&db_tx, order_id).await
        })
    }

    /// Add a line to an order that is not yet confirmed.
    pub async fn add_order_item(
        &self,
        order_id: i32,
        item: OrderItemNew,
    ) -> ResultEngine<OrderItem> {
        with_tx!(self, |db_tx| {
            let order = self.require_purchase_order(&db_tx, order_id).await?;
            let state = order.order_state()?;
            if state.is_locked() {
                return Err(EngineError::InvalidState(format!(
                    "cannot add items to a {} order",
                    state.as_str()
                )));
            }
            let model = self.insert_order_item(&db_tx, order_id, item).await?;
            self.touch_purchase_order(&db_tx, order).await?;
            Ok(OrderItem::from(model))
        })
    }

    /// Update a line. Confirmed orders accept only `cantidad_recibida`;
    /// completed orders accept nothing.
    pub async fn update_order_item(
        &self,
        item_id: i32,
        patch: OrderItemPatch,
    ) -> ResultEngine<OrderItem> {
        if let Some(quantity) = patch.quantity_ordered {
            ensure_positive(quantity, "cantidad_pedida")?;
        }
        if let Some(quantity) = patch.quantity_received {
            ensure_non_negative(quantity, "cantidad_recibida")?;
        }
        with_tx!(self, |db_tx| {
            let current = self.require_order_item(&db_tx, item_id).await?;
            let order = self
                .require_purchase_order(&db_tx, current.order_id)
                .await?;
            match order.order_state()? {
                OrderState::Completado => {
                    return Err(EngineError::InvalidState(
                        "items of a completado order cannot be modified".to_string(),
                    ));
                }
                OrderState::Confirmado if !patch.only_received_quantity() => {
                    return Err(EngineError::InvalidState(
                        "only cantidad_recibida may change on a confirmado order".to_string(),
                    ));
                }
                _ => {}
            }
            if let Some(part_id) = patch.part_id {
                self.require_part(&db_tx, part_id).await?;
            }

            let mut manual_name = current.manual_name.clone();
            patch_optional(&mut manual_name, patch.manual_name.as_deref());
            let mut manual_code = current.manual_code.clone();
            patch_optional(&mut manual_code, patch.manual_code.as_deref());
            if current.is_manual {
                let (Some(_), Some(code)) = (manual_name.as_deref(), manual_code.as_deref())
                else {
                    return Err(EngineError::Invalid(
                        "manual items require nombre_manual and codigo_manual".to_string(),
                    ));
                };
                if manual_code != current.manual_code {
                    self.ensure_manual_code_free(&db_tx, current.order_id, code, Some(item_id))
                        .await?;
                }
            }
            let mut manual_detail = current.manual_detail.clone();
            patch_optional(&mut manual_detail, patch.manual_detail.as_deref());
            let mut customs_description = current.customs_description.clone();
            patch_optional(
                &mut customs_description,
                patch.customs_description.as_deref(),
            );
            let part_id = patch.part_id.or(current.part_id);
            let quantity_ordered = patch.quantity_ordered.unwrap_or(current.quantity_ordered);
            let quantity_received = patch.quantity_received.unwrap_or(current.quantity_received);
            let unit_price = patch.unit_price.or(current.unit_price);
            let manual_min_quantity = patch.manual_min_quantity.or(current.manual_min_quantity);

            let mut active: purchase_order_items::ActiveModel = current.into();
            active.part_id = ActiveValue::Set(part_id);
            active.quantity_ordered = ActiveValue::Set(quantity_ordered);
            active.quantity_received = ActiveValue::Set(quantity_received);
            active.customs_description = ActiveValue::Set(customs_description);
            active.unit_price = ActiveValue::Set(unit_price);
            active.manual_name = ActiveValue::Set(manual_name);
            active.manual_code = ActiveValue::Set(manual_code);
            active.manual_detail = ActiveValue::Set(manual_detail);
            active.manual_min_quantity = ActiveValue::Set(manual_min_quantity);
            let model = active.update(&db_tx).await?;
            self.touch_purchase_order(&db_tx, order).await?;
            Ok(OrderItem::from(model))
        })
    }

    pub async fn delete_order_item(&self, item_id: i32) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let current = self.require_order_item(&db_tx, item_id).await?;
            let order = self
                .require_purchase_order(&db_tx, current.order_id)
                .await?;
            let state = order.order_state()?;
            if state.is_locked() {
                return Err(EngineError::InvalidState(format!(
                    "cannot delete items of a {} order",
                    state.as_str()
                )));
            }
            purchase_order_items::Entity::delete_by_id(item_id)
                .exec(&db_tx)
                .await?;
            self.touch_purchase_order(&db_tx, order).await?;
            Ok(())
        })
    }

    // ── documents ──────────────────────────────────────────────────────────

    pub async fn add_order_document(
        &self,
        order_id: i32,
        document: OrderDocumentNew,
        uploaded_by: Option<i32>,
    ) -> ResultEngine<OrderDocument> {
        let file_name = normalize_required(&document.file_name, "nombre_archivo")?;
        with_tx!(self, |db_tx| {
            self.require_purchase_order(&db_tx, order_id).await?;
            let model = order_documents::ActiveModel {
                id: ActiveValue::NotSet,
                order_id: ActiveValue::Set(order_id),
                file_name: ActiveValue::Set(file_name),
                stored_path: ActiveValue::Set(document.stored_path),
                file_type: ActiveValue::Set(document.file_type),
                size_bytes: ActiveValue::Set(document.size_bytes),
                uploaded_by: ActiveValue::Set(uploaded_by),
                uploaded_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;
            tracing::info!(order_id, document_id = model.id, "order document added");
            Ok(OrderDocument::from(model))
        })
    }

    pub async fn order_documents(&self, order_id: i32) -> ResultEngine<Vec<OrderDocument>> {
        with_tx!(self, |db_tx| {
            self.require_purchase_order(&db_tx, order_id).await?;
            self.order_documents_of(&db_tx, order_id).await
        })
    }

    pub async fn order_document(&self, document_id: i32) -> ResultEngine<OrderDocument> {
        with_tx!(self, |db_tx| {
            order_documents::Entity::find_by_id(document_id)
                .one(&db_tx)
                .await?
                .map(OrderDocument::from)
                .ok_or_else(|| EngineError::KeyNotFound(format!("document {document_id}")))
        })
    }

    /// Remove a document row and return it.
    pub async fn delete_order_document(&self, document_id: i32) -> ResultEngine<OrderDocument> {
        with_tx!(self, |db_tx| {
            let model = order_documents::Entity::find_by_id(document_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("document {document_id}")))?;
            order_documents::Entity::delete_by_id(document_id)
                .exec(&db_tx)
                .await?;
            Ok(OrderDocument::from(model))
        })
    }

    // ── helpers ────────────────────────────────────────────────────────────

    pub(super) async fn load_purchase_order(
        &self,
        db_tx: &DatabaseTransaction,
        model: purchase_orders::Model,
    ) -> ResultEngine<PurchaseOrder> {
        let items = self.order_items_of(db_tx, model.id).await?;
        let documents = self.order_documents_of(db_tx, model.id).await?;
        PurchaseOrder::from_parts(model, items, documents)
    }

    async fn assemble_purchase_orders(
        &self,
        db_tx: &DatabaseTransaction,
        models: Vec<purchase_orders::Model>,
    ) -> ResultEngine<Vec<PurchaseOrder>> {
        let ids: Vec<i32> = models.iter().map(|model| model.id).collect();
        let mut items: HashMap<i32, Vec<OrderItem>> = HashMap::new();
        for item in purchase_order_items::Entity::find()
            .filter(purchase_order_items::Column::OrderId.is_in(ids.clone()))
            .order_by_asc(purchase_order_items::Column::Id)
            .all(db_tx)
            .await?
        {
            items
                .entry(item.order_id)
                .or_default()
                .push(OrderItem::from(item));
        }
        let mut documents: HashMap<i32, Vec<OrderDocument>> = HashMap::new();
        for document in order_documents::Entity::find()
            .filter(order_documents::Column::OrderId.is_in(ids))
            .order_by_asc(order_documents::Column::Id)
            .all(db_tx)
            .await?
        {
            documents
                .entry(document.order_id)
                .or_default()
                .push(OrderDocument::from(document));
        }
        models
            .into_iter()
            .map(|model| {
                let id = model.id;
                PurchaseOrder::from_parts(
                    model,
                    items.remove(&id).unwrap_or_default(),
                    documents.remove(&id).unwrap_or_default(),
                )
            })
            .collect()
    }

    pub(super) async fn order_items_of(
        &self,
        db_tx: &DatabaseTransaction,
        order_id: i32,
    ) -> ResultEngine<Vec<OrderItem>> {
        let models = purchase_order_items::Entity::find()
            .filter(purchase_order_items::Column::OrderId.eq(order_id))
            .order_by_asc(purchase_order_items::Column::Id)
            .all(db_tx)
            .await?;
        Ok(models.into_iter().map(OrderItem::from).collect())
    }

    async fn order_documents_of(
        &self,
        db_tx: &DatabaseTransaction,
        order_id: i32,
    ) -> ResultEngine<Vec<OrderDocument>> {
        let models = order_documents::Entity::find()
            .filter(order_documents::Column::OrderId.eq(order_id))
            .order_by_asc(order_documents::Column::Id)
            .all(db_tx)
            .await?;
        Ok(models.into_iter().map(OrderDocument::from).collect())
    }

    /// Validate and insert one line of an editable order.
    async fn insert_order_item(
        &self,
        db_tx: &DatabaseTransaction,
        order_id: i32,
        item: OrderItemNew,
    ) -> ResultEngine<purchase_order_items::Model> {
        ensure_positive(item.quantity_ordered, "cantidad_pedida")?;
        if let Some(part_id) = item.part_id {
            self.require_part(db_tx, part_id).await?;
        }
        let manual_name = normalize_optional(item.manual_name.as_deref());
        let manual_code = normalize_optional(item.manual_code.as_deref());
        if item.is_manual {
            let (Some(_), Some(code)) = (manual_name.as_deref(), manual_code.as_deref()) else {
                return Err(EngineError::Invalid(
                    "manual items require nombre_manual and codigo_manual".to_string(),
                ));
            };
            self.ensure_manual_code_free(db_tx, order_id, code, None)
                .await?;
        }
        if let Some(min_quantity) = item.manual_min_quantity {
            ensure_non_negative(min_quantity, "cantidad_minima_manual")?;
        }
        purchase_order_items::ActiveModel {
            id: ActiveValue::NotSet,
            order_id: ActiveValue::Set(order_id),
            part_id: ActiveValue::Set(item.part_id),
            quantity_ordered: ActiveValue::Set(item.quantity_ordered),
            quantity_received: ActiveValue::Set(0),
            customs_description: ActiveValue::Set(normalize_optional(
                item.customs_description.as_deref(),
            )),
            unit_price: ActiveValue::Set(item.unit_price),
            is_manual: ActiveValue::Set(item.is_manual),
            manual_name: ActiveValue::Set(manual_name),
            manual_code: ActiveValue::Set(manual_code),
            manual_detail: ActiveValue::Set(normalize_optional(item.manual_detail.as_deref())),
            manual_min_quantity: ActiveValue::Set(item.manual_min_quantity),
        }
        .insert(db_tx)
        .await
        .map_err(Into::into)
    }

    async fn ensure_manual_code_free(
        &self,
        db_tx: &DatabaseTransaction,
        order_id: i32,
        code: &str,
        except: Option<i32>,
    ) -> ResultEngine<()> {
        let mut query = purchase_order_items::Entity::find()
            .filter(purchase_order_items::Column::OrderId.eq(order_id))
            .filter(purchase_order_items::Column::IsManual.eq(true))
            .filter(purchase_order_items::Column::ManualCode.eq(code));
        if let Some(id) = except {
            query = query.filter(purchase_order_items::Column::Id.ne(id));
        }
        if query.one(db_tx).await?.is_some() {
            return Err(EngineError::ExistingKey(format!(
                "manual item {code} in order {order_id}"
            )));
        }
        Ok(())
    }

    async fn ensure_requisition_free(
        &self,
        db_tx: &DatabaseTransaction,
        number: &str,
        except: Option<i32>,
    ) -> ResultEngine<()> {
        let mut query = purchase_orders::Entity::find()
            .filter(purchase_orders::Column::RequisitionNumber.eq(number));
        if let Some(id) = except {
            query = query.filter(purchase_orders::Column::Id.ne(id));
        }
        if query.one(db_tx).await?.is_some() {
            return Err(EngineError::ExistingKey(number.to_string()));
        }
        Ok(())
    }

    async fn touch_purchase_order(
        &self,
        db_tx: &DatabaseTransaction,
        order: purchase_orders::Model,
    ) -> ResultEngine<()> {
        let mut active: purchase_orders::ActiveModel = order.into();
        active.updated_at = ActiveValue::Set(Utc::now());
        active.update(db_tx).await?;
        Ok(())
    }
}
