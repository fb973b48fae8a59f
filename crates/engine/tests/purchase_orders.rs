use sea_orm::{ConnectionTrait, Database};

use engine::{
    Engine, EngineError, OrderItemNew, OrderItemPatch, OrderState, PartNew, PurchaseOrder,
    PurchaseOrderNew, PurchaseOrderPatch, ReceivedItem, SupplierNew,
};
use migration::MigratorTrait;

async fn engine() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

async fn part(engine: &Engine, code: &str, quantity: i32) -> i32 {
    engine
        .new_part(PartNew {
            code: code.to_string(),
            name: format!("Repuesto {code}"),
            quantity,
            ..Default::default()
        })
        .await
        .unwrap()
        .id
}

fn catalog_item(part_id: i32, quantity: i32) -> OrderItemNew {
    OrderItemNew {
        part_id: Some(part_id),
        quantity_ordered: quantity,
        ..Default::default()
    }
}

fn manual_item(code: &str, quantity: i32) -> OrderItemNew {
    OrderItemNew {
        quantity_ordered: quantity,
        is_manual: true,
        manual_name: Some(format!("Manual {code}")),
        manual_code: Some(code.to_string()),
        manual_detail: Some("pedido especial".to_string()),
        manual_min_quantity: Some(2),
        ..Default::default()
    }
}

/// Walk a fresh order up to `confirmado`.
async fn confirmed_order(engine: &Engine, items: Vec<OrderItemNew>, requisition: &str) -> PurchaseOrder {
    let order = engine
        .new_purchase_order(
            PurchaseOrderNew {
                items,
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    engine
        .update_purchase_order(
            order.id,
            PurchaseOrderPatch {
                state: Some(OrderState::Cotizado),
                requisition_number: Some(requisition.to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    engine
        .update_purchase_order(
            order.id,
            PurchaseOrderPatch {
                state: Some(OrderState::Confirmado),
                legajo: Some("L-100".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn new_orders_start_as_draft_with_their_items() {
    let engine = engine().await;
    let supplier = engine
        .new_supplier(SupplierNew {
            name: "Rodamientos SA".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    let part_id = part(&engine, "R-1", 0).await;

    let order = engine
        .new_purchase_order(
            PurchaseOrderNew {
                supplier_id: Some(supplier.id),
                notes: Some("  urgente ".to_string()),
                items: vec![catalog_item(part_id, 4), manual_item("M-1", 2)],
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();

    assert_eq!(order.state, OrderState::Borrador);
    assert_eq!(order.notes.as_deref(), Some("urgente"));
    assert_eq!(order.items.len(), 2);
    assert!(order.items.iter().all(|item| item.quantity_received == 0));
    assert_eq!(engine.purchase_order_stats().await.unwrap().borrador, 1);
}

#[tokio::test]
async fn states_only_move_forward_one_step() {
    let engine = engine().await;
    let order = engine
        .new_purchase_order(PurchaseOrderNew::default(), None)
        .await
        .unwrap();

    let same = engine
        .update_purchase_order(
            order.id,
            PurchaseOrderPatch {
                state: Some(OrderState::Borrador),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(same, Err(EngineError::InvalidState(_))));

    let skip = engine
        .update_purchase_order(
            order.id,
            PurchaseOrderPatch {
                state: Some(OrderState::Confirmado),
                legajo: Some("L-1".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(skip, Err(EngineError::InvalidState(_))));

    let missing_requisition = engine
        .update_purchase_order(
            order.id,
            PurchaseOrderPatch {
                state: Some(OrderState::Cotizado),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(missing_requisition, Err(EngineError::Invalid(_))));

    let quoted = engine
        .update_purchase_order(
            order.id,
            PurchaseOrderPatch {
                state: Some(OrderState::Cotizado),
                requisition_number: Some("REQ-1".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(quoted.state, OrderState::Cotizado);

    let back = engine
        .update_purchase_order(
            order.id,
            PurchaseOrderPatch {
                state: Some(OrderState::Borrador),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(back, Err(EngineError::InvalidState(_))));

    let missing_legajo = engine
        .update_purchase_order(
            order.id,
            PurchaseOrderPatch {
                state: Some(OrderState::Confirmado),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(missing_legajo, Err(EngineError::Invalid(_))));
    assert_eq!(
        engine.purchase_order(order.id).await.unwrap().state,
        OrderState::Cotizado
    );
}

#[tokio::test]
async fn requisition_numbers_are_unique() {
    let engine = engine().await;
    engine
        .new_purchase_order(
            PurchaseOrderNew {
                requisition_number: Some("REQ-7".to_string()),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    let duplicate = engine
        .new_purchase_order(
            PurchaseOrderNew {
                requisition_number: Some("REQ-7".to_string()),
                ..Default::default()
            },
            None,
        )
        .await;
    assert!(matches!(duplicate, Err(EngineError::ExistingKey(_))));

    let found = engine.purchase_order_by_requisition("REQ-7").await.unwrap();
    assert_eq!(found.requisition_number.as_deref(), Some("REQ-7"));
}

#[tokio::test]
async fn confirmed_orders_only_accept_received_quantities() {
    let engine = engine().await;
    let part_id = part(&engine, "R-2", 0).await;
    let order = confirmed_order(&engine, vec![catalog_item(part_id, 3)], "REQ-2").await;
    let item_id = order.items[0].id;

    let edit = engine
        .update_order_item(
            item_id,
            OrderItemPatch {
                quantity_ordered: Some(10),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(edit, Err(EngineError::InvalidState(_))));

    let add = engine
        .add_order_item(order.id, catalog_item(part_id, 1))
        .await;
    assert!(matches!(add, Err(EngineError::InvalidState(_))));

    let received = engine
        .update_order_item(
            item_id,
            OrderItemPatch {
                quantity_received: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(received.quantity_received, 2);

    let delete = engine.delete_purchase_order(order.id).await;
    assert!(matches!(delete, Err(EngineError::InvalidState(_))));
}

#[tokio::test]
async fn receiving_restocks_catalog_parts_by_the_exact_quantity() {
    let engine = engine().await;
    let part_id = part(&engine, "R-3", 5).await;
    let order = confirmed_order(&engine, vec![catalog_item(part_id, 10)], "REQ-3").await;

    let completed = engine
        .receive_purchase_order(
            order.id,
            &[ReceivedItem {
                item_id: order.items[0].id,
                quantity_received: 7,
            }],
        )
        .await
        .unwrap();

    assert_eq!(completed.state, OrderState::Completado);
    assert_eq!(completed.items[0].quantity_received, 7);
    assert_eq!(engine.part(part_id).await.unwrap().quantity, 12);

    let again = engine
        .update_purchase_order(
            order.id,
            PurchaseOrderPatch {
                notes: Some("tarde".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(again, Err(EngineError::InvalidState(_))));
}

#[tokio::test]
async fn manual_items_create_a_part_once_then_restock_it() {
    let engine = engine().await;

    let first = confirmed_order(&engine, vec![manual_item("MAN-9", 4)], "REQ-4").await;
    let first = engine
        .receive_purchase_order(
            first.id,
            &[ReceivedItem {
                item_id: first.items[0].id,
                quantity_received: 4,
            }],
        )
        .await
        .unwrap();
    let created = engine.part_by_code("MAN-9").await.unwrap();
    assert_eq!(created.quantity, 4);
    assert_eq!(created.name, "Manual MAN-9");
    assert_eq!(created.min_quantity, Some(2));
    assert_eq!(first.items[0].part_id, Some(created.id));

    let second = confirmed_order(&engine, vec![manual_item("MAN-9", 3)], "REQ-5").await;
    engine
        .receive_purchase_order(
            second.id,
            &[ReceivedItem {
                item_id: second.items[0].id,
                quantity_received: 3,
            }],
        )
        .await
        .unwrap();

    let parts = engine.list_parts(Default::default()).await.unwrap();
    assert_eq!(parts.iter().filter(|part| part.code == "MAN-9").count(), 1);
    assert_eq!(engine.part(created.id).await.unwrap().quantity, 7);
}

#[tokio::test]
async fn items_without_part_get_an_auto_generated_one() {
    let engine = engine().await;
    let order = confirmed_order(
        &engine,
        vec![OrderItemNew {
            quantity_ordered: 2,
            customs_description: Some("Correa dentada".to_string()),
            ..Default::default()
        }],
        "REQ-6",
    )
    .await;
    let item_id = order.items[0].id;

    let completed = engine
        .receive_purchase_order(
            order.id,
            &[ReceivedItem {
                item_id,
                quantity_received: 2,
            }],
        )
        .await
        .unwrap();

    let part_id = completed.items[0].part_id.unwrap();
    let created = engine.part(part_id).await.unwrap();
    assert!(created.code.starts_with(&format!("AUTO-{}-{item_id}-", order.id)));
    assert_eq!(created.name, "Correa dentada");
    assert_eq!(created.quantity, 2);
}

#[tokio::test]
async fn receiving_is_refused_before_confirmation() {
    let engine = engine().await;
    let part_id = part(&engine, "R-8", 1).await;
    let order = engine
        .new_purchase_order(
            PurchaseOrderNew {
                items: vec![catalog_item(part_id, 5)],
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();

    let result = engine
        .receive_purchase_order(
            order.id,
            &[ReceivedItem {
                item_id: order.items[0].id,
                quantity_received: 5,
            }],
        )
        .await;

    assert!(matches!(result, Err(EngineError::InvalidState(_))));
    assert_eq!(engine.part(part_id).await.unwrap().quantity, 1);
    let order = engine.purchase_order(order.id).await.unwrap();
    assert_eq!(order.state, OrderState::Borrador);
    assert_eq!(order.items[0].quantity_received, 0);
}

#[tokio::test]
async fn negative_received_quantities_change_nothing() {
    let engine = engine().await;
    let part_id = part(&engine, "R-9", 3).await;
    let order = confirmed_order(&engine, vec![catalog_item(part_id, 5)], "REQ-9").await;

    let result = engine
        .receive_purchase_order(
            order.id,
            &[ReceivedItem {
                item_id: order.items[0].id,
                quantity_received: -1,
            }],
        )
        .await;

    assert!(matches!(result, Err(EngineError::Invalid(_))));
    assert_eq!(engine.part(part_id).await.unwrap().quantity, 3);
    assert_eq!(
        engine.purchase_order(order.id).await.unwrap().state,
        OrderState::Confirmado
    );
}

#[tokio::test]
async fn receiving_is_refused_for_quoted_and_completed_orders() {
    let engine = engine().await;
    let part_id = part(&engine, "R-10", 2).await;

    let quoted = engine
        .new_purchase_order(
            PurchaseOrderNew {
                items: vec![catalog_item(part_id, 4)],
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    engine
        .update_purchase_order(
            quoted.id,
            PurchaseOrderPatch {
                state: Some(OrderState::Cotizado),
                requisition_number: Some("REQ-10".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let result = engine
        .receive_purchase_order(
            quoted.id,
            &[ReceivedItem {
                item_id: quoted.items[0].id,
                quantity_received: 4,
            }],
        )
        .await;
    assert!(matches!(result, Err(EngineError::InvalidState(_))));
    assert_eq!(engine.part(part_id).await.unwrap().quantity, 2);

    let order = confirmed_order(&engine, vec![catalog_item(part_id, 3)], "REQ-11").await;
    let received = [ReceivedItem {
        item_id: order.items[0].id,
        quantity_received: 3,
    }];
    engine
        .receive_purchase_order(order.id, &received)
        .await
        .unwrap();
    assert_eq!(engine.part(part_id).await.unwrap().quantity, 5);

    let again = engine.receive_purchase_order(order.id, &received).await;
    assert!(matches!(again, Err(EngineError::InvalidState(_))));
    assert_eq!(engine.part(part_id).await.unwrap().quantity, 5);
}

#[tokio::test]
async fn items_of_another_order_are_left_alone() {
    let engine = engine().await;
    let part_id = part(&engine, "R-12", 0).await;
    let other = confirmed_order(&engine, vec![catalog_item(part_id, 6)], "REQ-12").await;
    let order = confirmed_order(&engine, vec![catalog_item(part_id, 1)], "REQ-13").await;

    let completed = engine
        .receive_purchase_order(
            order.id,
            &[
                ReceivedItem {
                    item_id: other.items[0].id,
                    quantity_received: 6,
                },
                ReceivedItem {
                    item_id: order.items[0].id,
                    quantity_received: 1,
                },
            ],
        )
        .await
        .unwrap();

    assert_eq!(completed.state, OrderState::Completado);
    assert_eq!(engine.part(part_id).await.unwrap().quantity, 1);
    let other = engine.purchase_order(other.id).await.unwrap();
    assert_eq!(other.state, OrderState::Confirmado);
    assert_eq!(other.items[0].quantity_received, 0);
}

#[tokio::test]
async fn manual_items_matching_a_catalog_code_restock_it() {
    let engine = engine().await;
    let part_id = part(&engine, "CAT-1", 5).await;
    let order = confirmed_order(&engine, vec![manual_item("CAT-1", 4)], "REQ-14").await;

    let completed = engine
        .receive_purchase_order(
            order.id,
            &[ReceivedItem {
                item_id: order.items[0].id,
                quantity_received: 4,
            }],
        )
        .await
        .unwrap();

    assert_eq!(completed.items[0].part_id, Some(part_id));
    let restocked = engine.part(part_id).await.unwrap();
    assert_eq!(restocked.quantity, 9);
    assert_eq!(restocked.name, "Repuesto CAT-1");
    let parts = engine.list_parts(Default::default()).await.unwrap();
    assert_eq!(parts.iter().filter(|part| part.code == "CAT-1").count(), 1);
}

#[tokio::test]
async fn manual_items_without_code_only_record_the_quantity() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db.clone()).build().await.unwrap();
    let order = confirmed_order(&engine, vec![manual_item("SIN-COD", 3)], "REQ-15").await;
    let item_id = order.items[0].id;
    // Rows written before codes were mandatory.
    db.execute_unprepared(&format!(
        "UPDATE items_orden_compra SET codigo_manual = NULL WHERE id = {item_id}"
    ))
    .await
    .unwrap();

    let completed = engine
        .receive_purchase_order(
            order.id,
            &[ReceivedItem {
                item_id,
                quantity_received: 3,
            }],
        )
        .await
        .unwrap();

    assert_eq!(completed.state, OrderState::Completado);
    assert_eq!(completed.items[0].quantity_received, 3);
    assert_eq!(completed.items[0].part_id, None);
    assert!(engine.list_parts(Default::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn deleting_a_draft_removes_its_lines() {
    let engine = engine().await;
    let part_id = part(&engine, "R-10", 0).await;
    let order = engine
        .new_purchase_order(
            PurchaseOrderNew {
                items: vec![catalog_item(part_id, 1)],
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();

    let documents = engine.delete_purchase_order(order.id).await.unwrap();
    assert!(documents.is_empty());
    assert!(matches!(
        engine.purchase_order(order.id).await,
        Err(EngineError::KeyNotFound(_))
    ));
    // The part is free again once the order line is gone.
    engine.delete_part(part_id).await.unwrap();
}
