use chrono::{Duration, Utc};
use sea_orm::Database;

use engine::{
    Engine, EngineError, MachineModelNew, MachineNew, Pagination, PartNew, PartPatch,
    PartUsageNew, PartUsagePatch, StorageLocationNew, SupplierNew, SupplierPatch,
};
use migration::MigratorTrait;

async fn engine() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

async fn machine(engine: &Engine, serial: &str) -> i32 {
    engine
        .new_machine(MachineNew {
            serial_number: serial.to_string(),
            ..Default::default()
        })
        .await
        .unwrap()
        .id
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

#[tokio::test]
async fn supplier_names_are_normalized_and_unique() {
    let engine = engine().await;
    let supplier = engine
        .new_supplier(SupplierNew {
            name: "  Hidráulica Sur ".to_string(),
            email: Some("ventas@hsur.com".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(supplier.name, "Hidráulica Sur");

    let duplicate = engine
        .new_supplier(SupplierNew {
            name: "Hidráulica Sur".to_string(),
            ..Default::default()
        })
        .await;
    assert!(matches!(duplicate, Err(EngineError::ExistingKey(_))));

    let blank = engine
        .update_supplier(
            supplier.id,
            SupplierPatch {
                name: Some("   ".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(blank, Err(EngineError::Invalid(_))));
}

#[tokio::test]
async fn suppliers_with_parts_cannot_be_deleted() {
    let engine = engine().await;
    let supplier = engine
        .new_supplier(SupplierNew {
            name: "Filtros Norte".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    let part = engine
        .new_part(PartNew {
            code: "F-1".to_string(),
            name: "Filtro".to_string(),
            supplier_id: Some(supplier.id),
            ..Default::default()
        })
        .await
        .unwrap();

    let result = engine.delete_supplier(supplier.id).await;
    assert!(matches!(result, Err(EngineError::InUse(_))));

    let by_supplier = engine
        .parts_by_supplier(supplier.id, Default::default())
        .await
        .unwrap();
    assert_eq!(by_supplier, vec![part]);
}

#[tokio::test]
async fn machine_models_are_unique_per_manufacturer() {
    let engine = engine().await;
    let input = MachineModelNew {
        manufacturer: Some("Caterpillar".to_string()),
        model: "320D".to_string(),
        ..Default::default()
    };
    let model = engine.new_machine_model(input.clone()).await.unwrap();
    assert!(matches!(
        engine.new_machine_model(input).await,
        Err(EngineError::ExistingKey(_))
    ));
    engine
        .new_machine_model(MachineModelNew {
            manufacturer: Some("Komatsu".to_string()),
            model: "320D".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    engine
        .new_machine(MachineNew {
            model_id: Some(model.id),
            serial_number: "CAT-001".to_string(),
            alias: Some("Excavadora 1".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(matches!(
        engine.delete_machine_model(model.id).await,
        Err(EngineError::InUse(_))
    ));
    assert_eq!(
        engine
            .machines_by_model(model.id, Default::default())
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn machines_are_found_by_serial_and_alias() {
    let engine = engine().await;
    let id = engine
        .new_machine(MachineNew {
            serial_number: "SN-77".to_string(),
            alias: Some("Grúa".to_string()),
            ..Default::default()
        })
        .await
        .unwrap()
        .id;

    assert_eq!(engine.machine_by_serial("SN-77").await.unwrap().id, id);
    assert_eq!(engine.machine_by_alias("Grúa").await.unwrap().id, id);
    assert!(matches!(
        engine.machine_by_serial("SN-00").await,
        Err(EngineError::KeyNotFound(_))
    ));
    let duplicate = engine
        .new_machine(MachineNew {
            serial_number: "SN-77".to_string(),
            ..Default::default()
        })
        .await;
    assert!(matches!(duplicate, Err(EngineError::ExistingKey(_))));
}

#[tokio::test]
async fn storage_search_ignores_case_and_inactive_rows() {
    let engine = engine().await;
    let shelf = engine
        .new_storage_location(StorageLocationNew {
            code: "EST-A1".to_string(),
            name: "Estante A1".to_string(),
            physical_location: Some("Galpón Norte".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    let bin = engine
        .new_storage_location(StorageLocationNew {
            code: "CAJ-2".to_string(),
            name: "Cajón 2".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let found = engine
        .list_storage_locations(Some("galpón"), Default::default())
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, shelf.id);

    engine.delete_storage_location(bin.id).await.unwrap();
    let all = engine
        .list_storage_locations(None, Default::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
    assert!(matches!(
        engine.storage_location(bin.id).await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn part_codes_are_unique_and_stock_cannot_be_negative() {
    let engine = engine().await;
    let id = part(&engine, "P-1", 3).await;

    let duplicate = engine
        .new_part(PartNew {
            code: "P-1".to_string(),
            name: "Otro".to_string(),
            ..Default::default()
        })
        .await;
    assert!(matches!(duplicate, Err(EngineError::ExistingKey(_))));

    let negative = engine
        .update_part(
            id,
            PartPatch {
                quantity: Some(-1),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(negative, Err(EngineError::Invalid(_))));
    assert!(engine.set_part_stock(id, -5).await.is_err());
    assert_eq!(engine.set_part_stock(id, 0).await.unwrap().quantity, 0);
}

#[tokio::test]
async fn low_stock_uses_the_part_minimum_or_the_default() {
    let engine = engine().await;
    part(&engine, "LOW-DEFAULT", 4).await;
    part(&engine, "OK-DEFAULT", 40).await;
    engine
        .new_part(PartNew {
            code: "LOW-MIN".to_string(),
            name: "Con mínimo".to_string(),
            quantity: 20,
            min_quantity: Some(25),
            ..Default::default()
        })
        .await
        .unwrap();

    let low: Vec<String> = engine
        .low_stock_parts(Default::default())
        .await
        .unwrap()
        .into_iter()
        .map(|part| part.code)
        .collect();
    assert!(low.contains(&"LOW-DEFAULT".to_string()));
    assert!(low.contains(&"LOW-MIN".to_string()));
    assert!(!low.contains(&"OK-DEFAULT".to_string()));
}

#[tokio::test]
async fn low_stock_is_paged_after_filtering() {
    let engine = engine().await;
    part(&engine, "AT-DEFAULT", 10).await;
    part(&engine, "ABOVE-DEFAULT", 11).await;
    part(&engine, "EMPTY", 0).await;
    engine
        .new_part(PartNew {
            code: "AT-MIN".to_string(),
            name: "Justo en el mínimo".to_string(),
            quantity: 3,
            min_quantity: Some(3),
            ..Default::default()
        })
        .await
        .unwrap();
    engine
        .new_part(PartNew {
            code: "ZERO-MIN".to_string(),
            name: "Sin mínimo real".to_string(),
            quantity: 1,
            min_quantity: Some(0),
            ..Default::default()
        })
        .await
        .unwrap();

    let codes = |parts: Vec<engine::Part>| -> Vec<String> {
        parts.into_iter().map(|part| part.code).collect()
    };
    let all = engine.low_stock_parts(Pagination::default()).await.unwrap();
    assert_eq!(codes(all), ["EMPTY", "AT-MIN", "AT-DEFAULT"]);

    let page = engine
        .low_stock_parts(Pagination::new(Some(1), Some(1)))
        .await
        .unwrap();
    assert_eq!(codes(page), ["AT-MIN"]);
}

#[tokio::test]
async fn usage_moves_stock_and_never_goes_negative() {
    let engine = engine().await;
    let machine_id = machine(&engine, "M-1").await;
    let part_id = part(&engine, "U-1", 10).await;

    let usage = engine
        .new_usage(PartUsageNew {
            part_id,
            machine_id,
            quantity_used: 4,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(engine.part(part_id).await.unwrap().quantity, 6);

    let too_much = engine
        .new_usage(PartUsageNew {
            part_id,
            machine_id,
            quantity_used: 7,
            ..Default::default()
        })
        .await;
    assert!(matches!(too_much, Err(EngineError::InsufficientStock(_))));
    assert_eq!(engine.part(part_id).await.unwrap().quantity, 6);

    engine
        .update_usage(
            usage.id,
            PartUsagePatch {
                quantity_used: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(engine.part(part_id).await.unwrap().quantity, 9);

    engine.delete_usage(usage.id).await.unwrap();
    assert_eq!(engine.part(part_id).await.unwrap().quantity, 10);
}

#[tokio::test]
async fn moving_a_usage_to_another_part_rebalances_both() {
    let engine = engine().await;
    let machine_id = machine(&engine, "M-2").await;
    let first = part(&engine, "A", 5).await;
    let second = part(&engine, "B", 5).await;

    let usage = engine
        .new_usage(PartUsageNew {
            part_id: first,
            machine_id,
            quantity_used: 2,
            ..Default::default()
        })
        .await
        .unwrap();
    engine
        .update_usage(
            usage.id,
            PartUsagePatch {
                part_id: Some(second),
                quantity_used: Some(3),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(engine.part(first).await.unwrap().quantity, 5);
    assert_eq!(engine.part(second).await.unwrap().quantity, 2);
    assert!(matches!(
        engine.delete_part(second).await,
        Err(EngineError::InUse(_))
    ));
}

#[tokio::test]
async fn consumption_stats_respect_the_date_range() {
    let engine = engine().await;
    let machine_id = machine(&engine, "M-3").await;
    let part_id = part(&engine, "C-1", 100).await;
    let now = Utc::now();

    for (days_ago, quantity) in [(40, 10), (5, 3), (1, 5)] {
        engine
            .new_usage(PartUsageNew {
                part_id,
                machine_id,
                quantity_used: quantity,
                used_at: Some(now - Duration::days(days_ago)),
                ..Default::default()
            })
            .await
            .unwrap();
    }

    let all = engine.consumption_stats(part_id, None, None).await.unwrap();
    assert_eq!(all.total_used, 18);
    assert_eq!(all.uses, 3);

    let recent = engine
        .consumption_stats(part_id, Some(now - Duration::days(30)), Some(now))
        .await
        .unwrap();
    assert_eq!(recent.total_used, 8);
    assert_eq!(recent.uses, 2);
    assert!((recent.average_per_use - 4.0).abs() < f64::EPSILON);

    let history = engine
        .usage_by_date_range(now - Duration::days(30), now, Default::default())
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert!(history[0].used_at >= history[1].used_at);

    assert!(matches!(
        engine
            .consumption_stats(part_id, Some(now), Some(now - Duration::days(1)))
            .await,
        Err(EngineError::Invalid(_))
    ));
}
