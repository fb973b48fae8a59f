use chrono::{Duration, Utc};
use sea_orm::Database;

use engine::{
    Criticality, Engine, EngineError, MachineNew, UserNew, WorkOrderFileNew, WorkOrderFilter,
    WorkOrderNew, WorkOrderPatch, WorkOrderSort, WorkOrderState,
};
use migration::MigratorTrait;

struct Fixture {
    engine: Engine,
    machine_id: i32,
    admin_id: i32,
    tech_id: i32,
    other_id: i32,
}

async fn fixture() -> Fixture {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    let machine_id = engine
        .new_machine(MachineNew {
            serial_number: "WO-M-1".to_string(),
            ..Default::default()
        })
        .await
        .unwrap()
        .id;
    let mut ids = Vec::new();
    for (username, is_admin) in [("admin", true), ("tecnico", false), ("otro", false)] {
        let user = engine
            .new_user(UserNew {
                username: username.to_string(),
                email: format!("{username}@mantia.local"),
                password: "clave-segura".to_string(),
                full_name: None,
                active: true,
                is_admin,
                role_id: None,
                must_change_password: false,
            })
            .await
            .unwrap();
        ids.push(user.id);
    }
    Fixture {
        engine,
        machine_id,
        admin_id: ids[0],
        tech_id: ids[1],
        other_id: ids[2],
    }
}

fn order(fx: &Fixture, title: &str, criticality: Criticality, days: i64) -> WorkOrderNew {
    WorkOrderNew {
        title: title.to_string(),
        description: Some(format!("Revisar {title}")),
        machine_id: fx.machine_id,
        assignee_id: fx.tech_id,
        criticality,
        scheduled_for: Utc::now() + Duration::days(days),
        estimated_hours: Some(2.5),
    }
}

fn file(name: &str) -> WorkOrderFileNew {
    WorkOrderFileNew {
        file_name: name.to_string(),
        stored_name: format!("stored-{name}"),
        stored_path: format!("/tmp/{name}"),
        mime_type: Some("application/pdf".to_string()),
        size_bytes: 1024,
    }
}

#[tokio::test]
async fn state_changes_stamp_start_and_finish_once() {
    let fx = fixture().await;
    let created = fx
        .engine
        .new_work_order(order(&fx, "Cambio de aceite", Criticality::Media, 1), fx.admin_id)
        .await
        .unwrap();
    assert_eq!(created.state, WorkOrderState::Pendiente);
    assert!(created.started_at.is_none());

    let started = fx
        .engine
        .set_work_order_state(created.id, WorkOrderState::EnProceso)
        .await
        .unwrap();
    let started_at = started.started_at.expect("start stamped");

    let paused = fx
        .engine
        .set_work_order_state(created.id, WorkOrderState::Pendiente)
        .await
        .unwrap();
    fx.engine
        .set_work_order_state(paused.id, WorkOrderState::EnProceso)
        .await
        .unwrap();
    let finished = fx
        .engine
        .set_work_order_state(created.id, WorkOrderState::Completada)
        .await
        .unwrap();
    assert_eq!(finished.started_at, Some(started_at));
    assert!(finished.finished_at.is_some());
}

#[tokio::test]
async fn invalid_references_and_hours_are_rejected() {
    let fx = fixture().await;
    let mut input = order(&fx, "Sin máquina", Criticality::Baja, 0);
    input.machine_id = 999;
    assert!(matches!(
        fx.engine.new_work_order(input, fx.admin_id).await,
        Err(EngineError::KeyNotFound(_))
    ));

    let mut input = order(&fx, "Horas negativas", Criticality::Baja, 0);
    input.estimated_hours = Some(-1.0);
    assert!(matches!(
        fx.engine.new_work_order(input, fx.admin_id).await,
        Err(EngineError::Invalid(_))
    ));

    let created = fx
        .engine
        .new_work_order(order(&fx, "Válida", Criticality::Baja, 0), fx.admin_id)
        .await
        .unwrap();
    let result = fx
        .engine
        .update_work_order(
            created.id,
            WorkOrderPatch {
                title: Some("  ".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(EngineError::Invalid(_))));
}

#[tokio::test]
async fn listing_filters_searches_and_sorts_by_criticality() {
    let fx = fixture().await;
    for (title, level) in [
        ("Bomba hidráulica", Criticality::Alta),
        ("Filtro de aire", Criticality::Baja),
        ("Freno de emergencia", Criticality::Critica),
        ("Correa", Criticality::Media),
    ] {
        fx.engine
            .new_work_order(order(&fx, title, level, 2), fx.admin_id)
            .await
            .unwrap();
    }

    let sorted = fx
        .engine
        .list_work_orders(
            WorkOrderFilter {
                sort: WorkOrderSort::Criticality,
                descending: true,
                ..Default::default()
            },
            Default::default(),
        )
        .await
        .unwrap();
    let levels: Vec<Criticality> = sorted.iter().map(|wo| wo.criticality).collect();
    assert_eq!(
        levels,
        vec![
            Criticality::Critica,
            Criticality::Alta,
            Criticality::Media,
            Criticality::Baja
        ]
    );

    let found = fx
        .engine
        .list_work_orders(
            WorkOrderFilter {
                search: Some("FRENO".to_string()),
                ..Default::default()
            },
            Default::default(),
        )
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "Freno de emergencia");

    let high = fx
        .engine
        .list_work_orders(
            WorkOrderFilter {
                criticality: Some(Criticality::Alta),
                ..Default::default()
            },
            Default::default(),
        )
        .await
        .unwrap();
    assert_eq!(high.len(), 1);

    let mine = fx
        .engine
        .assigned_work_orders(fx.tech_id, Some(WorkOrderState::Pendiente), Default::default())
        .await
        .unwrap();
    assert_eq!(mine.len(), 4);
    assert!(
        fx.engine
            .assigned_work_orders(fx.other_id, None, Default::default())
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn stats_count_overdue_open_orders() {
    let fx = fixture().await;
    let late = fx
        .engine
        .new_work_order(order(&fx, "Atrasada", Criticality::Alta, -3), fx.admin_id)
        .await
        .unwrap();
    let done = fx
        .engine
        .new_work_order(order(&fx, "Hecha", Criticality::Baja, -3), fx.admin_id)
        .await
        .unwrap();
    fx.engine
        .new_work_order(order(&fx, "Futura", Criticality::Critica, 5), fx.admin_id)
        .await
        .unwrap();
    fx.engine
        .set_work_order_state(done.id, WorkOrderState::Completada)
        .await
        .unwrap();

    let stats = fx.engine.work_order_stats().await.unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.pendiente, 2);
    assert_eq!(stats.completada, 1);
    assert_eq!(stats.critica, 1);
    assert_eq!(stats.overdue, 1);
    assert!(fx.engine.work_order(late.id).await.unwrap().is_overdue(Utc::now()));
}

#[tokio::test]
async fn only_authors_or_admins_attach_files_to_comments() {
    let fx = fixture().await;
    let wo = fx
        .engine
        .new_work_order(order(&fx, "Con adjuntos", Criticality::Media, 1), fx.admin_id)
        .await
        .unwrap();
    let comment = fx
        .engine
        .add_work_order_comment(wo.id, fx.tech_id, "  Se cambió el filtro ")
        .await
        .unwrap();
    assert_eq!(comment.body, "Se cambió el filtro");
    assert!(matches!(
        fx.engine.add_work_order_comment(wo.id, fx.tech_id, "   ").await,
        Err(EngineError::Invalid(_))
    ));

    let forbidden = fx
        .engine
        .add_comment_file(comment.id, fx.other_id, false, file("foto.pdf"))
        .await;
    assert!(matches!(forbidden, Err(EngineError::Forbidden(_))));

    let own = fx
        .engine
        .add_comment_file(comment.id, fx.tech_id, false, file("informe.pdf"))
        .await
        .unwrap();
    assert_eq!(own.comment_id, Some(comment.id));
    fx.engine
        .add_comment_file(comment.id, fx.admin_id, true, file("anexo.pdf"))
        .await
        .unwrap();
    assert_eq!(fx.engine.comment_files(comment.id).await.unwrap().len(), 2);
    // Comment attachments are not listed as work order files.
    assert!(fx.engine.work_order_files(wo.id).await.unwrap().is_empty());

    assert!(matches!(
        fx.engine
            .delete_work_order_file(own.id, fx.other_id, false)
            .await,
        Err(EngineError::Forbidden(_))
    ));
    fx.engine
        .delete_work_order_file(own.id, fx.admin_id, true)
        .await
        .unwrap();
    assert_eq!(fx.engine.comment_files(comment.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn deleting_a_work_order_returns_every_stored_file() {
    let fx = fixture().await;
    let wo = fx
        .engine
        .new_work_order(order(&fx, "Borrar", Criticality::Baja, 1), fx.admin_id)
        .await
        .unwrap();
    fx.engine
        .add_work_order_file(wo.id, fx.tech_id, file("plano.pdf"))
        .await
        .unwrap();
    let comment = fx
        .engine
        .add_work_order_comment(wo.id, fx.tech_id, "listo")
        .await
        .unwrap();
    fx.engine
        .add_comment_file(comment.id, fx.tech_id, false, file("foto.pdf"))
        .await
        .unwrap();

    let removed = fx.engine.delete_work_order(wo.id).await.unwrap();
    assert_eq!(removed.len(), 2);
    assert!(matches!(
        fx.engine.work_order(wo.id).await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(matches!(
        fx.engine.work_order_comment(comment.id).await,
        Err(EngineError::KeyNotFound(_))
    ));
}
