use sea_orm::Database;

use engine::{
    Engine, EngineError, MAX_FAILED_ATTEMPTS, PageNew, Pagination, RoleNew, RolePatch, User,
    UserNew, UserPatch,
};
use migration::MigratorTrait;

async fn engine() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

async fn user(engine: &Engine, username: &str, is_admin: bool) -> User {
    engine
        .new_user(UserNew {
            username: username.to_string(),
            email: format!("{username}@mantia.local"),
            password: "correcta-1".to_string(),
            full_name: None,
            active: true,
            is_admin,
            role_id: None,
            must_change_password: false,
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn login_succeeds_and_stamps_last_login() {
    let engine = engine().await;
    let created = user(&engine, "ana", false).await;
    assert!(created.last_login.is_none());

    let logged = engine
        .authenticate("ana", "correcta-1")
        .await
        .unwrap()
        .expect("valid credentials");
    assert_eq!(logged.id, created.id);
    assert!(logged.last_login.is_some());
    assert_eq!(logged.failed_attempts, 0);
}

#[tokio::test]
async fn login_matches_the_normalized_username() {
    let engine = engine().await;
    let created = user(&engine, "ｍａｒｔａ", false).await;
    assert_eq!(created.username, "marta");

    let logged = engine
        .authenticate("  ｍａｒｔａ ", "correcta-1")
        .await
        .unwrap()
        .expect("normalized username");
    assert_eq!(logged.id, created.id);
    assert_eq!(engine.user_by_username("marta").await.unwrap().id, created.id);
    assert!(engine.authenticate("   ", "correcta-1").await.unwrap().is_none());
}

#[tokio::test]
async fn usernames_and_emails_are_unique() {
    let engine = engine().await;
    user(&engine, "beto", false).await;
    let result = engine
        .new_user(UserNew {
            username: "beto".to_string(),
            email: "otro@mantia.local".to_string(),
            password: "x-password".to_string(),
            full_name: None,
            active: true,
            is_admin: false,
            role_id: None,
            must_change_password: false,
        })
        .await;
    assert!(matches!(result, Err(EngineError::ExistingKey(_))));

    let other = user(&engine, "carla", false).await;
    let result = engine
        .update_user(
            other.id,
            UserPatch {
                email: Some("beto@mantia.local".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(EngineError::ExistingKey(_))));
}

#[tokio::test]
async fn five_failures_lock_the_account() {
    let engine = engine().await;
    let created = user(&engine, "dario", false).await;

    for _ in 0..MAX_FAILED_ATTEMPTS {
        assert!(engine.authenticate("dario", "mala").await.unwrap().is_none());
    }
    let locked = engine.user(created.id).await.unwrap();
    assert_eq!(locked.failed_attempts, MAX_FAILED_ATTEMPTS);
    assert!(locked.is_locked(chrono::Utc::now()));

    // The right password does not help while locked.
    assert!(
        engine
            .authenticate("dario", "correcta-1")
            .await
            .unwrap()
            .is_none()
    );

    engine.unlock_user(created.id).await.unwrap();
    assert!(
        engine
            .authenticate("dario", "correcta-1")
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn a_success_resets_the_failure_counter() {
    let engine = engine().await;
    let created = user(&engine, "eva", false).await;
    for _ in 0..MAX_FAILED_ATTEMPTS - 1 {
        engine.authenticate("eva", "mala").await.unwrap();
    }
    engine
        .authenticate("eva", "correcta-1")
        .await
        .unwrap()
        .expect("still unlocked");
    assert_eq!(engine.user(created.id).await.unwrap().failed_attempts, 0);
}

#[tokio::test]
async fn reset_password_clears_the_lock_and_can_force_a_change() {
    let engine = engine().await;
    let created = user(&engine, "fede", false).await;
    for _ in 0..MAX_FAILED_ATTEMPTS {
        engine.authenticate("fede", "mala").await.unwrap();
    }

    engine
        .reset_password(created.id, "nueva-clave", true)
        .await
        .unwrap();
    let logged = engine
        .authenticate("fede", "nueva-clave")
        .await
        .unwrap()
        .expect("reset unlocks");
    assert!(logged.must_change_password);

    assert!(matches!(
        engine
            .change_password(created.id, "incorrecta", "otra-clave")
            .await,
        Err(EngineError::Invalid(_))
    ));
    engine
        .change_password(created.id, "nueva-clave", "otra-clave")
        .await
        .unwrap();
    let user = engine.user(created.id).await.unwrap();
    assert!(!user.must_change_password);
    assert!(user.password_changed_at.is_some());
}

#[tokio::test]
async fn inactive_users_cannot_log_in_and_nobody_deactivates_themselves() {
    let engine = engine().await;
    let admin = user(&engine, "root", true).await;
    let worker = user(&engine, "gabi", false).await;

    assert!(matches!(
        engine.deactivate_user(admin.id, admin.id).await,
        Err(EngineError::Invalid(_))
    ));
    engine.deactivate_user(worker.id, admin.id).await.unwrap();
    assert!(
        engine
            .authenticate("gabi", "correcta-1")
            .await
            .unwrap()
            .is_none()
    );
    engine.activate_user(worker.id).await.unwrap();
    assert!(
        engine
            .authenticate("gabi", "correcta-1")
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn page_access_follows_assignments() {
    let engine = engine().await;
    let admin = user(&engine, "jefa", true).await;
    let worker = user(&engine, "hugo", false).await;
    let pages = engine.list_pages(Pagination::default()).await.unwrap();
    let repuestos = pages.iter().find(|page| page.name == "repuestos").unwrap();
    let historial = pages.iter().find(|page| page.name == "historial").unwrap();

    assert!(!engine.has_page_access(&worker, &["repuestos"]).await.unwrap());
    assert!(engine.has_page_access(&admin, &["repuestos"]).await.unwrap());

    let assigned = engine
        .assign_pages(worker.id, &[repuestos.id, historial.id, repuestos.id])
        .await
        .unwrap();
    assert_eq!(assigned.len(), 2);
    assert!(
        engine
            .has_page_access(&worker, &["ordenes_compra", "repuestos"])
            .await
            .unwrap()
    );
    assert!(!engine.has_page_access(&worker, &["usuarios"]).await.unwrap());

    engine.delete_page(repuestos.id).await.unwrap();
    assert!(!engine.has_page_access(&worker, &["repuestos"]).await.unwrap());
    assert_eq!(engine.user_pages(worker.id).await.unwrap().len(), 1);

    // Admins see every active page.
    assert_eq!(
        engine.user_pages(admin.id).await.unwrap().len(),
        pages.len() - 1
    );
    assert!(matches!(
        engine.assign_pages(worker.id, &[9_999]).await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn page_names_and_routes_are_unique() {
    let engine = engine().await;
    let result = engine
        .new_page(PageNew {
            name: "informes".to_string(),
            route: "/repuestos".to_string(),
            title: "Informes".to_string(),
            active: true,
            ..Default::default()
        })
        .await;
    assert!(matches!(result, Err(EngineError::ExistingKey(_))));

    let page = engine
        .new_page(PageNew {
            name: "informes".to_string(),
            route: "/informes".to_string(),
            title: "Informes".to_string(),
            order: 99,
            active: true,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(engine.page(page.id).await.unwrap().route, "/informes");
}

#[tokio::test]
async fn roles_carry_their_permissions() {
    let engine = engine().await;
    let permissions = engine
        .list_permissions(Pagination::default())
        .await
        .unwrap();
    assert_eq!(permissions.len(), 15);
    let read_ids: Vec<i32> = permissions
        .iter()
        .filter(|permission| permission.action == "leer")
        .map(|permission| permission.id)
        .collect();

    let role = engine
        .new_role(RoleNew {
            name: "lector".to_string(),
            description: Some("Solo lectura".to_string()),
            active: true,
            permission_ids: read_ids.clone(),
        })
        .await
        .unwrap();
    assert_eq!(role.permissions.len(), read_ids.len());

    let updated = engine
        .update_role(
            role.id,
            RolePatch {
                permission_ids: Some(vec![read_ids[0]]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.permissions.len(), 1);

    let bad = engine
        .update_role(
            role.id,
            RolePatch {
                permission_ids: Some(vec![12_345]),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(bad, Err(EngineError::KeyNotFound(_))));
    assert_eq!(engine.role(role.id).await.unwrap().permissions.len(), 1);

    let admin_role = engine
        .list_roles(Pagination::default())
        .await
        .unwrap()
        .into_iter()
        .find(|role| role.name == "admin")
        .unwrap();
    assert_eq!(admin_role.permissions.len(), 15);
}

#[tokio::test]
async fn roles_in_use_cannot_be_deleted() {
    let engine = engine().await;
    let role = engine
        .new_role(RoleNew {
            name: "taller".to_string(),
            active: true,
            ..Default::default()
        })
        .await
        .unwrap();
    let member = user(&engine, "ivan", false).await;
    engine
        .update_user(
            member.id,
            UserPatch {
                role_id: Some(role.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(matches!(
        engine.delete_role(role.id).await,
        Err(EngineError::InUse(_))
    ));
    assert!(matches!(
        engine
            .new_role(RoleNew {
                name: "taller".to_string(),
                ..Default::default()
            })
            .await,
        Err(EngineError::ExistingKey(_))
    ));
}
