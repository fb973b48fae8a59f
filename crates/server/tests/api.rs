use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use http_body_util::BodyExt;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::{Engine, Pagination, UserNew};
use migration::MigratorTrait;
use server::{JwtService, ServerState, UploadStore, router};

struct TestApp {
    router: Router,
    state: ServerState,
    _uploads: tempfile::TempDir,
}

async fn app() -> TestApp {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    let uploads = tempfile::tempdir().unwrap();
    let state = ServerState::new(
        engine,
        JwtService::new("test-secret", 60),
        UploadStore::new(uploads.path()),
    );
    for (username, is_admin) in [("admin", true), ("tecnico", false)] {
        state
            .engine
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
    }
    TestApp {
        router: router(state.clone()),
        state,
        _uploads: uploads,
    }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, bytes.to_vec())
    }

    async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&value).unwrap())
            }
            None => Body::empty(),
        };
        let (status, _, bytes) = self.send(builder.body(body).unwrap()).await;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    /// POST a single file as `multipart/form-data` under `field`.
    async fn upload_form(
        &self,
        uri: &str,
        token: &str,
        field: &str,
        (file_name, mime_type, bytes): (&str, &str, &[u8]),
    ) -> (StatusCode, Value) {
        let boundary = "mantia-test-boundary";
        let mut body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; \
             filename=\"{file_name}\"\r\nContent-Type: {mime_type}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("authorization", format!("Bearer {token}"))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();
        let (status, _, bytes) = self.send(request).await;
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn new_work_order(&self, token: &str) -> i64 {
        let tecnico = self.state.engine.user_by_username("tecnico").await.unwrap();
        let (status, machine) = self
            .call(
                "POST",
                "/maquinas",
                Some(token),
                Some(json!({"numero_serie": "SN-900"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{machine}");
        let (status, order) = self
            .call(
                "POST",
                "/ordenes-trabajo",
                Some(token),
                Some(json!({
                    "titulo": "Revisar rodamientos",
                    "maquina_id": machine["id"],
                    "usuario_asignado_id": tecnico.id,
                    "nivel_criticidad": "media",
                    "fecha_programada": "2026-11-03T08:00:00Z"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{order}");
        order["id"].as_i64().unwrap()
    }

    async fn login(&self, username: &str) -> String {
        let (status, body) = self
            .call(
                "POST",
                "/auth/login",
                None,
                Some(json!({"username": username, "password": "clave-segura"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["access_token"].as_str().unwrap().to_string()
    }

    async fn grant_page(&self, username: &str, page_name: &str) {
        let user = self.state.engine.user_by_username(username).await.unwrap();
        let page = self
            .state
            .engine
            .list_pages(Pagination::default())
            .await
            .unwrap()
            .into_iter()
            .find(|page| page.name == page_name)
            .unwrap();
        self.state
            .engine
            .assign_pages(user.id, &[page.id])
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn health_is_public() {
    let app = app().await;
    let (status, body) = app.call("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn login_returns_a_bearer_token_and_the_user() {
    let app = app().await;
    let (status, body) = app
        .call(
            "POST",
            "/auth/login",
            None,
            Some(json!({"username": "admin", "password": "clave-segura"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["expires_in"], 3600);
    assert_eq!(body["user"]["username"], "admin");
    assert_eq!(body["user"]["es_admin"], true);

    let token = body["access_token"].as_str().unwrap();
    let (status, me) = app.call("GET", "/auth/me", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "admin");

    let (status, check) = app.call("GET", "/auth/check-token", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(check["valid"], true);
}

#[tokio::test]
async fn wrong_password_is_401() {
    let app = app().await;
    let (status, body) = app
        .call(
            "POST",
            "/auth/login",
            None,
            Some(json!({"username": "admin", "password": "nope"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn protected_routes_need_a_valid_token() {
    let app = app().await;
    let (status, _) = app.call("GET", "/repuestos", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .call("GET", "/repuestos", Some("not-a-token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let forged = JwtService::new("other-secret", 60)
        .issue("admin")
        .unwrap()
        .token;
    let (status, _) = app.call("GET", "/repuestos", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn deactivated_users_lose_access_with_a_live_token() {
    let app = app().await;
    let token = app.login("tecnico").await;
    let user = app.state.engine.user_by_username("tecnico").await.unwrap();
    let admin = app.state.engine.user_by_username("admin").await.unwrap();
    app.state
        .engine
        .deactivate_user(user.id, admin.id)
        .await
        .unwrap();

    let (status, _) = app.call("GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_groups_reject_regular_users() {
    let app = app().await;
    let token = app.login("tecnico").await;
    let (status, body) = app.call("GET", "/usuarios", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].is_string());

    let (status, _) = app.call("GET", "/admin/roles", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = app.login("admin").await;
    let (status, users) = app.call("GET", "/usuarios", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn page_guards_follow_assignments() {
    let app = app().await;
    let token = app.login("tecnico").await;

    let (status, _) = app.call("GET", "/repuestos", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    app.grant_page("tecnico", "repuestos").await;
    let (status, parts) = app.call("GET", "/repuestos", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(parts.as_array().unwrap().is_empty());

    // Other groups stay closed.
    let (status, _) = app.call("GET", "/proveedores", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, pages) = app.call("GET", "/auth/me/paginas", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pages[0]["nombre"], "repuestos");
}

#[tokio::test]
async fn my_work_orders_page_opens_the_work_order_group() {
    let app = app().await;
    let token = app.login("tecnico").await;
    app.grant_page("tecnico", "mis_ordenes_trabajo").await;

    let (status, orders) = app
        .call("GET", "/ordenes-trabajo/mis-ordenes", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(orders.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn purchase_order_flow_restocks_on_arrival() {
    let app = app().await;
    let token = app.login("admin").await;

    let (status, part) = app
        .call(
            "POST",
            "/repuestos",
            Some(&token),
            Some(json!({"codigo": "ROD-6204", "nombre": "Rodamiento 6204", "cantidad": 3})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{part}");
    let part_id = part["id"].as_i64().unwrap();

    let (status, order) = app
        .call(
            "POST",
            "/ordenes-compra",
            Some(&token),
            Some(json!({"items": [{"repuesto_id": part_id, "cantidad_pedida": 10}]})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{order}");
    assert_eq!(order["estado"], "borrador");
    let order_id = order["id"].as_i64().unwrap();
    let item_id = order["items"][0]["id"].as_i64().unwrap();

    // Skipping a step is refused.
    let (status, _) = app
        .call(
            "PUT",
            &format!("/ordenes-compra/{order_id}"),
            Some(&token),
            Some(json!({"estado": "confirmado", "legajo": "L-1"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(
            "PUT",
            &format!("/ordenes-compra/{order_id}"),
            Some(&token),
            Some(json!({"estado": "cotizado", "numero_requisicion": "REQ-77"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, order) = app
        .call(
            "PUT",
            &format!("/ordenes-compra/{order_id}"),
            Some(&token),
            Some(json!({"estado": "confirmado", "legajo": "L-1"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["estado"], "confirmado");

    let (status, order) = app
        .call(
            "POST",
            &format!("/ordenes-compra/{order_id}/confirmar-llegada"),
            Some(&token),
            Some(json!({"items_recibidos": [{"item_id": item_id, "cantidad_recibida": 8}]})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{order}");
    assert_eq!(order["estado"], "completado");
    assert_eq!(order["items"][0]["cantidad_recibida"], 8);

    let (_, part) = app
        .call("GET", &format!("/repuestos/{part_id}"), Some(&token), None)
        .await;
    assert_eq!(part["cantidad"], 11);

    let (status, found) = app
        .call(
            "GET",
            "/ordenes-compra/numero-requisicion/REQ-77",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["id"], order_id);
}

#[tokio::test]
async fn unknown_enum_values_are_400() {
    let app = app().await;
    let token = app.login("admin").await;
    let (status, body) = app
        .call("GET", "/ordenes-compra?estado=cancelado", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("cancelado"));

    let (status, _) = app
        .call(
            "GET",
            "/ordenes-trabajo?sort_by=titulo",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_records_are_404_and_duplicates_409() {
    let app = app().await;
    let token = app.login("admin").await;
    let (status, _) = app.call("GET", "/proveedores/999", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let supplier = json!({"nombre": "Rulemanes SRL"});
    let (status, _) = app
        .call("POST", "/proveedores", Some(&token), Some(supplier.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app
        .call("POST", "/proveedores", Some(&token), Some(supplier))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn order_documents_are_stored_and_served_back() {
    let app = app().await;
    let token = app.login("admin").await;
    let (_, order) = app
        .call("POST", "/ordenes-compra", Some(&token), Some(json!({})))
        .await;
    let order_id = order["id"].as_i64().unwrap();
    let content = STANDARD.encode(b"%PDF-1.4 factura");

    let (status, _) = app
        .call(
            "POST",
            &format!("/ordenes-compra/{order_id}/documentos"),
            Some(&token),
            Some(json!({"nombre_archivo": "setup.exe", "contenido_base64": content})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, document) = app
        .call(
            "POST",
            &format!("/ordenes-compra/{order_id}/documentos"),
            Some(&token),
            Some(json!({"nombre_archivo": "factura.pdf", "contenido_base64": content})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{document}");
    assert_eq!(document["tipo_archivo"], "pdf");
    let document_id = document["id"].as_i64().unwrap();

    let (status, file) = app
        .call(
            "GET",
            &format!("/ordenes-compra/documentos/{document_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(file["contenido_base64"], content);
    assert_eq!(file["tipo_mime"], "application/pdf");

    let (status, _) = app
        .call(
            "DELETE",
            &format!("/ordenes-compra/documentos/{document_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .call(
            "GET",
            &format!("/ordenes-compra/documentos/{document_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn work_order_attachments_check_the_mime_type() {
    let app = app().await;
    let token = app.login("admin").await;
    let tecnico = app.state.engine.user_by_username("tecnico").await.unwrap();

    let (status, machine) = app
        .call(
            "POST",
            "/maquinas",
            Some(&token),
            Some(json!({"numero_serie": "SN-001"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, order) = app
        .call(
            "POST",
            "/ordenes-trabajo",
            Some(&token),
            Some(json!({
                "titulo": "Cambiar correa",
                "maquina_id": machine["id"],
                "usuario_asignado_id": tecnico.id,
                "nivel_criticidad": "alta",
                "fecha_programada": "2026-11-02T08:00:00Z"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{order}");
    let order_id = order["id"].as_i64().unwrap();
    let content = STANDARD.encode(b"foto");

    let (status, _) = app
        .call(
            "POST",
            &format!("/ordenes-trabajo/{order_id}/archivos"),
            Some(&token),
            Some(json!({
                "nombre_archivo": "tool.exe",
                "tipo_mime": "application/x-msdownload",
                "contenido_base64": content
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let (status, file) = app
        .call(
            "POST",
            &format!("/ordenes-trabajo/{order_id}/archivos"),
            Some(&token),
            Some(json!({
                "nombre_archivo": "correa.png",
                "tipo_mime": "image/png",
                "contenido_base64": content
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{file}");

    let (status, files) = app
        .call(
            "GET",
            &format!("/ordenes-trabajo/{order_id}/archivos"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(files.as_array().unwrap().len(), 1);

    let (status, downloaded) = app
        .call(
            "GET",
            &format!("/ordenes-trabajo/archivos/{}", file["id"]),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(downloaded["contenido_base64"], content);

    let (status, _) = app
        .call(
            "DELETE",
            &format!("/ordenes-trabajo/{order_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn change_password_then_login_with_the_new_one() {
    let app = app().await;
    let token = app.login("tecnico").await;
    let (status, _) = app
        .call(
            "POST",
            "/auth/change-password",
            Some(&token),
            Some(json!({"password_actual": "mala", "password_nueva": "otra-clave"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(
            "POST",
            "/auth/change-password",
            Some(&token),
            Some(json!({"password_actual": "clave-segura", "password_nueva": "otra-clave"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .call(
            "POST",
            "/auth/login",
            None,
            Some(json!({"username": "tecnico", "password": "otra-clave"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn order_documents_above_two_megabytes_are_accepted() {
    let app = app().await;
    let token = app.login("admin").await;
    let (_, order) = app
        .call("POST", "/ordenes-compra", Some(&token), Some(json!({})))
        .await;
    let uri = format!("/ordenes-compra/{}/documentos", order["id"]);

    let content = STANDARD.encode(vec![b'x'; 3 * 1024 * 1024]);
    let (status, document) = app
        .call(
            "POST",
            &uri,
            Some(&token),
            Some(json!({"nombre_archivo": "factura.pdf", "contenido_base64": content})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{document}");
    assert_eq!(document["tamano_archivo"], 3 * 1024 * 1024);

    let content = STANDARD.encode(vec![b'x'; 11 * 1024 * 1024]);
    let (status, body) = app
        .call(
            "POST",
            &uri,
            Some(&token),
            Some(json!({"nombre_archivo": "enorme.pdf", "contenido_base64": content})),
        )
        .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body["error"].is_string(), "{body}");
}

#[tokio::test]
async fn multipart_uploads_and_raw_downloads() {
    let app = app().await;
    let token = app.login("admin").await;
    let order_id = app.new_work_order(&token).await;

    let (status, _) = app
        .upload_form(
            &format!("/ordenes-trabajo/{order_id}/archivos"),
            &token,
            "archivo",
            ("tool.exe", "application/x-msdownload", b"MZ"),
        )
        .await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let (status, file) = app
        .upload_form(
            &format!("/ordenes-trabajo/{order_id}/archivos"),
            &token,
            "archivo",
            ("plano.pdf", "application/pdf", b"%PDF-1.4 plano"),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{file}");
    assert_eq!(file["tipo_mime"], "application/pdf");

    let request = Request::builder()
        .uri(format!("/ordenes-trabajo/archivos/{}/download", file["id"]))
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, headers, bytes) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["content-type"], "application/pdf");
    assert_eq!(
        headers["content-disposition"],
        "attachment; filename=\"plano.pdf\""
    );
    assert_eq!(bytes, b"%PDF-1.4 plano");

    let (status, comment) = app
        .call(
            "POST",
            &format!("/ordenes-trabajo/{order_id}/comentarios"),
            Some(&token),
            Some(json!({"comentario": "Foto del rodamiento"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{comment}");
    let (status, attachment) = app
        .upload_form(
            &format!("/ordenes-trabajo/comentarios/{}/archivos", comment["id"]),
            &token,
            "archivo",
            ("rodamiento.png", "image/png", b"png-bytes"),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{attachment}");

    let request = Request::builder()
        .uri(format!(
            "/ordenes-trabajo/comentarios/archivos/{}/download",
            attachment["id"]
        ))
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, headers, bytes) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["content-type"], "image/png");
    assert_eq!(bytes, b"png-bytes");

    let uri = format!("/ordenes-trabajo/comentarios/archivos/{}", attachment["id"]);
    let (status, _) = app.call("DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.call("GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn order_documents_accept_the_file_form_field() {
    let app = app().await;
    let token = app.login("admin").await;
    let (_, order) = app
        .call("POST", "/ordenes-compra", Some(&token), Some(json!({})))
        .await;
    let (status, document) = app
        .upload_form(
            &format!("/ordenes-compra/{}/documentos", order["id"]),
            &token,
            "file",
            ("cotizacion.xlsx", "application/octet-stream", b"PK"),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{document}");
    assert_eq!(document["nombre_archivo"], "cotizacion.xlsx");
    assert_eq!(document["tipo_archivo"], "xlsx");
}
