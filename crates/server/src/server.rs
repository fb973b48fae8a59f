use axum::{
    Extension, Json, Router,
    extract::{DefaultBodyLimit, Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, patch, post, put},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use chrono::Utc;
use serde::Serialize;

use std::sync::Arc;

use crate::{
    JwtService, ServerError, UploadStore, admin, auth, machines, parts, purchase_orders, storage,
    suppliers, uploads, usage, users, work_orders,
};
use engine::{Engine, EngineError, User};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub jwt: JwtService,
    pub uploads: UploadStore,
}

impl ServerState {
    pub fn new(engine: Engine, jwt: JwtService, uploads: UploadStore) -> Self {
        Self {
            engine: Arc::new(engine),
            jwt,
            uploads,
        }
    }
}

/// Resolve the bearer token to an active, unlocked user and store it (and
/// the token claims) in the request extensions.
async fn authenticate(
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let Some(TypedHeader(Authorization(bearer))) = bearer else {
        return Err(ServerError::Unauthorized("missing bearer token".to_string()));
    };
    let claims = state.jwt.verify(bearer.token()).map_err(|err| {
        tracing::debug!("rejected token: {err}");
        ServerError::Unauthorized("invalid or expired token".to_string())
    })?;

    let user = match state.engine.user_by_username(&claims.sub).await {
        Ok(user) => user,
        Err(EngineError::KeyNotFound(_)) => {
            return Err(ServerError::Unauthorized("unknown user".to_string()));
        }
        Err(err) => return Err(err.into()),
    };
    if !user.active || user.is_locked(Utc::now()) {
        return Err(ServerError::Unauthorized(
            "user inactive or locked".to_string(),
        ));
    }

    request.extensions_mut().insert(claims);
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

async fn require_admin(
    Extension(user): Extension<User>,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    if !user.is_admin {
        return Err(EngineError::Forbidden("administrator access required".to_string()).into());
    }
    Ok(next.run(request).await)
}

/// Pages granting access to a route group.
#[derive(Clone)]
struct PageGuard {
    engine: Arc<Engine>,
    pages: &'static [&'static str],
}

async fn require_page(
    State(guard): State<PageGuard>,
    Extension(user): Extension<User>,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    if !guard.engine.has_page_access(&user, guard.pages).await? {
        tracing::info!(username = %user.username, pages = ?guard.pages, "page access denied");
        return Err(EngineError::Forbidden(format!(
            "access to {} required",
            guard.pages.join(" or ")
        ))
        .into());
    }
    Ok(next.run(request).await)
}

fn guarded(
    state: &ServerState,
    pages: &'static [&'static str],
    routes: Router<ServerState>,
) -> Router<ServerState> {
    let guard = PageGuard {
        engine: state.engine.clone(),
        pages,
    };
    routes.route_layer(middleware::from_fn_with_state(guard, require_page))
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    service: &'static str,
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        service: "mantia",
    })
}

fn admin_routes() -> Router<ServerState> {
    Router::new()
        .route("/usuarios", get(users::list).post(users::create))
        .route(
            "/usuarios/{id}",
            get(users::get).put(users::update).delete(users::deactivate),
        )
        .route("/usuarios/{id}/activate", post(users::activate))
        .route("/usuarios/{id}/unlock", post(users::unlock))
        .route("/usuarios/{id}/asignar-paginas", post(users::assign_pages))
        .route("/usuarios/{id}/paginas", get(users::pages))
        .route("/auth/reset-password", post(auth::reset_password))
        .route("/admin/roles", get(admin::list_roles).post(admin::create_role))
        .route(
            "/admin/roles/{id}",
            get(admin::get_role)
                .put(admin::update_role)
                .delete(admin::delete_role),
        )
        .route(
            "/admin/permisos",
            get(admin::list_permissions).post(admin::create_permission),
        )
        .route(
            "/admin/permisos/{id}",
            get(admin::get_permission)
                .put(admin::update_permission)
                .delete(admin::delete_permission),
        )
        .route("/admin/paginas", get(admin::list_pages).post(admin::create_page))
        .route(
            "/admin/paginas/{id}",
            get(admin::get_page)
                .put(admin::update_page)
                .delete(admin::delete_page),
        )
        .route_layer(middleware::from_fn(require_admin))
}

fn inventory_routes(state: &ServerState) -> Router<ServerState> {
    let suppliers = Router::new()
        .route("/proveedores", get(suppliers::list).post(suppliers::create))
        .route(
            "/proveedores/{id}",
            get(suppliers::get)
                .put(suppliers::update)
                .delete(suppliers::delete),
        );

    let models = Router::new()
        .route(
            "/modelos-maquinas",
            get(machines::list_models).post(machines::create_model),
        )
        .route(
            "/modelos-maquinas/{id}",
            get(machines::get_model)
                .put(machines::update_model)
                .delete(machines::delete_model),
        );

    let machines = Router::new()
        .route("/maquinas", get(machines::list).post(machines::create))
        .route(
            "/maquinas/{id}",
            get(machines::get)
                .put(machines::update)
                .delete(machines::delete),
        )
        .route("/maquinas/numero-serie/{serial}", get(machines::by_serial))
        .route("/maquinas/alias/{alias}", get(machines::by_alias))
        .route("/maquinas/modelo/{id}", get(machines::by_model));

    let parts = Router::new()
        .route("/almacenamientos", get(storage::list).post(storage::create))
        .route(
            "/almacenamientos/{id}",
            get(storage::get).put(storage::update).delete(storage::delete),
        )
        .route("/repuestos", get(parts::list).post(parts::create))
        .route(
            "/repuestos/{id}",
            get(parts::get).put(parts::update).delete(parts::delete),
        )
        .route("/repuestos/{id}/stock", patch(parts::set_stock))
        .route("/repuestos/codigo/{code}", get(parts::by_code))
        .route("/repuestos/proveedor/{id}", get(parts::by_supplier))
        .route("/repuestos/stock/bajo", get(parts::low_stock));

    let history = Router::new()
        .route("/historial", get(usage::list).post(usage::create))
        .route(
            "/historial/{id}",
            get(usage::get).put(usage::update).delete(usage::delete),
        )
        .route("/historial/repuesto/{id}", get(usage::by_part))
        .route("/historial/maquina/{id}", get(usage::by_machine))
        .route("/historial/fecha/rango", get(usage::by_date_range))
        .route(
            "/historial/estadisticas/consumo/{id}",
            get(usage::consumption_stats),
        );

    Router::new()
        .merge(guarded(state, &["proveedores"], suppliers))
        .merge(guarded(state, &["modelos_maquinas", "maquinas"], models))
        .merge(guarded(state, &["maquinas"], machines))
        .merge(guarded(state, &["repuestos"], parts))
        .merge(guarded(state, &["historial", "repuestos"], history))
}

fn order_routes(state: &ServerState) -> Router<ServerState> {
    let purchase = Router::new()
        .route(
            "/ordenes-compra",
            get(purchase_orders::list).post(purchase_orders::create),
        )
        .route("/ordenes-compra/estadisticas", get(purchase_orders::stats))
        .route(
            "/ordenes-compra/numero-requisicion/{number}",
            get(purchase_orders::by_requisition),
        )
        .route(
            "/ordenes-compra/{id}",
            get(purchase_orders::get)
                .put(purchase_orders::update)
                .delete(purchase_orders::delete),
        )
        .route(
            "/ordenes-compra/{id}/items",
            get(purchase_orders::list_items).post(purchase_orders::add_item),
        )
        .route(
            "/ordenes-compra/items/{id}",
            put(purchase_orders::update_item).delete(purchase_orders::delete_item),
        )
        .route(
            "/ordenes-compra/{id}/documentos",
            get(purchase_orders::list_documents).merge(
                post(purchase_orders::upload_document).layer(DefaultBodyLimit::max(
                    uploads::body_limit(uploads::ORDER_DOCUMENT_MAX_BYTES),
                )),
            ),
        )
        .route(
            "/ordenes-compra/documentos/{id}",
            get(purchase_orders::download_document).delete(purchase_orders::delete_document),
        )
        .route(
            "/ordenes-compra/{id}/confirmar-llegada",
            post(purchase_orders::receive),
        );

    let work = Router::new()
        .route(
            "/ordenes-trabajo",
            get(work_orders::list).post(work_orders::create),
        )
        .route("/ordenes-trabajo/stats", get(work_orders::stats))
        .route("/ordenes-trabajo/mis-ordenes", get(work_orders::mine))
        .route(
            "/ordenes-trabajo/{id}",
            get(work_orders::get)
                .put(work_orders::update)
                .delete(work_orders::delete),
        )
        .route("/ordenes-trabajo/{id}/estado", patch(work_orders::set_state))
        .route(
            "/ordenes-trabajo/{id}/comentarios",
            get(work_orders::list_comments).post(work_orders::add_comment),
        )
        .route(
            "/ordenes-trabajo/{id}/archivos",
            get(work_orders::list_files).merge(post(work_orders::upload_file).layer(
                DefaultBodyLimit::max(uploads::body_limit(uploads::WORK_ORDER_FILE_MAX_BYTES)),
            )),
        )
        .route(
            "/ordenes-trabajo/comentarios/{id}/archivos",
            get(work_orders::list_comment_files).merge(
                post(work_orders::upload_comment_file).layer(DefaultBodyLimit::max(
                    uploads::body_limit(uploads::COMMENT_FILE_MAX_BYTES),
                )),
            ),
        )
        // Comment attachments share the file table, so both path families
        // resolve to the same handlers.
        .route(
            "/ordenes-trabajo/archivos/{id}",
            get(work_orders::download_file).delete(work_orders::delete_file),
        )
        .route(
            "/ordenes-trabajo/archivos/{id}/download",
            get(work_orders::download_file_raw),
        )
        .route(
            "/ordenes-trabajo/comentarios/archivos/{id}",
            get(work_orders::download_file).delete(work_orders::delete_file),
        )
        .route(
            "/ordenes-trabajo/comentarios/archivos/{id}/download",
            get(work_orders::download_file_raw),
        );

    Router::new()
        .merge(guarded(state, &["ordenes_compra"], purchase))
        .merge(guarded(
            state,
            &["ordenes_trabajo", "mis_ordenes_trabajo"],
            work,
        ))
}

pub fn router(state: ServerState) -> Router {
    let session = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/auth/me/paginas", get(auth::my_pages))
        .route("/auth/change-password", post(auth::change_password))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/check-token", get(auth::check_token));

    let protected = Router::new()
        .merge(session)
        .merge(admin_routes())
        .merge(inventory_routes(&state))
        .merge(order_routes(&state))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/auth/login", post(auth::login))
        .merge(protected)
        .with_state(state)
}

pub async fn run_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(state, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
