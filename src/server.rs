use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::Path,
    http::{HeaderMap, Method, StatusCode},
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Extension, Router,
};
use futures::future::BoxFuture;
use serde_json::Value;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};

use crate::app::validate_access_use_case::ValidateAccessUseCase;
use crate::controllers::{Controller, HttpRequest, HttpResponse};
use crate::error::Result;
use crate::middleware::{auth_guard, request_logging, AuthenticatedAccount};
use crate::observability::metrics;

/// One controller per route.
#[derive(Clone)]
pub struct Controllers {
    pub sign_up: Arc<dyn Controller>,
    pub login: Arc<dyn Controller>,
    pub refresh_token: Arc<dyn Controller>,
    pub recover_password: Arc<dyn Controller>,
    pub reset_password: Arc<dyn Controller>,
    pub get_account: Arc<dyn Controller>,
    pub update_account: Arc<dyn Controller>,
    pub remove_account: Arc<dyn Controller>,
    pub create_task: Arc<dyn Controller>,
    pub get_tasks: Arc<dyn Controller>,
    pub update_task: Arc<dyn Controller>,
    pub remove_task: Arc<dyn Controller>,
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "tasker",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Prometheus text exposition; empty when no recorder is installed.
async fn metrics_endpoint() -> impl IntoResponse {
    metrics::render().unwrap_or_default()
}

fn into_response(response: HttpResponse) -> Response {
    let status =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response.body)).into_response()
}

async fn dispatch(
    controller: &dyn Controller,
    account: Option<Extension<AuthenticatedAccount>>,
    params: Option<Path<HashMap<String, String>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let body = if body.is_empty() {
        Value::Null
    } else {
        match serde_json::from_slice::<Value>(&body) {
            Ok(value) => value,
            Err(e) => {
                debug!("Rejected malformed JSON body: {}", e);
                return into_response(HttpResponse::message(400, "Invalid JSON body"));
            }
        }
    };

    let headers = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();

    let request = HttpRequest {
        body,
        params: params.map(|Path(params)| params).unwrap_or_default(),
        headers,
        account_id: account.map(|Extension(account)| account.id),
    };
    into_response(controller.handle(request).await)
}

type AdaptedHandler = BoxFuture<'static, Response>;

/// Wraps a controller as an axum handler.
fn adapt(
    controller: Arc<dyn Controller>,
) -> impl Fn(
    Option<Extension<AuthenticatedAccount>>,
    Option<Path<HashMap<String, String>>>,
    HeaderMap,
    Bytes,
) -> AdaptedHandler
       + Clone
       + Send
       + Sync
       + 'static {
    move |account, params, headers, body| {
        let controller = controller.clone();
        Box::pin(async move { dispatch(controller.as_ref(), account, params, headers, body).await })
    }
}

/// Builds the HTTP application: the JSON API under `/api` plus health and metrics.
pub fn create_router(controllers: Controllers, validate_access: Arc<ValidateAccessUseCase>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let public = Router::new()
        .route("/auth/signup", post(adapt(controllers.sign_up)))
        .route("/auth/login", post(adapt(controllers.login)))
        .route("/auth/token/refresh", post(adapt(controllers.refresh_token)))
        .route("/auth/password/recover", post(adapt(controllers.recover_password)))
        .route("/auth/password/reset", post(adapt(controllers.reset_password)));

    let protected = Router::new()
        .route(
            "/account/:accountId",
            get(adapt(controllers.get_account))
                .put(adapt(controllers.update_account))
                .delete(adapt(controllers.remove_account)),
        )
        .route(
            "/task",
            post(adapt(controllers.create_task)).get(adapt(controllers.get_tasks)),
        )
        .route(
            "/task/:taskId",
            axum::routing::put(adapt(controllers.update_task))
                .delete(adapt(controllers.remove_task)),
        )
        .route_layer(middleware::from_fn_with_state(validate_access, auth_guard));

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_endpoint))
        .nest("/api", public.merge(protected))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_logging))
                .layer(cors),
        )
}

/// Start the HTTP server on the specified port
pub async fn start_server(router: Router, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("HTTP server running on http://localhost:{}", port);
    info!("Health check: http://localhost:{}/health", port);

    axum::serve(listener, router).await?;
    Ok(())
}
