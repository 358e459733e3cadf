//! axum middleware: the access-token guard and request logging.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::app::validate_access_use_case::ValidateAccessUseCase;
use crate::constants::ACCESS_TOKEN_HEADER;
use crate::controllers::ACCESS_DENIED;
use crate::observability::metrics;

/// Id of the account that owns the request's access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedAccount {
    pub id: String,
}

fn access_denied() -> Response {
    (StatusCode::FORBIDDEN, Json(json!({ "message": ACCESS_DENIED }))).into_response()
}

/// Requires a current access token in `x-access-token`.
pub async fn auth_guard(
    State(validate_access): State<Arc<ValidateAccessUseCase>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = request
        .headers()
        .get(ACCESS_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
    else {
        debug!("Request to {} without access token", request.uri().path());
        return access_denied();
    };

    match validate_access.validate(&token).await {
        Ok(Some(account)) => {
            request
                .extensions_mut()
                .insert(AuthenticatedAccount { id: account.id });
            next.run(request).await
        }
        Ok(None) => access_denied(),
        Err(e) => {
            error!("Access token check failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Internal server error" })),
            )
                .into_response()
        }
    }
}

/// Logs every request with its status and latency; slow requests are warnings.
pub async fn request_logging(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let elapsed = start.elapsed();
    let status = response.status().as_u16();
    metrics::http::request(method.as_str(), status);

    if elapsed.as_millis() > 100 {
        warn!(
            method = %method,
            uri = %uri,
            status,
            latency_ms = elapsed.as_millis() as u64,
            "Slow request"
        );
    } else {
        info!(
            method = %method,
            uri = %uri,
            status,
            latency_ms = elapsed.as_millis() as u64,
            "Request handled"
        );
    }
    response
}
