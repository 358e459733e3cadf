//! Transport-neutral controllers.
//!
//! A controller turns an [`HttpRequest`] into an [`HttpResponse`]: it validates the input,
//! calls one use case and maps the outcome to a status code. Infrastructure errors never
//! escape; [`Controller::handle`] logs them and answers 500.

pub mod account;
pub mod auth;
pub mod task;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tracing::error;

use crate::app::ports::{ParamError, Validator};
use crate::error::Result;

pub use account::{GetAccountController, RemoveAccountController, UpdateAccountController};
pub use auth::{
    LoginController, RecoverPasswordController, RefreshTokenController, ResetPasswordController,
    SignUpController,
};
pub use task::{CreateTaskController, GetTasksController, RemoveTaskController, UpdateTaskController};

pub const ACCESS_DENIED: &str = "Access denied";

#[derive(Debug, Clone, Default)]
pub struct HttpRequest {
    pub body: Value,
    pub params: HashMap<String, String>,
    /// Header names are lower case.
    pub headers: HashMap<String, String>,
    /// Set by the auth guard on protected routes.
    pub account_id: Option<String>,
}

impl HttpRequest {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status_code: u16,
    pub body: Value,
}

impl HttpResponse {
    pub fn ok(body: Value) -> Self {
        Self {
            status_code: 200,
            body,
        }
    }

    pub fn message(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            body: json!({ "message": message.into() }),
        }
    }

    pub fn bad_request(errors: Vec<ParamError>) -> Self {
        Self {
            status_code: 400,
            body: json!(errors),
        }
    }

    pub fn forbidden() -> Self {
        Self::message(403, ACCESS_DENIED)
    }

    pub fn server_error() -> Self {
        Self::message(500, "Internal server error")
    }
}

#[async_trait]
pub trait Controller: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn perform(&self, request: &HttpRequest) -> Result<HttpResponse>;

    async fn handle(&self, request: HttpRequest) -> HttpResponse {
        match self.perform(&request).await {
            Ok(response) => response,
            Err(e) => {
                error!(controller = self.name(), "Unhandled error: {}", e);
                HttpResponse::server_error()
            }
        }
    }
}

/// The request body with extra string fields merged in.
///
/// A missing body counts as an empty object. Bodies that are not objects are returned
/// untouched so the schema rejects them.
pub(crate) fn merged_input(body: &Value, fields: &[(&str, Option<&str>)]) -> Value {
    let mut object = match body {
        Value::Object(map) => map.clone(),
        Value::Null => Map::new(),
        other => return other.clone(),
    };
    for (key, value) in fields {
        if let Some(value) = value {
            object.insert((*key).to_string(), Value::String((*value).to_string()));
        }
    }
    Value::Object(object)
}

/// Validates `input` and decodes it, or produces the 400 response.
pub(crate) fn decode<T: DeserializeOwned>(
    validator: &dyn Validator,
    input: Value,
) -> std::result::Result<T, HttpResponse> {
    validator.validate(&input).map_err(HttpResponse::bad_request)?;
    serde_json::from_value(input)
        .map_err(|e| HttpResponse::bad_request(vec![ParamError::new("body", e.to_string())]))
}

/// The authenticated account id, or the 403 response.
pub(crate) fn authenticated(request: &HttpRequest) -> std::result::Result<&str, HttpResponse> {
    request
        .account_id
        .as_deref()
        .ok_or_else(HttpResponse::forbidden)
}
