// HTTP API Error Types
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};
use std::error::Error as _;
use thiserror::Error;

use crate::database::DatabaseError;
use crate::middleware::response::is_bodiless;

/// Every failure a request can end in. Handlers return it; the response
/// layer turns it into the error envelope.
#[derive(Debug, Error)]
pub enum AppError {
    // 401
    #[error("{}", unauthorized_message(.0))]
    Unauthorized(Option<String>),

    // 404
    #[error("{0}")]
    NotFound(&'static str),

    // 405
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    // 413
    #[error("Payload Too Large")]
    PayloadTooLarge,

    // 400
    #[error("Bad request: missing \"{0}\" field")]
    FieldNotFound(&'static str),

    #[error("{}", type_invalid_message(.0))]
    FieldTypeInvalid(Option<&'static str>),

    #[error("Bad request: \"{0}\" out of range")]
    FieldOutOfRange(&'static str),

    // 500
    #[error("Internal Server Error")]
    Internal(#[source] DatabaseError),

    // 503
    #[error("Database unavailable")]
    Unavailable(#[source] DatabaseError),
}

fn unauthorized_message(detail: &Option<String>) -> String {
    match detail {
        Some(detail) => format!("Unauthorized: {}", detail),
        None => "Unauthorized".to_string(),
    }
}

fn type_invalid_message(field: &Option<&'static str>) -> String {
    match field {
        Some(field) => format!("Bad request: invalid type for \"{}\"", field),
        None => "Bad request: invalid body".to_string(),
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::FieldNotFound(_)
            | AppError::FieldTypeInvalid(_)
            | AppError::FieldOutOfRange(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::NotFound(_) => "NotFound",
            AppError::MethodNotAllowed => "MethodNotAllowed",
            AppError::PayloadTooLarge => "PayloadTooLarge",
            AppError::FieldNotFound(_) => "FieldNotFound",
            AppError::FieldTypeInvalid(_) => "FieldTypeInvalid",
            AppError::FieldOutOfRange(_) => "FieldOutOfRange",
            AppError::Internal(_) => "Internal",
            AppError::Unavailable(_) => "Unavailable",
        }
    }

    /// The error and its chain of causes, one per line.
    pub fn stack(&self) -> String {
        let mut stack = format!("{}: {}", self.kind(), self);
        let mut source = self.source();
        while let Some(cause) = source {
            stack.push_str(&format!("\n    caused by: {}", cause));
            source = cause.source();
        }
        stack
    }

    /// Error envelope. `stack` is only filled in for development runs.
    pub fn to_json(&self, with_stack: bool) -> Value {
        let mut error = json!({ "message": self.to_string() });
        if with_stack {
            error["stack"] = Value::String(self.stack());
        }

        json!({
            "message": "Error",
            "data": Value::Null,
            "error": error,
        })
    }
}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        // Don't expose internal SQL errors to clients
        tracing::error!("Database error: {}", err);
        AppError::Internal(err)
    }
}

/// Envelope including the stack, attached to error responses so the
/// top-level error handler can swap it in for development runs.
#[derive(Debug, Clone)]
pub struct DetailedError(pub Value);

// Automatic HTTP response conversion for Axum
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if is_bodiless(status) {
            return status.into_response();
        }

        let mut response = (status, Json(self.to_json(false))).into_response();
        response
            .extensions_mut()
            .insert(DetailedError(self.to_json(true)));
        response
    }
}
