use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::StatusCode,
};
use serde_json::Value;

use crate::error::AppError;
use crate::protocol::parse_body;

/// Request body parsed as JSON, `None` when empty. Buffering failures
/// surface as `AppError` so they get the error envelope too.
#[derive(Debug)]
pub struct JsonBody(pub Option<Value>);

#[async_trait]
impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(request, state)
            .await
            .map_err(|rejection| match rejection.status() {
                StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge,
                _ => AppError::FieldTypeInvalid(None),
            })?;

        parse_body(&bytes).map(JsonBody)
    }
}
