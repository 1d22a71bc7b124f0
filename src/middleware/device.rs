use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::Deserialize;

use crate::database::{Device, DeviceStore};
use crate::error::AppError;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// The device that sent the request, resolved from the `token` query
/// parameter before the handler reads the body.
#[derive(Debug, Clone)]
pub struct AuthDevice(pub Device);

#[async_trait]
impl FromRequestParts<AppState> for AuthDevice {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<TokenQuery>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::Unauthorized(None))?;

        resolve_device(state.store.as_ref(), query.token.as_deref())
            .await
            .map(AuthDevice)
    }
}

/// Look a device up by its token. No side effects.
pub async fn resolve_device(store: &dyn DeviceStore, token: Option<&str>) -> Result<Device, AppError> {
    let token = match token {
        Some(token) if !token.is_empty() => token,
        _ => return Err(AppError::Unauthorized(None)),
    };

    match store.find_by_token(token).await? {
        Some(device) => Ok(device),
        None => {
            tracing::debug!("No device matches the presented token");
            Err(AppError::NotFound("Unable to find device"))
        }
    }
}
