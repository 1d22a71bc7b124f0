use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};

use crate::error::DetailedError;
use crate::server::AppState;

/// Top-level error handler. Error responses already carry the envelope;
/// development runs get the variant with the error stack instead.
pub async fn error_envelope(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    match response.extensions_mut().remove::<DetailedError>() {
        Some(DetailedError(body)) if state.config.is_development() => {
            let (mut parts, _) = response.into_parts();
            parts.headers.remove(axum::http::header::CONTENT_LENGTH);
            (parts, Json(body)).into_response()
        }
        _ => response,
    }
}
