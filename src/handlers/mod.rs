pub mod devices;
pub mod health;

pub use health::health;

use crate::error::AppError;

/// Unknown routes still answer with the error envelope.
pub async fn not_found() -> AppError {
    AppError::NotFound("Not Found")
}

/// Known path, unsupported method.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
