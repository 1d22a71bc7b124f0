//! Validation and normalization of device-originated request bodies.
//!
//! Every write operation decodes its body in two steps: raw bytes into a JSON
//! value, then that value into the operation's typed input. Validation never
//! touches the store, so a failed request has written nothing.

pub mod battery;
pub mod message;
pub mod status;

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use crate::error::AppError;

pub use battery::{Battery, BatteryInput};
pub use message::MessageInput;
pub use status::{DeviceStatus, StatusInput};

/// Parse a request body. An empty body is `None`; malformed JSON is an
/// invalid body.
pub fn parse_body(bytes: &[u8]) -> Result<Option<Value>, AppError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(bytes)
        .map(Some)
        .map_err(|_| AppError::FieldTypeInvalid(None))
}

/// Decode a parsed body into an operation's input.
///
/// A missing body, or one that is not a JSON object, decodes as the input's
/// default (every field absent). Shape errors inside an object are reported
/// against `field`.
pub fn decode<T>(body: Option<Value>, field: &'static str) -> Result<T, AppError>
where
    T: DeserializeOwned + Default,
{
    match body {
        Some(value @ Value::Object(_)) => {
            serde_json::from_value(value).map_err(|_| AppError::FieldTypeInvalid(Some(field)))
        }
        _ => Ok(T::default()),
    }
}

/// Keeps explicit `null` distinct from an absent key: absent stays `None`
/// through `#[serde(default)]`, while a present key (even `null`) is `Some`.
pub(crate) fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}
