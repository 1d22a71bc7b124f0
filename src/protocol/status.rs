use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use thiserror::Error;

use crate::error::AppError;

use super::present;

/// Liveness/state of a device. The set is closed; the integer code is what
/// gets stored and what travels over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum DeviceStatus {
    Offline,
    Online,
    Busy,
}

impl DeviceStatus {
    pub const ALL: [DeviceStatus; 3] = [DeviceStatus::Offline, DeviceStatus::Online, DeviceStatus::Busy];

    pub fn code(self) -> i32 {
        match self {
            DeviceStatus::Offline => 0,
            DeviceStatus::Online => 1,
            DeviceStatus::Busy => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|status| i64::from(status.code()) == code)
    }

    pub fn is_online(self) -> bool {
        self == DeviceStatus::Online
    }
}

impl From<bool> for DeviceStatus {
    fn from(online: bool) -> Self {
        if online {
            DeviceStatus::Online
        } else {
            DeviceStatus::Offline
        }
    }
}

impl From<DeviceStatus> for i32 {
    fn from(status: DeviceStatus) -> Self {
        status.code()
    }
}

#[derive(Debug, Error)]
#[error("unknown device status code {0}")]
pub struct UnknownStatus(pub i64);

impl TryFrom<i32> for DeviceStatus {
    type Error = UnknownStatus;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        DeviceStatus::from_code(i64::from(code)).ok_or(UnknownStatus(i64::from(code)))
    }
}

/// The shapes a client may send for `status`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawStatus {
    Flag(bool),
    Code(Number),
    Other(Value),
}

/// Body of `POST /status`.
#[derive(Debug, Default, Deserialize)]
pub struct StatusInput {
    #[serde(default, deserialize_with = "present")]
    pub status: Option<RawStatus>,
}

impl StatusInput {
    /// Validate and normalize into a DeviceStatus.
    ///
    /// Booleans map onto Online/Offline, numbers must be a known code.
    /// Anything else is a type error.
    pub fn validate(self) -> Result<DeviceStatus, AppError> {
        match self.status {
            None => Err(AppError::FieldNotFound("status")),
            Some(RawStatus::Flag(online)) => Ok(DeviceStatus::from(online)),
            Some(RawStatus::Code(number)) => whole_number(&number)
                .and_then(DeviceStatus::from_code)
                .ok_or(AppError::FieldOutOfRange("status")),
            Some(RawStatus::Other(_)) => Err(AppError::FieldTypeInvalid(Some("status"))),
        }
    }
}

/// `1` and `1.0` are the same JSON number; fractional values have no code.
fn whole_number(number: &Number) -> Option<i64> {
    number.as_i64().or_else(|| {
        number
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < 1e15)
            .map(|f| f as i64)
    })
}
