//! What a successful device request writes back to its row.
//!
//! Every write operation is one [`DeviceUpdate`]: at most one field change
//! plus the liveness timestamps, applied by the store as a single statement.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::database::models::Device;
use crate::protocol::{Battery, DeviceStatus};

/// Liveness timestamps refreshed by every successful device request.
///
/// `was_online` is taken from the row as read while resolving the token,
/// before any status change carried by the same request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heartbeat {
    pub at: DateTime<Utc>,
    pub was_online: bool,
}

impl Heartbeat {
    pub fn for_device(device: &Device, at: DateTime<Utc>) -> Self {
        Self {
            at,
            was_online: device.status.is_online(),
        }
    }

    /// Timestamps never move backwards, even if `at` is older than what is
    /// already stored.
    pub fn apply(&self, device: &mut Device) {
        device.last_updated_at = device.last_updated_at.max(self.at);
        if self.was_online {
            device.last_online = device.last_online.max(self.at);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldChange {
    None,
    Status(DeviceStatus),
    Battery(Battery),
    Message(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceUpdate {
    pub id: i32,
    pub change: FieldChange,
    pub heartbeat: Heartbeat,
}

impl DeviceUpdate {
    pub fn new(device: &Device, change: FieldChange, at: DateTime<Utc>) -> Self {
        Self {
            id: device.id,
            change,
            heartbeat: Heartbeat::for_device(device, at),
        }
    }

    pub fn heartbeat(device: &Device, at: DateTime<Utc>) -> Self {
        Self::new(device, FieldChange::None, at)
    }

    /// Apply to an in-memory copy of the row, the same way the store does.
    pub fn apply(&self, device: &mut Device) {
        match &self.change {
            FieldChange::None => {}
            FieldChange::Status(status) => device.status = *status,
            FieldChange::Battery(battery) => device.battery = Some(Value::from(battery.clone())),
            FieldChange::Message(message) => device.message = message.clone(),
        }
        self.heartbeat.apply(device);
    }
}

/// Payload returned by the write operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UpdateResult {
    pub affected: u64,
}
