use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::config::AppConfig;
use crate::database::{Device, DeviceStore, DeviceUpdate, DatabaseError, UpdateResult};
use crate::protocol::DeviceStatus;
use crate::server::AppState;

/// Device store kept in memory, applying updates the same way the Postgres
/// statement does.
#[derive(Default)]
pub struct MemoryDeviceStore {
    devices: Mutex<Vec<Device>>,
    unavailable: AtomicBool,
}

impl MemoryDeviceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timestamp every seeded row starts with, well in the past.
    pub fn seeded_at() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    pub fn insert(&self, name: &str, token: &str, status: DeviceStatus) -> Device {
        let mut devices = self.devices.lock().unwrap();
        let id = devices.iter().map(|d| d.id).max().unwrap_or(0) + 1;
        let device = Device {
            id,
            name: name.to_string(),
            token: token.to_string(),
            status,
            last_updated_at: Self::seeded_at(),
            last_online: Self::seeded_at() - Duration::hours(1),
            message: String::new(),
            battery: None,
            ignored: false,
        };
        devices.push(device.clone());
        device
    }

    pub fn get(&self, id: i32) -> Option<Device> {
        self.devices.lock().unwrap().iter().find(|d| d.id == id).cloned()
    }

    /// Change a row directly, the way an operator would outside the API.
    pub fn edit(&self, id: i32, change: impl FnOnce(&mut Device)) {
        if let Some(device) = self.devices.lock().unwrap().iter_mut().find(|d| d.id == id) {
            change(device);
        }
    }

    /// Make every call fail as if the database were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), DatabaseError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DatabaseError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceStore for MemoryDeviceStore {
    async fn find_by_token(&self, token: &str) -> Result<Option<Device>, DatabaseError> {
        self.check()?;
        Ok(self.devices.lock().unwrap().iter().find(|d| d.token == token).cloned())
    }

    async fn list(&self) -> Result<Vec<Device>, DatabaseError> {
        self.check()?;
        let mut devices = self.devices.lock().unwrap().clone();
        devices.sort_by_key(|d| d.id);
        Ok(devices)
    }

    async fn apply(&self, update: &DeviceUpdate) -> Result<UpdateResult, DatabaseError> {
        self.check()?;
        let mut devices = self.devices.lock().unwrap();
        let affected = match devices.iter_mut().find(|d| d.id == update.id) {
            Some(device) => {
                update.apply(device);
                1
            }
            None => 0,
        };
        Ok(UpdateResult { affected })
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        self.check()
    }
}

/// Router state over a memory store with the given configuration values.
pub fn state_with(store: Arc<MemoryDeviceStore>, vars: &[(&str, &str)]) -> AppState {
    let config = AppConfig::from_lookup(|key| {
        vars.iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    })
    .unwrap();
    AppState::new(store, Arc::new(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lists_in_id_order_whatever_the_insert_order() {
        let store = MemoryDeviceStore::new();
        store.insert("a", "t1", DeviceStatus::Online);
        store.insert("b", "t2", DeviceStatus::Offline);
        store.devices.lock().unwrap().reverse();

        let ids: Vec<i32> = store.list().await.unwrap().iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn unavailable_store_fails_every_call() {
        let store = MemoryDeviceStore::new();
        store.set_unavailable(true);
        assert!(store.list().await.is_err());
        assert!(store.health_check().await.is_err());
    }
}
