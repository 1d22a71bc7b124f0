use async_trait::async_trait;
use serde_json::Value;
use sqlx::{types::Json, PgPool};

use crate::database::heartbeat::{DeviceUpdate, FieldChange, UpdateResult};
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::Device;

/// Persistent device records.
///
/// `apply` must write the field change and the heartbeat timestamps as one
/// atomic operation.
#[async_trait]
pub trait DeviceStore: Send + Sync {
    async fn find_by_token(&self, token: &str) -> Result<Option<Device>, DatabaseError>;

    /// Every device, ascending by id.
    async fn list(&self) -> Result<Vec<Device>, DatabaseError>;

    async fn apply(&self, update: &DeviceUpdate) -> Result<UpdateResult, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}

const SELECT_DEVICE: &str = r#"
    SELECT id, name, token, status, last_updated_at, last_online, message, battery, ignored
    FROM device
"#;

// Absent changes are bound as NULL and keep the stored value.
const UPDATE_DEVICE: &str = r#"
    UPDATE device SET
        status = COALESCE($2, status),
        battery = COALESCE($3, battery),
        message = COALESCE($4, message),
        last_updated_at = GREATEST(last_updated_at, $5),
        last_online = CASE WHEN $6 THEN GREATEST(last_online, $5) ELSE last_online END
    WHERE id = $1
"#;

#[derive(Clone)]
pub struct PgDeviceStore {
    pool: PgPool,
}

impl PgDeviceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeviceStore for PgDeviceStore {
    async fn find_by_token(&self, token: &str) -> Result<Option<Device>, DatabaseError> {
        let sql = format!("{} WHERE token = $1", SELECT_DEVICE);
        let device = sqlx::query_as::<_, Device>(&sql)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        Ok(device)
    }

    async fn list(&self) -> Result<Vec<Device>, DatabaseError> {
        let sql = format!("{} ORDER BY id ASC", SELECT_DEVICE);
        let devices = sqlx::query_as::<_, Device>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(devices)
    }

    async fn apply(&self, update: &DeviceUpdate) -> Result<UpdateResult, DatabaseError> {
        let (status, battery, message) = match &update.change {
            FieldChange::None => (None, None, None),
            FieldChange::Status(status) => (Some(status.code()), None, None),
            FieldChange::Battery(battery) => (None, Some(Json(Value::from(battery.clone()))), None),
            FieldChange::Message(message) => (None, None, Some(message.as_str())),
        };

        let result = sqlx::query(UPDATE_DEVICE)
            .bind(update.id)
            .bind(status)
            .bind(battery)
            .bind(message)
            .bind(update.heartbeat.at)
            .bind(update.heartbeat.was_online)
            .execute(&self.pool)
            .await?;

        Ok(UpdateResult {
            affected: result.rows_affected(),
        })
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}
