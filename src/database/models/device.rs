use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::{postgres::PgRow, types::Json, FromRow, Row};

use crate::protocol::DeviceStatus;

/// One row of the `device` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: i32,
    pub name: String,
    #[serde(skip_serializing)]
    pub token: String,
    pub status: DeviceStatus,
    pub last_updated_at: DateTime<Utc>,
    pub last_online: DateTime<Utc>,
    pub message: String,
    /// Whatever JSON the column holds. Rows can be edited outside the API, so
    /// the shape is not checked on read.
    pub battery: Option<Value>,
    pub ignored: bool,
}

impl<'r> FromRow<'r, PgRow> for Device {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let code: i32 = row.try_get("status")?;
        let status = DeviceStatus::try_from(code).map_err(|e| sqlx::Error::ColumnDecode {
            index: "status".to_string(),
            source: Box::new(e),
        })?;
        let battery: Option<Json<Value>> = row.try_get("battery")?;

        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            token: row.try_get("token")?,
            status,
            last_updated_at: row.try_get("last_updated_at")?,
            last_online: row.try_get("last_online")?,
            message: row.try_get("message")?,
            battery: battery.map(|Json(battery)| battery),
            ignored: row.try_get("ignored")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serialized_device_never_carries_its_token() {
        let now = Utc::now();
        let device = Device {
            id: 7,
            name: "hallway sensor".into(),
            token: "abc".into(),
            status: DeviceStatus::Online,
            last_updated_at: now,
            last_online: now,
            message: String::new(),
            battery: Some(json!({ "power": 55, "charging": true })),
            ignored: false,
        };

        let value = serde_json::to_value(&device).unwrap();
        assert!(value.get("token").is_none());
        assert_eq!(value["status"], json!(1));
        assert_eq!(value["battery"], json!({ "power": 55, "charging": true }));
        assert!(value.get("lastUpdatedAt").is_some());
        assert!(value.get("lastOnline").is_some());
    }

    #[test]
    fn stored_battery_is_passed_through_whatever_its_shape() {
        let now = Utc::now();
        for stored in [json!({ "charging": true }), json!({ "power": 55.5 }), json!({ "power": "80" }), json!(12)] {
            let device = Device {
                id: 1,
                name: "edited by hand".into(),
                token: "abc".into(),
                status: DeviceStatus::Offline,
                last_updated_at: now,
                last_online: now,
                message: String::new(),
                battery: Some(stored.clone()),
                ignored: false,
            };
            assert_eq!(serde_json::to_value(&device).unwrap()["battery"], stored);
        }
    }
}
