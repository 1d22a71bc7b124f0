// handlers/devices.rs - device status endpoints under /api/v1
//
// GET  /status               fleet listing, no token
// POST /status?token=...     set status
// POST /heartbeat?token=...  liveness ping
// POST /battery?token=...    battery reading
// POST /message?token=...    free-text message
//
// Each write resolves the device first, validates the body, then issues a
// single update carrying the field change and the heartbeat timestamps.

use axum::extract::State;
use chrono::Utc;

use crate::database::{Device, DeviceUpdate, FieldChange, UpdateResult};
use crate::middleware::{ApiResponse, ApiResult, AuthDevice, JsonBody};
use crate::protocol::{decode, BatteryInput, MessageInput, StatusInput};
use crate::server::AppState;

/// GET /api/v1/status - every device, ascending by id, tokens stripped
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Device>> {
    let devices = state.store.list().await?;
    Ok(ApiResponse::success(devices))
}

/// POST /api/v1/status - `{status: number | boolean}`
pub async fn set_status(
    State(state): State<AppState>,
    AuthDevice(device): AuthDevice,
    JsonBody(body): JsonBody,
) -> ApiResult<UpdateResult> {
    let status = decode::<StatusInput>(body, "status")?.validate()?;
    apply(&state, DeviceUpdate::new(&device, FieldChange::Status(status), Utc::now())).await
}

/// POST /api/v1/heartbeat - no body
pub async fn heartbeat(State(state): State<AppState>, AuthDevice(device): AuthDevice) -> ApiResult<UpdateResult> {
    apply(&state, DeviceUpdate::heartbeat(&device, Utc::now())).await
}

/// POST /api/v1/battery - `{battery?: {power, charging?}}`
pub async fn set_battery(
    State(state): State<AppState>,
    AuthDevice(device): AuthDevice,
    JsonBody(body): JsonBody,
) -> ApiResult<UpdateResult> {
    let battery = decode::<BatteryInput>(body, "battery")?.normalize();
    apply(&state, DeviceUpdate::new(&device, FieldChange::Battery(battery), Utc::now())).await
}

/// POST /api/v1/message - `{message: string}`
pub async fn set_message(
    State(state): State<AppState>,
    AuthDevice(device): AuthDevice,
    JsonBody(body): JsonBody,
) -> ApiResult<UpdateResult> {
    let message = decode::<MessageInput>(body, "message")?.validate()?;
    apply(&state, DeviceUpdate::new(&device, FieldChange::Message(message), Utc::now())).await
}

async fn apply(state: &AppState, update: DeviceUpdate) -> ApiResult<UpdateResult> {
    let result = state.store.apply(&update).await?;
    tracing::debug!(
        device_id = update.id,
        change = ?update.change,
        was_online = update.heartbeat.was_online,
        "device updated"
    );
    Ok(ApiResponse::success(result))
}
