pub mod heartbeat;
pub mod manager;
pub mod models;
pub mod repository;

pub use heartbeat::{DeviceUpdate, FieldChange, Heartbeat, UpdateResult};
pub use manager::{DatabaseError, DatabaseManager};
pub use models::Device;
pub use repository::{DeviceStore, PgDeviceStore};
