pub mod body;
pub mod device;
pub mod envelope;
pub mod logging;
pub mod response;

pub use body::JsonBody;
pub use device::{resolve_device, AuthDevice};
pub use envelope::error_envelope;
pub use logging::request_logger;
pub use response::{ApiResponse, ApiResult};
