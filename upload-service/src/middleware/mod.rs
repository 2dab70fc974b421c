// Request pipeline stages, outermost first
pub mod request_id;
pub mod logging;

pub use logging::log_request;
pub use request_id::{set_request_id, RequestId};
