//! JSON request decoding, JSON replies and relaying JSON to remote endpoints.

pub mod core;
pub mod handlers;
pub mod transport;

pub use self::core::{JsonResponse, decode_json};
pub use handlers::{error_json, error_json_with_status, relay_json, relay_json_with, write_json};
pub use transport::{HttpsTransport, JsonTransport};
