//! Helpers for hyper handlers: multipart uploads with content sniffing,
//! bounded JSON decoding with classified errors, JSON replies, relaying JSON
//! to remote endpoints, downloads, slugs, random tokens and directory setup.

pub mod config;
pub mod error;
pub mod sys_fileapi;
pub mod sys_jsonapi;
pub mod sys_util;
pub mod tools;

pub use config::{DEFAULT_MAX_JSON_BYTES, DEFAULT_MAX_UPLOAD_BYTES, ToolsConfig};
pub use error::{ToolkitError, ToolkitResult};
pub use sys_fileapi::UploadedFile;
pub use sys_jsonapi::{HttpsTransport, JsonResponse, JsonTransport};
pub use tools::Tools;
