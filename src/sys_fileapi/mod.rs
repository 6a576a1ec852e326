//! Multipart upload pipeline and file download.

pub mod core;
pub mod filename;
pub mod form;
pub mod handlers;
pub mod sniff;

pub use self::core::{UploadedFile, store_files};
pub use form::{MultipartForm, SpooledFile};
