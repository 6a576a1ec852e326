//! Error taxonomy shared by every helper in the toolkit.
//!
//! Core functions return these errors untouched; only the HTTP glue logs them
//! before turning them into a response.

use std::io;
use std::path::PathBuf;

use hyper::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ToolkitError {
    #[error("empty {0} provided")]
    EmptyInput(&'static str),

    #[error("body must not be larger than {limit} bytes")]
    PayloadTooLarge { limit: u64 },

    #[error("uploaded file type not permitted: {content_type}")]
    UnsupportedFileType { content_type: String },

    #[error("destination {} is unavailable: {reason}", .path.display())]
    DestinationUnavailable { path: PathBuf, reason: String },

    #[error("failed to write {}: {source}", .path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid filename: {0:?}")]
    InvalidFilename(String),

    #[error("no file found in the submitted form")]
    NoFileFound,

    #[error("file not found: {0}")]
    NotFound(String),

    #[error("invalid multipart form: {0}")]
    MalformedMultipart(String),

    #[error("{}", malformed_json_message(.offset))]
    MalformedJson { offset: Option<usize> },

    #[error("{}", type_mismatch_message(.field, .offset))]
    JsonTypeMismatch {
        field: Option<String>,
        offset: Option<usize>,
    },

    #[error("body contains unknown field {0:?}")]
    UnknownJsonField(String),

    #[error("body is missing field {0:?}")]
    MissingJsonField(String),

    #[error("body must contain only one JSON value")]
    MultipleJsonDocuments,

    #[error("body must not be empty")]
    EmptyJsonBody,

    #[error("slug is empty")]
    SlugEmptyResult,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] hyper::http::Error),

    #[error("transport error: {0}")]
    Transport(#[from] hyper::Error),

    #[error("relay error: {0}")]
    Relay(#[from] reqwest::Error),

    #[error("relay request rejected: {0}")]
    InvalidRelayRequest(String),
}

pub type ToolkitResult<T> = Result<T, ToolkitError>;

fn malformed_json_message(offset: &Option<usize>) -> String {
    match offset {
        Some(offset) => format!("body contains malformed JSON (at char {offset})"),
        None => "body contains malformed JSON".to_string(),
    }
}

fn type_mismatch_message(field: &Option<String>, offset: &Option<usize>) -> String {
    match (field, offset) {
        (Some(field), _) => format!("body contains incorrect JSON type for field {field:?}"),
        (None, Some(offset)) => format!("body contains incorrect JSON type at char {offset}"),
        (None, None) => "body contains incorrect JSON type".to_string(),
    }
}

impl ToolkitError {
    /// Status a handler should answer with when this error reaches the client.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ToolkitError::EmptyInput(_)
            | ToolkitError::InvalidFilename(_)
            | ToolkitError::NoFileFound
            | ToolkitError::MalformedMultipart(_)
            | ToolkitError::MalformedJson { .. }
            | ToolkitError::JsonTypeMismatch { .. }
            | ToolkitError::UnknownJsonField(_)
            | ToolkitError::MissingJsonField(_)
            | ToolkitError::MultipleJsonDocuments
            | ToolkitError::EmptyJsonBody
            | ToolkitError::SlugEmptyResult => StatusCode::BAD_REQUEST,
            ToolkitError::NotFound(_) => StatusCode::NOT_FOUND,
            ToolkitError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ToolkitError::UnsupportedFileType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ToolkitError::Transport(_) | ToolkitError::Relay(_) => StatusCode::BAD_GATEWAY,
            ToolkitError::DestinationUnavailable { .. }
            | ToolkitError::WriteFailed { .. }
            | ToolkitError::Config(_)
            | ToolkitError::InvalidRelayRequest(_)
            | ToolkitError::Io(_)
            | ToolkitError::Json(_)
            | ToolkitError::Http(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
