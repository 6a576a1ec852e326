//! Toolkit configuration: explicit defaults plus optional environment overrides.

use std::env;

use crate::error::{ToolkitError, ToolkitResult};

/// Ceiling on a whole multipart body when nothing else is configured (1 GiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 1024 * 1024 * 1024;

/// Ceiling on a JSON request body when nothing else is configured (1 MiB).
pub const DEFAULT_MAX_JSON_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolsConfig {
    /// Maximum size of a full multipart body, in bytes.
    pub max_upload_bytes: u64,
    /// Sniffed content types accepted by uploads.
    ///
    /// An empty list accepts every content type. Matching is a case-insensitive
    /// comparison against the whole sniffed value, so `text/plain` does not
    /// match `text/plain; charset=utf-8`.
    pub allowed_types: Vec<String>,
    /// Maximum size of a JSON request body, in bytes.
    pub max_json_bytes: usize,
    /// Accept JSON object keys the target type does not declare.
    pub allow_unknown_fields: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_types: Vec::new(),
            max_json_bytes: DEFAULT_MAX_JSON_BYTES,
            allow_unknown_fields: false,
        }
    }
}

impl ToolsConfig {
    /// Build a config from `TOOLKIT_*` environment variables, keeping the
    /// default for every variable that is not set.
    pub fn from_env() -> ToolkitResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ToolsConfig::from_env`] with a caller-supplied variable source.
    pub fn from_lookup<F>(lookup: F) -> ToolkitResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("TOOLKIT_MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = parse_limit("TOOLKIT_MAX_UPLOAD_BYTES", &raw)?;
        }
        if let Some(raw) = lookup("TOOLKIT_MAX_JSON_BYTES") {
            let limit = parse_limit("TOOLKIT_MAX_JSON_BYTES", &raw)?;
            config.max_json_bytes = usize::try_from(limit).map_err(|_| {
                ToolkitError::Config(format!("TOOLKIT_MAX_JSON_BYTES is out of range: {raw}"))
            })?;
        }
        if let Some(raw) = lookup("TOOLKIT_ALLOWED_TYPES") {
            config.allowed_types = raw
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(raw) = lookup("TOOLKIT_ALLOW_UNKNOWN_FIELDS") {
            config.allow_unknown_fields = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(ToolkitError::Config(format!(
                        "TOOLKIT_ALLOW_UNKNOWN_FIELDS must be a boolean, got {raw:?}"
                    )));
                }
            };
        }

        Ok(config)
    }
}

fn parse_limit(name: &str, raw: &str) -> ToolkitResult<u64> {
    let limit: u64 = raw
        .trim()
        .parse()
        .map_err(|e| ToolkitError::Config(format!("{name} must be a byte count: {e}")))?;
    if limit == 0 {
        return Err(ToolkitError::Config(format!("{name} must be greater than zero")));
    }
    Ok(limit)
}
