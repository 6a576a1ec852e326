//! Decides the name an uploaded file is stored under.

use crate::error::{ToolkitError, ToolkitResult};
use crate::sys_util::random_string;

/// Length of the random token used when renaming.
pub const RENAMED_TOKEN_LEN: usize = 25;

/// Extension of the last path element, dot included; empty when there is none.
pub fn file_extension(name: &str) -> &str {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match base.rfind('.') {
        Some(idx) => &base[idx..],
        None => "",
    }
}

/// Reduce a client-supplied name to a single safe path component.
///
/// Anything before the last `/` or `\` is dropped and the remainder goes
/// through `sanitize_filename`, so the result can be joined to the upload
/// directory without escaping it.
pub fn sanitize_stored_name(original: &str) -> ToolkitResult<String> {
    let base = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let sanitized = sanitize_filename::sanitize(base);
    if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        return Err(ToolkitError::InvalidFilename(original.to_string()));
    }
    Ok(sanitized)
}

/// Stored name for an upload: a fresh random token plus the original
/// extension when `rename` is set, otherwise the sanitized original name.
pub fn resolve_stored_name(original: &str, rename: bool) -> ToolkitResult<String> {
    let safe = sanitize_stored_name(original)?;
    if !rename {
        return Ok(safe);
    }
    Ok(format!(
        "{}{}",
        random_string(RENAMED_TOKEN_LEN),
        file_extension(&safe)
    ))
}
