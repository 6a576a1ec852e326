use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ToolkitError, ToolkitResult};

static NON_SLUG_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^a-z0-9]+").expect("slug pattern is valid")
});

/// Lowercase `s` and collapse every run of characters outside `[a-z0-9]` into
/// a single `-`, trimming dashes from both ends.
pub fn slugify(s: &str) -> ToolkitResult<String> {
    if s.is_empty() {
        return Err(ToolkitError::EmptyInput("string"));
    }

    let lowered = s.to_lowercase();
    let slug = NON_SLUG_CHARS.replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');

    if slug.is_empty() {
        return Err(ToolkitError::SlugEmptyResult);
    }
    Ok(slug.to_string())
}
