use std::io::ErrorKind;
use std::path::Path;

use tokio::fs;

use crate::error::{ToolkitError, ToolkitResult};

#[cfg(unix)]
const DIR_MODE: u32 = 0o755;

/// Make sure `path` exists as a directory, creating it and any missing parents.
///
/// Succeeds silently when the directory is already there.
pub async fn ensure_dir(path: impl AsRef<Path>) -> ToolkitResult<()> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(ToolkitError::EmptyInput("path"));
    }

    match fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(ToolkitError::DestinationUnavailable {
            path: path.to_path_buf(),
            reason: "path exists and is not a directory".to_string(),
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => create_dir_all(path).await,
        Err(e) => Err(ToolkitError::DestinationUnavailable {
            path: path.to_path_buf(),
            reason: format!("stat failed: {e}"),
        }),
    }
}

async fn create_dir_all(path: &Path) -> ToolkitResult<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(DIR_MODE);

    builder
        .create(path)
        .await
        .map_err(|e| ToolkitError::DestinationUnavailable {
            path: path.to_path_buf(),
            reason: format!("create failed: {e}"),
        })?;

    tracing::debug!(path = %path.display(), "Created destination directory");
    Ok(())
}
