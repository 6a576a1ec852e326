//! Core upload pipeline: no hyper types here.

use std::io::SeekFrom;
use std::path::Path;
use std::time::Instant;

use serde::Serialize;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

use crate::error::{ToolkitError, ToolkitResult};
use crate::sys_fileapi::filename::resolve_stored_name;
use crate::sys_fileapi::form::{MultipartForm, SpooledFile};
use crate::sys_fileapi::sniff::{SNIFF_LEN, detect_content_type, is_allowed};
use crate::sys_util::ensure_dir;

/// One file that was validated and fully written to the upload directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedFile {
    pub stored_name: String,
    pub original_name: String,
    pub byte_size: u64,
}

/// Write every file of `form` into `upload_dir`.
///
/// The directory is created first when missing. Files are handled one at a
/// time in submission order; the first failure aborts the batch. Files stored
/// before the failure stay on disk and are not reported.
pub async fn store_files(
    form: MultipartForm,
    upload_dir: &Path,
    rename: bool,
    allowed_types: &[String],
) -> ToolkitResult<Vec<UploadedFile>> {
    ensure_dir(upload_dir).await?;

    let mut uploaded = Vec::with_capacity(form.files.len());
    for spooled in form.files {
        uploaded.push(store_one(spooled, upload_dir, rename, allowed_types).await?);
    }
    Ok(uploaded)
}

async fn store_one(
    mut spooled: SpooledFile,
    upload_dir: &Path,
    rename: bool,
    allowed_types: &[String],
) -> ToolkitResult<UploadedFile> {
    let start = Instant::now();

    let head = read_head(&mut spooled).await?;
    let content_type = detect_content_type(&head);
    if !is_allowed(&content_type, allowed_types) {
        return Err(ToolkitError::UnsupportedFileType { content_type });
    }

    let stored_name = resolve_stored_name(&spooled.file_name, rename)?;
    tracing::debug!(
        field = %spooled.field_name,
        original = %spooled.file_name,
        stored = %stored_name,
        content_type = %content_type,
        "Accepted uploaded file"
    );

    let path = upload_dir.join(&stored_name);
    let mut out = fs::File::create(&path)
        .await
        .map_err(|source| ToolkitError::WriteFailed {
            path: path.clone(),
            source,
        })?;

    let byte_size = tokio::io::copy(&mut spooled.file, &mut out)
        .await
        .map_err(|source| ToolkitError::WriteFailed {
            path: path.clone(),
            source,
        })?;
    out.flush()
        .await
        .map_err(|source| ToolkitError::WriteFailed {
            path: path.clone(),
            source,
        })?;

    tracing::info!(
        path = %path.display(),
        size_bytes = byte_size,
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Stored uploaded file"
    );

    Ok(UploadedFile {
        stored_name,
        original_name: spooled.file_name,
        byte_size,
    })
}

/// First `SNIFF_LEN` bytes (fewer for short files), leaving the handle at offset 0.
async fn read_head(spooled: &mut SpooledFile) -> ToolkitResult<Vec<u8>> {
    let mut head = Vec::with_capacity(SNIFF_LEN);
    (&mut spooled.file)
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut head)
        .await?;
    spooled.file.seek(SeekFrom::Start(0)).await?;
    Ok(head)
}
