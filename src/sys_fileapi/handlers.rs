//! HTTP glue: take hyper requests into the upload pipeline and turn results
//! into `Response<Body>`.

use std::io::ErrorKind;
use std::path::Path;

use hyper::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{Body, Request, Response, StatusCode};
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use crate::config::ToolsConfig;
use crate::error::{ToolkitError, ToolkitResult};
use crate::sys_fileapi::core::{UploadedFile, store_files};
use crate::sys_fileapi::form::{MultipartForm, parse_boundary, parse_multipart};
use crate::sys_jsonapi::handlers::{error_response, write_json};

/// Parse the multipart body of `req`, bounded by `max_bytes`.
pub async fn read_multipart(req: Request<Body>, max_bytes: u64) -> ToolkitResult<MultipartForm> {
    let content_type = req.headers().get(CONTENT_TYPE).and_then(|h| h.to_str().ok());
    let boundary = parse_boundary(content_type)?;

    let declared = req
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if declared.is_some_and(|len| len > max_bytes) {
        return Err(ToolkitError::PayloadTooLarge { limit: max_bytes });
    }

    parse_multipart(req.into_body(), boundary, max_bytes).await
}

/// Store every file of a multipart request under `upload_dir`.
pub async fn upload_files(
    config: &ToolsConfig,
    req: Request<Body>,
    upload_dir: &Path,
    rename: bool,
) -> ToolkitResult<Vec<UploadedFile>> {
    let form = read_multipart(req, config.max_upload_bytes).await?;
    store_files(form, upload_dir, rename, &config.allowed_types).await
}

/// Like [`upload_files`] but returns only the first stored file.
pub async fn upload_one_file(
    config: &ToolsConfig,
    req: Request<Body>,
    upload_dir: &Path,
    rename: bool,
) -> ToolkitResult<UploadedFile> {
    upload_files(config, req, upload_dir, rename)
        .await?
        .into_iter()
        .next()
        .ok_or(ToolkitError::NoFileFound)
}

/// Stream `file_path` back as an attachment named `display_name`.
pub async fn download_static_file(
    file_path: &Path,
    display_name: &str,
) -> ToolkitResult<Response<Body>> {
    let file = match File::open(file_path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ToolkitError::NotFound(display_name.to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    let meta = file.metadata().await?;
    if !meta.is_file() {
        return Err(ToolkitError::NotFound(display_name.to_string()));
    }

    let mime = mime_guess::from_path(display_name).first_or_octet_stream();
    let disposition = format!(
        "attachment; filename=\"{}\"",
        display_name.replace('\\', "\\\\").replace('"', "\\\"")
    );

    tracing::info!(
        path = %file_path.display(),
        size_bytes = meta.len(),
        "Serving download"
    );

    let response = Response::builder()
        .header(CONTENT_DISPOSITION, disposition)
        .header(CONTENT_TYPE, mime.as_ref())
        .header(CONTENT_LENGTH, meta.len())
        .body(Body::wrap_stream(ReaderStream::new(file)))?;
    Ok(response)
}

pub async fn handler_upload(
    config: &ToolsConfig,
    req: Request<Body>,
    upload_dir: &Path,
    rename: bool,
) -> Response<Body> {
    match upload_files(config, req, upload_dir, rename).await {
        Ok(files) => json_or_500(StatusCode::CREATED, &files),
        Err(e) => {
            tracing::error!(error = %e, "upload error");
            error_response(&e)
        }
    }
}

pub async fn handler_upload_one(
    config: &ToolsConfig,
    req: Request<Body>,
    upload_dir: &Path,
    rename: bool,
) -> Response<Body> {
    match upload_one_file(config, req, upload_dir, rename).await {
        Ok(file) => json_or_500(StatusCode::CREATED, &file),
        Err(e) => {
            tracing::error!(error = %e, "upload error");
            error_response(&e)
        }
    }
}

pub async fn handler_download(upload_dir: &Path, filename: &str) -> Response<Body> {
    // only plain names are served out of the upload directory
    let name = match crate::sys_fileapi::filename::sanitize_stored_name(filename) {
        Ok(name) if name == filename => name,
        _ => return error_response(&ToolkitError::NotFound(filename.to_string())),
    };

    match download_static_file(&upload_dir.join(&name), &name).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(error = %e, "download error");
            error_response(&e)
        }
    }
}

fn json_or_500<T: serde::Serialize + ?Sized>(status: StatusCode, payload: &T) -> Response<Body> {
    write_json(status, payload, None).unwrap_or_else(|e| {
        tracing::error!(error = %e, "json error");
        error_response(&e)
    })
}
