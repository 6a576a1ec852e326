//! `Tools`: the configured toolkit object handed to request handlers.

use std::path::Path;

use hyper::header::HeaderMap;
use hyper::{Body, Request, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::ToolsConfig;
use crate::error::ToolkitResult;
use crate::sys_fileapi::UploadedFile;
use crate::sys_fileapi::handlers as fileapi;
use crate::sys_jsonapi::JsonTransport;
use crate::sys_jsonapi::handlers as jsonapi;
use crate::sys_util;

#[derive(Debug, Clone, Default)]
pub struct Tools {
    pub config: ToolsConfig,
}

impl Tools {
    pub fn new(config: ToolsConfig) -> Self {
        Self { config }
    }

    /// Store every file of a multipart request under `upload_dir`.
    ///
    /// With `rename` set, files are stored under a 25-character random token
    /// plus the original extension.
    pub async fn upload_files(
        &self,
        req: Request<Body>,
        upload_dir: impl AsRef<Path>,
        rename: bool,
    ) -> ToolkitResult<Vec<UploadedFile>> {
        fileapi::upload_files(&self.config, req, upload_dir.as_ref(), rename).await
    }

    /// First file of [`Tools::upload_files`]; `NoFileFound` when the form held none.
    pub async fn upload_one_file(
        &self,
        req: Request<Body>,
        upload_dir: impl AsRef<Path>,
        rename: bool,
    ) -> ToolkitResult<UploadedFile> {
        fileapi::upload_one_file(&self.config, req, upload_dir.as_ref(), rename).await
    }

    pub async fn download_static_file(
        &self,
        file_path: impl AsRef<Path>,
        display_name: &str,
    ) -> ToolkitResult<Response<Body>> {
        fileapi::download_static_file(file_path.as_ref(), display_name).await
    }

    /// Decode the request body using the configured size limit and unknown-field policy.
    pub async fn read_json<T>(&self, req: Request<Body>) -> ToolkitResult<T>
    where
        T: DeserializeOwned,
    {
        jsonapi::read_json(
            req,
            self.config.max_json_bytes,
            self.config.allow_unknown_fields,
        )
        .await
    }

    pub fn write_json<T: Serialize + ?Sized>(
        &self,
        status: StatusCode,
        payload: &T,
        headers: Option<&HeaderMap>,
    ) -> ToolkitResult<Response<Body>> {
        jsonapi::write_json(status, payload, headers)
    }

    pub fn error_json<E: std::fmt::Display + ?Sized>(
        &self,
        err: &E,
        status: Option<StatusCode>,
    ) -> ToolkitResult<Response<Body>> {
        jsonapi::error_json_with_status(err, status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR))
    }

    /// POST `payload` to `uri` over a fresh rustls-backed client.
    pub async fn relay_json<T: Serialize + ?Sized>(
        &self,
        uri: &str,
        payload: &T,
    ) -> ToolkitResult<(Response<Body>, StatusCode)> {
        jsonapi::relay_json(uri, payload).await
    }

    pub async fn relay_json_with<C, T>(
        &self,
        client: &C,
        uri: &str,
        payload: &T,
    ) -> ToolkitResult<(Response<Body>, StatusCode)>
    where
        C: JsonTransport + ?Sized,
        T: Serialize + ?Sized,
    {
        jsonapi::relay_json_with(client, uri, payload).await
    }

    pub async fn create_dir_if_not_exist(&self, path: impl AsRef<Path>) -> ToolkitResult<()> {
        sys_util::ensure_dir(path).await
    }

    pub fn slugify(&self, s: &str) -> ToolkitResult<String> {
        sys_util::slugify(s)
    }

    pub fn random_string(&self, n: usize) -> String {
        sys_util::random_string(n)
    }
}
