//! HTTP glue for JSON: bounded body reads, replies, the error envelope and relaying.

use std::fmt::Display;

use bytes::{Bytes, BytesMut};
use hyper::body::HttpBody;
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderValue};
use hyper::{Body, Method, Request, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ToolkitError, ToolkitResult};
use crate::sys_jsonapi::core::{JsonResponse, decode_json};
use crate::sys_jsonapi::transport::{HttpsTransport, JsonTransport};

const APPLICATION_JSON: &str = "application/json";

/// Read a request body into memory, failing once it grows past `limit` bytes.
pub async fn read_body_limited(req: Request<Body>, limit: usize) -> ToolkitResult<Bytes> {
    let too_large = || ToolkitError::PayloadTooLarge {
        limit: limit as u64,
    };

    let declared = req
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if declared.is_some_and(|len| len > limit as u64) {
        return Err(too_large());
    }

    let mut body = req.into_body();
    let mut buf = BytesMut::new();
    while let Some(chunk) = body.data().await {
        let chunk = chunk?;
        if buf.len() + chunk.len() > limit {
            return Err(too_large());
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}

/// Decode a request body holding exactly one JSON value into `T`.
pub async fn read_json<T>(
    req: Request<Body>,
    max_bytes: usize,
    allow_unknown_fields: bool,
) -> ToolkitResult<T>
where
    T: DeserializeOwned,
{
    let body = read_body_limited(req, max_bytes).await?;
    decode_json(&body, allow_unknown_fields)
}

/// Copy `extra` into `target`; for every header name in `extra` its values
/// replace whatever `target` held.
pub fn merge_headers(target: &mut HeaderMap, extra: &HeaderMap) {
    for name in extra.keys() {
        target.remove(name);
        for value in extra.get_all(name) {
            target.append(name.clone(), value.clone());
        }
    }
}

/// Serialize `payload` into a JSON response with the given status.
pub fn write_json<T>(
    status: StatusCode,
    payload: &T,
    headers: Option<&HeaderMap>,
) -> ToolkitResult<Response<Body>>
where
    T: Serialize + ?Sized,
{
    let body = serde_json::to_vec(payload)?;

    let mut response = Response::builder().status(status).body(Body::from(body))?;
    if let Some(extra) = headers {
        merge_headers(response.headers_mut(), extra);
    }
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
    Ok(response)
}

/// Wrap `err` in the `{error: true, message}` envelope with status 500.
pub fn error_json<E: Display + ?Sized>(err: &E) -> ToolkitResult<Response<Body>> {
    error_json_with_status(err, StatusCode::INTERNAL_SERVER_ERROR)
}

pub fn error_json_with_status<E: Display + ?Sized>(
    err: &E,
    status: StatusCode,
) -> ToolkitResult<Response<Body>> {
    write_json(status, &JsonResponse::error(err.to_string()), None)
}

/// Turn a toolkit error into its envelope, using the error's own status.
pub fn error_response(err: &ToolkitError) -> Response<Body> {
    match error_json_with_status(err, err.status_code()) {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode error response");
            let mut response = Response::new(Body::from("Internal Server Error"));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        }
    }
}

/// POST `payload` as JSON to `uri` with a default client that speaks `http` and `https`.
pub async fn relay_json<T>(uri: &str, payload: &T) -> ToolkitResult<(Response<Body>, StatusCode)>
where
    T: Serialize + ?Sized,
{
    let client = HttpsTransport::new()?;
    relay_json_with(&client, uri, payload).await
}

/// POST `payload` as JSON to `uri` through `client`.
///
/// The response body is left unread for the caller.
pub async fn relay_json_with<C, T>(
    client: &C,
    uri: &str,
    payload: &T,
) -> ToolkitResult<(Response<Body>, StatusCode)>
where
    C: JsonTransport + ?Sized,
    T: Serialize + ?Sized,
{
    let body = serde_json::to_vec(payload)?;
    let req = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, APPLICATION_JSON)
        .body(Body::from(body))?;

    let response = client.send(req).await?;
    let status = response.status();
    tracing::debug!(uri = %uri, status = %status, "Relayed JSON payload");
    Ok((response, status))
}
