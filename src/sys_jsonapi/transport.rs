//! Outbound clients used to relay JSON to remote endpoints.

use async_trait::async_trait;
use hyper::client::connect::Connect;
use hyper::{Body, Client, Request, Response};

use crate::error::{ToolkitError, ToolkitResult};

/// Something that can send a prepared request and hand back the response.
#[async_trait]
pub trait JsonTransport: Send + Sync {
    async fn send(&self, req: Request<Body>) -> ToolkitResult<Response<Body>>;
}

#[async_trait]
impl<C> JsonTransport for Client<C, Body>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    async fn send(&self, req: Request<Body>) -> ToolkitResult<Response<Body>> {
        Ok(self.request(req).await?)
    }
}

/// Default relay client: reqwest over rustls, so `http` and `https` URIs both work.
#[derive(Debug, Clone)]
pub struct HttpsTransport {
    client: reqwest::Client,
}

impl HttpsTransport {
    pub fn new() -> ToolkitResult<Self> {
        let client = reqwest::Client::builder().use_rustls_tls().build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl JsonTransport for HttpsTransport {
    async fn send(&self, req: Request<Body>) -> ToolkitResult<Response<Body>> {
        let (parts, body) = req.into_parts();
        let method = reqwest::Method::from_bytes(parts.method.as_str().as_bytes())
            .map_err(|e| ToolkitError::InvalidRelayRequest(e.to_string()))?;
        let body = hyper::body::to_bytes(body).await?;

        let mut outbound = self
            .client
            .request(method, parts.uri.to_string())
            .body(body);
        for (name, value) in parts.headers.iter() {
            outbound = outbound.header(name.as_str(), value.as_bytes());
        }
        let upstream = outbound.send().await?;

        let mut response = Response::builder().status(upstream.status().as_u16());
        for (name, value) in upstream.headers() {
            response = response.header(name.as_str(), value.as_bytes());
        }
        // body stays a stream; the caller decides whether to read it
        Ok(response.body(Body::wrap_stream(upstream.bytes_stream()))?)
    }
}
