use std::convert::Infallible;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use smn_toolkit::sys_fileapi::handlers::{handler_download, handler_upload, handler_upload_one};
use smn_toolkit::sys_jsonapi::handlers::error_response;
use smn_toolkit::{JsonResponse, ToolkitError, ToolkitResult, Tools, ToolsConfig};

struct AppState {
    tools: Tools,
    upload_dir: PathBuf,
    relay_uri: Option<String>,
}

#[derive(Deserialize)]
struct SlugRequest {
    text: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("smn_toolkit=info")),
        )
        .init();

    let config = match ToolsConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let port = env::var("TOOLKIT_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);
    let state = Arc::new(AppState {
        tools: Tools::new(config),
        upload_dir: env::var("TOOLKIT_UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("uploads")),
        relay_uri: env::var("TOOLKIT_RELAY_URI").ok(),
    });

    run_server(port, state).await;
}

async fn run_server(port: u16, state: Arc<AppState>) {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let make_svc = make_service_fn(move |_conn| {
        let state = state.clone();
        async move { Ok::<_, Infallible>(service_fn(move |req| route(state.clone(), req))) }
    });

    tracing::info!(%addr, "listening");
    if let Err(e) = Server::bind(&addr).serve(make_svc).await {
        tracing::error!(error = %e, "server error");
    }
}

async fn route(state: Arc<AppState>, req: Request<Body>) -> Result<Response<Body>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let rename = req
        .uri()
        .query()
        .is_some_and(|q| q.split('&').any(|p| p == "rename=1" || p == "rename=true"));
    let tools = &state.tools;

    let response = match (method, path.as_str()) {
        (Method::POST, "/upload") => {
            handler_upload(&tools.config, req, &state.upload_dir, rename).await
        }
        (Method::POST, "/upload/one") => {
            handler_upload_one(&tools.config, req, &state.upload_dir, rename).await
        }
        (Method::GET, p) if p.starts_with("/files/") => {
            handler_download(&state.upload_dir, &p["/files/".len()..]).await
        }
        (Method::POST, "/slug") => reply(handle_slug(tools, req).await),
        (Method::POST, "/echo") => reply(handle_echo(tools, req).await),
        (Method::POST, "/relay") => reply(handle_relay(&state, req).await),
        _ => error_response(&ToolkitError::NotFound(path.clone())),
    };
    Ok(response)
}

fn reply(result: ToolkitResult<Response<Body>>) -> Response<Body> {
    result.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "request failed");
        error_response(&e)
    })
}

async fn handle_slug(tools: &Tools, req: Request<Body>) -> ToolkitResult<Response<Body>> {
    let body: SlugRequest = tools.read_json(req).await?;
    let slug = tools.slugify(&body.text)?;
    tools.write_json(
        StatusCode::OK,
        &JsonResponse::ok("slug created", Some(serde_json::json!({ "slug": slug }))),
        None,
    )
}

async fn handle_echo(tools: &Tools, req: Request<Body>) -> ToolkitResult<Response<Body>> {
    let body: serde_json::Value = tools.read_json(req).await?;
    tools.write_json(StatusCode::OK, &JsonResponse::ok("received", Some(body)), None)
}

async fn handle_relay(state: &AppState, req: Request<Body>) -> ToolkitResult<Response<Body>> {
    let uri = state
        .relay_uri
        .as_deref()
        .ok_or_else(|| ToolkitError::Config("TOOLKIT_RELAY_URI is not set".to_string()))?;
    let body: serde_json::Value = state.tools.read_json(req).await?;
    let (_response, status) = state.tools.relay_json(uri, &body).await?;
    state.tools.write_json(
        StatusCode::OK,
        &JsonResponse::ok(
            "relayed",
            Some(serde_json::json!({ "status": status.as_u16() })),
        ),
        None,
    )
}
