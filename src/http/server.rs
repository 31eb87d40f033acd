//! HTTP server setup and proxy dispatch.
//!
//! # Responsibilities
//! - Create the Axum router with the catch-all proxy handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Match requests against the live route table
//! - Run filter chains and dispatch by backend kind
//!
//! # Design Decisions
//! - The route table snapshot is loaded once per request; updates swapped
//!   in by the store never block request processing
//! - Loopback routes re-enter matching with the filtered request, bounded
//!   by `timeouts.max_loopback_depth`
//! - A shunted route that no filter served yields an empty 404

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::GatewayConfig;
use crate::filters::FilterContext;
use crate::http::request::{request_id, RequestIdLayer};
use crate::observability::metrics;
use crate::routex::BackendType;
use crate::routing::{CompiledRoute, RouteStore};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RouteStore>,
    pub client: Client<HttpConnector, Body>,
    pub config: Arc<GatewayConfig>,
}

impl AppState {
    pub fn new(config: Arc<GatewayConfig>, store: Arc<RouteStore>) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            store,
            client,
            config,
        }
    }
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server over the shared route store.
    pub fn new(state: AppState) -> Self {
        let timeout = Duration::from_secs(state.config.timeouts.request_secs);
        let router = Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(timeout))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http());
        Self { router }
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler: match, filter, dispatch.
#[axum::debug_handler]
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let id = request_id(&request).to_string();
    let method = request.method().to_string();

    let table = state.store.table();
    let mut request = request;

    for _depth in 0..=state.config.timeouts.max_loopback_depth {
        let Some(route) = table.match_request(&request) else {
            tracing::debug!(request_id = %id, path = %request.uri().path(), "no route matched");
            metrics::record_request(&method, 404, "none", start);
            return (StatusCode::NOT_FOUND, "no matching route").into_response();
        };

        tracing::debug!(
            request_id = %id,
            route_id = %route.route.id,
            backend = ?route.route.backend_type,
            "route matched"
        );

        let mut ctx = FilterContext::new(request);
        for filter in &route.filters {
            filter.on_request(&mut ctx);
            if ctx.is_served() {
                break;
            }
        }

        if ctx.is_served() {
            return finish(ctx, route, &method, &id, start);
        }

        match route.route.backend_type {
            BackendType::Loopback => {
                request = ctx.into_request();
                continue;
            }
            BackendType::Shunt => {
                ctx.set_response((StatusCode::NOT_FOUND, Body::empty()).into_response());
                return finish(ctx, route, &method, &id, start);
            }
            BackendType::Network => {
                // Move the body out for the upstream request; the context
                // keeps the request metadata for response hooks.
                let body = std::mem::replace(ctx.request_mut().body_mut(), Body::empty());
                let original = ctx.request();
                let (req_method, req_uri, req_headers) = (
                    original.method().clone(),
                    original.uri().clone(),
                    original.headers().clone(),
                );
                let response = forward(
                    &state,
                    &route.route.backend,
                    &id,
                    req_method,
                    req_uri,
                    req_headers,
                    body,
                )
                .await;
                ctx.set_response(response);
                return finish(ctx, route, &method, &id, start);
            }
        }
    }

    tracing::warn!(request_id = %id, "loopback depth exceeded");
    metrics::record_request(&method, 508, "loopback", start);
    (StatusCode::LOOP_DETECTED, "loopback depth exceeded").into_response()
}

/// Runs response hooks in reverse order and records metrics.
fn finish(
    mut ctx: FilterContext,
    route: &CompiledRoute,
    method: &str,
    id: &str,
    start: Instant,
) -> Response {
    for filter in route.filters.iter().rev() {
        filter.on_response(&mut ctx);
    }

    let response = ctx
        .take_response()
        .unwrap_or_else(|| StatusCode::INTERNAL_SERVER_ERROR.into_response());

    tracing::debug!(
        request_id = %id,
        route_id = %route.route.id,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "request finished"
    );
    metrics::record_request(method, response.status().as_u16(), &route.route.id, start);
    response
}

/// Forwards the request to a network backend.
async fn forward(
    state: &AppState,
    backend: &str,
    id: &str,
    method: axum::http::Method,
    original_uri: Uri,
    original_headers: axum::http::HeaderMap,
    body: Body,
) -> Response {
    let Some(uri) = backend_uri(backend, &original_uri) else {
        tracing::error!(request_id = %id, backend = %backend, "invalid backend address");
        return (StatusCode::BAD_GATEWAY, "invalid backend address").into_response();
    };

    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(headers) = builder.headers_mut() {
        for (k, v) in &original_headers {
            if k != header::HOST {
                headers.insert(k.clone(), v.clone());
            }
        }
    }

    // The body streams through unbuffered.
    let request = match builder.body(body) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(request_id = %id, error = %e, "failed to build upstream request");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match state.client.request(request).await {
        Ok(response) => {
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(request_id = %id, error = %e, "upstream request failed");
            (StatusCode::BAD_GATEWAY, "upstream request failed").into_response()
        }
    }
}

/// Joins the backend's scheme and authority with the request's path and
/// query.
fn backend_uri(backend: &str, request_uri: &Uri) -> Option<Uri> {
    let parsed = url::Url::parse(backend).ok()?;
    let host = parsed.host_str()?;
    let authority = match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    let path_and_query = request_uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    Uri::builder()
        .scheme(parsed.scheme())
        .authority(authority)
        .path_and_query(path_and_query)
        .build()
        .ok()
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        return;
    }
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_uri_join() {
        let request_uri: Uri = "/api/v1?x=1".parse().unwrap();
        let uri = backend_uri("http://backend.local:3000", &request_uri).unwrap();
        assert_eq!(uri.to_string(), "http://backend.local:3000/api/v1?x=1");
    }

    #[test]
    fn test_backend_uri_without_port() {
        let request_uri: Uri = "/".parse().unwrap();
        let uri = backend_uri("https://example.org/base-ignored", &request_uri).unwrap();
        assert_eq!(uri.to_string(), "https://example.org/");
    }

    #[test]
    fn test_invalid_backend_rejected() {
        let request_uri: Uri = "/".parse().unwrap();
        assert!(backend_uri("not a url", &request_uri).is_none());
    }
}
