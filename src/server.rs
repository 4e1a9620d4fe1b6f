//! HTTP surface of the gateway
//!
//! One GET route per feed plus a liveness probe. Feed handlers go through the
//! [`ReadThroughGate`] and relay the upstream body bytes and content type
//! unchanged, so a declared non-UTF-8 charset still matches the payload;
//! failures are translated into responses here and nowhere else.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::cache::{Lookup, ReadThroughGate, TtlCache};
use crate::config::GatewayConfig;
use crate::error::FetchFailure;
use crate::feeds::{build_feeds, Feed, FeedKind};

/// Response header reporting HIT, MISS, or STALE
pub const CACHE_STATUS_HEADER: HeaderName = HeaderName::from_static("x-cache-status");

/// JSON body for transport and configuration failures
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    detail: String,
}

/// A failed feed request, rendered as an HTTP response
#[derive(Debug)]
pub struct FeedError {
    pub kind: FeedKind,
    pub failure: FetchFailure,
}

impl IntoResponse for FeedError {
    fn into_response(self) -> Response {
        match self.failure {
            FetchFailure::Upstream { status, body } => {
                let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
                (status, [(header::CONTENT_TYPE, "text/plain")], body).into_response()
            }
            failure => {
                let body = ErrorBody {
                    error: self.kind.failure_label(),
                    detail: failure.to_string(),
                };
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

/// Builds the router from configuration, owning a fresh cache
///
/// # Returns
/// * `Err(reqwest::Error)` if the shared upstream client cannot be built
pub fn router_from_config(config: &GatewayConfig) -> Result<Router, reqwest::Error> {
    let gate = ReadThroughGate::new(Arc::new(TtlCache::new()))
        .with_stale_on_error(config.serve_stale_on_error);
    let feeds = build_feeds(config)?;
    Ok(build_router(gate, feeds, &config.allowed_origins))
}

/// Builds the router over an existing gate and feed set
pub fn build_router(
    gate: ReadThroughGate,
    feeds: Vec<Arc<dyn Feed>>,
    allowed_origins: &[String],
) -> Router {
    let mut router = Router::new().route("/health", get(health));

    for feed in feeds {
        let route = feed.kind().route();
        info!(route, ttl = ?feed.ttl(), "registering feed");
        router = router.route(
            route,
            get(move |State(gate): State<ReadThroughGate>| {
                let feed = feed.clone();
                async move { serve_feed(&gate, feed.as_ref()).await }
            }),
        );
    }

    router
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(gate)
}

async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

async fn serve_feed(gate: &ReadThroughGate, feed: &dyn Feed) -> Response {
    let kind = feed.kind();
    match gate.lookup(kind.cache_key(), feed.ttl(), feed).await {
        Ok(lookup) => render(kind, lookup),
        Err(failure) => FeedError { kind, failure }.into_response(),
    }
}

/// Writes a cached or fetched result back out unchanged
fn render(kind: FeedKind, lookup: Lookup) -> Response {
    let status = StatusCode::from_u16(lookup.value.status_code).unwrap_or(StatusCode::OK);
    let content_type = lookup
        .value
        .content_type
        .as_deref()
        .and_then(|value| HeaderValue::from_str(value).ok())
        .unwrap_or_else(|| HeaderValue::from_static(kind.default_content_type()));

    (
        status,
        [
            (header::CONTENT_TYPE, content_type),
            (CACHE_STATUS_HEADER, HeaderValue::from_static(lookup.status.as_str())),
        ],
        lookup.value.body,
    )
        .into_response()
}

/// GET-only CORS grant for the configured origins
///
/// Requests without an `Origin` header are unaffected.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_origin(AllowOrigin::list(origins))
}
