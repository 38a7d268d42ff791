use axum::{
    Router,
    body::Body,
    http::{HeaderName, HeaderValue, Request, StatusCode},
};
use std::time::Duration;
use tower_http::{
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{Span, debug, info, warn};

use crate::utils::generate_request_id;

/// Header carrying the per-request correlation id
pub fn request_id_header() -> HeaderName {
    HeaderName::from_static("x-request-id")
}

/// Request id generator for requests arriving without one
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomRequestId;

impl MakeRequestId for RandomRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&generate_request_id())
            .ok()
            .map(RequestId::new)
    }
}

/// Assign, trace and echo a request id around every request
///
/// At runtime the id is set first, the trace span reads it, and the
/// response carries it back in `x-request-id`.
pub fn with_request_tracing(router: Router) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(request_span)
        .on_request(|request: &Request<Body>, _span: &Span| {
            debug!(method = %request.method(), "HTTP request started");
        })
        .on_response(
            |response: &axum::http::Response<_>, latency: Duration, span: &Span| {
                span.record("status", response.status().as_u16());
                log_outcome(response.status(), latency);
            },
        );
    router
        .layer(PropagateRequestIdLayer::new(request_id_header()))
        .layer(trace_layer)
        .layer(SetRequestIdLayer::new(request_id_header(), RandomRequestId))
}

fn request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(request_id_header())
        .and_then(|v| v.to_str().ok())
        .unwrap_or("n/a");
    tracing::info_span!(
        "http_request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
        status = tracing::field::Empty,
    )
}

fn log_outcome(status: StatusCode, latency: Duration) {
    if status.is_client_error() || status.is_server_error() {
        warn!(status = status.as_u16(), ?latency, "HTTP request failed");
    } else {
        info!(status = status.as_u16(), ?latency, "HTTP request completed");
    }
}
