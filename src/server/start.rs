use anyhow::{Result, anyhow};
use axum::Router;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer};
use tracing::{error, info};

use crate::logs::init_logging_and_metrics;
use crate::server::http::{self, handle_panic};
use crate::server::trace::with_request_tracing;

/// Configuration for server startup
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub log_dir: PathBuf,
    pub log_file: String,
}

/// Start the HTTP API server based on the provided configuration
pub async fn start_server(config: ServerConfig) -> Result<()> {
    // Extract configuration values
    let ServerConfig {
        bind_address,
        log_dir,
        log_file,
    } = config;
    // Initialize structured logging and metrics
    let _guard = init_logging_and_metrics(&log_dir, &log_file)?;
    // Register the API routes
    let api = http::routes();
    // Output debugging information
    info!(
        bind_address = %bind_address,
        routes = ?api.routes().paths(),
        "Starting BMI API server"
    );
    // Create a TCP listener for the HTTP server
    let listener = TcpListener::bind(&bind_address).await.map_err(|e| {
        error!("Failed to start server: {e}");
        anyhow!("Failed to bind to address {bind_address}: {e}")
    })?;
    // Create the Axum router with the middleware stack
    let router = with_layers(http::router(api));
    // Serve the Axum router over HTTP
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to install Ctrl+C handler: {e}");
            }
        })
        .await?;
    // Output debugging information
    info!("BMI API server stopped");
    // All ok
    Ok(())
}

/// Wrap a router with panic recovery, request tracing and CORS
pub fn with_layers(router: Router) -> Router {
    // Create CORS layer allowing every origin on every route
    let cors_layer = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
        .allow_credentials(false);
    // Innermost first: panic recovery, request tracing, CORS
    let router = router.layer(CatchPanicLayer::custom(handle_panic));
    with_request_tracing(router).layer(cors_layer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode, header},
        routing::get,
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app() -> Router {
        with_layers(http::router(http::routes()))
    }

    #[tokio::test]
    async fn test_cors_headers_on_simple_request() {
        let request = Request::builder()
            .uri("/test")
            .header(header::ORIGIN, "http://localhost:3000")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/calculate-bmi")
            .header(header::ORIGIN, "http://localhost:3000")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
        assert!(
            response
                .headers()
                .contains_key(header::ACCESS_CONTROL_ALLOW_METHODS)
        );
    }

    #[tokio::test]
    async fn test_cors_headers_on_error_response() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/calculate-bmi")
            .header(header::ORIGIN, "http://localhost:3000")
            .body(Body::from(r#"{"weight": 70}"#))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }

    #[tokio::test]
    async fn test_panic_becomes_internal_error() {
        async fn explode() -> &'static str {
            panic!("handler exploded")
        }
        let app = with_layers(Router::new().route("/panic", get(explode)));

        let request = Request::builder()
            .uri("/panic")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().contains_key("x-request-id"));
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            json!({ "error": "Internal server error", "details": "handler exploded" })
        );
    }
}
