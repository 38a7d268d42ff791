use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use metrics::counter;
use serde_json::{Value, json};
use std::any::Any;
use tracing::{error, info, warn};

use crate::bmi::{self, BmiError, BmiRequest, BmiResult};
use crate::server::routes::{ApiRouter, AppState, RouteTable};

/// Register every API route
pub fn routes() -> ApiRouter {
    ApiRouter::new()
        .get("/", home)
        .get("/routes", list_routes)
        .get("/test", test)
        .post("/calculate-bmi", calculate_bmi)
}

/// Build the API router with JSON fallbacks for unmatched requests
pub fn router(api: ApiRouter) -> Router {
    api.into_router()
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
}

/// Service status and usage hint
async fn home() -> Json<Value> {
    Json(json!({
        "status": "API is running",
        "message": "Use the /calculate-bmi endpoint to calculate BMI",
        "endpoints": {
            "bmi": "/calculate-bmi (POST)",
            "routes": "/routes (GET) - Debugging"
        }
    }))
}

/// List every registered route with its accepted methods
async fn list_routes(State(routes): State<AppState>) -> Json<RouteTable> {
    Json(routes.as_ref().clone())
}

/// Liveness probe
async fn test() -> Json<Value> {
    Json(json!({ "message": "Test route is working!" }))
}

/// Validate the request body and compute the BMI
async fn calculate_bmi(body: Bytes) -> Result<Json<BmiResult>, BmiError> {
    counter!("bmi_api.total_requests").increment(1);
    let result = BmiRequest::from_body(&body).and_then(bmi::calculate);
    match &result {
        Ok(result) => {
            counter!("bmi_api.total_calculations").increment(1);
            info!(
                "BMI calculated successfully: {:.2} ({})",
                result.bmi, result.category
            );
        }
        Err(BmiError::Internal(details)) => {
            counter!("bmi_api.total_errors").increment(1);
            counter!("bmi_api.total_internal_errors").increment(1);
            error!("Internal server error: {details}");
        }
        Err(e) => {
            counter!("bmi_api.total_errors").increment(1);
            warn!(error = %e, "Rejected BMI request");
        }
    }
    result.map(Json)
}

/// Unknown paths
async fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}

/// Known paths with an unsupported method
async fn method_not_allowed() -> (StatusCode, Json<Value>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "Method not allowed" })),
    )
}

/// Convert a handler panic into an internal error response
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic message".to_string()
    };
    counter!("bmi_api.total_errors").increment(1);
    counter!("bmi_api.total_internal_errors").increment(1);
    error!("Internal server error: {details}");
    BmiError::Internal(details).into_response()
}
