//! Body Mass Index validation, computation and classification.
//!
//! A raw request body is turned into a [`BmiRequest`] by an ordered
//! validation chain that stops at the first failure, and a [`BmiRequest`]
//! is turned into a [`BmiResult`] by [`calculate`].

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

/// Lower bound of the normal weight range
const NORMAL_WEIGHT_MIN: f64 = 18.5;
/// Lower bound of the overweight range
const OVERWEIGHT_MIN: f64 = 25.0;
/// Lower bound of the obese range
const OBESE_MIN: f64 = 30.0;

/// Errors raised while validating or computing a BMI
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BmiError {
    #[error("Request body must be JSON")]
    InvalidRequest,
    #[error("Missing required fields: weight and height")]
    MissingFields,
    #[error("Invalid input: weight and height must be numbers")]
    InvalidInput,
    #[error("Weight and height must be positive numbers")]
    InvalidRange,
    #[error("Internal server error")]
    Internal(String),
}

impl BmiError {
    /// The HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            BmiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for BmiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            BmiError::Internal(details) => json!({
                "error": self.to_string(),
                "details": details,
            }),
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

/// A validated BMI calculation request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BmiRequest {
    /// Weight in kilograms
    pub weight: f64,
    /// Height in meters
    pub height: f64,
}

/// Weight status category derived from a BMI value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Category {
    Underweight,
    #[serde(rename = "Normal weight")]
    NormalWeight,
    Overweight,
    Obese,
}

impl Category {
    /// Classify a BMI value using half-open ranges with inclusive lower bounds
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < NORMAL_WEIGHT_MIN {
            Category::Underweight
        } else if bmi < OVERWEIGHT_MIN {
            Category::NormalWeight
        } else if bmi < OBESE_MIN {
            Category::Overweight
        } else {
            Category::Obese
        }
    }

    /// The human-readable category name
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Underweight => "Underweight",
            Category::NormalWeight => "Normal weight",
            Category::Overweight => "Overweight",
            Category::Obese => "Obese",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A computed BMI and its category
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BmiResult {
    /// BMI rounded to two decimal places
    pub bmi: f64,
    pub category: Category,
}

impl BmiRequest {
    /// Parse and validate a raw request body
    pub fn from_body(body: &[u8]) -> Result<Self, BmiError> {
        let value: Value = serde_json::from_slice(body).map_err(|_| BmiError::InvalidRequest)?;
        Self::from_json(&value)
    }

    /// Validate an already-parsed JSON document
    pub fn from_json(value: &Value) -> Result<Self, BmiError> {
        if is_falsy(value) {
            return Err(BmiError::InvalidRequest);
        }
        // Non-object documents carry no keys at all
        let (Some(weight), Some(height)) = (value.get("weight"), value.get("height")) else {
            return Err(BmiError::MissingFields);
        };
        let weight = coerce_number(weight)?;
        let height = coerce_number(height)?;
        if weight <= 0.0 || height <= 0.0 {
            return Err(BmiError::InvalidRange);
        }
        Ok(Self { weight, height })
    }
}

/// Compute the BMI and category for a validated request
pub fn calculate(request: BmiRequest) -> Result<BmiResult, BmiError> {
    let squared = request.height * request.height;
    if !squared.is_finite() {
        return Err(BmiError::Internal(
            "Numerical result out of range".to_string(),
        ));
    }
    if squared == 0.0 {
        return Err(BmiError::Internal("float division by zero".to_string()));
    }
    let bmi = request.weight / squared;
    if !bmi.is_finite() {
        return Err(BmiError::Internal(
            "BMI result is not a finite number".to_string(),
        ));
    }
    Ok(BmiResult {
        bmi: round2(bmi),
        category: Category::from_bmi(bmi),
    })
}

/// Round to two decimal places on the exact value of `value`
///
/// Exact halfway cases are the odd multiples of 1/8 and round to even.
/// Every other value is rounded by the float formatter, which works on
/// the exact binary value rather than a rescaled approximation.
pub fn round2(value: f64) -> f64 {
    let eighths = value * 8.0;
    if eighths.fract() == 0.0 && eighths % 2.0 != 0.0 {
        return (value * 100.0).round_ties_even() / 100.0;
    }
    format!("{value:.2}").parse().unwrap_or(value)
}

/// Coerce a JSON value into a finite number
///
/// Numbers are taken as-is and strings are parsed after trimming. Booleans,
/// nulls, arrays, objects and non-finite values are rejected.
fn coerce_number(value: &Value) -> Result<f64, BmiError> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number
        .filter(|n| n.is_finite())
        .ok_or(BmiError::InvalidInput)
}

/// Whether a JSON document counts as an empty body
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
