//! Standalone greeting and arithmetic routes.

use crate::error::AppError;
use crate::extractors::ValidJson;
use axum::{extract::Path, Json};
use serde::{Deserialize, Serialize};
use serde_json::Number;

#[derive(Debug, Deserialize)]
pub struct SumRequest {
    pub values: Vec<Number>,
}

#[derive(Debug, Serialize)]
pub struct SumResponse {
    pub result: Number,
}

pub async fn hello_world() -> &'static str {
    "Hello World!"
}

pub async fn hello(Path(name): Path<String>) -> String {
    format!("Hello {}", name)
}

pub async fn sum(ValidJson(req): ValidJson<SumRequest>) -> Result<Json<SumResponse>, AppError> {
    let result = add_numbers(&req.values)
        .ok_or_else(|| AppError::Validation("sum is not a finite number".into()))?;
    Ok(Json(SumResponse { result }))
}

/// Integers add exactly as `i64`; a float input or an overflow switches to `f64`. A float
/// sum with no fractional part that fits in `i64` is reported as an integer.
/// `None` when the float sum is not finite.
pub fn add_numbers(values: &[Number]) -> Option<Number> {
    let exact = values
        .iter()
        .try_fold(0i64, |acc, n| n.as_i64().and_then(|v| acc.checked_add(v)));
    match exact {
        Some(total) => Some(Number::from(total)),
        None => {
            let total: f64 = values.iter().filter_map(Number::as_f64).sum();
            if total.fract() == 0.0 && total >= i64::MIN as f64 && total < i64::MAX as f64 {
                return Some(Number::from(total as i64));
            }
            Number::from_f64(total)
        }
    }
}
