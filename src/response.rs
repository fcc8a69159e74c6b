//! Response helpers.

use crate::error::AppError;
use axum::{
    http::{header::LOCATION, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// `201 Created` with a `Location` header and a JSON body.
pub fn created_at<T: Serialize>(location: &str, body: T) -> Result<Response, AppError> {
    let location = HeaderValue::from_str(location)
        .map_err(|_| AppError::BadRequest(format!("cannot use '{}' as a Location header", location)))?;
    Ok((StatusCode::CREATED, [(LOCATION, location)], Json(body)).into_response())
}
