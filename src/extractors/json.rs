//! JSON body extractor that reports decode failures in the service's error format.

use crate::error::AppError;
use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;

/// Like [`axum::Json`], but a body that is not valid JSON or does not match `T` is rejected with
/// a `validation_error` (422) before the handler runs.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidJson(value)),
            Err(rejection) => Err(match rejection {
                JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
                    AppError::Validation(rejection.body_text()).into_response()
                }
                JsonRejection::MissingJsonContentType(_) => {
                    AppError::BadRequest(rejection.body_text()).into_response()
                }
                // Body read failures (e.g. over the size limit) keep their own status.
                other => other.into_response(),
            }),
        }
    }
}
