//! Free-form entries: batch create, read by key, list keys.

use crate::error::AppError;
use crate::extractors::ValidJson;
use crate::model::OneOrMany;
use crate::service::EntryService;
use crate::state::CollectionState;
use crate::store::Document;
use axum::{
    extract::{Path, State},
    Json,
};

/// POST /entries — one object or an array of objects.
pub async fn create(
    State(state): State<CollectionState>,
    ValidJson(body): ValidJson<OneOrMany>,
) -> Result<Json<OneOrMany>, AppError> {
    Ok(Json(EntryService::save(&state.items, body).await?))
}

/// GET /entries/:key
pub async fn detail(
    State(state): State<CollectionState>,
    Path(key): Path<String>,
) -> Result<Json<Document>, AppError> {
    Ok(Json(EntryService::read(&state.items, &key).await?))
}

/// GET /entries — keys only.
pub async fn keys(State(state): State<CollectionState>) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(EntryService::keys(&state.items).await?))
}
