//! Resource CRUD handlers: list, create, detail, replace, update, delete.
//! Generic over [`Resource`] so people and todo share one implementation.

use crate::error::AppError;
use crate::extractors::ValidJson;
use crate::model::{to_document, Resource};
use crate::response::created_at;
use crate::service::CrudService;
use crate::state::CollectionState;
use crate::store::Document;
use axum::{
    extract::{OriginalUri, Path, State},
    http::{header::HOST, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};

pub async fn list(State(state): State<CollectionState>) -> Result<Json<Vec<Document>>, AppError> {
    Ok(Json(CrudService::list(&state.items).await?))
}

pub async fn create<R: Resource>(
    State(state): State<CollectionState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    ValidJson(body): ValidJson<R::Body>,
) -> Result<impl IntoResponse, AppError> {
    let doc = to_document(&body)?;
    let (meta, created) = CrudService::create(&state.items, doc).await?;
    let location = detail_url(state.public_base_url.as_deref(), &headers, uri.path(), &meta.key);
    created_at(&location, created)
}

pub async fn detail(
    State(state): State<CollectionState>,
    Path(key): Path<String>,
) -> Result<Json<Document>, AppError> {
    Ok(Json(CrudService::read(&state.items, &key).await?))
}

pub async fn replace<R: Resource>(
    State(state): State<CollectionState>,
    Path(key): Path<String>,
    ValidJson(body): ValidJson<R::Body>,
) -> Result<Json<Document>, AppError> {
    let doc = to_document(&body)?;
    Ok(Json(CrudService::replace(&state.items, &key, doc).await?))
}

pub async fn update(
    State(state): State<CollectionState>,
    Path(key): Path<String>,
    ValidJson(patch): ValidJson<Document>,
) -> Result<Json<Document>, AppError> {
    Ok(Json(CrudService::update(&state.items, &key, patch).await?))
}

pub async fn delete(
    State(state): State<CollectionState>,
    Path(key): Path<String>,
) -> Result<StatusCode, AppError> {
    CrudService::delete(&state.items, &key).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Absolute URL of the detail route for `key`, given the collection route the request came in on.
fn detail_url(base: Option<&str>, headers: &HeaderMap, collection_path: &str, key: &str) -> String {
    let origin = match base {
        Some(base) => base.to_string(),
        None => {
            let host = headers
                .get(HOST)
                .and_then(|h| h.to_str().ok())
                .unwrap_or("localhost");
            format!("http://{}", host)
        }
    };
    // `%` is the only key character that is not a valid path character.
    format!("{}{}/{}", origin, collection_path.trim_end_matches('/'), key.replace('%', "%25"))
}
