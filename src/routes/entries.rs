use crate::handlers::entries::{create, detail, keys};
use crate::model::ENTRIES_COLLECTION;
use crate::state::AppState;
use axum::{routing::get, Router};

/// Mount at `/entries`.
pub fn entry_routes(state: &AppState) -> Router {
    Router::new()
        .route("/", get(keys).post(create))
        .route("/:key", get(detail))
        .with_state(state.for_collection(ENTRIES_COLLECTION))
}
