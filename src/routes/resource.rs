//! Per-resource CRUD routes. Mount the returned router at `/{R::COLLECTION}`.

use crate::handlers::resource::{create, delete, detail, list, replace, update};
use crate::model::Resource;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn resource_routes<R: Resource>(state: &AppState) -> Router {
    Router::new()
        .route("/", get(list).post(create::<R>))
        .route(
            "/:key",
            get(detail).put(replace::<R>).patch(update).delete(delete),
        )
        .with_state(state.for_collection(R::COLLECTION))
}
