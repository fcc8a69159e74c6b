//! Route tables and the assembled application router.

mod common;
mod entries;
mod greeting;
mod resource;

pub use common::common_routes;
pub use entries::entry_routes;
pub use greeting::greeting_routes;
pub use resource::resource_routes;

use crate::model::{People, Resource, Todos};
use crate::state::AppState;
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

/// Every route of the service: common, greetings, `/people`, `/todo` and `/entries`.
pub fn app(state: AppState, body_limit_bytes: usize) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .merge(greeting_routes())
        .nest(&format!("/{}", People::COLLECTION), resource_routes::<People>(&state))
        .nest(&format!("/{}", Todos::COLLECTION), resource_routes::<Todos>(&state))
        .nest("/entries", entry_routes(&state))
        .layer(RequestBodyLimitLayer::new(body_limit_bytes))
}
