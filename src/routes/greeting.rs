use crate::handlers::greeting::{hello, hello_world, sum};
use axum::{
    routing::{get, post},
    Router,
};

/// GET /hello-world, GET /hello/:name, POST /sum.
pub fn greeting_routes() -> Router {
    Router::new()
        .route("/hello-world", get(hello_world))
        .route("/hello/:name", get(hello))
        .route("/sum", post(sum))
}
