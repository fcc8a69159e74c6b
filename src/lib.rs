//! doc-crud: CRUD REST endpoints (people, todo, free-form entries) over a document store.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod model;
pub mod response;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;

pub use bootstrap::ensure_collections;
pub use config::Settings;
pub use error::{AppError, ConfigError, StoreError};
pub use model::COLLECTIONS;
pub use routes::{app, common_routes, entry_routes, greeting_routes, resource_routes};
pub use state::{AppState, CollectionState};
pub use store::{Collection, Document, DocumentMeta, DocumentStore, InMemoryStore, PgDocumentStore};
