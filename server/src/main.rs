//! doc-crud server: reads settings from the environment (and `.env`), opens the document store,
//! bootstraps collections, then serves the people, todo, entries and greeting routes.
//!
//! Run from repo root: `cargo run -p doc-crud-server`

use doc_crud::{app, ensure_collections, store, AppState, Settings, COLLECTIONS};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("doc_crud=info,doc_crud_server=info")),
        )
        .init();

    let store = store::open(&settings).await?;
    let created = ensure_collections(store.as_ref(), &COLLECTIONS).await?;
    if !created.is_empty() {
        tracing::info!(collections = ?created, "bootstrap created collections");
    }

    let state = AppState::new(store, &settings);
    let router = app(state, settings.body_limit_bytes);

    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}
