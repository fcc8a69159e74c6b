//! Collection bootstrap: make sure every collection a router needs exists before serving.

use crate::config::validate_collection_names;
use crate::error::{AppError, StoreError};
use crate::store::DocumentStore;

/// Create each named collection that does not exist yet, in order. Idempotent: existing
/// collections, including ones created concurrently by another instance, are left alone.
/// Returns the names that were actually created.
pub async fn ensure_collections<S: AsRef<str>>(store: &dyn DocumentStore, names: &[S]) -> Result<Vec<String>, AppError> {
    validate_collection_names(names)?;
    let mut created = Vec::new();
    for name in names {
        let name = name.as_ref();
        if store.collection_exists(name).await? {
            tracing::debug!(collection = name, "collection exists");
            continue;
        }
        match store.create_collection(name).await {
            Ok(()) => {
                tracing::info!(collection = name, "created collection");
                created.push(name.to_string());
            }
            Err(StoreError::DuplicateName(_)) => {
                tracing::debug!(collection = name, "collection created concurrently");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(created)
}
