//! CRUD over one collection. Each operation is a single store call (update: merge, then read)
//! and only the store errors listed per operation are translated; anything else passes through.

use crate::error::{AppError, StoreError};
use crate::store::{Collection, Document, DocumentMeta};

pub struct CrudService;

impl CrudService {
    pub async fn list(items: &Collection) -> Result<Vec<Document>, AppError> {
        Ok(items.all().await?)
    }

    /// Save a new document. Returns the store meta and the body with `_key`/`_id`/`_rev` merged in.
    pub async fn create(items: &Collection, mut doc: Document) -> Result<(DocumentMeta, Document), AppError> {
        let meta = items.save(doc.clone()).await.map_err(duplicate_as_conflict)?;
        tracing::debug!(collection = items.name(), key = %meta.key, "created document");
        meta.merge_into(&mut doc);
        Ok((meta, doc))
    }

    pub async fn read(items: &Collection, key: &str) -> Result<Document, AppError> {
        items.document(key).await.map_err(not_found)
    }

    /// Overwrite a document. Returns the new body with the new meta merged in.
    pub async fn replace(items: &Collection, key: &str, mut doc: Document) -> Result<Document, AppError> {
        let meta = items
            .replace(key, doc.clone())
            .await
            .map_err(not_found_or_conflict)?;
        tracing::debug!(collection = items.name(), key, rev = %meta.rev, "replaced document");
        meta.merge_into(&mut doc);
        Ok(doc)
    }

    /// Merge `patch` into a document, then read it back. The two calls are not atomic: the read
    /// may already observe a later write.
    pub async fn update(items: &Collection, key: &str, patch: Document) -> Result<Document, AppError> {
        let meta = items.update(key, patch).await.map_err(not_found_or_conflict)?;
        tracing::debug!(collection = items.name(), key, rev = %meta.rev, "updated document");
        items.document(key).await.map_err(not_found_or_conflict)
    }

    pub async fn delete(items: &Collection, key: &str) -> Result<(), AppError> {
        items.remove(key).await.map_err(not_found)?;
        tracing::debug!(collection = items.name(), key, "removed document");
        Ok(())
    }
}

fn not_found(e: StoreError) -> AppError {
    match e {
        e @ StoreError::DocumentNotFound { .. } => AppError::NotFound(e.to_string()),
        other => other.into(),
    }
}

fn not_found_or_conflict(e: StoreError) -> AppError {
    match e {
        e @ StoreError::DocumentNotFound { .. } => AppError::NotFound(e.to_string()),
        e @ StoreError::Conflict { .. } => AppError::Conflict(e.to_string()),
        other => other.into(),
    }
}

fn duplicate_as_conflict(e: StoreError) -> AppError {
    match e {
        e @ StoreError::UniqueConstraintViolated { .. } => AppError::Conflict(e.to_string()),
        other => other.into(),
    }
}
