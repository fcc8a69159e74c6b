use super::{Document, DocumentMeta, DocumentStore};
use crate::error::StoreResult;
use std::sync::Arc;

/// Handle to one named collection of a store. Cheap to clone.
#[derive(Clone)]
pub struct Collection {
    store: Arc<dyn DocumentStore>,
    name: Arc<str>,
}

impl Collection {
    pub fn new(store: Arc<dyn DocumentStore>, name: &str) -> Self {
        Collection {
            store,
            name: Arc::from(name),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn all(&self) -> StoreResult<Vec<Document>> {
        self.store.all(&self.name).await
    }

    pub async fn keys(&self) -> StoreResult<Vec<String>> {
        self.store.keys(&self.name).await
    }

    pub async fn save(&self, doc: Document) -> StoreResult<DocumentMeta> {
        self.store.save(&self.name, doc).await
    }

    pub async fn document(&self, key: &str) -> StoreResult<Document> {
        self.store.document(&self.name, key).await
    }

    pub async fn replace(&self, key: &str, doc: Document) -> StoreResult<DocumentMeta> {
        self.store.replace(&self.name, key, doc).await
    }

    pub async fn update(&self, key: &str, patch: Document) -> StoreResult<DocumentMeta> {
        self.store.update(&self.name, key, patch).await
    }

    pub async fn remove(&self, key: &str) -> StoreResult<DocumentMeta> {
        self.store.remove(&self.name, key).await
    }
}
