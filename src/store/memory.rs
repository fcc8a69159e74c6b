//! In-memory document store. Shares state across clones; used for development and tests.

use super::{generate_revision, merge_patch, prepare_insert, strip_system_attributes, with_meta, Document, DocumentMeta, DocumentStore};
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Debug)]
struct StoredDocument {
    seq: u64,
    rev: String,
    body: Document,
}

#[derive(Debug, Default)]
struct MemoryCollection {
    next_seq: u64,
    docs: HashMap<String, StoredDocument>,
}

impl MemoryCollection {
    /// Documents in insertion order.
    fn ordered(&self) -> Vec<(&String, &StoredDocument)> {
        let mut entries: Vec<_> = self.docs.iter().collect();
        entries.sort_by_key(|(_, d)| d.seq);
        entries
    }

    fn get_mut(&mut self, collection: &str, key: &str) -> StoreResult<&mut StoredDocument> {
        self.docs.get_mut(key).ok_or_else(|| StoreError::DocumentNotFound {
            collection: collection.to_string(),
            key: key.to_string(),
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    collections: Arc<RwLock<HashMap<String, MemoryCollection>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn missing(collection: &str) -> StoreError {
    StoreError::CollectionNotFound(collection.to_string())
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn collections(&self) -> StoreResult<Vec<String>> {
        let collections = self.collections.read().await;
        let mut names: Vec<String> = collections.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn collection_exists(&self, name: &str) -> StoreResult<bool> {
        Ok(self.collections.read().await.contains_key(name))
    }

    async fn create_collection(&self, name: &str) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        if collections.contains_key(name) {
            return Err(StoreError::DuplicateName(name.to_string()));
        }
        collections.insert(name.to_string(), MemoryCollection::default());
        Ok(())
    }

    async fn all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;
        let col = collections.get(collection).ok_or_else(|| missing(collection))?;
        Ok(col
            .ordered()
            .into_iter()
            .map(|(key, d)| with_meta(collection, key, &d.rev, d.body.clone()))
            .collect())
    }

    async fn keys(&self, collection: &str) -> StoreResult<Vec<String>> {
        let collections = self.collections.read().await;
        let col = collections.get(collection).ok_or_else(|| missing(collection))?;
        Ok(col.ordered().into_iter().map(|(key, _)| key.clone()).collect())
    }

    async fn save(&self, collection: &str, doc: Document) -> StoreResult<DocumentMeta> {
        let (key, body) = prepare_insert(doc)?;
        let mut collections = self.collections.write().await;
        let col = collections.get_mut(collection).ok_or_else(|| missing(collection))?;
        if col.docs.contains_key(&key) {
            return Err(StoreError::UniqueConstraintViolated {
                collection: collection.to_string(),
                key,
            });
        }
        let rev = generate_revision();
        let seq = col.next_seq;
        col.next_seq += 1;
        col.docs.insert(key.clone(), StoredDocument { seq, rev: rev.clone(), body });
        Ok(DocumentMeta::new(collection, &key, &rev))
    }

    async fn document(&self, collection: &str, key: &str) -> StoreResult<Document> {
        let collections = self.collections.read().await;
        let col = collections.get(collection).ok_or_else(|| missing(collection))?;
        let stored = col.docs.get(key).ok_or_else(|| StoreError::DocumentNotFound {
            collection: collection.to_string(),
            key: key.to_string(),
        })?;
        Ok(with_meta(collection, key, &stored.rev, stored.body.clone()))
    }

    async fn replace(&self, collection: &str, key: &str, mut doc: Document) -> StoreResult<DocumentMeta> {
        strip_system_attributes(&mut doc);
        let mut collections = self.collections.write().await;
        let col = collections.get_mut(collection).ok_or_else(|| missing(collection))?;
        let stored = col.get_mut(collection, key)?;
        stored.body = doc;
        stored.rev = generate_revision();
        Ok(DocumentMeta::new(collection, key, &stored.rev))
    }

    async fn update(&self, collection: &str, key: &str, mut patch: Document) -> StoreResult<DocumentMeta> {
        strip_system_attributes(&mut patch);
        let mut collections = self.collections.write().await;
        let col = collections.get_mut(collection).ok_or_else(|| missing(collection))?;
        let stored = col.get_mut(collection, key)?;
        merge_patch(&mut stored.body, patch);
        stored.rev = generate_revision();
        Ok(DocumentMeta::new(collection, key, &stored.rev))
    }

    async fn remove(&self, collection: &str, key: &str) -> StoreResult<DocumentMeta> {
        let mut collections = self.collections.write().await;
        let col = collections.get_mut(collection).ok_or_else(|| missing(collection))?;
        let stored = col.docs.remove(key).ok_or_else(|| StoreError::DocumentNotFound {
            collection: collection.to_string(),
            key: key.to_string(),
        })?;
        Ok(DocumentMeta::new(collection, key, &stored.rev))
    }
}
