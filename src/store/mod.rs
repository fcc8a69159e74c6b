//! Document store abstraction: named collections of JSON documents keyed by a unique string key.
//!
//! Backends classify their native failures into [`StoreError`] variants; everything above this
//! module matches on those variants and never inspects backend error codes.

mod collection;
pub mod memory;
pub mod postgres;

pub use collection::Collection;
pub use memory::InMemoryStore;
pub use postgres::{ensure_database_exists, PgDocumentStore};

use crate::config::Settings;
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::{Arc, OnceLock};

/// A stored document: a JSON object.
pub type Document = Map<String, Value>;

pub const KEY_ATTRIBUTE: &str = "_key";
pub const ID_ATTRIBUTE: &str = "_id";
pub const REV_ATTRIBUTE: &str = "_rev";

/// Attributes owned by the store. Ignored in write bodies, attached on read.
pub const SYSTEM_ATTRIBUTES: [&str; 3] = [KEY_ATTRIBUTE, ID_ATTRIBUTE, REV_ATTRIBUTE];

const MAX_KEY_LENGTH: usize = 254;

/// Store-assigned attributes returned by every write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DocumentMeta {
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev")]
    pub rev: String,
}

impl DocumentMeta {
    pub fn new(collection: &str, key: &str, rev: &str) -> Self {
        DocumentMeta {
            key: key.to_string(),
            id: format!("{}/{}", collection, key),
            rev: rev.to_string(),
        }
    }

    /// Copy `_key`, `_id` and `_rev` into `doc`, overwriting any caller-supplied values.
    pub fn merge_into(&self, doc: &mut Document) {
        doc.insert(KEY_ATTRIBUTE.into(), Value::String(self.key.clone()));
        doc.insert(ID_ATTRIBUTE.into(), Value::String(self.id.clone()));
        doc.insert(REV_ATTRIBUTE.into(), Value::String(self.rev.clone()));
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Cheap round trip used by readiness checks.
    async fn ping(&self) -> StoreResult<()>;

    /// Names of all collections.
    async fn collections(&self) -> StoreResult<Vec<String>>;

    async fn collection_exists(&self, name: &str) -> StoreResult<bool>;

    /// Create a document collection. Fails with [`StoreError::DuplicateName`] if it exists.
    async fn create_collection(&self, name: &str) -> StoreResult<()>;

    /// All documents, in collection-iteration (insertion) order.
    async fn all(&self, collection: &str) -> StoreResult<Vec<Document>>;

    /// `_key` of every document, in the same order as [`DocumentStore::all`].
    async fn keys(&self, collection: &str) -> StoreResult<Vec<String>>;

    /// Insert a document. Uses the body's `_key` when present, otherwise generates one.
    async fn save(&self, collection: &str, doc: Document) -> StoreResult<DocumentMeta>;

    async fn document(&self, collection: &str, key: &str) -> StoreResult<Document>;

    /// Overwrite the whole body of an existing document.
    async fn replace(&self, collection: &str, key: &str, doc: Document) -> StoreResult<DocumentMeta>;

    /// Merge `patch` into an existing document (see [`merge_patch`]).
    async fn update(&self, collection: &str, key: &str, patch: Document) -> StoreResult<DocumentMeta>;

    async fn remove(&self, collection: &str, key: &str) -> StoreResult<DocumentMeta>;
}

/// Open the store described by `settings`: PostgreSQL when `DATABASE_URL` is set (creating the
/// database if needed), otherwise a fresh in-memory store.
pub async fn open(settings: &Settings) -> StoreResult<Arc<dyn DocumentStore>> {
    match &settings.database_url {
        Some(url) => {
            ensure_database_exists(url).await?;
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(settings.db_max_connections)
                .connect(url)
                .await
                .map_err(StoreError::Db)?;
            tracing::info!(schema = %settings.schema, "using PostgreSQL document store");
            Ok(Arc::new(PgDocumentStore::new(pool, settings.schema.clone())))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; documents are kept in memory only");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}

fn key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_\-:.@()+,=;$!*'%]+$").expect("static key pattern compiles")
    })
}

pub fn validate_key(key: &str) -> StoreResult<()> {
    if key.is_empty() || key.len() > MAX_KEY_LENGTH || !key_pattern().is_match(key) {
        return Err(StoreError::IllegalKey(key.to_string()));
    }
    Ok(())
}

pub fn generate_key() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

pub fn generate_revision() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("_{}", &id[..16])
}

/// Remove system attributes from a body that is about to be written.
pub fn strip_system_attributes(doc: &mut Document) {
    for attr in SYSTEM_ATTRIBUTES {
        doc.remove(attr);
    }
}

/// Prepare a body for insertion: take out the caller's `_key` (or generate one) and strip the
/// remaining system attributes.
pub fn prepare_insert(mut doc: Document) -> StoreResult<(String, Document)> {
    let key = match doc.remove(KEY_ATTRIBUTE) {
        Some(Value::String(key)) => {
            validate_key(&key)?;
            key
        }
        Some(other) => return Err(StoreError::IllegalKey(other.to_string())),
        None => generate_key(),
    };
    strip_system_attributes(&mut doc);
    Ok((key, doc))
}

/// Merge `patch` into `target`. Objects merge recursively; any other value (null included)
/// replaces the existing one.
pub fn merge_patch(target: &mut Document, patch: Document) {
    for (field, value) in patch {
        match value {
            Value::Object(nested) => {
                if let Some(Value::Object(existing)) = target.get_mut(&field) {
                    merge_patch(existing, nested);
                    continue;
                }
                target.insert(field, Value::Object(nested));
            }
            value => {
                target.insert(field, value);
            }
        }
    }
}

/// Body with system attributes attached, as returned by reads.
pub fn with_meta(collection: &str, key: &str, rev: &str, mut body: Document) -> Document {
    DocumentMeta::new(collection, key, rev).merge_into(&mut body);
    body
}
