//! Free-form entries: batch save, read by key and key listing. Only a missing document on read
//! is translated; every other store error propagates unchanged.

use crate::error::{AppError, StoreError};
use crate::model::OneOrMany;
use crate::store::{Collection, Document};

pub struct EntryService;

impl EntryService {
    /// Save every item in input order, merging each item's meta into it. The reply has the same
    /// shape as the input. Stops at the first failure; earlier items stay saved.
    pub async fn save(items: &Collection, input: OneOrMany) -> Result<OneOrMany, AppError> {
        match input {
            OneOrMany::One(doc) => Ok(OneOrMany::One(Self::save_one(items, doc).await?)),
            OneOrMany::Many(docs) => {
                let mut saved = Vec::with_capacity(docs.len());
                for doc in docs {
                    saved.push(Self::save_one(items, doc).await?);
                }
                Ok(OneOrMany::Many(saved))
            }
        }
    }

    async fn save_one(items: &Collection, mut doc: Document) -> Result<Document, AppError> {
        let meta = items.save(doc.clone()).await?;
        meta.merge_into(&mut doc);
        Ok(doc)
    }

    pub async fn read(items: &Collection, key: &str) -> Result<Document, AppError> {
        items.document(key).await.map_err(|e| match e {
            StoreError::DocumentNotFound { .. } => {
                AppError::NotFound(format!("entry with key '{}' does not exist", key))
            }
            other => other.into(),
        })
    }

    pub async fn keys(items: &Collection) -> Result<Vec<String>, AppError> {
        Ok(items.keys().await?)
    }
}
