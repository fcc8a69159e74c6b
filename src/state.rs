//! Shared application state. The store client is built once at startup and handed to every router.

use crate::config::Settings;
use crate::store::{Collection, DocumentStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    /// Absolute base for `Location` headers; the request `Host` is used when unset.
    pub public_base_url: Option<Arc<str>>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, settings: &Settings) -> Self {
        AppState {
            store,
            public_base_url: settings.public_base_url.as_deref().map(Arc::from),
        }
    }

    /// State for a router that serves a single collection.
    pub fn for_collection(&self, name: &str) -> CollectionState {
        CollectionState {
            items: Collection::new(self.store.clone(), name),
            public_base_url: self.public_base_url.clone(),
        }
    }
}

#[derive(Clone)]
pub struct CollectionState {
    pub items: Collection,
    pub public_base_url: Option<Arc<str>>,
}
