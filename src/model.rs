//! Resource definitions: which collection each router serves and the shape of its request body.
//!
//! A body type is declared once and used two ways: `Deserialize` decodes and validates the
//! request, `Serialize` encodes it back into a store document.

use crate::error::AppError;
use crate::store::Document;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

pub const PEOPLE_COLLECTION: &str = "people";
pub const TODO_COLLECTION: &str = "todo";
pub const ENTRIES_COLLECTION: &str = "entries";

/// Every collection a router needs, in bootstrap order.
pub const COLLECTIONS: [&str; 3] = [PEOPLE_COLLECTION, TODO_COLLECTION, ENTRIES_COLLECTION];

/// A CRUD resource mounted at `/{COLLECTION}`.
pub trait Resource: Send + Sync + 'static {
    const COLLECTION: &'static str;
    /// Body accepted by create and replace.
    type Body: DeserializeOwned + Serialize + Send + 'static;
}

pub struct People;

impl Resource for People {
    const COLLECTION: &'static str = PEOPLE_COLLECTION;
    type Body = Person;
}

pub struct Todos;

impl Resource for Todos {
    const COLLECTION: &'static str = TODO_COLLECTION;
    type Body = Todo;
}

/// `name` and `age` are required; any other attribute is kept as-is.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    pub age: Number,
    #[serde(flatten)]
    pub extra: Document,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Todo(pub Document);

/// `POST /entries` accepts one object or an array of objects and answers in the same shape.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    Many(Vec<Document>),
    One(Document),
}

/// Encode a body into a store document.
pub fn to_document<T: Serialize>(body: &T) -> Result<Document, AppError> {
    match serde_json::to_value(body) {
        Ok(Value::Object(doc)) => Ok(doc),
        Ok(_) => Err(AppError::Validation("body must be a JSON object".into())),
        Err(e) => Err(AppError::BadRequest(e.to_string())),
    }
}
