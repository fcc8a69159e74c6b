use async_trait::async_trait;
use axum::{
    body::Body,
    http::{
        header::{CONTENT_TYPE, HOST, LOCATION},
        HeaderMap, Method, Request, StatusCode,
    },
    Router,
};
use doc_crud::error::StoreResult;
use doc_crud::{
    app, ensure_collections, AppState, Document, DocumentMeta, DocumentStore, InMemoryStore, Settings, StoreError,
    COLLECTIONS,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const BODY_LIMIT: usize = 64 * 1024;

async fn router_with(store: Arc<dyn DocumentStore>) -> Router {
    ensure_collections(store.as_ref(), &COLLECTIONS).await.unwrap();
    app(AppState::new(store, &Settings::default()), BODY_LIMIT)
}

async fn test_app() -> Router {
    router_with(Arc::new(InMemoryStore::new())).await
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Reply {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    fn text(&self) -> String {
        String::from_utf8(self.body.clone()).unwrap()
    }

    fn error_code(&self) -> String {
        self.json()["error"]["code"].as_str().unwrap().to_string()
    }
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Reply {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(HOST, "svc.test");
    let request = match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec();
    Reply { status, headers, body }
}

fn key_of(doc: &Value) -> String {
    doc["_key"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn create_then_read_person() {
    let app = test_app().await;
    let created = send(&app, Method::POST, "/people", Some(json!({"name": "Alice", "age": 30, "city": "Oslo"}))).await;
    assert_eq!(created.status, StatusCode::CREATED);
    let doc = created.json();
    let key = key_of(&doc);
    assert_eq!(
        created.headers.get(LOCATION).unwrap(),
        &format!("http://svc.test/people/{}", key)
    );
    assert_eq!(doc["name"], "Alice");
    assert_eq!(doc["age"], 30);
    assert_eq!(doc["city"], "Oslo");
    assert_eq!(doc["_id"], format!("people/{}", key));
    assert!(doc["_rev"].is_string());

    let read = send(&app, Method::GET, &format!("/people/{}", key), None).await;
    assert_eq!(read.status, StatusCode::OK);
    assert_eq!(read.json(), doc);

    let list = send(&app, Method::GET, "/people", None).await;
    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(list.json(), json!([doc]));
}

#[tokio::test]
async fn location_uses_configured_base_url() {
    let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());
    ensure_collections(store.as_ref(), &COLLECTIONS).await.unwrap();
    let settings = Settings {
        public_base_url: Some("https://api.example.com".into()),
        ..Settings::default()
    };
    let app = app(AppState::new(store, &settings), BODY_LIMIT);
    let created = send(&app, Method::POST, "/todo", Some(json!({"_key": "t1", "title": "write"}))).await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.headers.get(LOCATION).unwrap(), "https://api.example.com/todo/t1");
}

#[tokio::test]
async fn duplicate_key_is_conflict_and_first_survives() {
    let app = test_app().await;
    let first = send(&app, Method::POST, "/people", Some(json!({"_key": "alice", "name": "Alice", "age": 30}))).await;
    assert_eq!(first.status, StatusCode::CREATED);

    let second = send(&app, Method::POST, "/people", Some(json!({"_key": "alice", "name": "Impostor", "age": 1}))).await;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(second.error_code(), "conflict");
    assert!(second.json()["error"]["message"].as_str().unwrap().contains("unique constraint violated"));

    let read = send(&app, Method::GET, "/people/alice", None).await;
    assert_eq!(read.status, StatusCode::OK);
    assert_eq!(read.json()["name"], "Alice");
}

#[tokio::test]
async fn delete_then_read_is_not_found() {
    let app = test_app().await;
    let created = send(&app, Method::POST, "/people", Some(json!({"name": "Bob", "age": 41}))).await;
    let key = key_of(&created.json());

    let deleted = send(&app, Method::DELETE, &format!("/people/{}", key), None).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert!(deleted.body.is_empty());

    let read = send(&app, Method::GET, &format!("/people/{}", key), None).await;
    assert_eq!(read.status, StatusCode::NOT_FOUND);
    assert_eq!(read.error_code(), "not_found");
    assert_eq!(read.json()["error"]["message"], "document not found");

    let again = send(&app, Method::DELETE, &format!("/people/{}", key), None).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn patch_changes_only_given_fields() {
    let app = test_app().await;
    let created = send(&app, Method::POST, "/people", Some(json!({"name": "Carol", "age": 30, "tags": ["x"]}))).await;
    let before = created.json();
    let key = key_of(&before);

    let patched = send(&app, Method::PATCH, &format!("/people/{}", key), Some(json!({"age": 31}))).await;
    assert_eq!(patched.status, StatusCode::OK);
    let after = patched.json();
    assert_eq!(after["age"], 31);
    assert_eq!(after["name"], "Carol");
    assert_eq!(after["tags"], json!(["x"]));
    assert_eq!(after["_key"], before["_key"]);
    assert_ne!(after["_rev"], before["_rev"]);

    let missing = send(&app, Method::PATCH, "/people/nobody", Some(json!({"age": 1}))).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn put_replaces_whole_document() {
    let app = test_app().await;
    let created = send(&app, Method::POST, "/people", Some(json!({"name": "Dan", "age": 50, "nick": "D"}))).await;
    let before = created.json();
    let key = key_of(&before);

    let replaced = send(&app, Method::PUT, &format!("/people/{}", key), Some(json!({"name": "Daniel", "age": 51}))).await;
    assert_eq!(replaced.status, StatusCode::OK);
    let doc = replaced.json();
    assert_eq!(doc["name"], "Daniel");
    assert_ne!(doc["_rev"], before["_rev"]);

    let read = send(&app, Method::GET, &format!("/people/{}", key), None).await.json();
    assert_eq!(read, doc);
    assert!(read.get("nick").is_none());

    let missing = send(&app, Method::PUT, "/people/nobody", Some(json!({"name": "X", "age": 1}))).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_bodies_are_rejected_before_the_store() {
    let app = test_app().await;
    let missing_age = send(&app, Method::POST, "/people", Some(json!({"name": "Eve"}))).await;
    assert_eq!(missing_age.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(missing_age.error_code(), "validation_error");

    let wrong_type = send(&app, Method::POST, "/people", Some(json!({"name": "Eve", "age": "old"}))).await;
    assert_eq!(wrong_type.status, StatusCode::UNPROCESSABLE_ENTITY);

    let not_object = send(&app, Method::POST, "/todo", Some(json!([1, 2]))).await;
    assert_eq!(not_object.status, StatusCode::UNPROCESSABLE_ENTITY);

    let list = send(&app, Method::GET, "/people", None).await;
    assert_eq!(list.json(), json!([]));
}

#[tokio::test]
async fn patch_requires_an_object() {
    let app = test_app().await;
    send(&app, Method::POST, "/todo", Some(json!({"_key": "t", "title": "a"}))).await;
    let reply = send(&app, Method::PATCH, "/todo/t", Some(json!("done"))).await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn todo_accepts_free_form_documents() {
    let app = test_app().await;
    let created = send(&app, Method::POST, "/todo", Some(json!({"title": "ship", "done": false}))).await;
    assert_eq!(created.status, StatusCode::CREATED);
    let key = key_of(&created.json());

    let patched = send(&app, Method::PATCH, &format!("/todo/{}", key), Some(json!({"done": true}))).await.json();
    assert_eq!(patched["title"], "ship");
    assert_eq!(patched["done"], true);
}

#[tokio::test]
async fn sum_adds_values() {
    let app = test_app().await;
    let reply = send(&app, Method::POST, "/sum", Some(json!({"values": [1, 2, 3]}))).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json(), json!({"result": 6}));

    let empty = send(&app, Method::POST, "/sum", Some(json!({"values": []}))).await;
    assert_eq!(empty.json(), json!({"result": 0}));

    let fractional = send(&app, Method::POST, "/sum", Some(json!({"values": [0.5, 0.25]}))).await;
    assert_eq!(fractional.json(), json!({"result": 0.75}));

    let whole = send(&app, Method::POST, "/sum", Some(json!({"values": [1.5, 1.5]}))).await;
    assert_eq!(whole.text(), r#"{"result":3}"#);

    let missing = send(&app, Method::POST, "/sum", Some(json!({}))).await;
    assert_eq!(missing.status, StatusCode::UNPROCESSABLE_ENTITY);

    let not_numbers = send(&app, Method::POST, "/sum", Some(json!({"values": [1, "2"]}))).await;
    assert_eq!(not_numbers.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn greetings() {
    let app = test_app().await;
    let hello = send(&app, Method::GET, "/hello/Alice", None).await;
    assert_eq!(hello.status, StatusCode::OK);
    assert_eq!(hello.text(), "Hello Alice");
    assert!(hello.headers.get(CONTENT_TYPE).unwrap().to_str().unwrap().starts_with("text/plain"));

    let world = send(&app, Method::GET, "/hello-world", None).await;
    assert_eq!(world.text(), "Hello World!");
}

#[tokio::test]
async fn entries_accept_arrays_and_keep_order() {
    let app = test_app().await;
    let reply = send(
        &app,
        Method::POST,
        "/entries",
        Some(json!([{"n": 1}, {"n": 2}, {"n": 3}])),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    let saved = reply.json();
    let saved = saved.as_array().unwrap();
    assert_eq!(saved.len(), 3);
    let keys: Vec<String> = saved.iter().map(key_of).collect();
    for (i, doc) in saved.iter().enumerate() {
        assert_eq!(doc["n"], i + 1);
    }
    assert_ne!(keys[0], keys[1]);
    assert_ne!(keys[1], keys[2]);
    assert_ne!(keys[0], keys[2]);

    let listed = send(&app, Method::GET, "/entries", None).await.json();
    assert_eq!(listed, json!(keys));

    let read = send(&app, Method::GET, &format!("/entries/{}", keys[1]), None).await;
    assert_eq!(read.status, StatusCode::OK);
    assert_eq!(read.json()["n"], 2);
}

#[tokio::test]
async fn entries_single_object_in_single_object_out() {
    let app = test_app().await;
    let reply = send(&app, Method::POST, "/entries", Some(json!({"_key": "solo", "v": true}))).await;
    assert_eq!(reply.status, StatusCode::OK);
    let doc = reply.json();
    assert!(doc.is_object());
    assert_eq!(doc["_key"], "solo");

    let dup = send(&app, Method::POST, "/entries", Some(json!({"_key": "solo"}))).await;
    assert_eq!(dup.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(dup.error_code(), "store_error");

    let missing = send(&app, Method::GET, "/entries/ghost", None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert!(missing.json()["error"]["message"].as_str().unwrap().contains("ghost"));
}

#[tokio::test]
async fn common_routes_report_health() {
    let app = test_app().await;
    let health = send(&app, Method::GET, "/health", None).await;
    assert_eq!(health.json(), json!({"status": "ok"}));
    let ready = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(ready.status, StatusCode::OK);
    assert_eq!(ready.json()["store"], "ok");
    let version = send(&app, Method::GET, "/version", None).await;
    assert_eq!(version.json()["name"], "doc-crud");
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let app = test_app().await;
    let big = "x".repeat(BODY_LIMIT + 1);
    let reply = send(&app, Method::POST, "/todo", Some(json!({"blob": big}))).await;
    assert_eq!(reply.status, StatusCode::PAYLOAD_TOO_LARGE);
}

/// Delegates to an in-memory store but fails writes to key `contended` with a conflict and
/// reads of key `broken` with a backend fault.
struct FaultyStore {
    inner: InMemoryStore,
}

const CONTENDED: &str = "contended";
const BROKEN: &str = "broken";

fn conflict(collection: &str, key: &str) -> StoreError {
    StoreError::Conflict {
        collection: collection.to_string(),
        key: key.to_string(),
    }
}

#[async_trait]
impl DocumentStore for FaultyStore {
    async fn ping(&self) -> StoreResult<()> {
        Err(StoreError::Db(sqlx::Error::PoolTimedOut))
    }

    async fn collections(&self) -> StoreResult<Vec<String>> {
        self.inner.collections().await
    }

    async fn collection_exists(&self, name: &str) -> StoreResult<bool> {
        self.inner.collection_exists(name).await
    }

    async fn create_collection(&self, name: &str) -> StoreResult<()> {
        self.inner.create_collection(name).await
    }

    async fn all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        self.inner.all(collection).await
    }

    async fn keys(&self, collection: &str) -> StoreResult<Vec<String>> {
        self.inner.keys(collection).await
    }

    async fn save(&self, collection: &str, doc: Document) -> StoreResult<DocumentMeta> {
        self.inner.save(collection, doc).await
    }

    async fn document(&self, collection: &str, key: &str) -> StoreResult<Document> {
        if key == BROKEN {
            return Err(StoreError::Db(sqlx::Error::PoolTimedOut));
        }
        self.inner.document(collection, key).await
    }

    async fn replace(&self, collection: &str, key: &str, doc: Document) -> StoreResult<DocumentMeta> {
        if key == CONTENDED {
            return Err(conflict(collection, key));
        }
        self.inner.replace(collection, key, doc).await
    }

    async fn update(&self, collection: &str, key: &str, patch: Document) -> StoreResult<DocumentMeta> {
        if key == CONTENDED {
            return Err(conflict(collection, key));
        }
        self.inner.update(collection, key, patch).await
    }

    async fn remove(&self, collection: &str, key: &str) -> StoreResult<DocumentMeta> {
        self.inner.remove(collection, key).await
    }
}

async fn faulty_app() -> Router {
    router_with(Arc::new(FaultyStore {
        inner: InMemoryStore::new(),
    }))
    .await
}

#[tokio::test]
async fn store_conflicts_become_409() {
    let app = faulty_app().await;
    send(&app, Method::POST, "/people", Some(json!({"_key": CONTENDED, "name": "C", "age": 1}))).await;

    let put = send(&app, Method::PUT, "/people/contended", Some(json!({"name": "C", "age": 2}))).await;
    assert_eq!(put.status, StatusCode::CONFLICT);
    assert_eq!(put.error_code(), "conflict");

    let patch = send(&app, Method::PATCH, "/todo/contended", Some(json!({"x": 1}))).await;
    assert_eq!(patch.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn unmapped_store_faults_become_500() {
    let app = faulty_app().await;
    let people = send(&app, Method::GET, "/people/broken", None).await;
    assert_eq!(people.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(people.error_code(), "store_error");

    let entries = send(&app, Method::GET, "/entries/broken", None).await;
    assert_eq!(entries.status, StatusCode::INTERNAL_SERVER_ERROR);

    let ready = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(ready.status, StatusCode::SERVICE_UNAVAILABLE);
}
