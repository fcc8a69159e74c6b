//! PostgreSQL-backed document store. Each collection is a table in a dedicated schema holding the
//! document key, its current revision and the JSONB body (system attributes excluded).

use super::{generate_revision, merge_patch, prepare_insert, strip_system_attributes, with_meta, Document, DocumentMeta, DocumentStore};
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
    schema: String,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        PgDocumentStore {
            pool,
            schema: schema.into(),
        }
    }

    /// Schema-qualified, quoted table name for a collection (e.g. `"doc_crud"."people"`).
    fn table(&self, collection: &str) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(collection))
    }

    /// Lock a document row for writing. A lock held by a concurrent writer surfaces as a conflict.
    async fn lock_body(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        table: &str,
        collection: &str,
        key: &str,
    ) -> StoreResult<Document> {
        let sql = format!("SELECT body FROM {} WHERE key = $1 FOR UPDATE NOWAIT", table);
        let row: Option<(Json<Document>,)> = sqlx::query_as(&sql)
            .bind(key)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| classify(e, collection, key))?;
        row.map(|(body,)| body.0).ok_or_else(|| StoreError::DocumentNotFound {
            collection: collection.to_string(),
            key: key.to_string(),
        })
    }

    async fn write_body(&self, collection: &str, key: &str, write: BodyWrite) -> StoreResult<DocumentMeta> {
        let table = self.table(collection);
        let mut tx = self.pool.begin().await.map_err(StoreError::Db)?;
        let mut current = Self::lock_body(&mut tx, &table, collection, key).await?;
        let next = match write {
            BodyWrite::Replace(body) => body,
            BodyWrite::Merge(patch) => {
                merge_patch(&mut current, patch);
                current
            }
        };
        let rev = generate_revision();
        let sql = format!("UPDATE {} SET rev = $2, body = $3 WHERE key = $1", table);
        sqlx::query(&sql)
            .bind(key)
            .bind(&rev)
            .bind(Json(&next))
            .execute(&mut *tx)
            .await
            .map_err(|e| classify(e, collection, key))?;
        tx.commit().await.map_err(|e| classify(e, collection, key))?;
        Ok(DocumentMeta::new(collection, key, &rev))
    }
}

enum BodyWrite {
    Replace(Document),
    Merge(Document),
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(StoreError::Db)?;
        Ok(())
    }

    async fn collections(&self) -> StoreResult<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT table_name::text FROM information_schema.tables \
             WHERE table_schema::text = $1 AND table_type = 'BASE TABLE' ORDER BY table_name",
        )
        .bind(&self.schema)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::Db)?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    async fn collection_exists(&self, name: &str) -> StoreResult<bool> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM information_schema.tables WHERE table_schema::text = $1 AND table_name::text = $2)",
        )
        .bind(&self.schema)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::Db)?;
        Ok(exists.0)
    }

    async fn create_collection(&self, name: &str) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(StoreError::Db)?;
        // Held until commit; bootstraps racing on the same schema run their DDL one at a time.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(&self.schema)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::Db)?;
        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(&self.schema)))
            .execute(&mut *tx)
            .await
            .map_err(|e| classify_ddl(e, name))?;
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM information_schema.tables WHERE table_schema::text = $1 AND table_name::text = $2)",
        )
        .bind(&self.schema)
        .bind(name)
        .fetch_one(&mut *tx)
        .await
        .map_err(StoreError::Db)?;
        if exists.0 {
            return Err(StoreError::DuplicateName(name.to_string()));
        }
        let ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                seq BIGSERIAL NOT NULL,
                key TEXT PRIMARY KEY,
                rev TEXT NOT NULL,
                body JSONB NOT NULL
            )
            "#,
            self.table(name)
        );
        sqlx::query(&ddl)
            .execute(&mut *tx)
            .await
            .map_err(|e| classify_ddl(e, name))?;
        tx.commit().await.map_err(|e| classify_ddl(e, name))?;
        Ok(())
    }

    async fn all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let sql = format!("SELECT key, rev, body FROM {} ORDER BY seq", self.table(collection));
        let rows: Vec<(String, String, Json<Document>)> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| classify(e, collection, ""))?;
        Ok(rows
            .into_iter()
            .map(|(key, rev, body)| with_meta(collection, &key, &rev, body.0))
            .collect())
    }

    async fn keys(&self, collection: &str) -> StoreResult<Vec<String>> {
        let sql = format!("SELECT key FROM {} ORDER BY seq", self.table(collection));
        let rows: Vec<(String,)> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| classify(e, collection, ""))?;
        Ok(rows.into_iter().map(|(key,)| key).collect())
    }

    async fn save(&self, collection: &str, doc: Document) -> StoreResult<DocumentMeta> {
        let (key, body) = prepare_insert(doc)?;
        let rev = generate_revision();
        let sql = format!("INSERT INTO {} (key, rev, body) VALUES ($1, $2, $3)", self.table(collection));
        sqlx::query(&sql)
            .bind(&key)
            .bind(&rev)
            .bind(Json(&body))
            .execute(&self.pool)
            .await
            .map_err(|e| classify(e, collection, &key))?;
        Ok(DocumentMeta::new(collection, &key, &rev))
    }

    async fn document(&self, collection: &str, key: &str) -> StoreResult<Document> {
        let sql = format!("SELECT rev, body FROM {} WHERE key = $1", self.table(collection));
        let row: Option<(String, Json<Document>)> = sqlx::query_as(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| classify(e, collection, key))?;
        let (rev, body) = row.ok_or_else(|| StoreError::DocumentNotFound {
            collection: collection.to_string(),
            key: key.to_string(),
        })?;
        Ok(with_meta(collection, key, &rev, body.0))
    }

    async fn replace(&self, collection: &str, key: &str, mut doc: Document) -> StoreResult<DocumentMeta> {
        strip_system_attributes(&mut doc);
        self.write_body(collection, key, BodyWrite::Replace(doc)).await
    }

    async fn update(&self, collection: &str, key: &str, mut patch: Document) -> StoreResult<DocumentMeta> {
        strip_system_attributes(&mut patch);
        self.write_body(collection, key, BodyWrite::Merge(patch)).await
    }

    async fn remove(&self, collection: &str, key: &str) -> StoreResult<DocumentMeta> {
        let sql = format!("DELETE FROM {} WHERE key = $1 RETURNING rev", self.table(collection));
        let row: Option<(String,)> = sqlx::query_as(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| classify(e, collection, key))?;
        let (rev,) = row.ok_or_else(|| StoreError::DocumentNotFound {
            collection: collection.to_string(),
            key: key.to_string(),
        })?;
        Ok(DocumentMeta::new(collection, key, &rev))
    }
}

/// Map a PostgreSQL error to a store error kind by SQLSTATE.
fn classify(err: sqlx::Error, collection: &str, key: &str) -> StoreError {
    let (code, message) = match &err {
        sqlx::Error::Database(db) => (db.code().map(|c| c.into_owned()), db.message().to_string()),
        _ => (None, String::new()),
    };
    match code.as_deref().and_then(sqlstate_kind) {
        Some(SqlStateKind::UniqueViolation) => StoreError::UniqueConstraintViolated {
            collection: collection.to_string(),
            key: key.to_string(),
        },
        Some(SqlStateKind::Conflict) => StoreError::Conflict {
            collection: collection.to_string(),
            key: key.to_string(),
        },
        Some(SqlStateKind::UndefinedTable) => StoreError::CollectionNotFound(collection.to_string()),
        Some(SqlStateKind::DuplicateTable) => StoreError::DuplicateName(collection.to_string()),
        Some(SqlStateKind::Unstorable) => StoreError::InvalidDocument(message),
        None => StoreError::Db(err),
    }
}

/// Errors from collection DDL. A table created by someone else can also surface as a unique
/// violation on the system catalogs, so both kinds mean the name is taken.
fn classify_ddl(err: sqlx::Error, collection: &str) -> StoreError {
    match classify(err, collection, "") {
        StoreError::UniqueConstraintViolated { .. } | StoreError::DuplicateName(_) => {
            StoreError::DuplicateName(collection.to_string())
        }
        other => other,
    }
}

#[derive(Debug, PartialEq, Eq)]
enum SqlStateKind {
    UniqueViolation,
    Conflict,
    UndefinedTable,
    DuplicateTable,
    /// Valid JSON that JSONB cannot hold (`\u0000` in a string).
    Unstorable,
}

fn sqlstate_kind(code: &str) -> Option<SqlStateKind> {
    match code {
        "23505" => Some(SqlStateKind::UniqueViolation),
        // serialization_failure, deadlock_detected, lock_not_available
        "40001" | "40P01" | "55P03" => Some(SqlStateKind::Conflict),
        "42P01" | "3F000" => Some(SqlStateKind::UndefinedTable),
        "42P06" | "42P07" => Some(SqlStateKind::DuplicateTable),
        // untranslatable_character, character_not_in_repertoire
        "22P05" | "22021" => Some(SqlStateKind::Unstorable),
        _ => None,
    }
}

/// Create the database named in `database_url` if it does not exist, via the `postgres` maintenance DB.
pub async fn ensure_database_exists(database_url: &str) -> StoreResult<()> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url);
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url).map_err(StoreError::Db)?;
    let mut conn: sqlx::PgConnection = opts.connect().await.map_err(StoreError::Db)?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await
        .map_err(StoreError::Db)?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await
            .map_err(StoreError::Db)?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> (String, String) {
    let path_start = match url.rfind('/') {
        Some(i) => i + 1,
        None => return (url.to_string(), String::new()),
    };
    let path_and_query = url.get(path_start..).unwrap_or("");
    let (db_name, query) = match path_and_query.split_once('?') {
        Some((name, query)) => (name.trim(), Some(query)),
        None => (path_and_query.trim(), None),
    };
    let base = url.get(..path_start).unwrap_or(url);
    let admin_url = match query {
        Some(q) => format!("{}postgres?{}", base, q),
        None => format!("{}postgres", base),
    };
    (admin_url, db_name.to_string())
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
