//! SQLite-backed document store.
//!
//! Every document is one row of the `documents` table keyed by
//! `(collection, id)`, with its fields serialized as JSON text. Equality
//! filters are evaluated with `json_extract`, so no per-field schema or
//! index is needed.

use crate::models::document::{Document, DocumentRow};
use crate::services::backend::{BackendError, BackendResult, DocumentStore};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::{QueryBuilder, SqlitePool, sqlite::Sqlite};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

#[derive(Clone)]
pub struct SqliteDocuments {
    db: Arc<SqlitePool>,
}

impl SqliteDocuments {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Collections are non-empty `/`-separated paths with an odd number of
    /// segments (`name` or `name/{docId}/name`).
    fn ensure_collection_valid(collection: &str) -> BackendResult<()> {
        let segments: Vec<&str> = collection.split('/').collect();
        if segments.iter().any(|s| s.is_empty()) || segments.len() % 2 == 0 {
            return Err(BackendError::InvalidCollection(collection.to_string()));
        }
        Ok(())
    }

    fn ensure_id_valid(collection: &str, id: &str) -> BackendResult<()> {
        if id.is_empty() || id.contains('/') {
            return Err(BackendError::DocumentNotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    fn rows_to_documents(rows: Vec<DocumentRow>) -> BackendResult<Vec<Document>> {
        rows.into_iter()
            .map(|row| Document::try_from(row).map_err(BackendError::from))
            .collect()
    }
}

/// Build a JSON path for a top-level field, rejecting anything that could
/// escape into a nested or quoted path expression.
fn field_path(field: &str) -> BackendResult<String> {
    if field.is_empty()
        || !field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(BackendError::InvalidFieldPath(field.to_string()));
    }
    Ok(format!("$.{}", field))
}

#[async_trait]
impl DocumentStore for SqliteDocuments {
    async fn add(&self, collection: &str, data: Map<String, Value>) -> BackendResult<Document> {
        Self::ensure_collection_valid(collection)?;
        let id = Uuid::new_v4().simple().to_string();
        let created_at = Utc::now();
        let body = serde_json::to_string(&data)?;

        sqlx::query("INSERT INTO documents (collection, id, data, created_at) VALUES (?, ?, ?, ?)")
            .bind(collection)
            .bind(&id)
            .bind(&body)
            .bind(created_at)
            .execute(&*self.db)
            .await?;

        debug!("added document {}/{}", collection, id);
        Ok(Document {
            id,
            data,
            created_at,
        })
    }

    async fn set(
        &self,
        collection: &str,
        id: &str,
        data: Map<String, Value>,
    ) -> BackendResult<()> {
        Self::ensure_collection_valid(collection)?;
        Self::ensure_id_valid(collection, id)?;
        let body = serde_json::to_string(&data)?;

        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(collection, id) DO UPDATE SET data = excluded.data
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(&body)
        .bind(Utc::now())
        .execute(&*self.db)
        .await?;

        debug!("set document {}/{}", collection, id);
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> BackendResult<Option<Document>> {
        Self::ensure_collection_valid(collection)?;
        let row = sqlx::query_as::<_, DocumentRow>(
            "SELECT collection, id, data, created_at FROM documents
             WHERE collection = ? AND id = ?",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&*self.db)
        .await?;

        row.map(Document::try_from)
            .transpose()
            .map_err(BackendError::from)
    }

    async fn list(&self, collection: &str) -> BackendResult<Vec<Document>> {
        Self::ensure_collection_valid(collection)?;
        let rows = sqlx::query_as::<_, DocumentRow>(
            "SELECT collection, id, data, created_at FROM documents WHERE collection = ?",
        )
        .bind(collection)
        .fetch_all(&*self.db)
        .await?;

        Self::rows_to_documents(rows)
    }

    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> BackendResult<Vec<Document>> {
        Self::ensure_collection_valid(collection)?;
        let path = field_path(field)?;

        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT collection, id, data, created_at FROM documents WHERE collection = ",
        );
        builder.push_bind(collection);
        builder.push(" AND json_extract(data, ");
        builder.push_bind(path);
        builder.push(") IS ");

        // json_extract yields SQL integers for JSON booleans.
        match value {
            Value::Null => {
                builder.push("NULL");
            }
            Value::Bool(flag) => {
                builder.push_bind(i64::from(*flag));
            }
            Value::Number(number) => {
                if let Some(int) = number.as_i64() {
                    builder.push_bind(int);
                } else {
                    builder.push_bind(number.as_f64());
                }
            }
            Value::String(text) => {
                builder.push_bind(text.clone());
            }
            Value::Array(_) | Value::Object(_) => {
                return Err(BackendError::UnsupportedFilter(field.to_string()));
            }
        }

        let rows: Vec<DocumentRow> = builder.build_query_as().fetch_all(&*self.db).await?;
        debug!(
            "query {} where {} == {} matched {} documents",
            collection,
            field,
            value,
            rows.len()
        );
        Self::rows_to_documents(rows)
    }

    async fn delete(&self, collection: &str, id: &str) -> BackendResult<bool> {
        Self::ensure_collection_valid(collection)?;
        let nested_prefix = format!("{}/{}/", collection, id);

        let mut tx = self.db.begin().await?;
        let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let nested = sqlx::query("DELETE FROM documents WHERE substr(collection, 1, ?) = ?")
            .bind(nested_prefix.chars().count() as i64)
            .bind(&nested_prefix)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        debug!(
            "deleted document {}/{} ({} nested documents)",
            collection,
            id,
            nested.rows_affected()
        );
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> BackendResult<()> {
        let value = sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&*self.db)
            .await?;
        if value != 1 {
            return Err(BackendError::InvalidArgument(format!(
                "unexpected ping result: {}",
                value
            )));
        }
        Ok(())
    }
}
