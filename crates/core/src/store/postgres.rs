use chrono::Utc;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use super::StoreError;
use crate::document::{Document, DocumentRow};

/// Documents in the `documents` table, scoped to one dataset. Deleted rows
/// are kept with `deleted = true`.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    dataset: String,
}

impl PgStore {
    pub fn new(pool: PgPool, dataset: impl Into<String>) -> Self {
        Self {
            pool,
            dataset: dataset.into(),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub(super) async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub(super) async fn all(&self) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            "SELECT * FROM documents WHERE dataset = $1 AND NOT deleted ORDER BY document_id",
        )
        .bind(&self.dataset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Document::from).collect())
    }

    pub(super) async fn get(&self, id: &str) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            "SELECT * FROM documents WHERE dataset = $1 AND document_id = $2 AND NOT deleted",
        )
        .bind(&self.dataset)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Document::from))
    }

    pub(super) async fn insert(&self, doc: Document) -> Result<Document, StoreError> {
        // A soft-deleted row with the same id is revived.
        let result = sqlx::query(
            r#"
            INSERT INTO documents (id, dataset, document_id, doc_type, revision, content, created_at, updated_at, deleted)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, false)
            ON CONFLICT (dataset, document_id) DO UPDATE
                SET doc_type = EXCLUDED.doc_type,
                    revision = EXCLUDED.revision,
                    content = EXCLUDED.content,
                    created_at = EXCLUDED.created_at,
                    updated_at = EXCLUDED.updated_at,
                    deleted = false
                WHERE documents.deleted
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&self.dataset)
        .bind(&doc._id)
        .bind(&doc._type)
        .bind(&doc._rev)
        .bind(Value::Object(doc.content.clone()))
        .bind(doc.created_at)
        .bind(doc.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::AlreadyExists(doc._id));
        }
        Ok(doc)
    }

    pub(super) async fn upsert(&self, mut doc: Document) -> Result<(Option<String>, Document), StoreError> {
        let previous = self.get(&doc._id).await?;
        if let Some(existing) = &previous {
            doc.created_at = existing.created_at;
        }

        sqlx::query(
            r#"
            INSERT INTO documents (id, dataset, document_id, doc_type, revision, content, created_at, updated_at, deleted)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, false)
            ON CONFLICT (dataset, document_id) DO UPDATE
                SET doc_type = EXCLUDED.doc_type,
                    revision = EXCLUDED.revision,
                    content = EXCLUDED.content,
                    created_at = EXCLUDED.created_at,
                    updated_at = EXCLUDED.updated_at,
                    deleted = false
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&self.dataset)
        .bind(&doc._id)
        .bind(&doc._type)
        .bind(&doc._rev)
        .bind(Value::Object(doc.content.clone()))
        .bind(doc.created_at)
        .bind(doc.updated_at)
        .execute(&self.pool)
        .await?;

        Ok((previous.map(|p| p._rev), doc))
    }

    /// Holds the row lock from read to write.
    pub(super) async fn update<F, E>(&self, id: &str, change: F) -> Result<(Document, Document), E>
    where
        F: FnOnce(&Document) -> Result<Document, E>,
        E: From<StoreError>,
    {
        let mut tx = self.pool.begin().await.map_err(StoreError::from)?;
        let row = sqlx::query_as::<_, DocumentRow>(
            "SELECT * FROM documents WHERE dataset = $1 AND document_id = $2 AND NOT deleted FOR UPDATE",
        )
        .bind(&self.dataset)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(StoreError::from)?;
        let current = row
            .map(Document::from)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let next = change(&current)?;
        sqlx::query(
            r#"
            UPDATE documents
               SET doc_type = $3, revision = $4, content = $5, updated_at = $6
             WHERE dataset = $1 AND document_id = $2
            "#,
        )
        .bind(&self.dataset)
        .bind(&next._id)
        .bind(&next._type)
        .bind(&next._rev)
        .bind(Value::Object(next.content.clone()))
        .bind(next.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::from)?;
        tx.commit().await.map_err(StoreError::from)?;
        Ok((current, next))
    }

    pub(super) async fn delete(&self, id: &str) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            UPDATE documents SET deleted = true, updated_at = $3
             WHERE dataset = $1 AND document_id = $2 AND NOT deleted
            RETURNING *
            "#,
        )
        .bind(&self.dataset)
        .bind(id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Document::from))
    }
}
