//! Document storage backends.
//!
//! [`Store`] dispatches to an in-memory map (development, tests, seeded
//! demos) or to Postgres. Both keep the same semantics: ids are unique per
//! dataset, deletes are soft in Postgres and hard in memory, and
//! [`Store::update`] lets no other write land between its read and write.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use serde::Deserialize;
use sobremesa_groq::Dataset;
use thiserror::Error;

use crate::document::{Document, DocumentIdKind};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document `{0}` already exists")]
    AlreadyExists(String),
    #[error("document `{0}` not found")]
    NotFound(String),
    #[error("document `{id}` changed: expected revision {expected}, found {found}")]
    RevisionMismatch {
        id: String,
        expected: String,
        found: String,
    },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Which documents a read sees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Perspective {
    /// Published documents only: no `drafts.` or `versions.` ids.
    #[default]
    Published,
    /// Everything, including drafts.
    Raw,
    /// What anonymous readers may see: published ids, minus documents
    /// flagged `published: false` and internal types.
    Public,
}

/// Types only the dashboard reads.
pub const INTERNAL_TYPES: [&str; 2] = ["qrCode", "sanity.imageAsset"];

impl Perspective {
    pub fn includes(&self, id: &str) -> bool {
        match self {
            Perspective::Raw => true,
            Perspective::Published | Perspective::Public => DocumentIdKind::parse(id).is_published(),
        }
    }

    pub fn admits(&self, doc: &Document) -> bool {
        if !self.includes(&doc._id) {
            return false;
        }
        match self {
            Perspective::Public => {
                !INTERNAL_TYPES.contains(&doc._type.as_str())
                    && doc.content.get("published") != Some(&serde_json::Value::Bool(false))
            }
            _ => true,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Store {
    Memory(MemoryStore),
    Postgres(PgStore),
}

impl Store {
    pub fn memory() -> Self {
        Store::Memory(MemoryStore::default())
    }

    pub fn backend(&self) -> &'static str {
        match self {
            Store::Memory(_) => "memory",
            Store::Postgres(_) => "postgres",
        }
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        match self {
            Store::Memory(_) => Ok(()),
            Store::Postgres(pg) => pg.ping().await,
        }
    }

    /// All live documents visible under `perspective`, ready for querying.
    pub async fn snapshot(&self, perspective: Perspective) -> Result<Dataset, StoreError> {
        let docs = match self {
            Store::Memory(m) => m.all().await,
            Store::Postgres(pg) => pg.all().await?,
        };
        Ok(Dataset::new(
            docs.into_iter()
                .filter(|d| perspective.admits(d))
                .map(|d| d.to_value())
                .collect(),
        ))
    }

    pub async fn get(&self, id: &str) -> Result<Option<Document>, StoreError> {
        match self {
            Store::Memory(m) => Ok(m.get(id).await),
            Store::Postgres(pg) => pg.get(id).await,
        }
    }

    /// Insert a new document; fails if the id is taken.
    pub async fn insert(&self, doc: Document) -> Result<Document, StoreError> {
        match self {
            Store::Memory(m) => m.insert(doc).await,
            Store::Postgres(pg) => pg.insert(doc).await,
        }
    }

    /// Insert or overwrite. Returns the previous revision, if any. The
    /// original creation time survives a replace.
    pub async fn upsert(&self, doc: Document) -> Result<(Option<String>, Document), StoreError> {
        match self {
            Store::Memory(m) => Ok(m.upsert(doc).await),
            Store::Postgres(pg) => pg.upsert(doc).await,
        }
    }

    /// Read-modify-write one document with no other writer in between.
    /// `change` sees the current document and returns its replacement;
    /// the result is `(previous, stored)`.
    pub async fn update<F, E>(&self, id: &str, change: F) -> Result<(Document, Document), E>
    where
        F: FnOnce(&Document) -> Result<Document, E>,
        E: From<StoreError>,
    {
        match self {
            Store::Memory(m) => m.update(id, change).await,
            Store::Postgres(pg) => pg.update(id, change).await,
        }
    }

    /// Delete by id, returning the removed document.
    pub async fn delete(&self, id: &str) -> Result<Option<Document>, StoreError> {
        match self {
            Store::Memory(m) => Ok(m.delete(id).await),
            Store::Postgres(pg) => pg.delete(id).await,
        }
    }

    /// Bulk-load documents (seeding), overwriting existing ids.
    pub async fn load(&self, docs: Vec<Document>) -> Result<usize, StoreError> {
        let count = docs.len();
        for doc in docs {
            self.upsert(doc).await?;
        }
        tracing::info!(count, backend = self.backend(), "loaded documents");
        Ok(count)
    }
}

/// Parse newline-delimited JSON documents, skipping blank lines.
pub fn parse_ndjson(input: &str) -> Result<Vec<Document>, crate::ContentError> {
    input
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line)?;
            Ok(Document::from_json(value)?)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn doc(id: &str) -> Document {
        Document::new(id, "city", Map::new())
    }

    #[tokio::test]
    async fn published_snapshot_hides_drafts() {
        let store = Store::memory();
        store.insert(doc("madrid")).await.unwrap();
        store.insert(doc("drafts.madrid")).await.unwrap();

        assert_eq!(store.snapshot(Perspective::Published).await.unwrap().len(), 1);
        assert_eq!(store.snapshot(Perspective::Raw).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn public_snapshot_hides_unpublished_and_internal_documents() {
        let store = Store::memory();
        store.insert(doc("madrid")).await.unwrap();
        store.insert(doc("drafts.madrid")).await.unwrap();
        let mut hidden = Map::new();
        hidden.insert("published".into(), json!(false));
        store.insert(Document::new("guide-bilbao", "guide", hidden)).await.unwrap();
        store.insert(Document::new("qr-1", "qrCode", Map::new())).await.unwrap();
        store.insert(Document::new("image-1", "sanity.imageAsset", Map::new())).await.unwrap();

        let public = store.snapshot(Perspective::Public).await.unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public.documents()[0]["_id"], "madrid");
        assert_eq!(store.snapshot(Perspective::Published).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn insert_rejects_duplicates() {
        let store = Store::memory();
        store.insert(doc("sevilla")).await.unwrap();
        assert!(matches!(
            store.insert(doc("sevilla")).await,
            Err(StoreError::AlreadyExists(id)) if id == "sevilla"
        ));
    }

    #[tokio::test]
    async fn update_hands_over_the_current_revision() {
        let store = Store::memory();
        let original = store.insert(doc("bilbao")).await.unwrap();

        let (previous, stored) = store
            .update("bilbao", |current| -> Result<Document, StoreError> {
                let mut content = current.content.clone();
                content.insert("title".into(), json!("Bilbao"));
                Ok(current.revised(content))
            })
            .await
            .unwrap();
        assert_eq!(previous._rev, original._rev);
        assert_ne!(stored._rev, original._rev);
        assert_eq!(store.get("bilbao").await.unwrap().unwrap().content["title"], "Bilbao");

        let refused = store
            .update("bilbao", |current| Err(StoreError::NotFound(current._id.clone())))
            .await;
        assert!(matches!(refused, Err(StoreError::NotFound(_))));
        assert_eq!(store.get("bilbao").await.unwrap().unwrap()._rev, stored._rev);

        let missing = store
            .update("gijon", |current| -> Result<Document, StoreError> { Ok(current.clone()) })
            .await;
        assert!(matches!(missing, Err(StoreError::NotFound(id)) if id == "gijon"));
    }

    #[tokio::test]
    async fn upsert_keeps_created_at() {
        let store = Store::memory();
        let original = store.insert(doc("valencia")).await.unwrap();
        let mut replacement = doc("valencia");
        replacement.created_at = chrono::Utc::now() + chrono::Duration::hours(1);
        let (prev, stored) = store.upsert(replacement).await.unwrap();
        assert_eq!(prev.as_deref(), Some(original._rev.as_str()));
        assert_eq!(stored.created_at, original.created_at);
    }

    #[tokio::test]
    async fn delete_returns_removed_document() {
        let store = Store::memory();
        store.insert(doc("cadiz")).await.unwrap();
        assert!(store.delete("cadiz").await.unwrap().is_some());
        assert!(store.delete("cadiz").await.unwrap().is_none());
        assert!(store.get("cadiz").await.unwrap().is_none());
    }

    #[test]
    fn parses_ndjson_seed() {
        let input = format!(
            "{}\n\n{}\n",
            json!({"_id": "c1", "_type": "city", "title": "Madrid"}),
            json!({"_id": "c2", "_type": "city", "title": "Sevilla"})
        );
        let docs = parse_ndjson(&input).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1]._id, "c2");
    }
}
