use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::StoreError;
use crate::document::Document;

/// Documents held in process memory, ordered by id.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    docs: Arc<RwLock<BTreeMap<String, Document>>>,
}

impl MemoryStore {
    pub(super) async fn all(&self) -> Vec<Document> {
        self.docs.read().await.values().cloned().collect()
    }

    pub(super) async fn get(&self, id: &str) -> Option<Document> {
        self.docs.read().await.get(id).cloned()
    }

    pub(super) async fn insert(&self, doc: Document) -> Result<Document, StoreError> {
        let mut docs = self.docs.write().await;
        if docs.contains_key(&doc._id) {
            return Err(StoreError::AlreadyExists(doc._id));
        }
        docs.insert(doc._id.clone(), doc.clone());
        Ok(doc)
    }

    pub(super) async fn upsert(&self, mut doc: Document) -> (Option<String>, Document) {
        let mut docs = self.docs.write().await;
        let previous = docs.get(&doc._id).map(|existing| {
            doc.created_at = existing.created_at;
            existing._rev.clone()
        });
        docs.insert(doc._id.clone(), doc.clone());
        (previous, doc)
    }

    pub(super) async fn update<F, E>(&self, id: &str, change: F) -> Result<(Document, Document), E>
    where
        F: FnOnce(&Document) -> Result<Document, E>,
        E: From<StoreError>,
    {
        let mut docs = self.docs.write().await;
        let current = docs
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let next = change(&current)?;
        docs.insert(next._id.clone(), next.clone());
        Ok((current, next))
    }

    pub(super) async fn delete(&self, id: &str) -> Option<Document> {
        self.docs.write().await.remove(id)
    }
}
