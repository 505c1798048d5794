use chrono::Utc;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use super::patch::{apply_patch, PatchError};
use super::types::{DeleteTarget, Mutation, MutationResponse, MutationResult, PatchMutation};
use crate::document::{validate_document, Document, ValidationError};
use crate::events::types::revalidate_tags;
use crate::events::{ContentEvent, EventBus, MutationEvent};
use crate::store::{Perspective, Store, StoreError};

#[derive(Debug, Error)]
pub enum MutationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Patch(#[from] PatchError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid delete query: {0}")]
    Query(#[from] sobremesa_groq::QueryError),
}

/// Applies mutation batches to a store and announces the results.
#[derive(Debug, Clone)]
pub struct Committer {
    store: Store,
    bus: EventBus,
    dataset: String,
}

struct Effect {
    document_id: String,
    doc_type: String,
    operation: &'static str,
    previous_rev: Option<String>,
    result_rev: Option<String>,
    slug: Option<String>,
}

impl Committer {
    pub fn new(store: Store, bus: EventBus, dataset: impl Into<String>) -> Self {
        Self {
            store,
            bus,
            dataset: dataset.into(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Apply `mutations` in order. There is no rollback: when one fails,
    /// the ones before it stay applied and are still announced.
    pub async fn commit(&self, mutations: Vec<Mutation>) -> Result<MutationResponse, MutationError> {
        let transaction_id = Uuid::new_v4().to_string();
        let mut effects = Vec::new();
        let mut results = Vec::new();

        let outcome = self.apply_all(mutations, &mut effects, &mut results).await;
        self.announce(&transaction_id, effects);

        match outcome {
            Ok(()) => Ok(MutationResponse {
                transaction_id,
                results,
            }),
            Err(err) => {
                tracing::warn!(%transaction_id, error = %err, "mutation batch failed");
                Err(err)
            }
        }
    }

    async fn apply_all(
        &self,
        mutations: Vec<Mutation>,
        effects: &mut Vec<Effect>,
        results: &mut Vec<MutationResult>,
    ) -> Result<(), MutationError> {
        for mutation in mutations {
            match mutation {
                Mutation::Create(m) => {
                    let doc = prepare(m.document)?;
                    let doc = self.store.insert(doc).await?;
                    record(effects, results, "create", None, Some(doc));
                }
                Mutation::CreateOrReplace(m) => {
                    let doc = prepare(m.document)?;
                    let (previous, doc) = self.store.upsert(doc).await?;
                    let op = if previous.is_some() { "update" } else { "create" };
                    record(effects, results, op, previous, Some(doc));
                }
                Mutation::CreateIfNotExists(m) => {
                    let doc = prepare(m.document)?;
                    if self.store.get(&doc._id).await?.is_none() {
                        let doc = self.store.insert(doc).await?;
                        record(effects, results, "create", None, Some(doc));
                    }
                }
                Mutation::Delete(m) => {
                    for id in self.delete_targets(m.target).await? {
                        if let Some(removed) = self.store.delete(&id).await? {
                            let rev = Some(removed._rev.clone());
                            effects.push(effect("delete", rev, None, &removed));
                            results.push(MutationResult {
                                id,
                                operation: "delete".into(),
                                document: None,
                            });
                        }
                    }
                }
                Mutation::Patch(m) => {
                    let (previous, doc) = self.patch(m).await?;
                    record(effects, results, "update", Some(previous), Some(doc));
                }
            }
        }
        Ok(())
    }

    /// Operations apply to the document as it is when the store hands it
    /// over, so concurrent `inc`s on one counter all land.
    async fn patch(&self, m: PatchMutation) -> Result<(String, Document), MutationError> {
        let (previous, stored) = self
            .store
            .update(&m.id, |current| -> Result<Document, MutationError> {
                if let Some(expected) = &m.if_revision_id {
                    if expected != &current._rev {
                        return Err(StoreError::RevisionMismatch {
                            id: m.id.clone(),
                            expected: expected.clone(),
                            found: current._rev.clone(),
                        }
                        .into());
                    }
                }

                let mut content = current.content.clone();
                apply_patch(&mut content, &m.operations)?;
                let next = current.revised(content);
                validate_document(&next.to_value())?;
                Ok(next)
            })
            .await?;
        Ok((previous._rev, stored))
    }

    async fn delete_targets(&self, target: DeleteTarget) -> Result<Vec<String>, MutationError> {
        match target {
            DeleteTarget::ById { id } => Ok(vec![id]),
            DeleteTarget::ByQuery { query, params } => {
                let dataset = self.store.snapshot(Perspective::Raw).await?;
                let params = params.unwrap_or(Value::Null);
                let now = Utc::now().to_rfc3339();
                let matched = sobremesa_groq::query(&query, &dataset, &params, &now)?;
                Ok(matched
                    .as_array()
                    .map(|docs| {
                        docs.iter()
                            .filter_map(|d| d.get("_id").and_then(Value::as_str))
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default())
            }
        }
    }

    fn announce(&self, transaction_id: &str, effects: Vec<Effect>) {
        let total = effects.len() as u32;
        for (i, e) in effects.into_iter().enumerate() {
            let tags = revalidate_tags(&e.doc_type, &e.document_id, e.slug.as_deref());
            tracing::info!(
                document_id = %e.document_id,
                doc_type = %e.doc_type,
                operation = e.operation,
                ?tags,
                "document changed"
            );
            self.bus.notify(ContentEvent::Mutation(MutationEvent {
                dataset: self.dataset.clone(),
                document_id: e.document_id,
                doc_type: e.doc_type,
                transaction_id: transaction_id.to_string(),
                operation: e.operation.to_string(),
                previous_rev: e.previous_rev,
                result_rev: e.result_rev,
                timestamp: Utc::now(),
                revalidate_tags: tags,
                transaction_total_events: total,
                transaction_current_event: i as u32 + 1,
            }));
        }
    }
}

fn prepare(value: Value) -> Result<Document, ValidationError> {
    let doc = Document::from_json(value)?;
    validate_document(&doc.to_value())?;
    Ok(doc)
}

fn effect(
    operation: &'static str,
    previous_rev: Option<String>,
    result_rev: Option<String>,
    doc: &Document,
) -> Effect {
    Effect {
        document_id: doc._id.clone(),
        doc_type: doc._type.clone(),
        operation,
        previous_rev,
        result_rev,
        slug: doc.slug().map(str::to_string),
    }
}

fn record(
    effects: &mut Vec<Effect>,
    results: &mut Vec<MutationResult>,
    operation: &'static str,
    previous_rev: Option<String>,
    doc: Option<Document>,
) {
    if let Some(doc) = doc {
        effects.push(effect(operation, previous_rev, Some(doc._rev.clone()), &doc));
        results.push(MutationResult {
            id: doc._id.clone(),
            operation: operation.to_string(),
            document: Some(doc.to_value()),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::types::{CreateMutation, PatchOperations};
    use serde_json::json;

    fn committer() -> Committer {
        Committer::new(Store::memory(), EventBus::new(16), "test")
    }

    fn city(id: &str, title: &str) -> Mutation {
        Mutation::Create(CreateMutation {
            document: json!({"_id": id, "_type": "city", "title": title, "slug": {"current": id}}),
        })
    }

    #[tokio::test]
    async fn create_patch_delete_roundtrip() {
        let c = committer();
        let mut rx = c.bus.subscribe();

        let created = c.commit(vec![city("madrid", "Madrid")]).await.unwrap();
        assert_eq!(created.results[0].operation, "create");

        c.commit(vec![Mutation::set("madrid", json!({"description": "Capital"}))])
            .await
            .unwrap();
        let stored = c.store().get("madrid").await.unwrap().unwrap();
        assert_eq!(stored.content["description"], "Capital");

        c.commit(vec![Mutation::delete("madrid")]).await.unwrap();
        assert!(c.store().get("madrid").await.unwrap().is_none());

        let ops: Vec<String> = (0..3)
            .map(|_| match rx.try_recv().unwrap() {
                ContentEvent::Mutation(e) => e.operation,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(ops, vec!["create", "update", "delete"]);
    }

    #[tokio::test]
    async fn invalid_documents_are_rejected() {
        let c = committer();
        let err = c
            .commit(vec![Mutation::Create(CreateMutation {
                document: json!({"_id": "r1", "_type": "review", "title": "Hola"}),
            })])
            .await
            .unwrap_err();
        assert!(matches!(err, MutationError::Validation(ValidationError::Rules(_))));
        assert!(c.store().get("r1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn patch_that_breaks_schema_is_rejected() {
        let c = committer();
        c.commit(vec![city("sevilla", "Sevilla")]).await.unwrap();
        let err = c
            .commit(vec![Mutation::Patch(PatchMutation {
                id: "sevilla".into(),
                if_revision_id: None,
                operations: PatchOperations {
                    unset: Some(vec!["title".into()]),
                    ..Default::default()
                },
            })])
            .await
            .unwrap_err();
        assert!(matches!(err, MutationError::Validation(_)));
    }

    #[tokio::test]
    async fn stale_revision_is_a_conflict() {
        let c = committer();
        let created = c.commit(vec![city("bilbao", "Bilbao")]).await.unwrap();
        let rev = created.results[0].document.as_ref().unwrap()["_rev"]
            .as_str()
            .unwrap()
            .to_string();

        c.commit(vec![Mutation::set("bilbao", json!({"description": "Pintxos"}))])
            .await
            .unwrap();

        let err = c
            .commit(vec![Mutation::Patch(PatchMutation {
                id: "bilbao".into(),
                if_revision_id: Some(rev),
                operations: PatchOperations {
                    set: Some(json!({"description": "Otra cosa"})),
                    ..Default::default()
                },
            })])
            .await
            .unwrap_err();
        assert!(matches!(err, MutationError::Store(StoreError::RevisionMismatch { .. })));
    }

    #[tokio::test]
    async fn failed_batch_keeps_earlier_mutations() {
        let c = committer();
        let err = c
            .commit(vec![city("cadiz", "Cádiz"), city("cadiz", "Cádiz")])
            .await
            .unwrap_err();
        assert!(matches!(err, MutationError::Store(StoreError::AlreadyExists(_))));
        assert!(c.store().get("cadiz").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_by_query() {
        let c = committer();
        c.commit(vec![city("a1", "Alicante"), city("a2", "Almería"), city("b1", "Burgos")])
            .await
            .unwrap();
        let res = c
            .commit(vec![Mutation::Delete(crate::mutation::types::DeleteMutation {
                target: DeleteTarget::ByQuery {
                    query: "*[_type == \"city\" && title match $q]".into(),
                    params: Some(json!({"q": "al*"})),
                },
            })])
            .await
            .unwrap();
        assert_eq!(res.results.len(), 2);
        assert!(c.store().get("b1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn create_if_not_exists_is_idempotent() {
        let c = committer();
        let m = || {
            Mutation::CreateIfNotExists(crate::mutation::types::CreateIfNotExistsMutation {
                document: json!({"_id": "t1", "_type": "category", "title": "Tapas", "slug": {"current": "tapas"}}),
            })
        };
        assert_eq!(c.commit(vec![m()]).await.unwrap().results.len(), 1);
        assert_eq!(c.commit(vec![m()]).await.unwrap().results.len(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_increments_all_count() {
        const SCANS: u64 = 64;
        let c = committer();
        c.commit(vec![city("toledo", "Toledo")]).await.unwrap();

        let tasks: Vec<_> = (0..SCANS)
            .map(|_| {
                let c = c.clone();
                tokio::spawn(async move { c.commit(vec![Mutation::inc("toledo", json!({"scans": 1}))]).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let stored = c.store().get("toledo").await.unwrap().unwrap();
        assert_eq!(stored.content["scans"], SCANS);
    }
}
