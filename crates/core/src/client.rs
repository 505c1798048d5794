use chrono::Utc;
use serde::de::{DeserializeOwned, Error as _};
use serde_json::Value;

use crate::store::{Perspective, Store};
use crate::ContentError;

/// Read access to the content lake. Every call re-queries the store.
#[derive(Debug, Clone)]
pub struct ContentClient {
    store: Store,
}

impl ContentClient {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Evaluate `query` over published documents and decode the result.
    /// `tags` name the cache entries a mutation would invalidate.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        query: &str,
        params: Value,
        tags: &[&str],
    ) -> Result<T, ContentError> {
        let value = self.query_value(query, &params, Perspective::Published).await?;
        tracing::debug!(?tags, "content fetch");
        Ok(serde_json::from_value(value)?)
    }

    /// Like [`fetch`](Self::fetch), but a `null` result becomes `None`.
    pub async fn fetch_optional<T: DeserializeOwned>(
        &self,
        query: &str,
        params: Value,
        tags: &[&str],
    ) -> Result<Option<T>, ContentError> {
        let value = self.query_value(query, &params, Perspective::Published).await?;
        tracing::debug!(?tags, "content fetch");
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(value)?))
    }

    /// Decode an array result item by item. Items that do not decode (a
    /// dangling reference, a half-filled draft) are logged and skipped.
    pub async fn fetch_list<T: DeserializeOwned>(
        &self,
        query: &str,
        params: Value,
        tags: &[&str],
    ) -> Result<Vec<T>, ContentError> {
        let value = self.query_value(query, &params, Perspective::Published).await?;
        tracing::debug!(?tags, "content fetch");
        let items = match value {
            Value::Array(items) => items,
            Value::Null => return Ok(Vec::new()),
            other => {
                return Err(ContentError::Decode(serde_json::Error::custom(format!(
                    "expected an array, got {other}"
                ))))
            }
        };
        Ok(items
            .into_iter()
            .filter_map(|item| {
                let id = item.get("_id").and_then(Value::as_str).map(str::to_string);
                match serde_json::from_value(item) {
                    Ok(decoded) => Some(decoded),
                    Err(err) => {
                        tracing::warn!(document_id = ?id, error = %err, "skipping undecodable query result");
                        None
                    }
                }
            })
            .collect())
    }

    /// Raw JSON result under the given perspective.
    pub async fn query_value(
        &self,
        query: &str,
        params: &Value,
        perspective: Perspective,
    ) -> Result<Value, ContentError> {
        let dataset = self.store.snapshot(perspective).await?;
        let now = Utc::now().to_rfc3339();
        Ok(sobremesa_groq::query(query, &dataset, params, &now)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Title {
        title: String,
    }

    async fn client() -> ContentClient {
        let store = Store::memory();
        for value in [
            json!({"_id": "c1", "_type": "city", "title": "Madrid"}),
            json!({"_id": "drafts.c2", "_type": "city", "title": "Borrador"}),
        ] {
            store.insert(Document::from_json(value).unwrap()).await.unwrap();
        }
        ContentClient::new(store)
    }

    #[tokio::test]
    async fn fetch_decodes_published_documents() {
        let c = client().await;
        let titles: Vec<Title> = c
            .fetch("*[_type == \"city\"]{title}", Value::Null, &["city"])
            .await
            .unwrap();
        assert_eq!(titles.len(), 1);
        assert_eq!(titles[0].title, "Madrid");
    }

    #[tokio::test]
    async fn fetch_optional_maps_null_to_none() {
        let c = client().await;
        let missing: Option<Title> = c
            .fetch_optional("*[_id == $id][0]{title}", json!({"id": "zz"}), &[])
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn fetch_list_skips_undecodable_items() {
        let c = client().await;
        c.store()
            .insert(Document::from_json(json!({"_id": "c3", "_type": "city"})).unwrap())
            .await
            .unwrap();
        let titles: Vec<Title> = c
            .fetch_list("*[_type == \"city\"]{title}", Value::Null, &[])
            .await
            .unwrap();
        assert_eq!(titles.len(), 1);
    }

    #[tokio::test]
    async fn raw_perspective_sees_drafts() {
        let c = client().await;
        let count = c
            .query_value("count(*)", &Value::Null, Perspective::Raw)
            .await
            .unwrap();
        assert_eq!(count, json!(2));
    }
}
