use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Events emitted after successful mutations, consumed by `/v1/listen`
/// subscribers and the revalidation logger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ContentEvent {
    Welcome,
    Mutation(MutationEvent),
    Reconnect,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationEvent {
    pub dataset: String,
    pub document_id: String,
    pub doc_type: String,
    pub transaction_id: String,
    /// `create`, `update` or `delete`.
    pub operation: String,
    pub previous_rev: Option<String>,
    pub result_rev: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// Cache tags affected by this change, e.g. `venue` and `venue:casa-lucio`.
    pub revalidate_tags: Vec<String>,
    pub transaction_total_events: u32,
    pub transaction_current_event: u32,
}

/// Tags a page fetch can subscribe to for a document of `doc_type`.
pub fn revalidate_tags(doc_type: &str, document_id: &str, slug: Option<&str>) -> Vec<String> {
    let mut tags = vec![doc_type.to_string(), format!("document:{document_id}")];
    if let Some(slug) = slug {
        tags.push(format!("{doc_type}:{slug}"));
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_include_slug_when_known() {
        assert_eq!(
            revalidate_tags("venue", "v1", Some("casa-lucio")),
            vec!["venue", "document:v1", "venue:casa-lucio"]
        );
        assert_eq!(revalidate_tags("qrCode", "q1", None).len(), 2);
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(ContentEvent::Welcome).unwrap();
        assert_eq!(json["type"], "welcome");
    }
}
