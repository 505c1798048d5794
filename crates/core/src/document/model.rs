use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::id::{is_valid_id, DocumentIdKind};
use super::validate::ValidationError;

/// Attributes managed by the content lake rather than by editors.
pub const SYSTEM_FIELDS: [&str; 5] = ["_id", "_type", "_rev", "_createdAt", "_updatedAt"];

/// A content document: system attributes plus arbitrary JSON fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub _id: String,
    pub _type: String,
    #[serde(rename = "_createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "_updatedAt")]
    pub updated_at: DateTime<Utc>,
    pub _rev: String,
    #[serde(flatten)]
    pub content: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, doc_type: impl Into<String>, content: Map<String, Value>) -> Self {
        let now = Utc::now();
        Self {
            _id: id.into(),
            _type: doc_type.into(),
            created_at: now,
            updated_at: now,
            _rev: new_revision(),
            content,
        }
    }

    /// Build a document from editor-supplied JSON. A missing `_id` gets a
    /// fresh UUID; system timestamps and revision are always assigned here.
    pub fn from_json(value: Value) -> Result<Self, ValidationError> {
        let Value::Object(mut map) = value else {
            return Err(ValidationError::NotAnObject);
        };

        let id = match map.get("_id") {
            None | Some(Value::Null) => Uuid::new_v4().to_string(),
            Some(Value::String(id)) if id.is_empty() => return Err(ValidationError::EmptyId),
            Some(Value::String(id)) if !is_valid_id(id) => {
                return Err(ValidationError::InvalidId(id.clone()))
            }
            Some(Value::String(id)) => id.clone(),
            Some(_) => return Err(ValidationError::MissingId),
        };
        let doc_type = match map.get("_type") {
            Some(Value::String(t)) if t.is_empty() => return Err(ValidationError::EmptyType),
            Some(Value::String(t)) => t.clone(),
            _ => return Err(ValidationError::MissingType),
        };

        for field in SYSTEM_FIELDS {
            map.remove(field);
        }
        Ok(Self::new(id, doc_type, map))
    }

    /// Full JSON representation, as seen by queries.
    pub fn to_value(&self) -> Value {
        let mut map = self.content.clone();
        map.insert("_id".into(), Value::String(self._id.clone()));
        map.insert("_type".into(), Value::String(self._type.clone()));
        map.insert("_rev".into(), Value::String(self._rev.clone()));
        map.insert("_createdAt".into(), Value::String(self.created_at.to_rfc3339()));
        map.insert("_updatedAt".into(), Value::String(self.updated_at.to_rfc3339()));
        Value::Object(map)
    }

    pub fn id_kind(&self) -> DocumentIdKind {
        DocumentIdKind::parse(&self._id)
    }

    /// `slug.current`, when the document has one.
    pub fn slug(&self) -> Option<&str> {
        self.content
            .get("slug")
            .and_then(|s| s.get("current"))
            .and_then(Value::as_str)
    }

    /// Replace the content and stamp a new revision.
    pub fn revised(&self, content: Map<String, Value>) -> Self {
        Self {
            _id: self._id.clone(),
            _type: self._type.clone(),
            created_at: self.created_at,
            updated_at: Utc::now(),
            _rev: new_revision(),
            content,
        }
    }
}

pub fn new_revision() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Database row representation of a document.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DocumentRow {
    pub id: Uuid,
    pub dataset: String,
    pub document_id: String,
    pub doc_type: String,
    pub revision: String,
    pub content: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted: bool,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        let content = match row.content {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Document {
            _id: row.document_id,
            _type: row.doc_type,
            created_at: row.created_at,
            updated_at: row.updated_at,
            _rev: row.revision,
            content,
        }
    }
}
