use std::fmt;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::schema;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("document must be a JSON object")]
    NotAnObject,
    #[error("document _id is required")]
    MissingId,
    #[error("document _type is required")]
    MissingType,
    #[error("document _id cannot be empty")]
    EmptyId,
    #[error("document _type cannot be empty")]
    EmptyType,
    #[error("invalid document _id: {0}")]
    InvalidId(String),
    #[error("document failed validation: {}", join_issues(.0))]
    Rules(Vec<ValidationIssue>),
}

/// A single failed schema rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validate that a document has the minimum required fields.
pub fn validate_document_fields(
    id: Option<&str>,
    doc_type: Option<&str>,
) -> Result<(), ValidationError> {
    match id {
        None => return Err(ValidationError::MissingId),
        Some("") => return Err(ValidationError::EmptyId),
        _ => {}
    }
    match doc_type {
        None => return Err(ValidationError::MissingType),
        Some("") => return Err(ValidationError::EmptyType),
        _ => {}
    }
    Ok(())
}

/// Validate a full document value against its type's schema rules.
/// Types without a schema only need `_id` and `_type`.
pub fn validate_document(doc: &Value) -> Result<(), ValidationError> {
    let id = doc.get("_id").and_then(Value::as_str);
    let doc_type = doc.get("_type").and_then(Value::as_str);
    validate_document_fields(id, doc_type)?;

    let Some(schema) = doc_type.and_then(schema::schema_for) else {
        return Ok(());
    };
    let issues = schema.check(doc);
    if issues.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Rules(issues))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn requires_id_and_type() {
        assert!(matches!(
            validate_document(&json!({"_type": "city"})),
            Err(ValidationError::MissingId)
        ));
        assert!(matches!(
            validate_document(&json!({"_id": "x", "_type": ""})),
            Err(ValidationError::EmptyType)
        ));
    }

    #[test]
    fn unknown_types_pass() {
        assert!(validate_document(&json!({"_id": "x", "_type": "somethingElse"})).is_ok());
    }

    #[test]
    fn rule_failures_are_listed() {
        let err = validate_document(&json!({"_id": "c1", "_type": "city"})).unwrap_err();
        match err {
            ValidationError::Rules(issues) => {
                assert!(issues.iter().any(|i| i.path == "title"));
                assert!(issues.iter().any(|i| i.path == "slug"));
            }
            other => panic!("expected rule failures, got {other:?}"),
        }
    }
}
