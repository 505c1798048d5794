//! Declarative content schemas.
//!
//! Each document type is a list of fields with validation rules, checked
//! at write time by the mutation executor.

mod types;

use serde_json::Value;

use crate::document::ValidationIssue;

pub use types::{schema_for, DOCUMENT_TYPES, EDITORIAL_TYPES};

/// A validation rule attached to a field.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    Required,
    MinLength(usize),
    MaxLength(usize),
    MinItems(usize),
    MaxItems(usize),
    Range { min: f64, max: f64 },
    /// `{ current: "kebab-case" }`
    Slug,
    /// `{ _ref: "..." }`
    Reference,
    /// String value must be one of the listed options.
    OneOf(&'static [&'static str]),
    /// `http://` or `https://` URL.
    Url,
    /// Rules applied to each item of an array field.
    Items(Vec<Field>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Dotted path from the document (or array item) root.
    pub path: &'static str,
    pub rules: Vec<Rule>,
}

impl Field {
    pub fn new(path: &'static str, rules: Vec<Rule>) -> Self {
        Self { path, rules }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaType {
    pub name: &'static str,
    pub title: &'static str,
    pub fields: Vec<Field>,
    /// Exactly one of these fields must be set.
    pub exactly_one_of: Option<&'static [&'static str]>,
}

impl SchemaType {
    /// Run every rule against `doc`, collecting all failures.
    pub fn check(&self, doc: &Value) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        check_fields(&self.fields, doc, "", &mut issues);

        if let Some(options) = self.exactly_one_of {
            let set = options
                .iter()
                .filter(|f| is_present(lookup(doc, f)))
                .count();
            if set != 1 {
                issues.push(ValidationIssue {
                    path: options.join("|"),
                    message: format!("exactly one of {} must be set, found {set}", options.join(", ")),
                });
            }
        }
        issues
    }
}

fn check_fields(fields: &[Field], root: &Value, prefix: &str, issues: &mut Vec<ValidationIssue>) {
    for field in fields {
        let path = if prefix.is_empty() {
            field.path.to_string()
        } else {
            format!("{prefix}.{}", field.path)
        };
        let value = lookup(root, field.path);
        for rule in &field.rules {
            if let Some(message) = check_rule(rule, value, &path, issues) {
                issues.push(ValidationIssue {
                    path: path.clone(),
                    message,
                });
            }
        }
    }
}

/// Returns a message when `rule` fails. Absent values only fail `Required`.
fn check_rule(
    rule: &Rule,
    value: Option<&Value>,
    path: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<String> {
    if !is_present(value) {
        return matches!(rule, Rule::Required).then(|| "is required".to_string());
    }
    let value = value?;

    match rule {
        Rule::Required => None,
        Rule::MinLength(min) => value
            .as_str()
            .filter(|s| s.chars().count() < *min)
            .map(|_| format!("must be at least {min} characters")),
        Rule::MaxLength(max) => value
            .as_str()
            .filter(|s| s.chars().count() > *max)
            .map(|_| format!("must be at most {max} characters")),
        Rule::MinItems(min) => value
            .as_array()
            .filter(|a| a.len() < *min)
            .map(|_| format!("must have at least {min} items")),
        Rule::MaxItems(max) => value
            .as_array()
            .filter(|a| a.len() > *max)
            .map(|_| format!("must have at most {max} items")),
        Rule::Range { min, max } => match value.as_f64() {
            Some(n) if n < *min || n > *max => Some(format!("must be between {min} and {max}")),
            Some(_) => None,
            None => Some("must be a number".to_string()),
        },
        Rule::Slug => match value.get("current").and_then(Value::as_str) {
            Some(slug) if is_slug(slug) => None,
            Some(_) => Some("slug may only contain lowercase letters, digits and dashes".into()),
            None => Some("must be a slug object with `current`".into()),
        },
        Rule::Reference => match value.get("_ref").and_then(Value::as_str) {
            Some(r) if !r.is_empty() => None,
            _ => Some("must be a reference".into()),
        },
        Rule::OneOf(options) => match value.as_str() {
            Some(s) if options.contains(&s) => None,
            _ => Some(format!("must be one of {}", options.join(", "))),
        },
        Rule::Url => match value.as_str() {
            Some(s) if s.starts_with("https://") || s.starts_with("http://") => None,
            _ => Some("must be an http(s) URL".into()),
        },
        Rule::Items(fields) => {
            if let Some(items) = value.as_array() {
                for (i, item) in items.iter().enumerate() {
                    check_fields(fields, item, &format!("{path}[{i}]"), issues);
                }
            }
            None
        }
    }
}

fn lookup<'v>(root: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.').try_fold(root, |v, key| v.get(key))
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

/// Lowercase ASCII letters, digits and single dashes, no leading/trailing dash.
pub fn is_slug(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with('-')
        && !s.ends_with('-')
        && !s.contains("--")
        && s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Build a slug from a title: lowercase, accents folded, non-alphanumerics
/// collapsed into single dashes.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars().flat_map(char::to_lowercase) {
        let folded = match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            'ç' => 'c',
            other => other,
        };
        if folded.is_ascii_alphanumeric() {
            slug.push(folded);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn issues(doc: Value) -> Vec<ValidationIssue> {
        let t = doc["_type"].as_str().unwrap().to_string();
        schema_for(&t).unwrap().check(&doc)
    }

    #[test]
    fn slugify_folds_spanish_text() {
        assert_eq!(slugify("Cañas & Tapas: El Bar"), "canas-tapas-el-bar");
        assert_eq!(slugify("  Jamón ibérico  "), "jamon-iberico");
        assert!(is_slug(&slugify("¿Dónde comer en Málaga?")));
    }

    #[test]
    fn valid_venue_passes() {
        let found = issues(json!({
            "_id": "v1", "_type": "venue", "title": "Casa Lucio",
            "slug": {"current": "casa-lucio"}, "city": {"_ref": "city-madrid"},
            "priceRange": "€€", "geo": {"lat": 40.41, "lng": -3.71}
        }));
        assert!(found.is_empty(), "{found:?}");
    }

    #[test]
    fn review_ratings_are_bounded() {
        let found = issues(json!({
            "_id": "r1", "_type": "review", "title": "Un clásico castizo",
            "slug": {"current": "casa-lucio"}, "venue": {"_ref": "v1"},
            "ratings": {"food": 11, "service": 8, "ambience": 7, "value": -1}
        }));
        let paths: Vec<&str> = found.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["ratings.food", "ratings.value"]);
    }

    #[test]
    fn list_items_are_checked_individually() {
        let found = issues(json!({
            "_id": "l1", "_type": "list", "title": "Top 3 cocidos",
            "slug": {"current": "top-cocidos"},
            "items": [
                {"venue": {"_ref": "v1"}, "position": 1},
                {"position": 2},
                {"venue": {"_ref": "v3"}, "position": 3}
            ]
        }));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, "items[1].venue");
    }

    #[test]
    fn featured_item_needs_exactly_one_target() {
        let none = issues(json!({"_id": "f1", "_type": "featuredItem", "order": 1}));
        assert_eq!(none.len(), 1);
        let two = issues(json!({
            "_id": "f1", "_type": "featuredItem",
            "venue": {"_ref": "v1"}, "guide": {"_ref": "g1"}
        }));
        assert_eq!(two.len(), 1);
        let one = issues(json!({"_id": "f1", "_type": "featuredItem", "review": {"_ref": "r1"}}));
        assert!(one.is_empty());
    }

    #[test]
    fn blank_strings_count_as_missing() {
        let found = issues(json!({"_id": "c", "_type": "city", "title": "  ", "slug": {"current": "x"}}));
        assert_eq!(found[0].path, "title");
        assert_eq!(found[0].message, "is required");
    }
}
