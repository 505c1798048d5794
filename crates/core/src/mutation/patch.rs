//! Applying patch operations to document content.

use serde_json::{Map, Value};
use thiserror::Error;

use super::types::{InsertOperation, PatchOperations};
use crate::document::model::SYSTEM_FIELDS;

#[derive(Debug, Error, PartialEq)]
pub enum PatchError {
    #[error("`{0}` is managed by the content lake and cannot be patched")]
    Immutable(String),
    #[error("invalid path `{0}`")]
    InvalidPath(String),
    #[error("`{0}` must be an object of path → value")]
    NotAnObject(&'static str),
    #[error("`{path}` is not a number")]
    NotANumber { path: String },
    #[error("`{path}` is not an array")]
    NotAnArray { path: String },
    #[error("insert needs exactly one of before, after or replace")]
    InsertTarget,
    #[error("{0} patches are not supported")]
    Unsupported(&'static str),
}

/// Apply `ops` to `content`, in the order setIfMissing, set, merge, unset,
/// inc, dec, insert. Missing numeric fields count as zero for inc/dec.
pub fn apply_patch(content: &mut Map<String, Value>, ops: &PatchOperations) -> Result<(), PatchError> {
    if ops.diff_match_patch.is_some() {
        return Err(PatchError::Unsupported("diffMatchPatch"));
    }

    if let Some(fields) = &ops.set_if_missing {
        for (path, value) in entries(fields, "setIfMissing")? {
            if get_path(content, path)?.map_or(true, Value::is_null) {
                set_path(content, path, value.clone())?;
            }
        }
    }
    if let Some(fields) = &ops.set {
        for (path, value) in entries(fields, "set")? {
            set_path(content, path, value.clone())?;
        }
    }
    if let Some(fields) = &ops.merge {
        for (path, value) in entries(fields, "merge")? {
            let merged = match (get_path(content, path)?, value) {
                (Some(Value::Object(existing)), Value::Object(incoming)) => {
                    let mut merged = existing.clone();
                    merged.extend(incoming.iter().map(|(k, v)| (k.clone(), v.clone())));
                    Value::Object(merged)
                }
                _ => value.clone(),
            };
            set_path(content, path, merged)?;
        }
    }
    if let Some(paths) = &ops.unset {
        for path in paths {
            unset_path(content, path)?;
        }
    }
    if let Some(fields) = &ops.inc {
        for (path, amount) in entries(fields, "inc")? {
            add(content, path, amount, 1.0)?;
        }
    }
    if let Some(fields) = &ops.dec {
        for (path, amount) in entries(fields, "dec")? {
            add(content, path, amount, -1.0)?;
        }
    }
    if let Some(insert) = &ops.insert {
        apply_insert(content, insert)?;
    }
    Ok(())
}

fn entries<'a>(
    fields: &'a Value,
    op: &'static str,
) -> Result<impl Iterator<Item = (&'a str, &'a Value)>, PatchError> {
    let map = fields.as_object().ok_or(PatchError::NotAnObject(op))?;
    Ok(map.iter().map(|(k, v)| (k.as_str(), v)))
}

fn split_path(path: &str) -> Result<Vec<&str>, PatchError> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(PatchError::InvalidPath(path.to_string()));
    }
    if SYSTEM_FIELDS.contains(&segments[0]) {
        return Err(PatchError::Immutable(segments[0].to_string()));
    }
    Ok(segments)
}

fn get_path<'c>(content: &'c Map<String, Value>, path: &str) -> Result<Option<&'c Value>, PatchError> {
    let segments = split_path(path)?;
    let (first, rest) = segments
        .split_first()
        .ok_or_else(|| PatchError::InvalidPath(path.to_string()))?;
    let mut current = content.get(*first);
    for key in rest {
        current = current.and_then(|v| v.get(*key));
    }
    Ok(current)
}

fn set_path(content: &mut Map<String, Value>, path: &str, value: Value) -> Result<(), PatchError> {
    let segments = split_path(path)?;
    let (last, parents) = segments
        .split_last()
        .ok_or_else(|| PatchError::InvalidPath(path.to_string()))?;
    let mut map = content;
    for key in parents {
        let entry = map
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        map = entry
            .as_object_mut()
            .ok_or_else(|| PatchError::InvalidPath(path.to_string()))?;
    }
    map.insert(last.to_string(), value);
    Ok(())
}

fn unset_path(content: &mut Map<String, Value>, path: &str) -> Result<(), PatchError> {
    let segments = split_path(path)?;
    let (last, parents) = segments
        .split_last()
        .ok_or_else(|| PatchError::InvalidPath(path.to_string()))?;
    let mut map = content;
    for key in parents {
        match map.get_mut(*key).and_then(Value::as_object_mut) {
            Some(next) => map = next,
            None => return Ok(()),
        }
    }
    map.remove(*last);
    Ok(())
}

fn add(content: &mut Map<String, Value>, path: &str, amount: &Value, sign: f64) -> Result<(), PatchError> {
    let not_a_number = || PatchError::NotANumber {
        path: path.to_string(),
    };
    let current = match get_path(content, path)? {
        None | Some(Value::Null) => Value::from(0),
        Some(v) if v.is_number() => v.clone(),
        Some(_) => return Err(not_a_number()),
    };

    let next = match (current.as_i64(), amount.as_i64()) {
        (Some(a), Some(b)) => Value::from(a + (sign as i64) * b),
        _ => {
            let a = current.as_f64().ok_or_else(not_a_number)?;
            let b = amount.as_f64().ok_or_else(not_a_number)?;
            serde_json::Number::from_f64(a + sign * b)
                .map(Value::Number)
                .ok_or_else(not_a_number)?
        }
    };
    set_path(content, path, next)
}

/// Parse `field[index]` (index may be negative, counting from the end).
fn parse_array_selector(selector: &str) -> Result<(&str, i64), PatchError> {
    let invalid = || PatchError::InvalidPath(selector.to_string());
    let (field, rest) = selector.split_once('[').ok_or_else(invalid)?;
    let index = rest.strip_suffix(']').ok_or_else(invalid)?;
    let index: i64 = index.trim().parse().map_err(|_| invalid())?;
    Ok((field, index))
}

fn apply_insert(content: &mut Map<String, Value>, insert: &InsertOperation) -> Result<(), PatchError> {
    let (selector, mode) = match (&insert.before, &insert.after, &insert.replace) {
        (Some(s), None, None) => (s, InsertMode::Before),
        (None, Some(s), None) => (s, InsertMode::After),
        (None, None, Some(s)) => (s, InsertMode::Replace),
        _ => return Err(PatchError::InsertTarget),
    };
    let (field, index) = parse_array_selector(selector)?;

    let mut items = match get_path(content, field)? {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.clone(),
        Some(_) => {
            return Err(PatchError::NotAnArray {
                path: field.to_string(),
            })
        }
    };

    let len = items.len() as i64;
    let resolved = if index < 0 { len + index } else { index };
    let at = match mode {
        InsertMode::Before => resolved.clamp(0, len),
        InsertMode::After => (resolved + 1).clamp(0, len),
        InsertMode::Replace => resolved.clamp(0, len),
    } as usize;

    if mode == InsertMode::Replace && at < items.len() {
        items.splice(at..=at, insert.items.iter().cloned());
    } else {
        items.splice(at..at, insert.items.iter().cloned());
    }
    set_path(content, field, Value::Array(items))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InsertMode {
    Before,
    After,
    Replace,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn content(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    fn ops(value: Value) -> PatchOperations {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn set_creates_nested_objects() {
        let mut c = content(json!({"title": "Casa Lucio"}));
        apply_patch(&mut c, &ops(json!({"set": {"address.street": "Cava Baja 35", "title": "Casa Lucio Madrid"}}))).unwrap();
        assert_eq!(c["address"]["street"], "Cava Baja 35");
        assert_eq!(c["title"], "Casa Lucio Madrid");
    }

    #[test]
    fn set_if_missing_keeps_existing() {
        let mut c = content(json!({"stats": {"views": 3}}));
        apply_patch(&mut c, &ops(json!({"setIfMissing": {"stats.views": 0, "stats.shares": 0}}))).unwrap();
        assert_eq!(c["stats"], json!({"views": 3, "shares": 0}));
    }

    #[test]
    fn unset_and_merge() {
        let mut c = content(json!({"tldr": "x", "social": {"website": "https://a.es"}}));
        apply_patch(
            &mut c,
            &ops(json!({"unset": ["tldr", "missing.deep"], "merge": {"social": {"instagram": "https://instagram.com/a"}}})),
        )
        .unwrap();
        assert!(!c.contains_key("tldr"));
        assert_eq!(c["social"]["website"], "https://a.es");
        assert_eq!(c["social"]["instagram"], "https://instagram.com/a");
    }

    #[test]
    fn inc_and_dec_counters() {
        let mut c = content(json!({"scans": 4}));
        apply_patch(&mut c, &ops(json!({"inc": {"scans": 1, "downloads": 2}}))).unwrap();
        assert_eq!(c["scans"], 5);
        assert_eq!(c["downloads"], 2);
        apply_patch(&mut c, &ops(json!({"dec": {"scans": 2}}))).unwrap();
        assert_eq!(c["scans"], 3);

        let mut bad = content(json!({"scans": "many"}));
        assert!(matches!(
            apply_patch(&mut bad, &ops(json!({"inc": {"scans": 1}}))),
            Err(PatchError::NotANumber { .. })
        ));
    }

    #[test]
    fn insert_positions() {
        let mut c = content(json!({"pros": ["a", "c"]}));
        apply_patch(&mut c, &ops(json!({"insert": {"after": "pros[0]", "items": ["b"]}}))).unwrap();
        assert_eq!(c["pros"], json!(["a", "b", "c"]));
        apply_patch(&mut c, &ops(json!({"insert": {"after": "pros[-1]", "items": ["d"]}}))).unwrap();
        assert_eq!(c["pros"], json!(["a", "b", "c", "d"]));
        apply_patch(&mut c, &ops(json!({"insert": {"replace": "pros[1]", "items": ["B", "B2"]}}))).unwrap();
        assert_eq!(c["pros"], json!(["a", "B", "B2", "c", "d"]));
        apply_patch(&mut c, &ops(json!({"insert": {"before": "cons[0]", "items": ["caro"]}}))).unwrap();
        assert_eq!(c["cons"], json!(["caro"]));
    }

    #[test]
    fn system_fields_are_immutable() {
        let mut c = content(json!({}));
        assert_eq!(
            apply_patch(&mut c, &ops(json!({"set": {"_type": "post"}}))),
            Err(PatchError::Immutable("_type".into()))
        );
    }
}
