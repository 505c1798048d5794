//! GROQ in-memory evaluator.
//!
//! Queries run against a [`Dataset`] snapshot: `*` yields every document,
//! `->` resolves `_ref` values by `_id`. Comparisons between incompatible
//! types yield `null`, which filters treat as false.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::ast::Expr;
use crate::functions::call_builtin;

#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("type error: {0}")]
    TypeError(String),
    #[error("unsupported expression")]
    Unsupported,
}

/// Documents a query can see, indexed by `_id` for dereferencing.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    docs: Vec<Value>,
    by_id: HashMap<String, usize>,
}

impl Dataset {
    pub fn new(docs: Vec<Value>) -> Self {
        let by_id = docs
            .iter()
            .enumerate()
            .filter_map(|(i, doc)| doc.get("_id").and_then(Value::as_str).map(|id| (id.to_string(), i)))
            .collect();
        Self { docs, by_id }
    }

    pub fn documents(&self) -> &[Value] {
        &self.docs
    }

    pub fn get(&self, id: &str) -> Option<&Value> {
        self.by_id.get(id).map(|&i| &self.docs[i])
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

/// Lexical scope: `@` is `this`, `^` is the enclosing scope's `this`.
struct Scope<'s> {
    this: &'s Value,
    parent: Option<&'s Scope<'s>>,
}

pub struct Evaluator<'a> {
    dataset: &'a Dataset,
    params: &'a Value,
    now: &'a str,
}

impl<'a> Evaluator<'a> {
    /// `now` is returned verbatim by the `now()` function.
    pub fn new(dataset: &'a Dataset, params: &'a Value, now: &'a str) -> Self {
        Self {
            dataset,
            params,
            now,
        }
    }

    /// Evaluate a top-level query. `@` is null at the root.
    pub fn evaluate(&self, expr: &Expr) -> Result<Value, EvalError> {
        let root = Value::Null;
        self.eval(expr, &Scope {
            this: &root,
            parent: None,
        })
    }

    /// Evaluate `expr` as a filter against a single document.
    pub fn matches(&self, expr: &Expr, doc: &Value) -> Result<bool, EvalError> {
        let scope = Scope {
            this: doc,
            parent: None,
        };
        Ok(is_true(&self.eval(expr, &scope)?))
    }

    fn eval(&self, expr: &Expr, scope: &Scope<'_>) -> Result<Value, EvalError> {
        match expr {
            Expr::StringLiteral(s) => Ok(Value::String(s.clone())),
            Expr::IntLiteral(n) => Ok(Value::Number((*n).into())),
            Expr::FloatLiteral(n) => Ok(number(*n)),
            Expr::BoolLiteral(b) => Ok(Value::Bool(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Array(items) => items
                .iter()
                .map(|item| self.eval(item, scope))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Expr::Object(fields) => self.project(scope.this, fields, scope.parent),

            Expr::Ident(name) => Ok(scope.this.get(name).cloned().unwrap_or(Value::Null)),
            Expr::DotAccess(base, field) => {
                let v = self.eval(base, scope)?;
                Ok(access(&v, field))
            }
            Expr::Deref(base, field) => {
                let v = self.eval(base, scope)?;
                let target = self.deref(&v);
                Ok(match field {
                    Some(field) => access(&target, field),
                    None => target,
                })
            }
            Expr::This => Ok(scope.this.clone()),
            Expr::Parent => Ok(scope
                .parent
                .map(|p| p.this.clone())
                .unwrap_or(Value::Null)),
            Expr::Param(name) => Ok(self.params.get(name).cloned().unwrap_or(Value::Null)),

            Expr::Eq(l, r) => {
                let (lv, rv) = (self.eval(l, scope)?, self.eval(r, scope)?);
                Ok(Value::Bool(values_equal(&lv, &rv)))
            }
            Expr::Neq(l, r) => {
                let (lv, rv) = (self.eval(l, scope)?, self.eval(r, scope)?);
                Ok(Value::Bool(!values_equal(&lv, &rv)))
            }
            Expr::Lt(l, r) => self.ordering(l, r, scope, |o| o == Ordering::Less),
            Expr::Gt(l, r) => self.ordering(l, r, scope, |o| o == Ordering::Greater),
            Expr::Lte(l, r) => self.ordering(l, r, scope, |o| o != Ordering::Greater),
            Expr::Gte(l, r) => self.ordering(l, r, scope, |o| o != Ordering::Less),
            Expr::In(l, r) => {
                let (lv, rv) = (self.eval(l, scope)?, self.eval(r, scope)?);
                Ok(match rv {
                    Value::Array(items) => Value::Bool(items.iter().any(|i| values_equal(&lv, i))),
                    _ => Value::Null,
                })
            }
            Expr::Match(l, r) => {
                let (lv, rv) = (self.eval(l, scope)?, self.eval(r, scope)?);
                Ok(Value::Bool(text_match(&lv, &rv)))
            }

            Expr::And(l, r) => Ok(Value::Bool(
                is_true(&self.eval(l, scope)?) && is_true(&self.eval(r, scope)?),
            )),
            Expr::Or(l, r) => Ok(Value::Bool(
                is_true(&self.eval(l, scope)?) || is_true(&self.eval(r, scope)?),
            )),
            Expr::Not(inner) => Ok(Value::Bool(!is_true(&self.eval(inner, scope)?))),

            Expr::Everything => Ok(Value::Array(self.dataset.documents().to_vec())),
            Expr::Pipeline(stages) => {
                let (source, rest) = stages.split_first().ok_or(EvalError::Unsupported)?;
                let mut value = self.eval(source, scope)?;
                for stage in rest {
                    value = self.apply_stage(stage, value, scope)?;
                }
                Ok(value)
            }

            Expr::FuncCall(name, args) => self.call(name, args, scope),

            Expr::Filter(_)
            | Expr::Projection(_)
            | Expr::Order(_)
            | Expr::Slice(_, _)
            | Expr::Index(_)
            | Expr::Traverse => Err(EvalError::Unsupported),
        }
    }

    fn apply_stage(&self, stage: &Expr, input: Value, scope: &Scope<'_>) -> Result<Value, EvalError> {
        match stage {
            Expr::Filter(cond) => match input {
                Value::Array(items) => {
                    let mut kept = Vec::new();
                    for item in items {
                        let inner = Scope {
                            this: &item,
                            parent: Some(scope),
                        };
                        if is_true(&self.eval(cond, &inner)?) {
                            kept.push(item);
                        }
                    }
                    Ok(Value::Array(kept))
                }
                _ => Ok(Value::Null),
            },
            Expr::Projection(fields) => match input {
                Value::Array(items) => items
                    .iter()
                    .map(|item| self.project(item, fields, Some(scope)))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array),
                Value::Object(_) => self.project(&input, fields, Some(scope)),
                _ => Ok(Value::Null),
            },
            Expr::Order(keys) => match input {
                Value::Array(items) => self.order(items, keys, scope).map(Value::Array),
                other => Ok(other),
            },
            Expr::Slice(start, end) => match input {
                Value::Array(items) => {
                    let len = items.len() as i64;
                    let lo = resolve_index(*start, len).clamp(0, len) as usize;
                    let hi = resolve_index(*end, len).clamp(0, len) as usize;
                    if lo >= hi {
                        return Ok(Value::Array(Vec::new()));
                    }
                    Ok(Value::Array(items[lo..hi].to_vec()))
                }
                _ => Ok(Value::Null),
            },
            Expr::Index(i) => match input {
                Value::Array(items) => {
                    let idx = resolve_index(*i, items.len() as i64);
                    Ok(usize::try_from(idx)
                        .ok()
                        .and_then(|idx| items.get(idx).cloned())
                        .unwrap_or(Value::Null))
                }
                _ => Ok(Value::Null),
            },
            Expr::Traverse => match input {
                Value::Array(items) => Ok(Value::Array(items)),
                _ => Ok(Value::Null),
            },
            _ => Err(EvalError::Unsupported),
        }
    }

    fn project(
        &self,
        item: &Value,
        fields: &[(String, Expr)],
        parent: Option<&Scope<'_>>,
    ) -> Result<Value, EvalError> {
        let scope = Scope { this: item, parent };
        let mut out = Map::new();
        for (key, expr) in fields {
            if Expr::is_spread_key(key) {
                if let Value::Object(map) = item {
                    out.extend(map.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
                continue;
            }
            let value = self.eval(expr, &scope)?;
            // Null attributes are omitted from projections.
            if value.is_null() {
                out.remove(key);
            } else {
                out.insert(key.clone(), value);
            }
        }
        Ok(Value::Object(out))
    }

    fn order(
        &self,
        items: Vec<Value>,
        keys: &[(Expr, bool)],
        scope: &Scope<'_>,
    ) -> Result<Vec<Value>, EvalError> {
        let mut keyed = Vec::with_capacity(items.len());
        for item in items {
            let inner = Scope {
                this: &item,
                parent: Some(scope),
            };
            let sort_keys = keys
                .iter()
                .map(|(expr, _)| self.eval(expr, &inner))
                .collect::<Result<Vec<_>, _>>()?;
            keyed.push((sort_keys, item));
        }

        keyed.sort_by(|(a, _), (b, _)| {
            for (i, (_, ascending)) in keys.iter().enumerate() {
                let ord = order_values(&a[i], &b[i], *ascending);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });

        Ok(keyed.into_iter().map(|(_, item)| item).collect())
    }

    fn deref(&self, value: &Value) -> Value {
        match value {
            Value::Object(map) => map
                .get("_ref")
                .and_then(Value::as_str)
                .and_then(|id| self.dataset.get(id))
                .cloned()
                .unwrap_or(Value::Null),
            Value::Array(items) => Value::Array(items.iter().map(|v| self.deref(v)).collect()),
            _ => Value::Null,
        }
    }

    fn ordering(
        &self,
        l: &Expr,
        r: &Expr,
        scope: &Scope<'_>,
        accept: impl Fn(Ordering) -> bool,
    ) -> Result<Value, EvalError> {
        let (lv, rv) = (self.eval(l, scope)?, self.eval(r, scope)?);
        Ok(match compare_values(&lv, &rv) {
            Some(ord) => Value::Bool(accept(ord)),
            None => Value::Null,
        })
    }

    fn call(&self, name: &str, args: &[Expr], scope: &Scope<'_>) -> Result<Value, EvalError> {
        if name == "now" {
            return Ok(Value::String(self.now.to_string()));
        }
        let mut values = args
            .iter()
            .map(|arg| self.eval(arg, scope))
            .collect::<Result<Vec<_>, _>>()?;
        // references($id) checks the current document
        if name == "references" && values.len() == 1 {
            values.insert(0, scope.this.clone());
        }
        call_builtin(name, &values)
    }
}

/// Evaluate `expr` as a filter against a single document, without a dataset.
pub fn eval_filter(expr: &Expr, doc: &Value, params: &Value) -> Result<bool, EvalError> {
    let dataset = Dataset::default();
    Evaluator::new(&dataset, params, "").matches(expr, doc)
}

fn is_true(value: &Value) -> bool {
    matches!(value, Value::Bool(true))
}

fn number(n: f64) -> Value {
    serde_json::Number::from_f64(n)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn access(value: &Value, field: &str) -> Value {
    match value {
        Value::Object(map) => map.get(field).cloned().unwrap_or(Value::Null),
        Value::Array(items) => Value::Array(items.iter().map(|v| access(v, field)).collect()),
        _ => Value::Null,
    }
}

fn resolve_index(i: i64, len: i64) -> i64 {
    if i < 0 {
        len + i
    } else {
        i
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Ordering used by `order()`: nulls sort last in either direction.
fn order_values(a: &Value, b: &Value, ascending: bool) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let ord = compare_values(a, b).unwrap_or(Ordering::Equal);
            if ascending {
                ord
            } else {
                ord.reverse()
            }
        }
    }
}

fn text_tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// `text match pattern`: every pattern term must equal a token of the text,
/// or prefix one when it ends in `*`.
fn text_match(text: &Value, pattern: &Value) -> bool {
    let haystack: Vec<String> = match text {
        Value::String(s) => text_tokens(s),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .flat_map(text_tokens)
            .collect(),
        _ => return false,
    };
    let patterns: Vec<&str> = match pattern {
        Value::String(s) => vec![s.as_str()],
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => return false,
    };

    let mut terms = Vec::new();
    for p in patterns {
        for raw in p.split(|c: char| !(c.is_alphanumeric() || c == '*')) {
            let term = raw.to_lowercase();
            if !term.trim_matches('*').is_empty() {
                terms.push(term);
            }
        }
    }
    if terms.is_empty() {
        return false;
    }

    terms.iter().all(|term| match term.strip_suffix('*') {
        Some(prefix) => {
            let prefix = prefix.trim_start_matches('*');
            haystack.iter().any(|t| t.starts_with(prefix))
        }
        None => haystack.iter().any(|t| t == term),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use serde_json::json;

    fn dataset() -> Dataset {
        Dataset::new(vec![
            json!({"_id": "city-mad", "_type": "city", "title": "Madrid", "slug": {"current": "madrid"}}),
            json!({"_id": "cat-tapas", "_type": "category", "title": "Tapas"}),
            json!({"_id": "v1", "_type": "venue", "title": "Casa Lucio", "priceRange": "€€",
                   "city": {"_ref": "city-mad"}, "categories": [{"_ref": "cat-tapas"}], "rating": 8.5}),
            json!({"_id": "v2", "_type": "venue", "title": "Bar Alegría", "priceRange": "€",
                   "city": {"_ref": "city-mad"}, "rating": 7}),
            json!({"_id": "v3", "_type": "venue", "title": "Zalacaín", "priceRange": "€€€€"}),
            json!({"_id": "p1", "_type": "post", "title": "Los mejores churros de Madrid"}),
        ])
    }

    fn run(src: &str, params: Value) -> Value {
        let ds = dataset();
        let expr = parse(src).unwrap();
        Evaluator::new(&ds, &params, "2026-01-01T00:00:00Z")
            .evaluate(&expr)
            .unwrap()
    }

    #[test]
    fn eval_simple_eq() {
        let expr = Expr::Eq(
            Box::new(Expr::Ident("_type".into())),
            Box::new(Expr::StringLiteral("venue".into())),
        );
        let doc = json!({"_type": "venue"});
        assert!(eval_filter(&expr, &doc, &json!({})).unwrap());
    }

    #[test]
    fn eval_dot_access() {
        let expr = parse("author._ref == \"user1\"").unwrap();
        let doc = json!({"author": {"_ref": "user1"}});
        assert!(eval_filter(&expr, &doc, &json!({})).unwrap());
    }

    #[test]
    fn filter_with_deref_and_param() {
        let out = run(
            "*[_type == \"venue\" && city->slug.current == $city]._id",
            json!({"city": "madrid"}),
        );
        assert_eq!(out, json!(["v1", "v2"]));
    }

    #[test]
    fn order_slice_and_project() {
        let out = run(
            "*[_type == \"venue\"] | order(rating desc) [0...2] { title, \"city\": city->title }",
            json!({}),
        );
        assert_eq!(
            out,
            json!([
                {"title": "Casa Lucio", "city": "Madrid"},
                {"title": "Bar Alegría", "city": "Madrid"}
            ])
        );
    }

    #[test]
    fn nulls_sort_last_both_directions() {
        let asc = run("*[_type == \"venue\"] | order(rating asc)._id", json!({}));
        assert_eq!(asc, json!(["v2", "v1", "v3"]));
        let desc = run("*[_type == \"venue\"] | order(rating desc)._id", json!({}));
        assert_eq!(desc, json!(["v1", "v2", "v3"]));
    }

    #[test]
    fn traversal_dereferences_each_item() {
        let out = run("*[_id == \"v1\"][0].categories[]->title", json!({}));
        assert_eq!(out, json!(["Tapas"]));
    }

    #[test]
    fn match_is_case_insensitive_with_prefix() {
        let out = run("*[title match $q]._id", json!({"q": "CHURR*"}));
        assert_eq!(out, json!(["p1"]));
        let none = run("*[title match $q]._id", json!({"q": "churr"}));
        assert_eq!(none, json!([]));
    }

    #[test]
    fn in_operator_with_traversal() {
        let out = run(
            "*[_type == \"venue\" && $cat in categories[]._ref]._id",
            json!({"cat": "cat-tapas"}),
        );
        assert_eq!(out, json!(["v1"]));
    }

    #[test]
    fn object_literal_with_counts() {
        let out = run(
            "{\"venues\": count(*[_type == \"venue\"]), \"posts\": count(*[_type == \"post\"]), \"at\": now()}",
            json!({}),
        );
        assert_eq!(
            out,
            json!({"venues": 3, "posts": 1, "at": "2026-01-01T00:00:00Z"})
        );
    }

    #[test]
    fn projection_omits_nulls_and_spreads() {
        let out = run("*[_id == \"v3\"][0]{..., \"city\": city->title}", json!({}));
        assert!(out.get("city").is_none());
        assert_eq!(out["title"], json!("Zalacaín"));
    }

    #[test]
    fn parent_scope_in_nested_filter() {
        let out = run(
            "*[_type == \"city\"]{ title, \"venues\": count(*[_type == \"venue\" && city._ref == ^._id]) }",
            json!({}),
        );
        assert_eq!(out, json!([{"title": "Madrid", "venues": 2}]));
    }

    #[test]
    fn mixed_type_comparison_is_null() {
        let out = run("*[rating > \"x\"]", json!({}));
        assert_eq!(out, json!([]));
    }
}
