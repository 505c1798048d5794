// GROQ built-in functions. `now()` is resolved by the evaluator.

use serde_json::Value;

use crate::eval::EvalError;

/// Evaluate a built-in GROQ function by name.
pub fn call_builtin(name: &str, args: &[Value]) -> Result<Value, EvalError> {
    match name {
        "count" => builtin_count(args),
        "defined" => builtin_defined(args),
        "length" => builtin_length(args),
        "references" => builtin_references(args),
        "coalesce" => Ok(args
            .iter()
            .find(|v| !v.is_null())
            .cloned()
            .unwrap_or(Value::Null)),
        "lower" => Ok(map_string(args, str::to_lowercase)),
        "upper" => Ok(map_string(args, str::to_uppercase)),
        "round" => builtin_round(args),
        _ => Err(EvalError::TypeError(format!("unknown function: {name}"))),
    }
}

fn builtin_count(args: &[Value]) -> Result<Value, EvalError> {
    match args.first() {
        Some(Value::Array(arr)) => Ok(Value::Number(arr.len().into())),
        Some(Value::Null) => Ok(Value::Number(0.into())),
        _ => Err(EvalError::TypeError("count() expects an array".into())),
    }
}

fn builtin_defined(args: &[Value]) -> Result<Value, EvalError> {
    match args.first() {
        Some(Value::Null) | None => Ok(Value::Bool(false)),
        _ => Ok(Value::Bool(true)),
    }
}

fn builtin_length(args: &[Value]) -> Result<Value, EvalError> {
    match args.first() {
        Some(Value::String(s)) => Ok(Value::Number(s.chars().count().into())),
        Some(Value::Array(a)) => Ok(Value::Number(a.len().into())),
        _ => Ok(Value::Null),
    }
}

fn builtin_references(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() < 2 {
        return Err(EvalError::TypeError("references() needs 2 args".into()));
    }
    let doc = &args[0];
    let ref_id = match &args[1] {
        Value::String(s) => s,
        _ => return Ok(Value::Bool(false)),
    };
    Ok(Value::Bool(value_references(doc, ref_id)))
}

fn builtin_round(args: &[Value]) -> Result<Value, EvalError> {
    let Some(n) = args.first().and_then(Value::as_f64) else {
        return Ok(Value::Null);
    };
    let precision = args.get(1).and_then(Value::as_i64).unwrap_or(0);
    if precision <= 0 {
        return Ok(Value::Number((n.round() as i64).into()));
    }
    let factor = 10f64.powi(precision as i32);
    Ok(serde_json::Number::from_f64((n * factor).round() / factor)
        .map(Value::Number)
        .unwrap_or(Value::Null))
}

fn map_string(args: &[Value], f: fn(&str) -> String) -> Value {
    match args.first() {
        Some(Value::String(s)) => Value::String(f(s)),
        _ => Value::Null,
    }
}

fn value_references(val: &Value, ref_id: &str) -> bool {
    match val {
        Value::Object(map) => {
            if let Some(Value::String(r)) = map.get("_ref") {
                if r == ref_id {
                    return true;
                }
            }
            map.values().any(|v| value_references(v, ref_id))
        }
        Value::Array(arr) => arr.iter().any(|v| value_references(v, ref_id)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_count() {
        let r = call_builtin("count", &[json!([1, 2, 3])]).unwrap();
        assert_eq!(r, json!(3));
    }

    #[test]
    fn test_defined() {
        assert_eq!(
            call_builtin("defined", &[json!(null)]).unwrap(),
            json!(false)
        );
        assert_eq!(call_builtin("defined", &[json!("x")]).unwrap(), json!(true));
    }

    #[test]
    fn test_length_counts_chars() {
        assert_eq!(call_builtin("length", &[json!("jamón")]).unwrap(), json!(5));
        assert_eq!(call_builtin("length", &[json!([1, 2])]).unwrap(), json!(2));
    }

    #[test]
    fn test_references() {
        let doc = json!({"venue": {"_ref": "venue-1"}, "categories": [{"_ref": "cat-2"}]});
        assert_eq!(
            call_builtin("references", &[doc.clone(), json!("venue-1")]).unwrap(),
            json!(true)
        );
        assert_eq!(
            call_builtin("references", &[doc.clone(), json!("nope")]).unwrap(),
            json!(false)
        );
        assert_eq!(
            call_builtin("references", &[doc, json!("cat-2")]).unwrap(),
            json!(true)
        );
    }

    #[test]
    fn test_coalesce_and_case() {
        assert_eq!(
            call_builtin("coalesce", &[json!(null), json!("b")]).unwrap(),
            json!("b")
        );
        assert_eq!(call_builtin("lower", &[json!("ÑAM")]).unwrap(), json!("ñam"));
    }

    #[test]
    fn test_round() {
        assert_eq!(call_builtin("round", &[json!(7.6)]).unwrap(), json!(8));
        assert_eq!(call_builtin("round", &[json!(7.66), json!(1)]).unwrap(), json!(7.7));
    }
}
