//! JSON bridge between the value model and `serde_json`.
//!
//! Backs the `json_parse` / `json_serialize` imports. Non-data values fold
//! to `null` (inside arrays) or are omitted (object entries), matching
//! stringify semantics; NaN and infinities serialize as `null`.

use crate::value::Value;

/// Parse JSON text into a value.
pub fn parse(text: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str::<serde_json::Value>(text).map(from_json)
}

/// Serialize a value as compact JSON text.
pub fn serialize(value: &Value) -> String {
    to_json(value).to_string()
}

pub fn from_json(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::str(&s),
        serde_json::Value::Array(items) => {
            Value::array(items.into_iter().map(from_json).collect())
        }
        serde_json::Value::Object(map) => {
            Value::object(map.into_iter().map(|(k, v)| (k, from_json(v))))
        }
    }
}

pub fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Undefined | Value::Func(_) => serde_json::Value::Null,
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => number_to_json(*n),
        Value::Str(s) => serde_json::Value::String(s.to_string()),
        Value::Array(items) => {
            serde_json::Value::Array(items.borrow().iter().map(to_json).collect())
        }
        Value::Object(map) => serde_json::Value::Object(
            map.borrow()
                .iter()
                .filter(|(_, v)| !matches!(v, Value::Undefined | Value::Func(_)))
                .map(|(k, v)| (k.clone(), to_json(v)))
                .collect(),
        ),
    }
}

/// Whole numbers in the exactly-representable range serialize in integer
/// form (`1`, not `1.0`); everything else keeps its float form or folds
/// to `null`.
fn number_to_json(n: f64) -> serde_json::Value {
    const SAFE_MAX: f64 = 9_007_199_254_740_992.0; // 2^53
    if n.is_finite() && n.fract() == 0.0 && n.abs() <= SAFE_MAX {
        serde_json::Value::Number((n as i64).into())
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scalars() {
        assert_eq!(parse("null").unwrap(), Value::Null);
        assert_eq!(parse("true").unwrap(), Value::Bool(true));
        assert_eq!(parse("2.5").unwrap(), Value::Number(2.5));
        assert_eq!(parse("\"hi\"").unwrap(), Value::str("hi"));
    }

    #[test]
    fn test_parse_nested() {
        let v = parse(r#"{"items": [1, "two", null], "ok": true}"#).unwrap();
        let items = v.get_prop("items").unwrap();
        assert_eq!(items.get_prop("length").unwrap(), Value::Number(3.0));
        assert_eq!(items.get_prop("1").unwrap(), Value::str("two"));
        assert_eq!(items.get_prop("2").unwrap(), Value::Null);
        assert_eq!(v.get_prop("ok").unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_parse_rejects_invalid() {
        assert!(parse("{not json").is_err());
    }

    #[test]
    fn test_serialize_round_trip() {
        let text = r#"{"a":[1,2],"b":"x"}"#;
        assert_eq!(serialize(&parse(text).unwrap()), text);
    }

    #[test]
    fn test_serialize_non_data() {
        // inside arrays, undefined and functions become null
        let a = Value::array(vec![
            Value::Undefined,
            Value::func("f", |_, _| Ok(Value::Undefined)),
        ]);
        assert_eq!(serialize(&a), "[null,null]");

        // object entries holding them are omitted
        let o = Value::object([
            ("keep".to_string(), Value::Number(1.0)),
            ("skip".to_string(), Value::Undefined),
        ]);
        assert_eq!(serialize(&o), r#"{"keep":1}"#);

        assert_eq!(serialize(&Value::Number(f64::NAN)), "null");
    }

    #[test]
    fn test_whole_numbers_serialize_in_integer_form() {
        assert_eq!(serialize(&Value::Number(3.0)), "3");
        assert_eq!(serialize(&Value::Number(-12.0)), "-12");
        assert_eq!(serialize(&Value::Number(2.5)), "2.5");
    }
}
