//! Plain JSON <-> Firestore typed value encoding.
//!
//! Firestore's REST API wraps every value in a single-key object naming its
//! type (`{"stringValue": "x"}`, `{"mapValue": {"fields": {...}}}`, ...).

use serde_json::{json, Map, Number, Value};

/// Encodes a JSON object as a Firestore `fields` map.
pub fn encode_fields(record: &Map<String, Value>) -> Map<String, Value> {
    record
        .iter()
        .map(|(k, v)| (k.clone(), encode_value(v)))
        .collect()
}

pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            // Firestore transports int64 as a decimal string.
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or(0.0) }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(fields) => json!({ "mapValue": { "fields": encode_fields(fields) } }),
    }
}

/// Decodes a Firestore `fields` map back into a JSON object.
pub fn decode_fields(fields: &Map<String, Value>) -> Result<Map<String, Value>, String> {
    fields
        .iter()
        .map(|(k, v)| decode_value(v).map(|decoded| (k.clone(), decoded)))
        .collect()
}

pub fn decode_value(value: &Value) -> Result<Value, String> {
    let Some(typed) = value.as_object() else {
        return Err(format!("expected typed value object, got {}", value));
    };
    let Some((type_name, inner)) = typed.iter().next() else {
        return Err("empty typed value".to_string());
    };

    match type_name.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| format!("bad booleanValue {}", inner)),
        "integerValue" => {
            let parsed = match inner {
                Value::String(s) => s.parse::<i64>().ok(),
                Value::Number(n) => n.as_i64(),
                _ => None,
            };
            parsed
                .map(|i| Value::Number(i.into()))
                .ok_or_else(|| format!("bad integerValue {}", inner))
        }
        "doubleValue" => inner
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| format!("bad doubleValue {}", inner)),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| format!("bad {} {}", type_name, inner)),
        "arrayValue" => {
            let values = inner.get("values").and_then(Value::as_array);
            match values {
                Some(values) => values
                    .iter()
                    .map(decode_value)
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array),
                // An empty array is sent as `{}`.
                None => Ok(Value::Array(Vec::new())),
            }
        }
        "mapValue" => {
            let fields = inner.get("fields").and_then(Value::as_object);
            match fields {
                Some(fields) => decode_fields(fields).map(Value::Object),
                None => Ok(Value::Object(Map::new())),
            }
        }
        other => Err(format!("unsupported Firestore value type '{}'", other)),
    }
}
