//! YAML value → JSON text
//!
//! Mapping order is kept as written (serde_json is built with
//! `preserve_order`). JSON only has string keys, so other YAML keys are
//! rendered as text: `1: a` becomes `"1": "a"`, `null: a` becomes
//! `"null": "a"`, and composite keys use their compact JSON form.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Number};
use serde_yaml::Value;

/// Default indent width
pub const DEFAULT_INDENT: usize = 2;

/// Widest indent honoured, wider requests are clamped
const MAX_INDENT: usize = 10;

/// Converts a resolved YAML value into a JSON value
pub fn to_json_value(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => number_to_json(n),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Sequence(items) => serde_json::Value::Array(items.iter().map(to_json_value).collect()),
        Value::Mapping(mapping) => {
            let mut object = Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                object.insert(key_to_string(key), to_json_value(value));
            }
            serde_json::Value::Object(object)
        }
        Value::Tagged(tagged) => {
            let mut object = Map::with_capacity(1);
            object.insert(tagged.tag.to_string(), to_json_value(&tagged.value));
            serde_json::Value::Object(object)
        }
    }
}

/// Serializes a resolved value as pretty-printed JSON
///
/// An indent of 0 produces compact single-line output.
pub fn to_json_string(value: &Value, indent: usize) -> Result<String, serde_json::Error> {
    let json = to_json_value(value);

    if indent == 0 {
        return serde_json::to_string(&json);
    }

    let indent = " ".repeat(indent.min(MAX_INDENT));
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(indent.as_bytes()));
    json.serialize(&mut serializer)?;

    String::from_utf8(buf).map_err(<serde_json::Error as serde::ser::Error>::custom)
}

fn number_to_json(n: &serde_yaml::Number) -> serde_json::Value {
    if let Some(i) = n.as_i64() {
        serde_json::Value::Number(i.into())
    } else if let Some(u) = n.as_u64() {
        serde_json::Value::Number(u.into())
    } else {
        // NaN and infinities have no JSON form
        n.as_f64()
            .and_then(Number::from_f64)
            .map_or(serde_json::Value::Null, serde_json::Value::Number)
    }
}

fn key_to_string(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => to_json_value(other).to_string(),
    }
}
