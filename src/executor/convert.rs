//! BSON to JSON conversion for results
//!
//! Store results are handed to callers as plain JSON. BSON-only types are
//! simplified: ObjectIds become their hex string, dates become RFC 3339
//! strings, binary data becomes base64.

use base64::Engine;
use mongodb::bson::{Bson, Document};
use serde_json::{Map, Value as JsonValue};

/// Convert a BSON value to simplified JSON
pub fn bson_to_json(value: &Bson) -> JsonValue {
    match value {
        Bson::String(s) => JsonValue::String(s.clone()),
        Bson::Int32(n) => JsonValue::Number((*n).into()),
        Bson::Int64(n) => JsonValue::Number((*n).into()),
        Bson::Double(f) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Bson::Boolean(b) => JsonValue::Bool(*b),
        Bson::Null | Bson::Undefined => JsonValue::Null,
        Bson::ObjectId(oid) => JsonValue::String(oid.to_hex()),
        Bson::DateTime(dt) => JsonValue::String(
            dt.try_to_rfc3339_string()
                .unwrap_or_else(|_| dt.timestamp_millis().to_string()),
        ),
        Bson::Decimal128(d) => {
            let s = d.to_string();
            s.parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::String(s))
        }
        Bson::Array(arr) => JsonValue::Array(arr.iter().map(bson_to_json).collect()),
        Bson::Document(doc) => document_to_json(doc),
        Bson::Binary(bin) => {
            JsonValue::String(base64::engine::general_purpose::STANDARD.encode(&bin.bytes))
        }
        Bson::RegularExpression(regex) => {
            JsonValue::String(format!("/{}/{}", regex.pattern, regex.options))
        }
        Bson::Timestamp(ts) => JsonValue::Number(((ts.time as i64) * 1000).into()),
        Bson::MinKey => JsonValue::String("MinKey".to_string()),
        Bson::MaxKey => JsonValue::String("MaxKey".to_string()),
        other => JsonValue::String(other.to_string()),
    }
}

/// Convert a document to a JSON object, keeping field order
pub fn document_to_json(doc: &Document) -> JsonValue {
    let map: Map<String, JsonValue> = doc
        .iter()
        .map(|(key, value)| (key.clone(), bson_to_json(value)))
        .collect();
    JsonValue::Object(map)
}
