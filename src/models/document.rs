//! Conversion between wire JSON and stored BSON documents.
//!
//! Documents are opaque to the marketplace apart from a handful of fields,
//! so handlers carry `serde_json::Map` bodies straight into BSON and render
//! stored documents back with `_id` as hex and dates as RFC 3339.

use mongodb::bson::{self, doc, oid::ObjectId, Bson, Document};
use serde_json::{Map, Value};

pub const ID: &str = "_id";

pub fn from_json(fields: &Map<String, Value>) -> Result<Document, bson::ser::Error> {
    bson::to_document(fields)
}

pub fn to_json(document: Document) -> Value {
    Value::Object(
        document
            .into_iter()
            .map(|(key, value)| (key, bson_to_json(value)))
            .collect(),
    )
}

pub fn to_json_list(documents: Vec<Document>) -> Vec<Value> {
    documents.into_iter().map(to_json).collect()
}

fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(id) => Value::String(id.to_hex()),
        Bson::DateTime(date) => date
            .try_to_rfc3339_string()
            .map(Value::String)
            .unwrap_or_else(|_| Value::from(date.timestamp_millis())),
        Bson::Document(nested) => to_json(nested),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        Bson::Int32(n) => Value::from(n),
        Bson::Int64(n) => Value::from(n),
        Bson::Double(n) => serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        other => other.into_relaxed_extjson(),
    }
}

/// Filter selecting the document with identifier `id`. A malformed id can
/// never match a stored document, so it yields `None`.
pub fn id_filter(id: &str) -> Option<Document> {
    ObjectId::parse_str(id).ok().map(|oid| doc! { ID: oid })
}

/// Hex form of a store-generated identifier.
pub fn id_string(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}
