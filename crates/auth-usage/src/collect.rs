//! Flattening of the raw `apis → models → details[]` usage tree.
//!
//! Every level may be missing or the wrong JSON type. A malformed node is
//! read as "no entries" and the walk carries on with its siblings.

use serde_json::Value;

use crate::normalize::{normalize_id_key, normalize_index_key};
use crate::types::UsageDetail;

/// Unwrap a `{ "usage": {...} }` envelope if present.
///
/// The member is used when it exists and is neither `null` nor `false`;
/// otherwise the document itself is the usage document.
pub fn unwrap_usage_envelope(document: Value) -> Value {
    match document {
        Value::Object(mut map) => match map.remove("usage") {
            Some(inner) if !matches!(inner, Value::Null | Value::Bool(false)) => inner,
            Some(inner) => {
                map.insert("usage".to_string(), inner);
                Value::Object(map)
            }
            None => Value::Object(map),
        },
        other => other,
    }
}

/// Iterate the raw detail entries of a usage document in structural order.
///
/// Non-object `apis`/`models` nodes and non-array `details` nodes yield
/// nothing. Entries themselves are not validated here.
pub(crate) fn raw_details(usage: &Value) -> impl Iterator<Item = &Value> {
    object_values(usage.get("apis"))
        .flat_map(|api| object_values(api.get("models")))
        .flat_map(|model| {
            model
                .get("details")
                .and_then(Value::as_array)
                .map(|details| details.iter())
                .into_iter()
                .flatten()
        })
}

fn object_values(node: Option<&Value>) -> impl Iterator<Item = &Value> {
    node.and_then(Value::as_object)
        .map(|map| map.values())
        .into_iter()
        .flatten()
}

impl UsageDetail {
    /// Decode one raw detail entry.
    ///
    /// Returns `None` unless the entry is an object with a non-empty string
    /// `timestamp`. The identifier is taken from `auth_id`, falling back to
    /// `authId` only when `auth_id` is absent or null.
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let timestamp = raw.get("timestamp")?.as_str().filter(|s| !s.is_empty())?;

        let auth_id = match raw.get("auth_id") {
            Some(Value::Null) | None => raw.get("authId"),
            present => present,
        };

        Some(Self {
            timestamp: timestamp.to_string(),
            source: raw
                .get("source")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            credential_id: normalize_id_key(auth_id),
            credential_index: normalize_index_key(raw.get("auth_index")),
            failed: raw.get("failed").and_then(Value::as_bool) == Some(true),
        })
    }
}

/// Flatten a usage document into its detail records.
///
/// Order within one model's detail list is preserved. Order across APIs and
/// models follows the JSON object order and carries no meaning.
pub fn collect_usage_details(usage: &Value) -> Vec<UsageDetail> {
    raw_details(usage).filter_map(UsageDetail::from_raw).collect()
}
