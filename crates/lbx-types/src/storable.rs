use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::RawError;

/// Plain, backend-transportable representation of a record.
///
/// Holds nested maps, arrays and scalars only. Keys starting with `_` are
/// reserved for backend bookkeeping (for example a document database's
/// `_id`) and are dropped when a record is rebuilt.
pub type RawObject = Map<String, Value>;

/// A record that can be persisted through a storage backend.
///
/// Implementations must make `from_raw` the left inverse of `to_raw`:
/// rebuilding a record from its own raw form reproduces every field the
/// type declares.
pub trait Storable: Send + Sync {
    /// Stable discriminator for the record type. Backends use it to pick an
    /// isolated namespace, so two kinds never collide on id.
    fn kind(&self) -> &str;

    /// Unique identifier within [`kind`](Storable::kind).
    fn id(&self) -> &str;

    /// Produce the raw representation of this record.
    fn to_raw(&self) -> Result<RawObject, RawError>;

    /// Replace this record's fields with the ones carried by `raw`.
    fn from_raw(&mut self, raw: RawObject) -> Result<(), RawError>;
}

/// Serialize any `Serialize` value into a [`RawObject`].
pub fn to_raw<T: Serialize + ?Sized>(value: &T) -> Result<RawObject, RawError> {
    match serde_json::to_value(value).map_err(|e| RawError::Serialization(e.to_string()))? {
        Value::Object(map) => Ok(map),
        other => Err(RawError::NotAnObject {
            found: value_type(&other),
        }),
    }
}

/// Rebuild a value from a [`RawObject`], ignoring `_`-prefixed bookkeeping keys.
pub fn from_raw<T: DeserializeOwned>(kind: &str, mut raw: RawObject) -> Result<T, RawError> {
    raw.retain(|key, _| !key.starts_with('_'));
    serde_json::from_value(Value::Object(raw)).map_err(|e| RawError::Decode {
        kind: kind.to_string(),
        reason: e.to_string(),
    })
}

fn value_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: String,
        body: String,
    }

    #[test]
    fn to_raw_produces_map() {
        let raw = to_raw(&Note {
            id: "n1".into(),
            body: "hello".into(),
        })
        .unwrap();
        assert_eq!(raw.get("id"), Some(&json!("n1")));
        assert_eq!(raw.get("body"), Some(&json!("hello")));
    }

    #[test]
    fn to_raw_rejects_scalars() {
        let err = to_raw(&42u32).unwrap_err();
        assert_eq!(err, RawError::NotAnObject { found: "number" });
    }

    #[test]
    fn from_raw_drops_bookkeeping_keys() {
        let mut raw = RawObject::new();
        raw.insert("_id".into(), json!("n1"));
        raw.insert("id".into(), json!("n1"));
        raw.insert("body".into(), json!("hi"));

        let note: Note = from_raw("note", raw).unwrap();
        assert_eq!(
            note,
            Note {
                id: "n1".into(),
                body: "hi".into()
            }
        );
    }

    #[test]
    fn from_raw_reports_kind_on_failure() {
        let mut raw = RawObject::new();
        raw.insert("id".into(), json!(7));
        let err = from_raw::<Note>("note", raw).unwrap_err();
        assert!(matches!(err, RawError::Decode { ref kind, .. } if kind == "note"));
    }
}
