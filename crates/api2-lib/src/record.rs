//! Records as the remote service returns them.
//!
//! Field order and any top-level keys beyond `id`, `createdTime` and
//! `fields` are kept, so a record re-serializes to the bytes it came in as
//! (`serde_json` is built with `preserve_order`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single row returned by the remote service.
///
/// Serializes back to the exact shape it was received in, so handlers can
/// return it as the top-level response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,

    #[serde(
        rename = "createdTime",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub created_time: Option<String>,

    #[serde(default)]
    pub fields: Map<String, Value>,

    /// Top-level keys this type does not model, e.g. `commentCount`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_time: None,
            fields: Map::new(),
            extra: Map::new(),
        }
    }

    /// Add a field value.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_serializes_without_created_time() {
        let record = Record::new("rec123").with_field("Name", "Foo");
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"id":"rec123","fields":{"Name":"Foo"}}"#);
    }

    #[test]
    fn test_record_keeps_created_time() {
        let record: Record = serde_json::from_value(json!({
            "id": "rec1",
            "createdTime": "2018-01-01T00:00:00.000Z",
            "fields": {"Name": "Bar"}
        }))
        .unwrap();

        assert_eq!(
            record.created_time.as_deref(),
            Some("2018-01-01T00:00:00.000Z")
        );
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["createdTime"], "2018-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_record_reserializes_upstream_bytes() {
        let upstream = concat!(
            r#"{"id":"rec1","createdTime":"2018-01-01T00:00:00.000Z","#,
            r#""fields":{"Zeta":1,"Alpha":{"b":2,"a":1},"Mid":[3]},"commentCount":2}"#,
        );
        let record: Record = serde_json::from_str(upstream).unwrap();

        assert_eq!(record.extra["commentCount"], 2);
        let keys: Vec<&str> = record.fields.keys().map(String::as_str).collect();
        assert_eq!(keys, ["Zeta", "Alpha", "Mid"]);
        assert_eq!(serde_json::to_string(&record).unwrap(), upstream);
    }

    #[test]
    fn test_record_missing_fields_defaults_empty() {
        let record: Record = serde_json::from_str(r#"{"id":"rec9"}"#).unwrap();
        assert!(record.fields.is_empty());
    }
}
