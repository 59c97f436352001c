//! StreamRecord - one structured message forwarded to the collector per tick.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::EndpointKind;

/// Read access to the latest value held for each endpoint.
///
/// Implemented by the in-memory store so the emitter can build records
/// without owning the slots.
pub trait SlotView {
    /// The current value of the endpoint's slot, if it was ever filled.
    fn slot(&self, kind: EndpointKind) -> Option<&Value>;
}

impl SlotView for BTreeMap<EndpointKind, Value> {
    fn slot(&self, kind: EndpointKind) -> Option<&Value> {
        self.get(&kind)
    }
}

/// Whether a JSON value counts as "nothing fetched yet".
///
/// `null`, `{}`, `[]` and `""` are empty; everything else (including `0`
/// and `false`) is a real payload.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// A single streamed message.
///
/// The header fields are always present. Endpoint sections (`systems`,
/// `ports`, `links`, `alarms`) are flattened next to them and only exist
/// when the corresponding stream is enabled.
///
/// # Example
///
/// ```rust
/// use ufm_streamer_types::{EndpointKind, StreamRecord};
/// use serde_json::json;
///
/// let record = StreamRecord::builder("full")
///     .sequence(7)
///     .stream_time(12.5)
///     .server_name("ufm-1")
///     .section(EndpointKind::Links, json!([{"source_port": 1}]))
///     .build();
///
/// let json = serde_json::to_value(&record).unwrap();
/// assert_eq!(json["type"], "full");
/// assert_eq!(json["sequence_stamp"], 7);
/// assert!(json.get("links").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamRecord {
    /// Message type label.
    #[serde(rename = "type")]
    pub message_type: String,

    /// Monotonic per-process sequence number.
    pub sequence_stamp: u64,

    /// Seconds elapsed since the stream started.
    pub stream_time: f64,

    /// Identity of the UFM server the data came from.
    pub ufm_server_name: String,

    /// Endpoint sections keyed by endpoint name.
    #[serde(flatten)]
    pub sections: BTreeMap<String, Value>,
}

impl StreamRecord {
    /// Create a builder for a record with the given type label.
    pub fn builder(message_type: impl Into<String>) -> StreamRecordBuilder {
        StreamRecordBuilder::new(message_type)
    }

    /// Get the section for an endpoint.
    pub fn get(&self, kind: EndpointKind) -> Option<&Value> {
        self.sections.get(kind.name())
    }

    /// Whether the record carries a section for an endpoint.
    pub fn contains(&self, kind: EndpointKind) -> bool {
        self.sections.contains_key(kind.name())
    }
}

/// Builder for constructing `StreamRecord` instances.
#[derive(Debug)]
pub struct StreamRecordBuilder {
    message_type: String,
    sequence_stamp: u64,
    stream_time: f64,
    ufm_server_name: String,
    sections: BTreeMap<String, Value>,
}

impl StreamRecordBuilder {
    /// Create a new builder.
    pub fn new(message_type: impl Into<String>) -> Self {
        Self {
            message_type: message_type.into(),
            sequence_stamp: 0,
            stream_time: 0.0,
            ufm_server_name: String::new(),
            sections: BTreeMap::new(),
        }
    }

    /// Set the sequence number.
    pub fn sequence(mut self, sequence_stamp: u64) -> Self {
        self.sequence_stamp = sequence_stamp;
        self
    }

    /// Set the elapsed stream time in seconds.
    pub fn stream_time(mut self, seconds: f64) -> Self {
        self.stream_time = seconds;
        self
    }

    /// Set the server identity.
    pub fn server_name(mut self, name: impl Into<String>) -> Self {
        self.ufm_server_name = name.into();
        self
    }

    /// Add an endpoint section.
    pub fn section(mut self, kind: EndpointKind, value: Value) -> Self {
        self.sections.insert(kind.name().to_string(), value);
        self
    }

    /// Build the record.
    pub fn build(self) -> StreamRecord {
        StreamRecord {
            message_type: self.message_type,
            sequence_stamp: self.sequence_stamp,
            stream_time: self.stream_time,
            ufm_server_name: self.ufm_server_name,
            sections: self.sections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_values() {
        assert!(is_empty_value(&Value::Null));
        assert!(is_empty_value(&json!({})));
        assert!(is_empty_value(&json!([])));
        assert!(is_empty_value(&json!("")));
        assert!(!is_empty_value(&json!(0)));
        assert!(!is_empty_value(&json!(false)));
        assert!(!is_empty_value(&json!({"UFM": "6.7"})));
        assert!(!is_empty_value(&json!([1])));
    }

    #[test]
    fn test_record_header_fields() {
        let record = StreamRecord::builder("full")
            .sequence(3)
            .stream_time(1.5)
            .server_name("ufm-a")
            .build();

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            json!({
                "type": "full",
                "sequence_stamp": 3,
                "stream_time": 1.5,
                "ufm_server_name": "ufm-a"
            })
        );
    }

    #[test]
    fn test_sections_are_flattened() {
        let record = StreamRecord::builder("full")
            .section(EndpointKind::Systems, json!([{"system_name": "sw1"}]))
            .section(EndpointKind::Alarms, Value::Null)
            .build();

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["systems"][0]["system_name"], "sw1");
        assert_eq!(json["alarms"], Value::Null);
        assert!(json.get("ports").is_none());
        assert!(json.get("sections").is_none());
    }

    #[test]
    fn test_serde_roundtrip() {
        let record = StreamRecord::builder("full")
            .sequence(42)
            .stream_time(10.25)
            .server_name("ufm")
            .section(EndpointKind::Ports, json!([{"name": "p1"}]))
            .build();

        let text = serde_json::to_string(&record).unwrap();
        let parsed: StreamRecord = serde_json::from_str(&text).unwrap();

        assert_eq!(record, parsed);
        assert!(parsed.contains(EndpointKind::Ports));
    }

    #[test]
    fn test_map_slot_view() {
        let mut slots = BTreeMap::new();
        slots.insert(EndpointKind::Links, json!([1, 2]));

        assert_eq!(slots.slot(EndpointKind::Links), Some(&json!([1, 2])));
        assert!(slots.slot(EndpointKind::Ports).is_none());
    }
}
