//! Fluentd forward protocol messages.
//!
//! Fluentd's `in_forward` input accepts JSON-encoded messages in addition to
//! MessagePack. Message mode is a three element array:
//!
//! ```text
//! ["ufm_telemetry", 1703160000, {"type": "full", "sequence_stamp": 1, ...}]
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ufm_streamer_types::StreamRecord;

/// One forward protocol message in message mode.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardMessage {
    /// Fluentd routing tag.
    pub tag: String,
    /// Event time in seconds since the Unix epoch.
    pub time: u64,
    /// The record itself.
    pub record: StreamRecord,
}

impl ForwardMessage {
    /// Create a new message.
    pub fn new(tag: impl Into<String>, time: u64, record: StreamRecord) -> Self {
        Self {
            tag: tag.into(),
            time,
            record,
        }
    }

    /// Encode as a single newline-terminated JSON line.
    pub fn to_line(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut bytes = serde_json::to_vec(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}

impl Serialize for ForwardMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.tag, self.time, &self.record).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ForwardMessage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (tag, time, record) = <(String, u64, StreamRecord)>::deserialize(deserializer)?;
        Ok(Self { tag, time, record })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use ufm_streamer_types::EndpointKind;

    #[test]
    fn test_message_mode_layout() {
        let record = StreamRecord::builder("full")
            .sequence(1)
            .server_name("ufm")
            .section(EndpointKind::Links, json!([]))
            .build();
        let message = ForwardMessage::new("ufm_telemetry", 1703160000, record);

        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value[0], "ufm_telemetry");
        assert_eq!(value[1], 1703160000u64);
        assert_eq!(value[2]["type"], "full");
        assert_eq!(value[2]["links"], json!([]));
    }

    #[test]
    fn test_line_is_newline_terminated() {
        let message = ForwardMessage::new("t", 0, StreamRecord::builder("full").build());
        let line = message.to_line().unwrap();

        assert_eq!(line.last(), Some(&b'\n'));
        assert_eq!(line.iter().filter(|b| **b == b'\n').count(), 1);

        let parsed: ForwardMessage = serde_json::from_slice(&line).unwrap();
        assert_eq!(parsed, message);
    }
}
