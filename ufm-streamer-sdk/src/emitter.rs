//! The Emitter: builds one stream record per tick and sends it to outputs.

use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;
use tracing::{debug, warn};
use ufm_streamer_types::{SlotView, StreamRecord, StreamToggles};

use crate::error::OutputError;
use crate::forward::ForwardMessage;
use crate::output::Output;
use crate::state::StreamMetadata;

/// Default Fluentd tag for stream records.
pub const DEFAULT_TAG: &str = "ufm_telemetry";

/// Default message type label.
pub const DEFAULT_MESSAGE_TYPE: &str = "full";

/// Builds stream records from endpoint slots and emits them.
///
/// # Example
///
/// ```rust
/// use std::collections::BTreeMap;
/// use std::time::SystemTime;
/// use ufm_streamer_sdk::{Emitter, StreamToggles};
/// use ufm_streamer_types::EndpointKind;
///
/// let mut emitter = Emitter::builder()
///     .server_name("ufm-1")
///     .toggles(StreamToggles { ports: false, ..StreamToggles::all() })
///     .build();
///
/// let slots = BTreeMap::new();
/// let record = emitter.build_record(&slots, SystemTime::now());
///
/// assert_eq!(record.sequence_stamp, 1);
/// assert!(record.contains(EndpointKind::Systems));
/// assert!(!record.contains(EndpointKind::Ports));
/// ```
#[derive(Debug)]
pub struct Emitter {
    outputs: Vec<Output>,
    tag: String,
    message_type: String,
    server_name: String,
    toggles: StreamToggles,
    metadata: StreamMetadata,
}

impl Emitter {
    /// Create a builder for configuring the emitter.
    pub fn builder() -> EmitterBuilder {
        EmitterBuilder::new()
    }

    /// Build the next record from the current slots.
    ///
    /// Consumes one sequence number. Enabled sections whose slot was never
    /// filled are included as `null`.
    pub fn build_record<V>(&mut self, slots: &V, now: SystemTime) -> StreamRecord
    where
        V: SlotView + ?Sized,
    {
        let stamp = self.metadata.next_stamp(now);

        let mut builder = StreamRecord::builder(&self.message_type)
            .sequence(stamp.sequence)
            .stream_time(stamp.stream_time)
            .server_name(&self.server_name);

        for kind in self.toggles.enabled() {
            let value = slots.slot(kind).cloned().unwrap_or(Value::Null);
            builder = builder.section(kind, value);
        }

        builder.build()
    }

    /// Build a record and send it to every output.
    ///
    /// Every output is attempted; the first failure is returned after the
    /// others have been tried. The sequence number is consumed either way.
    pub async fn emit<V>(&mut self, slots: &V) -> Result<StreamRecord, OutputError>
    where
        V: SlotView + ?Sized,
    {
        let now = SystemTime::now();
        let record = self.build_record(slots, now);
        let time = now
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let message = ForwardMessage::new(&self.tag, time, record);

        debug!(
            sequence = message.record.sequence_stamp,
            sections = message.record.sections.len(),
            outputs = self.outputs.len(),
            "emitting stream record"
        );

        let mut first_error = None;
        for output in &self.outputs {
            if let Err(e) = output.emit(&message).await {
                warn!(%output, error = %e, "failed to emit stream record");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(message.record),
        }
    }

    /// The Fluentd tag records are sent under.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The configured stream toggles.
    pub fn toggles(&self) -> StreamToggles {
        self.toggles
    }

    /// The streaming metadata.
    pub fn metadata(&self) -> &StreamMetadata {
        &self.metadata
    }

    /// Number of configured outputs.
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }
}

/// Builder for configuring an Emitter.
#[derive(Debug, Default)]
pub struct EmitterBuilder {
    outputs: Vec<Output>,
    tag: Option<String>,
    message_type: Option<String>,
    server_name: Option<String>,
    toggles: Option<StreamToggles>,
    metadata: Option<StreamMetadata>,
}

impl EmitterBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an output destination.
    ///
    /// Multiple outputs can be added; records will be emitted to all of them.
    pub fn output(mut self, output: Output) -> Self {
        self.outputs.push(output);
        self
    }

    /// Set the Fluentd tag (default: "ufm_telemetry").
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Set the message type label (default: "full").
    pub fn message_type(mut self, message_type: impl Into<String>) -> Self {
        self.message_type = Some(message_type.into());
        self
    }

    /// Set the server identity carried in every record.
    pub fn server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self
    }

    /// Select which endpoint sections are streamed (default: all).
    pub fn toggles(mut self, toggles: StreamToggles) -> Self {
        self.toggles = Some(toggles);
        self
    }

    /// Start numbering records from `initial` (default: 1).
    pub fn initial_sequence(mut self, initial: u64) -> Self {
        self.metadata = Some(StreamMetadata::new(initial));
        self
    }

    /// Use prepared streaming metadata.
    pub fn metadata(mut self, metadata: StreamMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Build the emitter.
    pub fn build(self) -> Emitter {
        Emitter {
            outputs: self.outputs,
            tag: self.tag.unwrap_or_else(|| DEFAULT_TAG.to_string()),
            message_type: self
                .message_type
                .unwrap_or_else(|| DEFAULT_MESSAGE_TYPE.to_string()),
            server_name: self.server_name.unwrap_or_default(),
            toggles: self.toggles.unwrap_or_default(),
            metadata: self.metadata.unwrap_or_default(),
        }
    }
}
