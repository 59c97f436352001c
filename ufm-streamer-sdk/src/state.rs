//! Streaming metadata: sequence numbers and stream time.

use std::time::SystemTime;

/// Sequence number and elapsed time assigned to one record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stamp {
    /// Value of the record's `sequence_stamp`.
    pub sequence: u64,
    /// Seconds since the stream started.
    pub stream_time: f64,
}

/// Per-process streaming state.
///
/// Created once when streaming starts, advanced once per record, never
/// persisted.
#[derive(Debug, Clone)]
pub struct StreamMetadata {
    initial_sequence: u64,
    next_sequence: u64,
    started_at: SystemTime,
}

impl StreamMetadata {
    /// Start a stream now, numbering records from `initial_sequence`.
    pub fn new(initial_sequence: u64) -> Self {
        Self::starting_at(initial_sequence, SystemTime::now())
    }

    /// Start a stream at a specific time.
    pub fn starting_at(initial_sequence: u64, started_at: SystemTime) -> Self {
        Self {
            initial_sequence,
            next_sequence: initial_sequence,
            started_at,
        }
    }

    /// Take the next stamp.
    ///
    /// A clock that went backwards yields a stream time of zero.
    pub fn next_stamp(&mut self, now: SystemTime) -> Stamp {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);

        let stream_time = now
            .duration_since(self.started_at)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);

        Stamp {
            sequence,
            stream_time,
        }
    }

    /// The sequence number the next record will carry.
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// The configured first sequence number.
    pub fn initial_sequence(&self) -> u64 {
        self.initial_sequence
    }

    /// Number of stamps handed out so far.
    pub fn emitted(&self) -> u64 {
        self.next_sequence.wrapping_sub(self.initial_sequence)
    }

    /// When the stream started.
    pub fn started_at(&self) -> SystemTime {
        self.started_at
    }
}

impl Default for StreamMetadata {
    fn default() -> Self {
        Self::new(1)
    }
}
