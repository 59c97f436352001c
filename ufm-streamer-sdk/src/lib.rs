//! # ufm-streamer-sdk
//!
//! Emission SDK for forwarding UFM telemetry records to a log collector.
//!
//! The [`Emitter`] turns the current endpoint slots into one
//! [`StreamRecord`] per tick, stamps it with a sequence number and the
//! elapsed stream time, and hands it to every configured [`Output`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::collections::BTreeMap;
//! use ufm_streamer_sdk::{Emitter, Output, StreamToggles};
//! use ufm_streamer_types::EndpointKind;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut emitter = Emitter::builder()
//!         .output(Output::forward("fluentd.local:24224"))
//!         .tag("ufm_telemetry")
//!         .server_name("ufm-1")
//!         .toggles(StreamToggles::all())
//!         .build();
//!
//!     let mut slots = BTreeMap::new();
//!     slots.insert(EndpointKind::Systems, json!([{"system_name": "sw1"}]));
//!
//!     if let Err(e) = emitter.emit(&slots).await {
//!         eprintln!("collector unavailable: {}", e);
//!     }
//! }
//! ```
//!
//! ## Features
//!
//! - **Fluentd forward protocol**: JSON message mode over TCP
//! - **Multiple outputs**: forward, file, or in-process channel
//! - **Stable sequencing**: one sequence number per built record

mod emitter;
mod error;
mod forward;
mod output;
mod state;

pub use emitter::{Emitter, EmitterBuilder, DEFAULT_MESSAGE_TYPE, DEFAULT_TAG};
pub use error::OutputError;
pub use forward::ForwardMessage;
pub use output::Output;
pub use state::{Stamp, StreamMetadata};

// Re-export types for convenience
pub use ufm_streamer_types::{EndpointKind, SlotView, StreamRecord, StreamToggles};
