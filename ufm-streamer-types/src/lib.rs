//! # ufm-streamer-types
//!
//! Core types shared by the ufm-streamer crates. This crate defines the
//! fixed table of UFM REST endpoints that get polled, the per-stream toggles,
//! and the record shape that is forwarded to the collector.
//!
//! ## Design Goals
//!
//! - **Data, not behaviour**: no I/O lives here, only descriptors and records
//! - **Explicit refresh policy**: every endpoint says whether it is fetched
//!   once per process or on every tick
//! - **Stable record shape**: the streamed record always carries the same
//!   header fields; per-endpoint sections appear only when enabled
//!
//! ## Example
//!
//! ```rust
//! use ufm_streamer_types::{EndpointKind, StreamRecord, StreamToggles};
//! use serde_json::json;
//!
//! let toggles = StreamToggles {
//!     ports: false,
//!     ..StreamToggles::default()
//! };
//!
//! let mut builder = StreamRecord::builder("full").sequence(1).server_name("ufm-1");
//! for kind in toggles.enabled() {
//!     builder = builder.section(kind, json!([]));
//! }
//! let record = builder.build();
//!
//! assert!(record.contains(EndpointKind::Systems));
//! assert!(!record.contains(EndpointKind::Ports));
//! ```

mod endpoint;
mod record;
mod toggles;

pub use endpoint::*;
pub use record::*;
pub use toggles::*;

/// Default directory holding the per-endpoint result files.
pub const DEFAULT_CACHE_DIR: &str = "api_results";
