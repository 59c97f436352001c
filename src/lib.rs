//! # ufm-streamer
//!
//! Polls a UFM (Unified Fabric Manager) REST API on a fixed interval and
//! streams one structured record per tick to a Fluentd collector.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Streamer                            │
//! │  ┌───────────┐    ┌───────────┐    ┌───────────┐             │
//! │  │ ApiSource │───▶│ ApiStore  │───▶│  Emitter  │───▶ Fluentd │
//! │  │ (UFM API) │    │  (slots)  │    │ (records) │             │
//! │  └───────────┘    └─────┬─────┘    └───────────┘             │
//! │                         │                                    │
//! │                         ▼                                    │
//! │                   ┌───────────┐                              │
//! │                   │ FileCache │  api_results/*.json          │
//! │                   └───────────┘                              │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`config`]**: argument / config file / default resolution into [`Settings`]
//! - **[`cache`]**: one JSON file per persisted endpoint, errors logged and dropped
//! - **[`store`]**: in-memory slots, the update cycle and the startup warm cache
//! - **[`streamer`]**: the tick loop tying store and emitter together
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Everything from ufm_streamer.cfg
//! ufm-streamer
//!
//! # Override a few settings and run a single tick
//! ufm-streamer --ufm-host ufm.local --fluentd-host fluentd.local --once
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use std::time::Duration;
//! use ufm_streamer::{ApiStore, FileCache, Streamer};
//! use ufm_streamer_adapters::ufm::UfmClient;
//! use ufm_streamer_sdk::{Emitter, Output};
//!
//! # tokio_test::block_on(async {
//! let client = UfmClient::builder()
//!     .host("ufm.local")
//!     .credentials("admin", "secret")
//!     .build()
//!     .unwrap();
//! let emitter = Emitter::builder()
//!     .output(Output::forward("fluentd.local:24224"))
//!     .server_name("ufm.local")
//!     .build();
//! let store = ApiStore::new(FileCache::new("api_results"));
//!
//! let mut streamer = Streamer::new(client, store, emitter, Duration::from_secs(10));
//! streamer.warm_up();
//! let report = streamer.tick().await;
//! println!("streamed: {:?}", report.emitted);
//! # });
//! ```

pub mod cache;
pub mod config;
pub mod store;
pub mod streamer;

// Re-export main types for convenience
pub use cache::FileCache;
pub use config::{Args, ConfigError, ConfigFile, Settings};
pub use store::{ApiSource, ApiStore};
pub use streamer::{Streamer, TickReport};
