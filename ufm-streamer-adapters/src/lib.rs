//! # ufm-streamer-adapters
//!
//! Adapters for fetching telemetry from a UFM management server.
//!
//! ## Supported Sources
//!
//! - **UFM REST API** (`ufm` feature, on by default) - fetches systems, ports,
//!   links, alarms and versioning either from a remote UFM (`/ufmRest`, basic
//!   auth) or through the local UFM proxy port (`X-Remote-User` identity)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ufm_streamer_adapters::ufm::UfmClient;
//! use ufm_streamer_types::EndpointKind;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = UfmClient::builder()
//!         .protocol("https")
//!         .host("ufm.example.com")
//!         .credentials("admin", "secret")
//!         .build()?;
//!
//!     let systems = client
//!         .fetch(EndpointKind::Systems.descriptor().path)
//!         .await?;
//!
//!     println!("Fetched {} systems", systems.as_array().map_or(0, |s| s.len()));
//!     Ok(())
//! }
//! ```

pub mod error;

#[cfg(feature = "ufm")]
pub mod ufm;

pub use error::AdapterError;

// Re-export types for convenience
pub use ufm_streamer_types::{Endpoint, EndpointKind, RefreshPolicy, ENDPOINTS};
