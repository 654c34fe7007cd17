//! OSM Observability Module
//!
//! Structured logging for the OSM control plane processes.
//!
//! # Features
//!
//! - **Multiple Output Formats**: Pretty, JSON, and compact output formats
//! - **Environment-based Filtering**: level control via `OSM_LOG` or `RUST_LOG`
//! - **Structured Logging**: JSON output for log shippers
//!
//! # Example
//!
//! ```ignore
//! use osm_observability::{init_tracing, LogFormat};
//!
//! fn main() -> Result<(), osm_observability::LogError> {
//!     init_tracing(LogFormat::Pretty, None)?;
//!     tracing::info!("controller started");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod initialization;

pub use config::{LogConfig, LogError, LogFormat, LogOutput, LOG_ENV_VAR};
pub use initialization::{init_tracing, init_tracing_with_config};
