//! OSM controller process wiring
//!
//! Loads configuration, installs logging, builds the metrics store and serves
//! its scrape endpoint for the life of the process.

pub mod config;
pub mod controller;

pub use config::{ConfigError, ConfigResult, ControllerConfig, LoggingSettings};
pub use controller::{shutdown_signal, Controller};
