//! Error type for the metrics store and its HTTP surface

use thiserror::Error;

/// Errors raised by the metrics store, handler and server
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Registering an instrument failed, usually because its identity is
    /// already present in the registry.
    #[error("Failed to register metric {metric}: {source}")]
    Registration {
        /// Fully qualified name of the instrument
        metric: String,
        /// Registry error
        #[source]
        source: prometheus::Error,
    },

    /// An instrument could not be constructed from its options.
    #[error("Invalid metric definition: {0}")]
    Instrument(#[source] prometheus::Error),

    /// Rendering the registry in text exposition format failed.
    #[error("Failed to encode metrics: {0}")]
    Encode(#[source] prometheus::Error),

    /// Binding or serving the scrape endpoint failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The endpoint configuration cannot be served.
    #[error("Invalid metrics configuration: {0}")]
    InvalidConfig(String),
}

impl MetricsError {
    /// True when the failure is a duplicate registration.
    pub fn is_already_registered(&self) -> bool {
        matches!(
            self,
            MetricsError::Registration {
                source: prometheus::Error::AlreadyReg,
                ..
            }
        )
    }
}

/// Result alias used across the crate
pub type MetricsResult<T> = Result<T, MetricsError>;
