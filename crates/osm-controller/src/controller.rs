//! Process wiring for the metrics store
//!
//! The controller is the only place a [`MetricsStore`] is constructed; every
//! other component receives a clone of it through [`Controller::store`].

use anyhow::{Context, Result};
use osm_metrics::{MetricsServer, MetricsStore};
use std::future::Future;
use tracing::{error, info};

use crate::config::ControllerConfig;

/// Owns the process-wide metrics store and its scrape endpoint
pub struct Controller {
    config: ControllerConfig,
    store: MetricsStore,
}

impl Controller {
    /// Construct the store for this process
    pub fn new(config: ControllerConfig) -> Result<Self> {
        let store = MetricsStore::new().context("Failed to build metrics store")?;
        Ok(Self { config, store })
    }

    /// Store handle for collaborators that report metrics
    pub fn store(&self) -> &MetricsStore {
        &self.store
    }

    /// Start the store, serve scrapes until `shutdown` resolves, then stop
    ///
    /// With the endpoint disabled the store is still started and `run` still
    /// waits for `shutdown`. A failed start is returned without serving; the
    /// caller must treat it as fatal.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Err(e) = self.store.start() {
            error!(error = %e, "Metrics registration failed, refusing to continue");
            return Err(e).context("Failed to start metrics store");
        }

        let server = MetricsServer::with_config(self.store.clone(), self.config.metrics.clone());
        info!(
            enabled = self.config.metrics.enabled,
            address = %server.bind_address(),
            path = %self.config.metrics.path,
            "Metrics endpoint configured"
        );

        let served = if self.config.metrics.enabled {
            server.serve_with_shutdown(shutdown).await
        } else {
            // Instruments stay registered for in-process readers until shutdown.
            shutdown.await;
            Ok(())
        };
        self.store.stop();

        served.context("Metrics server failed")
    }
}

/// Resolves on Ctrl-C, or SIGTERM on unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
