// Copyright (C) 2026  winnyboy5
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//! HTTP server for the Prometheus scrape endpoint
//!
//! Mounts the store's handler at the configured path next to a `/health`
//! probe and serves both with axum.

use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use std::future::Future;
use tokio::net::TcpListener;
use tracing::info;

use crate::error::MetricsResult;
use crate::types::{MetricsConfig, HEALTH_PATH};
use crate::MetricsStore;

/// HTTP server for Prometheus metrics
#[derive(Clone)]
pub struct MetricsServer {
    store: MetricsStore,
    config: MetricsConfig,
}

impl MetricsServer {
    /// Create a metrics server on `port` with otherwise default configuration
    pub fn new(store: MetricsStore, port: u16) -> Self {
        Self {
            store,
            config: MetricsConfig::with_port(port),
        }
    }

    /// Create a new metrics server with custom configuration
    pub fn with_config(store: MetricsStore, config: MetricsConfig) -> Self {
        Self { store, config }
    }

    /// Get the bind address for the server
    pub fn bind_address(&self) -> String {
        self.config.socket_addr()
    }

    /// Router with the scrape and health routes
    pub fn router(&self) -> Router {
        Router::new()
            .route(&self.config.path, self.store.handler())
            .route(HEALTH_PATH, get(health_handler))
    }

    /// Serve until the process exits
    ///
    /// Returns immediately when the endpoint is disabled in configuration.
    pub async fn serve(self) -> MetricsResult<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Serve until `shutdown` resolves, then drain in-flight scrapes
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> MetricsResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if !self.config.enabled {
            info!("Metrics server disabled");
            return Ok(());
        }
        self.config.validate()?;

        let listener = TcpListener::bind(self.bind_address()).await?;
        self.serve_on(listener, shutdown).await
    }

    /// Serve on an already bound listener
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> MetricsResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.config.validate()?;
        let addr = listener.local_addr()?;
        info!("Serving metrics on http://{}{}", addr, self.config.path);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Metrics server on {} shut down", addr);
        Ok(())
    }
}

/// Handler for `/health` endpoint
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
