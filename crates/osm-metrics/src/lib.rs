//! OSM Metrics Module
//!
//! Prometheus metrics store for the OSM control plane, with an HTTP endpoint
//! for scraping.
//!
//! # Instruments
//!
//! - `osm_k8s_api_event_count`: events received from the Kubernetes API server
//! - `osm_proxy_connect_count`: proxies currently connected to the controller
//! - `osm_injector_injector_sidecar_count`: sidecar injection webhook calls
//! - `osm_injector_injector_rq_time`: injection latency by outcome (`success`)
//!
//! # Example
//!
//! ```ignore
//! use osm_metrics::{MetricsServer, MetricsStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = MetricsStore::new()?;
//!     store.start()?;
//!
//!     let server = MetricsServer::new(store.clone(), 9091);
//!     tokio::spawn(server.serve());
//!
//!     store.record_k8s_api_event();
//!     store.set_proxy_connect_count(3);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod handler;
pub mod server;
pub mod store;
pub mod types;

pub use error::{MetricsError, MetricsResult};
pub use handler::MetricsHandler;
pub use server::MetricsServer;
pub use store::MetricsStore;
pub use types::{InjectionOutcome, MetricsConfig, Subsystem, METRICS_ROOT_NAMESPACE};
