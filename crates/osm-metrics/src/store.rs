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
//! Metrics store for the OSM control plane
//!
//! Owns the control plane's instruments and the registry they are exposed
//! through. Instruments always exist and can always be written to; they only
//! show up in scrapes between [`MetricsStore::start`] and [`MetricsStore::stop`].

use axum::routing::MethodRouter;
use prometheus::core::Collector;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntGauge, Opts, Registry};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::error::{MetricsError, MetricsResult};
use crate::handler::MetricsHandler;
use crate::types::{
    InjectionOutcome, Subsystem, INJECTION_OUTCOME_LABEL, INJECTOR_RQ_TIME_BUCKETS,
    METRICS_ROOT_NAMESPACE,
};

/// Control plane metrics store
///
/// Clones share the same instruments and registry, so one store built during
/// startup can be handed to every component that reports or serves metrics.
#[derive(Clone)]
pub struct MetricsStore {
    inner: Arc<MetricsStoreInner>,
}

struct MetricsStoreInner {
    /// Registry the scrape handler renders
    registry: Registry,
    handler: MetricsHandler,

    // K8s metrics
    /// Events received from the Kubernetes API server
    k8s_api_event_count: IntCounter,

    // Proxy metrics
    /// Proxies currently connected to the controller
    proxy_connect_count: IntGauge,

    // Injector metrics
    /// Injector webhook calls handled
    injector_sidecar_count: IntCounter,
    /// Injector webhook latency (seconds), partitioned by outcome
    injector_rq_time: HistogramVec,
}

impl MetricsStore {
    /// Build the instruments and an empty registry
    ///
    /// Nothing is exposed until [`MetricsStore::start`] is called.
    pub fn new() -> MetricsResult<Self> {
        // K8s metrics
        let k8s_api_event_count = IntCounter::with_opts(subsystem_opts(
            Subsystem::K8s,
            "api_event_count",
            "represents the number of events received from the Kubernetes API Server",
        ))
        .map_err(MetricsError::Instrument)?;

        // Proxy metrics
        let proxy_connect_count = IntGauge::with_opts(subsystem_opts(
            Subsystem::Proxy,
            "connect_count",
            "represents the number of proxies connected to OSM controller",
        ))
        .map_err(MetricsError::Instrument)?;

        // Injector metrics
        let injector_sidecar_count = IntCounter::with_opts(subsystem_opts(
            Subsystem::Injector,
            "injector_sidecar_count",
            "Counts the number of injector webhooks dealt with over time",
        ))
        .map_err(MetricsError::Instrument)?;

        let injector_rq_time = HistogramVec::new(
            HistogramOpts::new(
                "injector_rq_time",
                "Histogram for time taken to perform sidecar injection",
            )
            .namespace(METRICS_ROOT_NAMESPACE)
            .subsystem(Subsystem::Injector.as_label())
            .buckets(INJECTOR_RQ_TIME_BUCKETS.to_vec()),
            &[INJECTION_OUTCOME_LABEL],
        )
        .map_err(MetricsError::Instrument)?;
        // Both partitions scrape from the start, at zero.
        for outcome in InjectionOutcome::ALL {
            let _ = injector_rq_time.with_label_values(&[outcome.as_label()]);
        }

        let registry = Registry::new();
        let handler = MetricsHandler::new(registry.clone())?;

        Ok(Self {
            inner: Arc::new(MetricsStoreInner {
                registry,
                handler,
                k8s_api_event_count,
                proxy_connect_count,
                injector_sidecar_count,
                injector_rq_time,
            }),
        })
    }

    /// Register every instrument so scrapes expose it
    ///
    /// Any failure is a programming error (usually a second `start` without a
    /// `stop`); the caller is expected to abort. Instruments registered by
    /// this call are rolled back first, so the registry never holds a partial
    /// set.
    pub fn start(&self) -> MetricsResult<()> {
        for (registered, collector) in self.instruments().into_iter().enumerate() {
            if let Err(e) = register_collector(&self.inner.registry, collector) {
                for collector in self.instruments().into_iter().take(registered) {
                    let _ = self.inner.registry.unregister(collector);
                }
                error!(error = %e, "Failed to start metrics store");
                return Err(e);
            }
        }

        info!(instruments = self.instruments().len(), "Metrics store started");
        Ok(())
    }

    /// Unregister every instrument; best effort
    ///
    /// Instruments keep their values and keep accepting writes, they are just
    /// no longer rendered.
    pub fn stop(&self) {
        for collector in self.instruments() {
            let metric = fq_name(collector.as_ref());
            if let Err(e) = self.inner.registry.unregister(collector) {
                debug!(metric = %metric, error = %e, "Metric was not registered at stop");
            }
        }

        info!("Metrics store stopped");
    }

    /// GET route rendering the registry, for mounting at the scrape path
    pub fn handler(&self) -> MethodRouter {
        self.inner.handler.method_router()
    }

    /// Scrape handler, for callers that render without going through axum
    pub fn metrics_handler(&self) -> &MetricsHandler {
        &self.inner.handler
    }

    /// Get reference to Prometheus registry for gathering metrics
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Counter of Kubernetes API server events
    pub fn k8s_api_event_count(&self) -> &IntCounter {
        &self.inner.k8s_api_event_count
    }

    /// Gauge of connected proxies
    pub fn proxy_connect_count(&self) -> &IntGauge {
        &self.inner.proxy_connect_count
    }

    /// Counter of injector webhook calls
    pub fn injector_sidecar_count(&self) -> &IntCounter {
        &self.inner.injector_sidecar_count
    }

    /// Injection latency histogram, labeled by `success`
    pub fn injector_rq_time(&self) -> &HistogramVec {
        &self.inner.injector_rq_time
    }

    /// Record one event received from the Kubernetes API server
    pub fn record_k8s_api_event(&self) {
        self.inner.k8s_api_event_count.inc();
    }

    /// Set the number of connected proxies
    pub fn set_proxy_connect_count(&self, count: i64) {
        self.inner.proxy_connect_count.set(count);
    }

    /// Record one injector webhook call
    pub fn record_injector_sidecar(&self) {
        self.inner.injector_sidecar_count.inc();
    }

    /// Record how long an injection took
    pub fn record_injector_rq_time(&self, outcome: InjectionOutcome, elapsed: Duration) {
        self.inner
            .injector_rq_time
            .with_label_values(&[outcome.as_label()])
            .observe(elapsed.as_secs_f64());
    }

    /// The store's own instruments, in registration order
    fn instruments(&self) -> Vec<Box<dyn Collector>> {
        vec![
            Box::new(self.inner.k8s_api_event_count.clone()),
            Box::new(self.inner.proxy_connect_count.clone()),
            Box::new(self.inner.injector_sidecar_count.clone()),
            Box::new(self.inner.injector_rq_time.clone()),
        ]
    }
}

fn subsystem_opts(subsystem: Subsystem, name: &str, help: &str) -> Opts {
    Opts::new(name, help)
        .namespace(METRICS_ROOT_NAMESPACE)
        .subsystem(subsystem.as_label())
}

/// Fully qualified name of a collector's first descriptor
fn fq_name(collector: &dyn Collector) -> String {
    collector
        .desc()
        .first()
        .map(|desc| desc.fq_name.clone())
        .unwrap_or_default()
}

/// Register `collector`, naming it in the error on failure
pub(crate) fn register_collector(
    registry: &Registry,
    collector: Box<dyn Collector>,
) -> MetricsResult<()> {
    let metric = fq_name(collector.as_ref());
    registry
        .register(collector)
        .map_err(|source| MetricsError::Registration { metric, source })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn gathered_names(store: &MetricsStore) -> Vec<String> {
        let body = String::from_utf8(store.metrics_handler().render().unwrap()).unwrap();
        body.lines()
            .filter_map(|line| line.strip_prefix("# TYPE "))
            .filter_map(|rest| rest.split_whitespace().next())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_store_creation() {
        let store = MetricsStore::new();
        assert!(store.is_ok());
    }

    #[test]
    fn test_instrument_names() {
        let store = MetricsStore::new().unwrap();
        let names: Vec<String> = store
            .instruments()
            .iter()
            .map(|c| fq_name(c.as_ref()))
            .collect();

        assert_eq!(
            names,
            vec![
                "osm_k8s_api_event_count",
                "osm_proxy_connect_count",
                "osm_injector_injector_sidecar_count",
                "osm_injector_injector_rq_time",
            ]
        );
    }

    #[test]
    fn test_nothing_exposed_before_start() {
        let store = MetricsStore::new().unwrap();
        store.record_k8s_api_event();

        let names = gathered_names(&store);
        assert!(names.iter().all(|n| !n.starts_with("osm_")));
    }

    #[test]
    fn test_start_and_stop() {
        let store = MetricsStore::new().unwrap();

        store.start().unwrap();
        assert_eq!(
            gathered_names(&store)
                .iter()
                .filter(|n| n.starts_with("osm_"))
                .count(),
            4
        );

        store.stop();
        assert!(gathered_names(&store).iter().all(|n| !n.starts_with("osm_")));
    }

    #[test]
    fn test_double_start_is_rejected() {
        let store = MetricsStore::new().unwrap();
        store.start().unwrap();

        let err = store.start().unwrap_err();
        assert!(err.is_already_registered());
        assert!(err.to_string().contains("osm_k8s_api_event_count"));

        // The failed call must not have unregistered the first start's instruments.
        assert_eq!(
            gathered_names(&store)
                .iter()
                .filter(|n| n.starts_with("osm_"))
                .count(),
            4
        );
    }

    #[test]
    fn test_failed_start_rolls_back() {
        let store = MetricsStore::new().unwrap();

        // Occupy the last instrument's identity with a foreign collector.
        let squatter = HistogramVec::new(
            HistogramOpts::new("osm_injector_injector_rq_time", "squatter"),
            &["success"],
        )
        .unwrap();
        store.registry().register(Box::new(squatter)).unwrap();

        let err = store.start().unwrap_err();
        assert!(err.is_already_registered());

        let names = gathered_names(&store);
        assert!(!names.contains(&"osm_k8s_api_event_count".to_string()));
        assert!(!names.contains(&"osm_proxy_connect_count".to_string()));
        assert!(!names.contains(&"osm_injector_injector_sidecar_count".to_string()));
    }

    #[test]
    fn test_stop_without_start_is_silent() {
        let store = MetricsStore::new().unwrap();
        store.stop();
        store.stop();
        store.start().unwrap();
    }

    #[test]
    fn test_restart_after_stop() {
        let store = MetricsStore::new().unwrap();
        store.start().unwrap();
        store.stop();
        assert!(store.start().is_ok());
    }

    #[test]
    fn test_recording_helpers() {
        let store = MetricsStore::new().unwrap();

        store.record_k8s_api_event();
        store.record_k8s_api_event();
        store.set_proxy_connect_count(12);
        store.set_proxy_connect_count(9);
        store.record_injector_sidecar();
        store.record_injector_rq_time(InjectionOutcome::Success, Duration::from_millis(300));

        assert_eq!(store.k8s_api_event_count().get(), 2);
        assert_eq!(store.proxy_connect_count().get(), 9);
        assert_eq!(store.injector_sidecar_count().get(), 1);

        let success = store.injector_rq_time().with_label_values(&["true"]);
        assert_eq!(success.get_sample_count(), 1);
        assert!((success.get_sample_sum() - 0.3).abs() < 1e-9);
        let failure = store.injector_rq_time().with_label_values(&["false"]);
        assert_eq!(failure.get_sample_count(), 0);
    }

    #[test]
    fn test_clones_share_instruments() {
        let store = MetricsStore::new().unwrap();
        let clone = store.clone();

        clone.record_injector_sidecar();
        assert_eq!(store.injector_sidecar_count().get(), 1);
    }
}
