//! Common types for metrics collection

use serde::{Deserialize, Serialize};

use crate::error::{MetricsError, MetricsResult};

/// Root namespace for every metric emitted by the store, e.g. `osm_<subsystem>_<name>`
pub const METRICS_ROOT_NAMESPACE: &str = "osm";

/// Bucket upper bounds, in seconds, for the injection latency histogram
pub const INJECTOR_RQ_TIME_BUCKETS: [f64; 9] = [0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 40.0];

/// Label partitioning injection latency by outcome
pub const INJECTION_OUTCOME_LABEL: &str = "success";

/// Health endpoint served next to the scrape endpoint
pub const HEALTH_PATH: &str = "/health";

/// Configuration for the metrics endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Serve the metrics endpoint at all
    pub enabled: bool,

    /// Bind address (default: 127.0.0.1)
    pub bind_address: String,

    /// Port for metrics HTTP server
    pub port: u16,

    /// Path the scrape handler is mounted at
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "127.0.0.1".to_string(),
            port: 9091,
            path: "/metrics".to_string(),
        }
    }
}

impl MetricsConfig {
    /// Create new config with port
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Get bind address with port
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Reject configurations the router cannot mount
    pub fn validate(&self) -> MetricsResult<()> {
        if self.bind_address.trim().is_empty() {
            return Err(MetricsError::InvalidConfig(
                "bind_address must not be empty".to_string(),
            ));
        }
        if !self.path.starts_with('/') || self.path.len() < 2 {
            return Err(MetricsError::InvalidConfig(format!(
                "path '{}' must start with '/' and name a route",
                self.path
            )));
        }
        let has_capture = self
            .path
            .split('/')
            .any(|segment| segment.starts_with(':') || segment.starts_with('*'));
        if has_capture || self.path.contains(['{', '}']) {
            return Err(MetricsError::InvalidConfig(format!(
                "path '{}' must be a literal route without captures or wildcards",
                self.path
            )));
        }
        if self.path == HEALTH_PATH {
            return Err(MetricsError::InvalidConfig(format!(
                "path '{}' collides with the health endpoint",
                self.path
            )));
        }
        Ok(())
    }
}

/// Control plane areas a metric belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subsystem {
    /// Kubernetes API server interaction
    K8s,
    /// Data-plane proxies connected to the controller
    Proxy,
    /// Sidecar injection webhook
    Injector,
}

impl Subsystem {
    /// Get string label for Prometheus
    pub fn as_label(&self) -> &'static str {
        match self {
            Subsystem::K8s => "k8s",
            Subsystem::Proxy => "proxy",
            Subsystem::Injector => "injector",
        }
    }
}

/// Result of a sidecar injection webhook call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InjectionOutcome {
    /// Sidecar injected
    Success,
    /// Webhook returned an error or refused the pod
    Failure,
}

impl InjectionOutcome {
    /// All outcomes, in exposition order
    pub const ALL: [InjectionOutcome; 2] = [InjectionOutcome::Success, InjectionOutcome::Failure];

    /// Get string label for Prometheus
    pub fn as_label(&self) -> &'static str {
        match self {
            InjectionOutcome::Success => "true",
            InjectionOutcome::Failure => "false",
        }
    }
}

impl From<bool> for InjectionOutcome {
    fn from(success: bool) -> Self {
        if success {
            InjectionOutcome::Success
        } else {
            InjectionOutcome::Failure
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_config_default() {
        let config = MetricsConfig::default();
        assert_eq!(config.port, 9091);
        assert!(config.enabled);
        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(config.path, "/metrics");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_metrics_config_with_port() {
        let config = MetricsConfig::with_port(8080);
        assert_eq!(config.port, 8080);
        assert_eq!(config.socket_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_metrics_config_rejects_bad_paths() {
        for path in [
            "metrics",
            "/",
            "",
            "/health",
            "/:metrics",
            "/*rest",
            "/stats/{name}",
            "/stats/:id/prometheus",
            "/metrics}",
        ] {
            let config = MetricsConfig {
                path: path.to_string(),
                ..Default::default()
            };
            assert!(config.validate().is_err(), "path {:?} should be rejected", path);
        }
    }

    #[test]
    fn test_metrics_config_accepts_literal_paths() {
        for path in ["/metrics", "/stats/prometheus", "/osm-metrics:v1"] {
            let config = MetricsConfig {
                path: path.to_string(),
                ..Default::default()
            };
            assert!(config.validate().is_ok(), "path {:?} should be accepted", path);
        }
    }

    #[test]
    fn test_metrics_config_rejects_empty_bind_address() {
        let config = MetricsConfig {
            bind_address: "  ".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MetricsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_subsystem_labels() {
        assert_eq!(Subsystem::K8s.as_label(), "k8s");
        assert_eq!(Subsystem::Proxy.as_label(), "proxy");
        assert_eq!(Subsystem::Injector.as_label(), "injector");
    }

    #[test]
    fn test_injection_outcome_labels() {
        assert_eq!(InjectionOutcome::Success.as_label(), "true");
        assert_eq!(InjectionOutcome::Failure.as_label(), "false");
        assert_eq!(InjectionOutcome::from(true), InjectionOutcome::Success);
        assert_eq!(InjectionOutcome::from(false), InjectionOutcome::Failure);
    }

    #[test]
    fn test_buckets_are_sorted() {
        assert!(INJECTOR_RQ_TIME_BUCKETS.windows(2).all(|w| w[0] < w[1]));
    }
}
