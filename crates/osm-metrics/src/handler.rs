//! Scrape handler for the metrics store
//!
//! Renders the registry in Prometheus text exposition format and keeps its own
//! usage counters (requests by status code, in-flight requests, duration) in
//! the same registry, so scrapers see them next to the business metrics.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, MethodRouter},
};
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use tracing::{debug, error};

use crate::error::{MetricsError, MetricsResult};
use crate::store::register_collector;

/// Scrape handler bound to one registry
///
/// Cheap to clone; all clones share the same registry and meta-instruments.
#[derive(Clone)]
pub struct MetricsHandler {
    registry: Registry,
    requests_total: IntCounterVec,
    requests_in_flight: IntGauge,
    request_duration: Histogram,
}

impl MetricsHandler {
    /// Create the handler and register its meta-instruments into `registry`
    pub(crate) fn new(registry: Registry) -> MetricsResult<Self> {
        let requests_total = IntCounterVec::new(
            Opts::new(
                "promhttp_metric_handler_requests_total",
                "Total number of scrapes by HTTP status code.",
            ),
            &["code"],
        )
        .map_err(MetricsError::Instrument)?;
        // Pre-create the common codes so they scrape as 0 rather than missing.
        for code in [StatusCode::OK, StatusCode::INTERNAL_SERVER_ERROR] {
            let _ = requests_total.with_label_values(&[code.as_str()]);
        }
        register_collector(&registry, Box::new(requests_total.clone()))?;

        let requests_in_flight = IntGauge::with_opts(Opts::new(
            "promhttp_metric_handler_requests_in_flight",
            "Current number of scrapes being served.",
        ))
        .map_err(MetricsError::Instrument)?;
        register_collector(&registry, Box::new(requests_in_flight.clone()))?;

        let request_duration = Histogram::with_opts(HistogramOpts::new(
            "promhttp_metric_handler_request_duration_seconds",
            "Time taken to render a scrape, in seconds.",
        ))
        .map_err(MetricsError::Instrument)?;
        register_collector(&registry, Box::new(request_duration.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            requests_in_flight,
            request_duration,
        })
    }

    /// Render every registered collector in text exposition format
    ///
    /// Does not touch the meta-instruments; [`MetricsHandler::scrape`] does.
    pub fn render(&self) -> MetricsResult<Vec<u8>> {
        let metric_families = self.registry.gather();
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(MetricsError::Encode)?;

        debug!(families = metric_families.len(), bytes = buffer.len(), "Rendered metrics");
        Ok(buffer)
    }

    /// Serve one scrape, recording it in the meta-instruments
    pub fn scrape(&self) -> Response {
        self.requests_in_flight.inc();
        let timer = self.request_duration.start_timer();

        let response = match self.render() {
            Ok(buffer) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, TextEncoder::new().format_type().to_string())],
                buffer,
            )
                .into_response(),
            Err(e) => {
                error!(error = %e, "Failed to serve metrics scrape");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
            }
        };

        timer.observe_duration();
        self.requests_total
            .with_label_values(&[response.status().as_str()])
            .inc();
        self.requests_in_flight.dec();

        response
    }

    /// GET route serving [`MetricsHandler::scrape`], ready to mount at any path
    pub fn method_router(&self) -> MethodRouter {
        get(metrics_handler).with_state(self.clone())
    }
}

/// Handler for the scrape endpoint
async fn metrics_handler(State(handler): State<MetricsHandler>) -> Response {
    handler.scrape()
}
