use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry};

use crate::prometheus_exporter::render_metrics;

/// Metrics collector. All recording is gated behind `enabled`.
///
/// When disabled no registry is created and every `record_*` call returns
/// immediately.
pub struct MetricsCollector {
    enabled: bool,
    registry: Option<Registry>,
    pub http_requests_total: Option<IntCounterVec>,
    pub http_request_duration: Option<HistogramVec>,
    pub in_flight_requests: Option<IntGauge>,
    pub import_soft_failures_total: Option<IntCounterVec>,
}

impl MetricsCollector {
    /// Create a new collector. When `enabled = false`, everything is None.
    pub fn new(enabled: bool) -> anyhow::Result<Self> {
        if !enabled {
            return Ok(Self {
                enabled: false,
                registry: None,
                http_requests_total: None,
                http_request_duration: None,
                in_flight_requests: None,
                import_soft_failures_total: None,
            });
        }

        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests").namespace("f5api"),
            &["route", "method", "status"],
        )?;

        let http_request_duration = HistogramVec::new(
            HistogramOpts::new("http_request_duration_seconds", "Request latency")
                .namespace("f5api")
                .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 15.0]),
            &["route"],
        )?;

        let in_flight_requests = IntGauge::with_opts(
            Opts::new("in_flight_requests", "Requests currently being handled").namespace("f5api"),
        )?;

        let import_soft_failures_total = IntCounterVec::new(
            Opts::new(
                "import_soft_failures_total",
                "Certificate/key imports that failed without failing the request",
            )
            .namespace("f5api"),
            &["host", "object", "conflict"],
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration.clone()))?;
        registry.register(Box::new(in_flight_requests.clone()))?;
        registry.register(Box::new(import_soft_failures_total.clone()))?;

        #[cfg(target_os = "linux")]
        registry.register(Box::new(prometheus::process_collector::ProcessCollector::for_self()))?;

        Ok(Self {
            enabled: true,
            registry: Some(registry),
            http_requests_total: Some(http_requests_total),
            http_request_duration: Some(http_request_duration),
            in_flight_requests: Some(in_flight_requests),
            import_soft_failures_total: Some(import_soft_failures_total),
        })
    }

    /// Record a request (no-op when disabled).
    #[inline]
    pub fn record_request(&self, route: &str, method: &str, status: u16, duration_secs: f64) {
        if !self.enabled {
            return;
        }
        if let Some(ref counter) = self.http_requests_total {
            let mut buf = itoa::Buffer::new();
            let status_str = buf.format(status);
            counter.with_label_values(&[route, method, status_str]).inc();
        }
        if let Some(ref hist) = self.http_request_duration {
            hist.with_label_values(&[route]).observe(duration_secs);
        }
    }

    /// Count an import that was swallowed by the profile workflow.
    pub fn record_soft_failure(&self, host: &str, object: &str, conflict: bool) {
        if let Some(ref counter) = self.import_soft_failures_total {
            let conflict = if conflict { "true" } else { "false" };
            counter.with_label_values(&[host, object, conflict]).inc();
        }
    }

    pub fn request_started(&self) {
        if let Some(ref gauge) = self.in_flight_requests {
            gauge.inc();
        }
    }

    pub fn request_finished(&self) {
        if let Some(ref gauge) = self.in_flight_requests {
            gauge.dec();
        }
    }

    /// Render prometheus text exposition format.
    pub fn render(&self) -> String {
        match self.registry {
            Some(ref registry) => render_metrics(registry),
            None => String::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}
