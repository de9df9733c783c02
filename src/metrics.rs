use prometheus::{
    Gauge, Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

const SERVICE: &str = env!("CARGO_PKG_NAME");

/// Outcome label values for `login_attempts_total`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    Success,
    Rejected,
    Error,
}

impl LoginOutcome {
    fn as_label(self) -> &'static str {
        match self {
            LoginOutcome::Success => "success",
            LoginOutcome::Rejected => "rejected",
            LoginOutcome::Error => "error",
        }
    }
}

/// Application metrics collector
#[derive(Clone)]
pub struct AppMetrics {
    registry: Arc<Registry>,
    started_at: Instant,

    pub http_requests_total: IntCounterVec,
    pub http_request_duration_seconds: Histogram,
    pub http_requests_in_flight: IntGauge,
    pub login_attempts_total: IntCounterVec,
    pub application_info: IntGauge,
    pub application_uptime_seconds: Gauge,
}

impl AppMetrics {
    /// Create a new metrics collector with all metrics registered
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Arc::new(Registry::new());

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests processed")
                .const_label("service", SERVICE),
            &["method", "status"],
        )?;

        let http_request_duration_seconds = Histogram::with_opts(
            HistogramOpts::new("http_request_duration_seconds", "HTTP request duration in seconds")
                .const_label("service", SERVICE)
                .buckets(vec![
                    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
                ]),
        )?;

        let http_requests_in_flight = IntGauge::with_opts(
            Opts::new(
                "http_requests_in_flight",
                "Number of HTTP requests currently being processed",
            )
            .const_label("service", SERVICE),
        )?;

        let login_attempts_total = IntCounterVec::new(
            Opts::new("login_attempts_total", "Login attempts by outcome")
                .const_label("service", SERVICE),
            &["outcome"],
        )?;

        let application_info = IntGauge::with_opts(
            Opts::new("application_info", "Application information")
                .const_label("service", SERVICE)
                .const_label("version", env!("CARGO_PKG_VERSION")),
        )?;

        let application_uptime_seconds = Gauge::with_opts(
            Opts::new("application_uptime_seconds", "Application uptime in seconds")
                .const_label("service", SERVICE),
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(login_attempts_total.clone()))?;
        registry.register(Box::new(application_info.clone()))?;
        registry.register(Box::new(application_uptime_seconds.clone()))?;

        application_info.set(1);

        info!("Metrics registry initialized with {} metrics", registry.gather().len());

        Ok(Self {
            registry,
            started_at: Instant::now(),
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
            login_attempts_total,
            application_info,
            application_uptime_seconds,
        })
    }

    pub fn record_request(&self, method: &str, status: u16, duration_seconds: f64) {
        self.http_requests_total
            .with_label_values(&[method, &status.to_string()])
            .inc();
        self.http_request_duration_seconds.observe(duration_seconds);
    }

    pub fn record_login(&self, outcome: LoginOutcome) {
        self.login_attempts_total
            .with_label_values(&[outcome.as_label()])
            .inc();
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Get metrics as Prometheus text format
    pub fn gather(&self) -> String {
        self.application_uptime_seconds
            .set(self.started_at.elapsed().as_secs_f64());

        match TextEncoder::new().encode_to_string(&self.registry.gather()) {
            Ok(output) => output,
            Err(e) => {
                warn!("Failed to encode metrics: {}", e);
                String::new()
            }
        }
    }
}
