use std::sync::{Arc, OnceLock};

use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};

#[derive(Clone, Debug)]
pub struct MetricsRegistry {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    registry: Registry,
    batches_read: CounterVec,
    rows_read: CounterVec,
    bytes_read: CounterVec,
    advance_seconds: HistogramVec,
    auth_seconds: HistogramVec,
    read_errors: CounterVec,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner::new()),
        }
    }

    /// Record one successful batch receive.
    pub fn record_advance(&self, endpoint: &str, rows: u64, bytes: u64, secs: f64) {
        let labels = [endpoint];
        self.inner.batches_read.with_label_values(&labels).inc();
        self.inner
            .rows_read
            .with_label_values(&labels)
            .inc_by(rows as f64);
        self.inner
            .bytes_read
            .with_label_values(&labels)
            .inc_by(bytes as f64);
        self.inner
            .advance_seconds
            .with_label_values(&labels)
            .observe(secs.max(0.0));
    }

    /// Record one authentication handshake duration.
    pub fn record_auth(&self, endpoint: &str, secs: f64) {
        self.inner
            .auth_seconds
            .with_label_values(&[endpoint])
            .observe(secs.max(0.0));
    }

    /// Record one read-path error, labeled by error class.
    pub fn record_error(&self, endpoint: &str, class: &str) {
        self.inner
            .read_errors
            .with_label_values(&[endpoint, class])
            .inc();
    }

    /// Render the registry in Prometheus text exposition format.
    pub fn render_text(&self) -> String {
        let encoder = TextEncoder::new();
        let mut out = Vec::new();
        if encoder
            .encode(&self.inner.registry.gather(), &mut out)
            .is_ok()
        {
            String::from_utf8(out).unwrap_or_default()
        } else {
            String::new()
        }
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsInner {
    fn new() -> Self {
        let registry = Registry::new();

        let batches_read = CounterVec::new(
            Opts::new("colflux_batches_read_total", "Batches received per endpoint"),
            &["endpoint"],
        )
        .expect("metric opts");
        let rows_read = CounterVec::new(
            Opts::new("colflux_rows_read_total", "Rows received per endpoint"),
            &["endpoint"],
        )
        .expect("metric opts");
        let bytes_read = CounterVec::new(
            Opts::new(
                "colflux_bytes_read_total",
                "Decoded batch bytes received per endpoint",
            ),
            &["endpoint"],
        )
        .expect("metric opts");
        let advance_seconds = HistogramVec::new(
            HistogramOpts::new("colflux_advance_seconds", "Per-batch receive latency"),
            &["endpoint"],
        )
        .expect("metric opts");
        let auth_seconds = HistogramVec::new(
            HistogramOpts::new("colflux_auth_seconds", "Authentication handshake latency"),
            &["endpoint"],
        )
        .expect("metric opts");
        let read_errors = CounterVec::new(
            Opts::new(
                "colflux_read_errors_total",
                "Read-path errors per endpoint and error class",
            ),
            &["endpoint", "class"],
        )
        .expect("metric opts");

        for collector in [&batches_read, &rows_read, &bytes_read, &read_errors] {
            registry
                .register(Box::new(collector.clone()))
                .expect("register metric");
        }
        registry
            .register(Box::new(advance_seconds.clone()))
            .expect("register metric");
        registry
            .register(Box::new(auth_seconds.clone()))
            .expect("register metric");

        Self {
            registry,
            batches_read,
            rows_read,
            bytes_read,
            advance_seconds,
            auth_seconds,
            read_errors,
        }
    }
}

/// Process-global metrics registry.
pub fn global_metrics() -> &'static MetricsRegistry {
    static GLOBAL: OnceLock<MetricsRegistry> = OnceLock::new();
    GLOBAL.get_or_init(MetricsRegistry::new)
}
