//! Prometheus metrics registry for Lifeline
//!
//! Counts report cache activity and lifecycle events. The registry is owned
//! by the bridge and rendered on demand in the text exposition format.

use lifeline_core::domain::EventKind;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Central metrics registry holding all Prometheus metrics.
pub struct MetricsRegistry {
    registry: Registry,
    /// Counter: reports written to the local cache
    pub reports_cached_total: IntCounter,
    /// Counter: reports evicted to respect the cache capacity
    pub reports_evicted_total: IntCounter,
    /// Counter: reports handed back by a flush
    pub reports_flushed_total: IntCounter,
    /// Counter: reports vetoed by the crash filter
    pub reports_vetoed_total: IntCounter,
    /// Gauge: reports currently held in the cache
    pub report_cache_size: IntGauge,
    /// Counter: lifecycle events emitted, by event name
    pub lifecycle_events_total: IntCounterVec,
}

impl MetricsRegistry {
    /// Creates a new `MetricsRegistry` with all metrics registered.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new_custom(Some("lifeline".to_string()), None)?;

        let reports_cached_total =
            IntCounter::with_opts(Opts::new("reports_cached_total", "Reports cached locally"))?;
        registry.register(Box::new(reports_cached_total.clone()))?;

        let reports_evicted_total = IntCounter::with_opts(Opts::new(
            "reports_evicted_total",
            "Reports evicted from the cache to respect its capacity",
        ))?;
        registry.register(Box::new(reports_evicted_total.clone()))?;

        let reports_flushed_total = IntCounter::with_opts(Opts::new(
            "reports_flushed_total",
            "Reports returned by cache flushes",
        ))?;
        registry.register(Box::new(reports_flushed_total.clone()))?;

        let reports_vetoed_total = IntCounter::with_opts(Opts::new(
            "reports_vetoed_total",
            "Reports vetoed by the crash filter",
        ))?;
        registry.register(Box::new(reports_vetoed_total.clone()))?;

        let report_cache_size =
            IntGauge::with_opts(Opts::new("report_cache_size", "Reports currently cached"))?;
        registry.register(Box::new(report_cache_size.clone()))?;

        let lifecycle_events_total = IntCounterVec::new(
            Opts::new("lifecycle_events_total", "Lifecycle events emitted"),
            &["event"],
        )?;
        registry.register(Box::new(lifecycle_events_total.clone()))?;

        Ok(Self {
            registry,
            reports_cached_total,
            reports_evicted_total,
            reports_flushed_total,
            reports_vetoed_total,
            report_cache_size,
            lifecycle_events_total,
        })
    }

    // ========================================================================
    // Recording helpers
    // ========================================================================

    /// Record a cached report and the resulting cache size.
    pub fn record_cached(&self, evicted: usize, len: usize) {
        self.reports_cached_total.inc();
        self.reports_evicted_total.inc_by(evicted as u64);
        self.report_cache_size.set(len as i64);
    }

    /// Record a flush returning `count` reports.
    pub fn record_flushed(&self, count: usize) {
        self.reports_flushed_total.inc_by(count as u64);
        self.report_cache_size.set(0);
    }

    pub fn record_vetoed(&self) {
        self.reports_vetoed_total.inc();
    }

    pub fn set_cache_size(&self, len: usize) {
        self.report_cache_size.set(len as i64);
    }

    /// Record an emitted lifecycle event.
    pub fn record_event(&self, kind: EventKind) {
        self.lifecycle_events_total
            .with_label_values(&[kind.name()])
            .inc();
    }

    // ========================================================================
    // Encoding
    // ========================================================================

    /// Encode all metrics in Prometheus text exposition format.
    pub fn encode(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
