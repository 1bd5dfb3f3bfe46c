//! Lifeline Telemetry - Crash report retention and reporting helpers
//!
//! Provides:
//! - `BoundedReportStore`: Durable FIFO-bounded log of pending crash reports
//! - `FileKeyValueStore` / `MemoryKeyValueStore`: `IKeyValueStore` adapters
//! - `CrashReportPayload`: Typed view of the crash SDK's report schema
//! - `CrashFilter`: Veto for reports already delivered by the script runtime
//! - `LocalEnvironment`: Device/runtime facts and a stable device id
//! - `MetricsRegistry`: Prometheus counters for cache and lifecycle activity

pub mod crash_filter;
pub mod crash_report;
pub mod environment;
pub mod file_store;
pub mod memory_store;
pub mod metrics;
pub mod store;

pub use crash_filter::CrashFilter;
pub use crash_report::{install_panic_reporter, CrashReportPayload};
pub use environment::LocalEnvironment;
pub use file_store::FileKeyValueStore;
pub use memory_store::MemoryKeyValueStore;
pub use metrics::MetricsRegistry;
pub use store::{BoundedReportStore, CacheReceipt, StoredReport};

/// Errors surfaced by the bounded report store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A report payload, or the persisted log itself, is not well-formed JSON
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The storage backend is unavailable or a write did not complete
    #[error("Persistence failure: {0}")]
    Persistence(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}
