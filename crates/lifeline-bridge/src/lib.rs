//! Lifeline Bridge - Session tracking and report caching facade
//!
//! Provides:
//! - `LifecycleObserver`: Raw UI-unit callbacks to session and view events
//! - `EventEmitter`: Fire-and-forget channel to the event consumer
//! - `Bridge`: Facade owning the report store, the observer and session metadata
//! - In-process host adapters and clocks for tests and tooling

pub mod bridge;
pub mod clock;
pub mod emitter;
pub mod host;
pub mod observer;

pub use bridge::{Bridge, BridgeContext, CacheOutcome, InitOutcome};
pub use clock::{ManualClock, SystemClock};
pub use emitter::{EmittedEvent, EventEmitter, RecordingSink};
pub use host::{ManualLifecycleSource, NamedUnit, RecordingCrashClient};
pub use observer::LifecycleObserver;

use lifeline_core::domain::DomainError;
use lifeline_telemetry::StoreError;

/// Errors returned by the bridge facade
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// An inbound value or the crash reporting configuration was rejected
    #[error(transparent)]
    Invalid(#[from] DomainError),

    /// The report store failed; the report was not stored
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The crash reporting SDK rejected a call
    #[error("Crash reporting client error: {0}")]
    CrashClient(String),

    /// The host refused the lifecycle listener
    #[error("Lifecycle registration failed: {0}")]
    Lifecycle(String),

    /// A blocking store task did not complete
    #[error("Background task failed: {0}")]
    Runtime(#[from] tokio::task::JoinError),

    #[error("Metrics error: {0}")]
    Metrics(String),
}
