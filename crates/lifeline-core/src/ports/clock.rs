//! Clock port
//!
//! The session machine is pure; the observer reads time through this port so
//! transitions can be replayed deterministically in tests.

/// Port trait for time readings
pub trait IClock: Send + Sync {
    /// Wall-clock time in epoch milliseconds
    fn now_ms(&self) -> u64;

    /// Milliseconds elapsed since process start
    fn uptime_ms(&self) -> u64;
}
