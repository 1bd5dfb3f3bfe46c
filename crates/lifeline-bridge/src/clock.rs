//! Clock adapters
//!
//! [`SystemClock`] reads the host clocks; [`ManualClock`] is advanced by hand
//! in tests and when replaying recorded signal scripts.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

use chrono::Utc;
use lifeline_core::ports::IClock;

static PROCESS_START: OnceLock<Instant> = OnceLock::new();

/// Marks process start. Called by [`SystemClock::new`]; hosts may call it
/// earlier (first thing in `main`) for a more accurate first-session duration.
pub fn mark_process_start() -> Instant {
    *PROCESS_START.get_or_init(Instant::now)
}

/// `IClock` adapter over the system wall clock and a monotonic uptime
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    started: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            started: mark_process_start(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl IClock for SystemClock {
    fn now_ms(&self) -> u64 {
        Utc::now().timestamp_millis().max(0) as u64
    }

    fn uptime_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

/// `IClock` adapter whose readings only change when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicU64,
    uptime_ms: AtomicU64,
}

impl ManualClock {
    /// Starts at wall-clock `now_ms` with zero uptime.
    pub fn starting_at(now_ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(now_ms),
            uptime_ms: AtomicU64::new(0),
        }
    }

    /// Moves both readings forward by `ms`.
    pub fn advance(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
        self.uptime_ms.fetch_add(ms, Ordering::SeqCst);
    }
}

impl IClock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    fn uptime_ms(&self) -> u64 {
        self.uptime_ms.load(Ordering::SeqCst)
    }
}
