//! Bounded local crash report store
//!
//! Keeps the reports that could not be delivered as one ordered JSON array
//! under a single namespaced key of an [`IKeyValueStore`]. Inserts beyond the
//! capacity evict the oldest reports first.
//!
//! Every operation reads the persisted log, computes the new log and writes it
//! back as a whole while holding the store lock, so `cache`, `flush` and
//! `clear` never interleave. The backend's `put` is all-or-nothing; a failed
//! write leaves the previous log in place.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lifeline_core::config::{clamp_capacity, DEFAULT_CACHE_CAPACITY};
use lifeline_core::ports::IKeyValueStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::StoreError;

/// Namespace holding the report log.
pub const REPORTS_NAMESPACE: &str = "lifeline.crash_reports";

/// Key of the report log inside [`REPORTS_NAMESPACE`].
pub const REPORTS_KEY: &str = "reports";

/// One cached report. The store treats the payload as opaque JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoredReport(Value);

impl StoredReport {
    /// Parses a serialized report. Only JSON objects are accepted.
    pub fn parse(payload: &str) -> Result<Self, StoreError> {
        let value: Value = serde_json::from_str(payload)?;
        if !value.is_object() {
            return Err(StoreError::Serialization(format!(
                "report must be a JSON object, got {}",
                json_type_name(&value)
            )));
        }
        Ok(Self(value))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Serializes the report back to its compact JSON form.
    pub fn to_json_string(&self) -> String {
        self.0.to_string()
    }
}

/// Outcome of a successful [`BoundedReportStore::cache`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheReceipt {
    /// Reports evicted to respect the capacity (may include the new one when capacity is 0)
    pub evicted: usize,
    /// Reports held after the insert
    pub len: usize,
}

/// Durable FIFO-bounded log of pending crash reports
pub struct BoundedReportStore {
    backend: Arc<dyn IKeyValueStore>,
    capacity: AtomicUsize,
    lock: Mutex<()>,
}

impl BoundedReportStore {
    /// Creates a store with the default capacity of 10.
    pub fn new(backend: Arc<dyn IKeyValueStore>) -> Self {
        Self::with_capacity(backend, DEFAULT_CACHE_CAPACITY as i64)
    }

    /// Creates a store with `capacity` (clamped into `0..=64`).
    pub fn with_capacity(backend: Arc<dyn IKeyValueStore>, capacity: i64) -> Self {
        Self {
            backend,
            capacity: AtomicUsize::new(clamp_capacity(capacity)),
            lock: Mutex::new(()),
        }
    }

    /// Current capacity.
    pub fn capacity(&self) -> usize {
        self.capacity.load(Ordering::SeqCst)
    }

    /// Clamps `requested` into `0..=64` and stores it.
    ///
    /// Existing entries are not evicted until the next `cache` (or `trim`).
    /// Returns the capacity actually applied.
    pub fn set_capacity(&self, requested: i64) -> usize {
        let capacity = clamp_capacity(requested);
        self.capacity.store(capacity, Ordering::SeqCst);
        debug!(requested, capacity, "Report cache capacity set");
        capacity
    }

    /// Appends `payload` to the log, evicting the oldest reports beyond capacity.
    ///
    /// Malformed payloads are rejected with [`StoreError::Serialization`] and
    /// leave the log untouched.
    pub fn cache(&self, payload: &str) -> Result<CacheReceipt, StoreError> {
        let report = StoredReport::parse(payload)?;

        let _guard = self.guard();
        let mut log = self.read_log()?;
        log.push(report);

        let evicted = evict_oldest(&mut log, self.capacity());
        self.write_log(&log)?;

        debug!(evicted, len = log.len(), "Crash report cached");
        Ok(CacheReceipt {
            evicted,
            len: log.len(),
        })
    }

    /// Returns every cached report in insertion order and empties the log.
    ///
    /// The empty log is persisted before the reports are returned.
    pub fn flush(&self) -> Result<Vec<StoredReport>, StoreError> {
        let _guard = self.guard();
        let log = self.read_log()?;
        if log.is_empty() {
            return Ok(log);
        }
        self.write_log(&[])?;

        debug!(count = log.len(), "Report cache flushed");
        Ok(log)
    }

    /// Deletes every cached report without reading them.
    ///
    /// Works even when the persisted log is corrupt.
    pub fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.guard();
        self.backend
            .remove(REPORTS_NAMESPACE, REPORTS_KEY)
            .map_err(persistence_error)?;
        debug!("Report cache cleared");
        Ok(())
    }

    /// True iff the persisted log is the empty sequence.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Number of cached reports.
    pub fn len(&self) -> Result<usize, StoreError> {
        let _guard = self.guard();
        Ok(self.read_log()?.len())
    }

    /// Cached reports in insertion order, without removing them.
    pub fn reports(&self) -> Result<Vec<StoredReport>, StoreError> {
        let _guard = self.guard();
        self.read_log()
    }

    /// Applies the current capacity to the persisted log immediately.
    ///
    /// Returns the number of reports evicted.
    pub fn trim(&self) -> Result<usize, StoreError> {
        let _guard = self.guard();
        let mut log = self.read_log()?;
        let evicted = evict_oldest(&mut log, self.capacity());
        if evicted > 0 {
            self.write_log(&log)?;
            debug!(evicted, len = log.len(), "Report cache trimmed");
        }
        Ok(evicted)
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_log(&self) -> Result<Vec<StoredReport>, StoreError> {
        let raw = self
            .backend
            .get(REPORTS_NAMESPACE, REPORTS_KEY)
            .map_err(persistence_error)?;

        let Some(raw) = raw else {
            return Ok(Vec::new());
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        let entries: Vec<Value> = serde_json::from_str(&raw).map_err(|e| {
            StoreError::Serialization(format!("persisted report log is not a JSON array: {}", e))
        })?;

        let mut log = Vec::with_capacity(entries.len());
        for entry in entries {
            match entry {
                Value::Object(_) => log.push(StoredReport(entry)),
                Value::Null => {}
                other => warn!(entry = %other, "Skipping non-object entry in persisted report log"),
            }
        }
        Ok(log)
    }

    fn write_log(&self, log: &[StoredReport]) -> Result<(), StoreError> {
        let json = serde_json::to_string(log)?;
        self.backend
            .put(REPORTS_NAMESPACE, REPORTS_KEY, &json)
            .map_err(persistence_error)
    }
}

/// Drops entries from the front until `log.len() <= capacity`.
fn evict_oldest(log: &mut Vec<StoredReport>, capacity: usize) -> usize {
    let excess = log.len().saturating_sub(capacity);
    if excess > 0 {
        log.drain(..excess);
    }
    excess
}

fn persistence_error(e: anyhow::Error) -> StoreError {
    warn!(error = %e, "Report cache storage failure");
    StoreError::Persistence(format!("{:#}", e))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
