//! Key-value storage port (driven/secondary port)
//!
//! The bounded report store persists its whole ordered log as a single value
//! under one namespaced key.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because storage errors are adapter-specific
//!   (files, shared preferences, keychains) and are classified by the caller.
//! - `put` and `remove` must be durable and all-or-nothing when they return
//!   `Ok`: after a crash the key holds either the old or the new value.
//! - A missing key is `Ok(None)`, never an error.

/// Port trait for durable namespaced key-value storage
pub trait IKeyValueStore: Send + Sync {
    /// Reads the value stored under `key` in `namespace`
    fn get(&self, namespace: &str, key: &str) -> anyhow::Result<Option<String>>;

    /// Replaces the value stored under `key` in `namespace`
    fn put(&self, namespace: &str, key: &str, value: &str) -> anyhow::Result<()>;

    /// Removes `key` from `namespace`; removing a missing key succeeds
    fn remove(&self, namespace: &str, key: &str) -> anyhow::Result<()>;
}
