//! In-memory key-value store
//!
//! Backs the report store in tests and in hosts without durable storage.
//! Reads and writes can be made to fail on demand.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use anyhow::bail;
use lifeline_core::ports::IKeyValueStore;

/// `IKeyValueStore` adapter keeping values in a map
#[derive(Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<(String, String), String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `get` fail until reset.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent `put` and `remove` fail until reset.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl IKeyValueStore for MemoryKeyValueStore {
    fn get(&self, namespace: &str, key: &str) -> anyhow::Result<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            bail!("storage unavailable: read of {namespace}/{key} refused");
        }
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries
            .get(&(namespace.to_string(), key.to_string()))
            .cloned())
    }

    fn put(&self, namespace: &str, key: &str, value: &str) -> anyhow::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("storage unavailable: write of {namespace}/{key} refused");
        }
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert((namespace.to_string(), key.to_string()), value.to_string());
        Ok(())
    }

    fn remove(&self, namespace: &str, key: &str) -> anyhow::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("storage unavailable: removal of {namespace}/{key} refused");
        }
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(&(namespace.to_string(), key.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespaces_are_isolated() {
        let store = MemoryKeyValueStore::new();
        store.put("a", "k", "1").unwrap();
        store.put("b", "k", "2").unwrap();
        assert_eq!(store.get("a", "k").unwrap().as_deref(), Some("1"));
        assert_eq!(store.get("b", "k").unwrap().as_deref(), Some("2"));
        assert_eq!(store.get("c", "k").unwrap(), None);
    }

    #[test]
    fn test_failure_injection() {
        let store = MemoryKeyValueStore::new();
        store.put("ns", "k", "v").unwrap();

        store.set_fail_writes(true);
        assert!(store.put("ns", "k", "w").is_err());
        assert!(store.remove("ns", "k").is_err());
        assert_eq!(store.get("ns", "k").unwrap().as_deref(), Some("v"));

        store.set_fail_reads(true);
        assert!(store.get("ns", "k").is_err());
    }
}
