//! File-backed key-value store
//!
//! Each namespace is one JSON object file, `<dir>/<namespace>.json`, mapping
//! keys to string values. Every change rewrites the whole file through a
//! temporary sibling that is fsynced and then renamed over the target, so a
//! crash leaves either the old or the new file on disk.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::Context;
use lifeline_core::ports::IKeyValueStore;
use tracing::{debug, trace};
use uuid::Uuid;

/// `IKeyValueStore` adapter persisting namespaces as JSON files
pub struct FileKeyValueStore {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl FileKeyValueStore {
    /// Creates a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock: Mutex::new(()),
        }
    }

    /// Default storage directory (`~/.local/share/lifeline`)
    pub fn default_dir() -> PathBuf {
        lifeline_core::config::CacheConfig::default().dir
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `namespace`.
    pub fn namespace_path(&self, namespace: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_namespace(namespace)))
    }

    fn read_namespace(&self, namespace: &str) -> anyhow::Result<BTreeMap<String, String>> {
        let path = self.namespace_path(namespace);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()))
            }
        };
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    fn write_namespace(
        &self,
        namespace: &str,
        entries: &BTreeMap<String, String>,
    ) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let path = self.namespace_path(namespace);
        let json = serde_json::to_string_pretty(entries)?;
        atomic_write(&path, json.as_bytes())
            .with_context(|| format!("Failed to write {}", path.display()))?;

        trace!(path = %path.display(), bytes = json.len(), "Namespace persisted");
        Ok(())
    }
}

impl IKeyValueStore for FileKeyValueStore {
    fn get(&self, namespace: &str, key: &str) -> anyhow::Result<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_namespace(namespace)?.remove(key))
    }

    fn put(&self, namespace: &str, key: &str, value: &str) -> anyhow::Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_namespace(namespace)?;
        entries.insert(key.to_string(), value.to_string());
        self.write_namespace(namespace, &entries)
    }

    fn remove(&self, namespace: &str, key: &str) -> anyhow::Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        // A corrupt namespace file is replaced rather than blocking removal
        let mut entries = match self.read_namespace(namespace) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(namespace, error = %e, "Discarding unreadable namespace");
                BTreeMap::new()
            }
        };
        entries.remove(key);
        self.write_namespace(namespace, &entries)
    }
}

/// Writes `data` to `path` via a fsynced temporary file and a rename.
fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    // Unique per write: other stores in this process may share the directory
    let tmp_path = parent.join(format!(".{}.tmp.{}", file_name, Uuid::new_v4().simple()));

    let result = (|| {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
        return result;
    }

    // Make the rename itself durable where the platform allows it
    if let Ok(dir) = fs::File::open(parent) {
        let _ = dir.sync_all();
    }
    Ok(())
}

/// Maps a namespace onto a safe file stem.
fn sanitize_namespace(namespace: &str) -> String {
    let stem: String = namespace
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = stem.trim_start_matches('.');
    if stem.is_empty() {
        "default".to_string()
    } else {
        stem.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::new(dir.path());
        assert_eq!(store.get("ns", "reports").unwrap(), None);
    }

    #[test]
    fn test_put_get_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileKeyValueStore::new(dir.path());
            store.put("lifeline.crash_reports", "reports", "[1]").unwrap();
        }
        let store = FileKeyValueStore::new(dir.path());
        assert_eq!(
            store.get("lifeline.crash_reports", "reports").unwrap().as_deref(),
            Some("[1]")
        );
        assert!(dir.path().join("lifeline.crash_reports.json").exists());
    }

    #[test]
    fn test_keys_in_same_namespace_coexist() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::new(dir.path());
        store.put("ns", "a", "1").unwrap();
        store.put("ns", "b", "2").unwrap();
        store.remove("ns", "a").unwrap();
        assert_eq!(store.get("ns", "a").unwrap(), None);
        assert_eq!(store.get("ns", "b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn test_two_stores_over_one_directory_write_concurrently() {
        let dir = tempfile::tempdir().unwrap();
        let handles: Vec<_> = (0..2)
            .map(|t| {
                let store = FileKeyValueStore::new(dir.path());
                std::thread::spawn(move || {
                    for i in 0..25 {
                        store.put("shared", "value", &format!("{t}-{i}")).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let store = FileKeyValueStore::new(dir.path());
        let last = store.get("shared", "value").unwrap().unwrap();
        assert!(last == "0-24" || last == "1-24");
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp."))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_no_temporary_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::new(dir.path());
        store.put("ns", "k", "v").unwrap();
        store.put("ns", "k", "w").unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["ns.json".to_string()]);
    }

    #[test]
    fn test_corrupt_file_is_an_error_but_removable() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::new(dir.path());
        fs::write(store.namespace_path("ns"), "not json").unwrap();

        assert!(store.get("ns", "k").is_err());
        store.remove("ns", "k").unwrap();
        assert_eq!(store.get("ns", "k").unwrap(), None);
    }

    #[test]
    fn test_namespace_is_sanitized() {
        assert_eq!(sanitize_namespace("../etc/passwd"), "_etc_passwd");
        assert_eq!(sanitize_namespace("lifeline.crash_reports"), "lifeline.crash_reports");
        assert_eq!(sanitize_namespace(""), "default");
    }
}
