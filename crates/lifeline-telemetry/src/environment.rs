//! Local device and runtime information
//!
//! Gathers non-identifying system facts for crash reports. Never includes
//! hostname or username. The device id is a hash of the machine id, so it is
//! stable across runs without exposing the raw identifier.

use std::collections::BTreeMap;

use chrono::Local;
use lifeline_core::ports::IEnvironmentProvider;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tracing::debug;
use uuid::Uuid;

const MACHINE_ID_PATHS: &[&str] = &["/etc/machine-id", "/var/lib/dbus/machine-id"];

/// `IEnvironmentProvider` adapter reading from the running host
#[derive(Debug, Clone)]
pub struct LocalEnvironment {
    device_id: String,
    os_version: String,
    platform: String,
}

impl LocalEnvironment {
    /// Collects the static facts and derives the device id once.
    pub fn collect() -> Self {
        let device_id = match read_machine_id() {
            Some(machine_id) => hash_device_id(&machine_id),
            None => {
                debug!("No machine id available; using a random device id");
                Uuid::new_v4().to_string()
            }
        };
        Self::with_device_id(device_id)
    }

    /// Same as [`collect`](Self::collect) with a caller-provided device id.
    pub fn with_device_id(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            os_version: read_kernel_version(),
            platform: std::env::consts::ARCH.to_string(),
        }
    }
}

impl IEnvironmentProvider for LocalEnvironment {
    fn snapshot(&self) -> BTreeMap<String, Value> {
        let processors = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let utc_offset_hours = Local::now().offset().local_minus_utc() as f64 / 3600.0;

        let mut env = BTreeMap::new();
        env.insert("Architecture".into(), json!(std::env::consts::ARCH));
        env.insert("OS".into(), json!(std::env::consts::OS));
        env.insert("OSVersion".into(), json!(self.os_version));
        env.insert("ProcessorCount".into(), json!(processors));
        env.insert("Locale".into(), json!(read_locale()));
        env.insert("DeviceName".into(), json!(read_device_name()));
        env.insert("UtcOffset".into(), json!(utc_offset_hours));
        env.insert(
            "Desktop".into(),
            json!(std::env::var("XDG_CURRENT_DESKTOP").unwrap_or_default()),
        );
        env
    }

    fn device_id(&self) -> String {
        self.device_id.clone()
    }

    fn os_version(&self) -> String {
        self.os_version.clone()
    }

    fn platform(&self) -> String {
        self.platform.clone()
    }
}

/// Hex SHA-256 of a machine id.
pub fn hash_device_id(machine_id: &str) -> String {
    let digest = Sha256::digest(machine_id.trim().as_bytes());
    format!("{:x}", digest)
}

fn read_machine_id() -> Option<String> {
    MACHINE_ID_PATHS
        .iter()
        .filter_map(|p| std::fs::read_to_string(p).ok())
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
}

fn read_kernel_version() -> String {
    std::fs::read_to_string("/proc/version")
        .ok()
        .and_then(|v| v.split_whitespace().nth(2).map(String::from))
        .unwrap_or_default()
}

fn read_locale() -> String {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|v| !v.is_empty())
        .map(|v| v.split('.').next().unwrap_or_default().to_string())
        .unwrap_or_default()
}

fn read_device_name() -> String {
    std::fs::read_to_string("/sys/devices/virtual/dmi/id/product_name")
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}
