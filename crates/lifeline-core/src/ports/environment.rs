//! Environment port (driven/secondary port)
//!
//! Read-only device and runtime facts. Gathering them carries no state.

use std::collections::BTreeMap;

use serde_json::Value;

/// Port trait for device and runtime information
pub trait IEnvironmentProvider: Send + Sync {
    /// Snapshot of device/runtime facts keyed by their report field names
    fn snapshot(&self) -> BTreeMap<String, Value>;

    /// Stable identifier of this device. Must return without I/O.
    fn device_id(&self) -> String;

    /// Operating system version string
    fn os_version(&self) -> String;

    /// Platform (device model or architecture) string
    fn platform(&self) -> String;
}
