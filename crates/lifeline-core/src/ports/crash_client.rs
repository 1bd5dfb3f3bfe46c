//! Crash reporting SDK port (driven/secondary port)
//!
//! The SDK owns report serialization and transmission. The bridge only
//! initializes it, installs a before-send hook, and mirrors session metadata
//! into it.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because SDK failures are vendor-specific.
//! - Metadata setters replace the SDK's current value wholesale; merging is
//!   done by the bridge before calling them.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::config::CrashReportingConfig;
use crate::domain::{Breadcrumb, User};

/// Hook consulted by the SDK before a report leaves the device.
///
/// Receives the serialized report; returns `false` to veto sending it.
pub type BeforeSendHook = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Port trait for the crash reporting SDK
pub trait ICrashReportingClient: Send + Sync {
    /// Initializes the SDK and enables crash reporting
    fn init(&self, config: &CrashReportingConfig) -> anyhow::Result<()>;

    /// Installs the hook consulted before each report is sent
    fn set_before_send(&self, hook: BeforeSendHook) -> anyhow::Result<()>;

    fn set_user(&self, user: &User) -> anyhow::Result<()>;

    fn set_tags(&self, tags: &BTreeSet<String>) -> anyhow::Result<()>;

    fn set_custom_data(&self, data: &Map<String, Value>) -> anyhow::Result<()>;

    fn record_breadcrumb(&self, breadcrumb: &Breadcrumb) -> anyhow::Result<()>;

    fn clear_breadcrumbs(&self) -> anyhow::Result<()>;
}
