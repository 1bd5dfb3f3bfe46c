//! In-process host adapters
//!
//! Stand-ins for the collaborators a mobile host would provide: UI units, the
//! OS lifecycle callback registry, and the crash reporting SDK. The CLI uses
//! them to replay signal scripts; tests use them to observe the bridge.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::bail;
use lifeline_core::config::CrashReportingConfig;
use lifeline_core::domain::{Breadcrumb, SessionMetadata, UnitSignal, User};
use lifeline_core::ports::{
    BeforeSendHook, ICrashReportingClient, ILifecycleSource, LifecycleCallbacks, UiUnit,
};
use serde_json::{Map, Value};
use tracing::debug;

/// A UI unit identified by a fixed name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedUnit {
    name: String,
}

impl NamedUnit {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Creates the unit behind the shared handle the host would hold.
    pub fn shared(name: impl Into<String>) -> Arc<dyn UiUnit> {
        Arc::new(Self::new(name))
    }
}

impl UiUnit for NamedUnit {
    fn name(&self) -> String {
        self.name.clone()
    }
}

// ============================================================================
// Lifecycle source
// ============================================================================

/// `ILifecycleSource` whose callbacks are raised by the caller
#[derive(Default)]
pub struct ManualLifecycleSource {
    listeners: Mutex<Vec<Arc<dyn LifecycleCallbacks>>>,
}

impl ManualLifecycleSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of listeners registered so far.
    pub fn registrations(&self) -> usize {
        self.listeners().len()
    }

    /// Raises `signal` for `unit` on every registered listener.
    pub fn dispatch(&self, signal: UnitSignal, unit: &Arc<dyn UiUnit>) {
        // Clone the list so listeners may call back into the source
        let listeners: Vec<_> = self.listeners().clone();
        for listener in listeners {
            match signal {
                UnitSignal::Created => listener.on_unit_created(unit),
                UnitSignal::Started => listener.on_unit_started(unit),
                UnitSignal::Resumed => listener.on_unit_resumed(unit),
                UnitSignal::Paused => listener.on_unit_paused(unit),
                UnitSignal::Stopped => listener.on_unit_stopped(unit),
                UnitSignal::Destroyed => listener.on_unit_destroyed(unit),
            }
        }
    }

    fn listeners(&self) -> MutexGuard<'_, Vec<Arc<dyn LifecycleCallbacks>>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ILifecycleSource for ManualLifecycleSource {
    fn register(&self, callbacks: Arc<dyn LifecycleCallbacks>) -> anyhow::Result<()> {
        self.listeners().push(callbacks);
        Ok(())
    }
}

// ============================================================================
// Crash reporting client
// ============================================================================

#[derive(Default)]
struct ClientState {
    config: Option<CrashReportingConfig>,
    init_calls: usize,
    hook: Option<BeforeSendHook>,
    metadata: SessionMetadata,
    fail: bool,
    fail_hook: bool,
}

/// `ICrashReportingClient` that keeps what it is told, for read-back
#[derive(Default)]
pub struct RecordingCrashClient {
    state: Mutex<ClientState>,
}

impl RecordingCrashClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail until reset.
    pub fn set_failing(&self, fail: bool) {
        self.lock().fail = fail;
    }

    /// Makes only `set_before_send` fail until reset.
    pub fn set_failing_hook(&self, fail: bool) {
        self.lock().fail_hook = fail;
    }

    pub fn init_calls(&self) -> usize {
        self.lock().init_calls
    }

    pub fn config(&self) -> Option<CrashReportingConfig> {
        self.lock().config.clone()
    }

    /// The SDK's view of the session metadata.
    pub fn metadata(&self) -> SessionMetadata {
        self.lock().metadata.clone()
    }

    /// Runs the installed before-send hook; `None` when no hook is installed.
    pub fn would_send(&self, report: &Value) -> Option<bool> {
        let hook = self.lock().hook.clone();
        hook.map(|hook| hook(report))
    }

    fn lock(&self) -> MutexGuard<'_, ClientState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn checked(&self) -> anyhow::Result<MutexGuard<'_, ClientState>> {
        let state = self.lock();
        if state.fail {
            bail!("crash reporting client unavailable");
        }
        Ok(state)
    }
}

impl ICrashReportingClient for RecordingCrashClient {
    fn init(&self, config: &CrashReportingConfig) -> anyhow::Result<()> {
        let mut state = self.checked()?;
        state.config = Some(config.clone());
        state.init_calls += 1;
        debug!(version = %config.version, "Crash reporting client initialized");
        Ok(())
    }

    fn set_before_send(&self, hook: BeforeSendHook) -> anyhow::Result<()> {
        let mut state = self.checked()?;
        if state.fail_hook {
            bail!("before-send hook rejected");
        }
        state.hook = Some(hook);
        Ok(())
    }

    fn set_user(&self, user: &User) -> anyhow::Result<()> {
        self.checked()?.metadata.user = user.clone();
        Ok(())
    }

    fn set_tags(&self, tags: &BTreeSet<String>) -> anyhow::Result<()> {
        self.checked()?.metadata.tags = tags.clone();
        Ok(())
    }

    fn set_custom_data(&self, data: &Map<String, Value>) -> anyhow::Result<()> {
        self.checked()?.metadata.custom_data = data.clone();
        Ok(())
    }

    fn record_breadcrumb(&self, breadcrumb: &Breadcrumb) -> anyhow::Result<()> {
        self.checked()?.metadata.breadcrumbs.push(breadcrumb.clone());
        Ok(())
    }

    fn clear_breadcrumbs(&self) -> anyhow::Result<()> {
        self.checked()?.metadata.breadcrumbs.clear();
        Ok(())
    }
}
