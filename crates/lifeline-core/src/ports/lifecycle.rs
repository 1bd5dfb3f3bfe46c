//! OS lifecycle callback port (driving/primary port)
//!
//! The host raises raw lifecycle callbacks for its UI units (screens,
//! activities, windows). The bridge registers one [`LifecycleCallbacks`]
//! listener with the host's [`ILifecycleSource`].
//!
//! ## Design Notes
//!
//! - UI units are owned by the host. Listeners receive `&Arc<dyn UiUnit>` and
//!   may only keep weak references to them.
//! - Callbacks may arrive on any thread and out of order; listeners must
//!   degrade into no-ops rather than fail.

use std::sync::Arc;

/// A UI unit owned by the host
pub trait UiUnit: Send + Sync {
    /// Short display name used in view and session events
    fn name(&self) -> String;
}

/// Listener for raw UI-unit lifecycle callbacks
pub trait LifecycleCallbacks: Send + Sync {
    fn on_unit_created(&self, unit: &Arc<dyn UiUnit>);
    fn on_unit_started(&self, unit: &Arc<dyn UiUnit>);
    fn on_unit_resumed(&self, unit: &Arc<dyn UiUnit>);
    fn on_unit_paused(&self, unit: &Arc<dyn UiUnit>);
    fn on_unit_stopped(&self, unit: &Arc<dyn UiUnit>);
    fn on_unit_destroyed(&self, unit: &Arc<dyn UiUnit>);
}

/// Port trait for the host's lifecycle callback registry
pub trait ILifecycleSource: Send + Sync {
    /// Registers a listener. The bridge calls this at most once.
    fn register(&self, callbacks: Arc<dyn LifecycleCallbacks>) -> anyhow::Result<()>;
}
