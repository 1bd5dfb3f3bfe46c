//! Event sink port (driven/secondary port)
//!
//! Lifecycle events leave the core through this port. Delivery is
//! fire-and-forget: the core never waits for, or learns about, the consumer.

use crate::domain::event::LifecycleEvent;

/// Port trait for pushing lifecycle events to the external consumer
///
/// Implementations must not block and must not panic when the consumer is
/// gone; an undeliverable event is dropped.
pub trait IEventSink: Send + Sync {
    /// Pushes one event
    fn emit(&self, event: &LifecycleEvent);
}
