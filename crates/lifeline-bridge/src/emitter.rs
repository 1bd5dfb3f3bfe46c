//! Event emitter gateway
//!
//! One-way push of lifecycle events to the external consumer. Sending never
//! blocks and never fails: when the consumer has gone away the event is
//! dropped.

use std::sync::{Arc, Mutex, PoisonError};

use lifeline_core::domain::{EventKind, LifecycleEvent};
use lifeline_core::ports::IEventSink;
use lifeline_telemetry::MetricsRegistry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::trace;

/// An event as delivered to the consumer: its symbolic name and flat payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmittedEvent {
    pub name: String,
    pub payload: Value,
}

impl From<&LifecycleEvent> for EmittedEvent {
    fn from(event: &LifecycleEvent) -> Self {
        Self {
            name: event.kind().name().to_string(),
            payload: event.payload(),
        }
    }
}

// ============================================================================
// Channel gateway
// ============================================================================

/// `IEventSink` adapter pushing events into an unbounded channel
#[derive(Debug, Clone)]
pub struct EventEmitter {
    tx: mpsc::UnboundedSender<EmittedEvent>,
}

impl EventEmitter {
    /// Creates the gateway and the receiving end handed to the consumer.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<EmittedEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl IEventSink for EventEmitter {
    fn emit(&self, event: &LifecycleEvent) {
        if self.tx.send(EmittedEvent::from(event)).is_err() {
            trace!(event = %event.kind(), "Consumer gone; event dropped");
        }
    }
}

// ============================================================================
// Recording sink
// ============================================================================

/// `IEventSink` adapter that keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far, in order.
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Kinds of the events received so far, in order.
    pub fn kinds(&self) -> Vec<EventKind> {
        self.events().iter().map(LifecycleEvent::kind).collect()
    }

    /// Returns and forgets the events received so far.
    pub fn take(&self) -> Vec<LifecycleEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl IEventSink for RecordingSink {
    fn emit(&self, event: &LifecycleEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

// ============================================================================
// Metered sink
// ============================================================================

/// Counts events per kind before forwarding them
pub struct MeteredSink {
    inner: Arc<dyn IEventSink>,
    metrics: Arc<MetricsRegistry>,
}

impl MeteredSink {
    pub fn new(inner: Arc<dyn IEventSink>, metrics: Arc<MetricsRegistry>) -> Self {
        Self { inner, metrics }
    }
}

impl IEventSink for MeteredSink {
    fn emit(&self, event: &LifecycleEvent) {
        self.metrics.record_event(event.kind());
        self.inner.emit(event);
    }
}
