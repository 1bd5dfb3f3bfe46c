//! Port definitions (hexagonal architecture interfaces)
//!
//! Ports are the interfaces the domain core depends on; their implementations
//! live in adapter crates or in the host application.
//!
//! ## Ports Overview
//!
//! - [`IKeyValueStore`] - Durable namespaced key-value storage for the report log
//! - [`IEventSink`] - One-way push of lifecycle events to the external consumer
//! - [`ICrashReportingClient`] - The crash SDK that serializes and transmits reports
//! - [`IEnvironmentProvider`] - Read-only device and runtime facts
//! - [`ILifecycleSource`] - The OS registry of UI-unit lifecycle callbacks
//! - [`IClock`] - Wall-clock and process uptime readings

pub mod clock;
pub mod crash_client;
pub mod environment;
pub mod event_sink;
pub mod key_value_store;
pub mod lifecycle;

pub use clock::IClock;
pub use crash_client::{BeforeSendHook, ICrashReportingClient};
pub use environment::IEnvironmentProvider;
pub use event_sink::IEventSink;
pub use key_value_store::IKeyValueStore;
pub use lifecycle::{ILifecycleSource, LifecycleCallbacks, UiUnit};
