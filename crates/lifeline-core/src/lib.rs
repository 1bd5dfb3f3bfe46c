//! Lifeline Core - Domain logic for the crash and session telemetry bridge
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `LifecycleEvent`, `SessionMachine`, `Breadcrumb`, `User`, `SessionMetadata`
//! - **State machine** - The pure foreground/background session transition function
//! - **Port definitions** - Traits for adapters: `IKeyValueStore`, `IEventSink`,
//!   `ICrashReportingClient`, `IEnvironmentProvider`, `ILifecycleSource`, `IClock`
//! - **Configuration** - YAML-backed `Config` with validation and a builder
//!
//! # Architecture
//!
//! The domain module is pure: no I/O, no clocks, no threads. Everything that
//! touches the host (storage, the crash SDK, the OS lifecycle callbacks, the
//! script-side event consumer) is reached through a port trait whose
//! implementation lives in an adapter crate.

pub mod config;
pub mod domain;
pub mod ports;
