//! Domain entities and business logic
//!
//! This module contains the core domain types for Lifeline:
//! - Lifecycle events and the constants table handed to the consumer
//! - The foreground session state machine
//! - Breadcrumbs and session metadata
//! - Domain-specific error types

pub mod breadcrumb;
pub mod errors;
pub mod event;
pub mod metadata;
pub mod session;

// Re-export commonly used types
pub use breadcrumb::{Breadcrumb, BreadcrumbLevel};
pub use errors::DomainError;
pub use event::{constants_table, EventKind, LifecycleEvent};
pub use metadata::{SessionMetadata, User};
pub use session::{
    transition, ForegroundUpdate, SessionMachine, SessionState, SignalInput, Transition,
    UnitRelation, UnitSignal,
};
