//! Lifecycle events pushed to the external consumer
//!
//! Events are immutable once constructed. Each one has a symbolic name that the
//! consumer retrieves up front from the constants table, and a flat key/value
//! payload.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Key under which the device identifier is published in the constants table.
pub const DEVICE_ID_KEY: &str = "DEVICE_ID";

/// Kind of a lifecycle event, with its wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "ON_VIEW_LOADING")]
    ViewLoading,
    #[serde(rename = "ON_VIEW_LOADED")]
    ViewLoaded,
    #[serde(rename = "ON_SESSION_RESUME")]
    SessionResume,
    #[serde(rename = "ON_SESSION_PAUSE")]
    SessionPause,
    #[serde(rename = "ON_SESSION_END")]
    SessionEnd,
}

impl EventKind {
    /// Every event kind, in a stable order.
    pub const ALL: [EventKind; 5] = [
        EventKind::ViewLoading,
        EventKind::ViewLoaded,
        EventKind::SessionResume,
        EventKind::SessionPause,
        EventKind::SessionEnd,
    ];

    /// Symbolic name the consumer subscribes to.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::ViewLoading => "ON_VIEW_LOADING",
            EventKind::ViewLoaded => "ON_VIEW_LOADED",
            EventKind::SessionResume => "ON_SESSION_RESUME",
            EventKind::SessionPause => "ON_SESSION_PAUSE",
            EventKind::SessionEnd => "ON_SESSION_END",
        }
    }

    /// Parses a symbolic name back into a kind.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A session or view transition derived from the raw OS callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// A view started loading; `time_ms` is the wall-clock mark in epoch ms.
    ViewLoading { name: String, time_ms: u64 },
    /// A view finished loading; `time_ms` is the load duration.
    ViewLoaded { name: String, time_ms: u64 },
    /// The session became active. `duration_ms` is present on the first
    /// activation of a session.
    SessionResume {
        name: String,
        duration_ms: Option<u64>,
    },
    /// The foreground unit went to the background.
    SessionPause,
    /// The foreground unit was destroyed.
    SessionEnd,
}

impl LifecycleEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            LifecycleEvent::ViewLoading { .. } => EventKind::ViewLoading,
            LifecycleEvent::ViewLoaded { .. } => EventKind::ViewLoaded,
            LifecycleEvent::SessionResume { .. } => EventKind::SessionResume,
            LifecycleEvent::SessionPause => EventKind::SessionPause,
            LifecycleEvent::SessionEnd => EventKind::SessionEnd,
        }
    }

    /// Name of the view the event refers to, if any.
    pub fn view_name(&self) -> Option<&str> {
        match self {
            LifecycleEvent::ViewLoading { name, .. }
            | LifecycleEvent::ViewLoaded { name, .. }
            | LifecycleEvent::SessionResume { name, .. } => Some(name),
            LifecycleEvent::SessionPause | LifecycleEvent::SessionEnd => None,
        }
    }

    /// Flat payload delivered to the consumer alongside the event name.
    pub fn payload(&self) -> Value {
        match self {
            LifecycleEvent::ViewLoading { name, time_ms }
            | LifecycleEvent::ViewLoaded { name, time_ms } => {
                json!({ "viewname": name, "time": time_ms })
            }
            LifecycleEvent::SessionResume { name, duration_ms } => {
                let mut map = Map::new();
                map.insert("viewname".into(), Value::String(name.clone()));
                if let Some(duration) = duration_ms {
                    map.insert("duration".into(), json!(duration));
                }
                Value::Object(map)
            }
            LifecycleEvent::SessionPause | LifecycleEvent::SessionEnd => json!({}),
        }
    }
}

/// Builds the constants table handed to the consumer at startup.
///
/// Each event name maps to itself, followed by the device id and the host's
/// OS version and platform.
pub fn constants_table(device_id: &str, os_version: &str, platform: &str) -> BTreeMap<String, Value> {
    let mut constants: BTreeMap<String, Value> = EventKind::ALL
        .iter()
        .map(|k| (k.name().to_string(), Value::String(k.name().to_string())))
        .collect();
    constants.insert(DEVICE_ID_KEY.to_string(), Value::String(device_id.to_string()));
    constants.insert("osVersion".to_string(), Value::String(os_version.to_string()));
    constants.insert("platform".to_string(), Value::String(platform.to_string()));
    constants
}
