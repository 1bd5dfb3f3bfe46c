//! Foreground session state machine
//!
//! This module turns raw UI-unit lifecycle signals ("created", "resumed",
//! "paused", ...) into session-level events. The machine is a value type and
//! [`transition`] is a pure function: it never touches clocks, locks or the
//! foreground reference itself. The caller tells it how the signalling unit
//! relates to the tracked foreground unit and applies the returned
//! [`ForegroundUpdate`].
//!
//! ```text
//!  NoSession ──created/started──▶ Loading ──resumed──▶ Active ──paused──▶ Paused
//!      ▲                                                  │                 │
//!      └──────────────destroyed (foreground)──────────────┴─────────────────┘
//!  Paused ──created/started──▶ Loading      Paused ──resumed──▶ Active
//! ```

use serde::{Deserialize, Serialize};

use super::event::LifecycleEvent;

/// Session state owned by the lifecycle observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No session; initial state and the state after the foreground unit is destroyed
    #[default]
    NoSession,
    /// A view is loading and `ViewLoading` has been emitted for it
    Loading,
    /// The foreground unit is interactive
    Active,
    /// The foreground unit went to the background
    Paused,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionState::NoSession => "no_session",
            SessionState::Loading => "loading",
            SessionState::Active => "active",
            SessionState::Paused => "paused",
        };
        write!(f, "{}", s)
    }
}

/// Raw lifecycle callback raised by the host for a UI unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitSignal {
    Created,
    Started,
    Resumed,
    Paused,
    Stopped,
    Destroyed,
}

impl std::str::FromStr for UnitSignal {
    type Err = super::errors::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "created" => Ok(UnitSignal::Created),
            "started" => Ok(UnitSignal::Started),
            "resumed" => Ok(UnitSignal::Resumed),
            "paused" => Ok(UnitSignal::Paused),
            "stopped" => Ok(UnitSignal::Stopped),
            "destroyed" => Ok(UnitSignal::Destroyed),
            other => Err(super::errors::DomainError::ValidationFailed(format!(
                "unknown lifecycle signal '{}'",
                other
            ))),
        }
    }
}

/// How the signalling unit relates to the tracked foreground unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitRelation {
    /// The signalling unit is the tracked foreground unit
    Foreground,
    /// Another unit is tracked as foreground
    Other,
    /// No live foreground unit is tracked
    Untracked,
}

/// What the caller must do with its foreground reference after a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForegroundUpdate {
    /// Leave the reference as it is
    Keep,
    /// Point the reference at the signalling unit
    Adopt,
    /// Drop the reference
    Clear,
}

/// Input to a single transition
#[derive(Debug, Clone, Copy)]
pub struct SignalInput<'a> {
    pub signal: UnitSignal,
    pub relation: UnitRelation,
    /// Display name of the signalling unit
    pub unit_name: &'a str,
    /// Wall-clock time in epoch milliseconds
    pub now_ms: u64,
    /// Milliseconds elapsed since process start
    pub uptime_ms: u64,
}

/// Result of a single transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub machine: SessionMachine,
    pub event: Option<LifecycleEvent>,
    pub foreground: ForegroundUpdate,
}

impl Transition {
    fn unchanged(machine: &SessionMachine) -> Self {
        Self {
            machine: *machine,
            event: None,
            foreground: ForegroundUpdate::Keep,
        }
    }
}

/// Session bookkeeping carried between transitions
///
/// The `loaded` guard of the callback layer is the `Loading` state itself:
/// while loading, further created/started callbacks are suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionMachine {
    state: SessionState,
    /// True once the current session has been activated, until it ends
    session_open: bool,
    /// Number of sessions activated since process start
    sessions_started: u64,
    /// Uptime at which the current `ViewLoading` was emitted
    loading_since_ms: Option<u64>,
}

impl SessionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// True while a view load is in flight (the duplicate-`ViewLoading` guard)
    pub fn is_loading(&self) -> bool {
        self.state == SessionState::Loading
    }

    /// True if a session has been activated and not yet ended
    pub fn is_session_open(&self) -> bool {
        self.session_open
    }

    pub fn sessions_started(&self) -> u64 {
        self.sessions_started
    }

    /// Duration reported on the first activation of a session.
    ///
    /// The first session of the process measures from process start; later
    /// sessions measure from their `ViewLoading` mark.
    fn first_activation_duration(&self, uptime_ms: u64) -> u64 {
        if self.sessions_started == 0 {
            return uptime_ms;
        }
        match self.loading_since_ms {
            Some(mark) => uptime_ms.saturating_sub(mark),
            None => 0,
        }
    }
}

/// Applies one lifecycle signal to the machine.
///
/// Only the tracked foreground unit may pause or end a session. Other units
/// can start a view load (and become foreground) when no session is active,
/// or take over the foreground on resume.
pub fn transition(machine: &SessionMachine, input: &SignalInput<'_>) -> Transition {
    match input.signal {
        UnitSignal::Created | UnitSignal::Started => on_loading_signal(machine, input),
        UnitSignal::Resumed => on_resumed(machine, input),
        UnitSignal::Paused => on_paused(machine, input),
        UnitSignal::Stopped => Transition::unchanged(machine),
        UnitSignal::Destroyed => on_destroyed(machine, input),
    }
}

fn on_loading_signal(machine: &SessionMachine, input: &SignalInput<'_>) -> Transition {
    match machine.state {
        SessionState::Loading | SessionState::Active => Transition::unchanged(machine),
        SessionState::NoSession | SessionState::Paused => {
            let mut next = *machine;
            next.state = SessionState::Loading;
            next.loading_since_ms = Some(input.uptime_ms);
            Transition {
                machine: next,
                event: Some(LifecycleEvent::ViewLoading {
                    name: input.unit_name.to_string(),
                    time_ms: input.now_ms,
                }),
                foreground: ForegroundUpdate::Adopt,
            }
        }
    }
}

fn on_resumed(machine: &SessionMachine, input: &SignalInput<'_>) -> Transition {
    let adopt = if input.relation == UnitRelation::Foreground {
        ForegroundUpdate::Keep
    } else {
        ForegroundUpdate::Adopt
    };

    match machine.state {
        // Duplicate resume of the foreground unit, or navigation inside an
        // active session: re-point the foreground, no event.
        SessionState::Active => Transition {
            machine: *machine,
            event: None,
            foreground: adopt,
        },
        SessionState::Paused => {
            let mut next = *machine;
            next.state = SessionState::Active;
            next.loading_since_ms = None;
            Transition {
                machine: next,
                event: Some(LifecycleEvent::SessionResume {
                    name: input.unit_name.to_string(),
                    duration_ms: None,
                }),
                foreground: adopt,
            }
        }
        SessionState::NoSession | SessionState::Loading => {
            let mut next = *machine;
            let duration_ms = if machine.session_open {
                None
            } else {
                next.session_open = true;
                next.sessions_started += 1;
                Some(machine.first_activation_duration(input.uptime_ms))
            };
            next.state = SessionState::Active;
            next.loading_since_ms = None;
            Transition {
                machine: next,
                event: Some(LifecycleEvent::SessionResume {
                    name: input.unit_name.to_string(),
                    duration_ms,
                }),
                foreground: adopt,
            }
        }
    }
}

fn on_paused(machine: &SessionMachine, input: &SignalInput<'_>) -> Transition {
    if input.relation != UnitRelation::Foreground || machine.state != SessionState::Active {
        return Transition::unchanged(machine);
    }

    let mut next = *machine;
    next.state = SessionState::Paused;
    Transition {
        machine: next,
        event: Some(LifecycleEvent::SessionPause),
        foreground: ForegroundUpdate::Keep,
    }
}

fn on_destroyed(machine: &SessionMachine, input: &SignalInput<'_>) -> Transition {
    if input.relation != UnitRelation::Foreground {
        return Transition::unchanged(machine);
    }

    let mut next = *machine;
    next.state = SessionState::NoSession;
    next.session_open = false;
    next.loading_since_ms = None;

    let event = if machine.state == SessionState::NoSession {
        None
    } else {
        Some(LifecycleEvent::SessionEnd)
    };

    Transition {
        machine: next,
        event,
        foreground: ForegroundUpdate::Clear,
    }
}
