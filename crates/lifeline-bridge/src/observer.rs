//! Lifecycle observer
//!
//! Thin adapter between the host's raw UI-unit callbacks and the pure session
//! machine in `lifeline_core::domain::session`. It owns the machine and a weak
//! reference to the foreground unit, works out how each signalling unit
//! relates to that reference, applies the transition and pushes the resulting
//! event to the sink.
//!
//! The observer never fails: callbacks for unknown, stale or out-of-order
//! units degrade into no-ops.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use lifeline_core::domain::{
    transition, ForegroundUpdate, SessionMachine, SessionState, SignalInput, UnitRelation,
    UnitSignal,
};
use lifeline_core::ports::{IClock, IEventSink, LifecycleCallbacks, UiUnit};
use tracing::{debug, trace};

#[derive(Default)]
struct ObserverState {
    machine: SessionMachine,
    foreground: Option<Weak<dyn UiUnit>>,
}

impl ObserverState {
    fn relation_of(&mut self, unit: &Arc<dyn UiUnit>) -> UnitRelation {
        let Some(weak) = &self.foreground else {
            return UnitRelation::Untracked;
        };
        match weak.upgrade() {
            Some(current) if same_unit(&current, unit) => UnitRelation::Foreground,
            Some(_) => UnitRelation::Other,
            None => {
                trace!("Foreground unit already dropped; treating as untracked");
                self.foreground = None;
                UnitRelation::Untracked
            }
        }
    }
}

fn same_unit(a: &Arc<dyn UiUnit>, b: &Arc<dyn UiUnit>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

/// Derives session and view events from raw lifecycle callbacks
pub struct LifecycleObserver {
    state: Mutex<ObserverState>,
    /// Spans a transition and the delivery of its event, so events reach the
    /// sink in transition order. Always taken before `state`.
    delivery: Mutex<()>,
    sink: Arc<dyn IEventSink>,
    clock: Arc<dyn IClock>,
}

impl LifecycleObserver {
    pub fn new(sink: Arc<dyn IEventSink>, clock: Arc<dyn IClock>) -> Self {
        Self {
            state: Mutex::new(ObserverState::default()),
            delivery: Mutex::new(()),
            sink,
            clock,
        }
    }

    /// Applies one raw signal. Any resulting event is emitted after the
    /// state lock is released, but before the next signal is applied.
    pub fn handle(&self, signal: UnitSignal, unit: &Arc<dyn UiUnit>) {
        let unit_name = unit.name();
        let _delivery = self.delivery.lock().unwrap_or_else(PoisonError::into_inner);

        let event = {
            let mut state = self.lock();
            let relation = state.relation_of(unit);
            let input = SignalInput {
                signal,
                relation,
                unit_name: &unit_name,
                now_ms: self.clock.now_ms(),
                uptime_ms: self.clock.uptime_ms(),
            };

            let next = transition(&state.machine, &input);
            match next.foreground {
                ForegroundUpdate::Keep => {}
                ForegroundUpdate::Adopt => state.foreground = Some(Arc::downgrade(unit)),
                ForegroundUpdate::Clear => state.foreground = None,
            }

            if next.event.is_none() {
                trace!(?signal, ?relation, unit = %unit_name, state = %state.machine.state(), "Signal absorbed");
            }
            state.machine = next.machine;
            next.event
        };

        if let Some(event) = event {
            debug!(event = %event.kind(), unit = %unit_name, "Lifecycle event");
            self.sink.emit(&event);
        }
    }

    /// Adopts the unit that is already on screen when tracking starts.
    pub fn attach(&self, current: Option<&Arc<dyn UiUnit>>) {
        if let Some(unit) = current {
            self.handle(UnitSignal::Created, unit);
        }
    }

    /// Name of the foreground unit, or an empty string when there is none.
    pub fn current_unit_name(&self) -> String {
        let foreground = self.lock().foreground.as_ref().and_then(Weak::upgrade);
        foreground.map(|unit| unit.name()).unwrap_or_default()
    }

    pub fn session_state(&self) -> SessionState {
        self.lock().machine.state()
    }

    /// Snapshot of the session bookkeeping.
    pub fn machine(&self) -> SessionMachine {
        self.lock().machine
    }

    fn lock(&self) -> MutexGuard<'_, ObserverState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LifecycleCallbacks for LifecycleObserver {
    fn on_unit_created(&self, unit: &Arc<dyn UiUnit>) {
        self.handle(UnitSignal::Created, unit);
    }

    fn on_unit_started(&self, unit: &Arc<dyn UiUnit>) {
        self.handle(UnitSignal::Started, unit);
    }

    fn on_unit_resumed(&self, unit: &Arc<dyn UiUnit>) {
        self.handle(UnitSignal::Resumed, unit);
    }

    fn on_unit_paused(&self, unit: &Arc<dyn UiUnit>) {
        self.handle(UnitSignal::Paused, unit);
    }

    fn on_unit_stopped(&self, unit: &Arc<dyn UiUnit>) {
        self.handle(UnitSignal::Stopped, unit);
    }

    fn on_unit_destroyed(&self, unit: &Arc<dyn UiUnit>) {
        self.handle(UnitSignal::Destroyed, unit);
    }
}
