//! Lookup-and-dispatch of key notifications
//!
//! A [`Dispatcher`] owns the state that triggers read while the controller
//! is linked: the tuning, its frequency table and the two outputs. It is
//! cheap to clone and can be captured by custom triggers.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::configuration::Configuration;
use crate::event::{EventKind, KeyEvent, PitchEvent};
use crate::frequency::{self, FrequencyTable};
use crate::handler::{Output, Trigger};

#[derive(Debug)]
struct DispatchState {
    configuration: Configuration,
    table: FrequencyTable,
    press_output: Output,
    release_output: Output,
}

/// Shared handle that turns key notifications into pitch events
#[derive(Debug, Clone)]
pub struct Dispatcher {
    state: Arc<RwLock<DispatchState>>,
}

impl Dispatcher {
    pub(crate) fn new(
        configuration: Configuration,
        press_output: Output,
        release_output: Output,
    ) -> Self {
        let table = build_table(&configuration);
        Self {
            state: Arc::new(RwLock::new(DispatchState {
                configuration,
                table,
                press_output,
                release_output,
            })),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, DispatchState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, DispatchState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Resolve a notification against the current table
    ///
    /// Returns `None` for repeats and unbound keys.
    pub fn resolve(&self, event: &KeyEvent) -> Option<PitchEvent> {
        if event.is_repeat {
            return None;
        }
        let state = self.read();
        let entry = state.table.lookup(&event.key)?;
        Some(PitchEvent {
            key: event.key.clone(),
            frequency: entry.reported_frequency(),
            note: entry.note.clone(),
            velocity: state.configuration.velocity(),
        })
    }

    /// Resolve a notification and hand it to the output for `kind`
    ///
    /// Returns whether an output was called. The state lock is released
    /// before the output runs.
    pub fn dispatch(&self, kind: EventKind, event: &KeyEvent) -> bool {
        let Some(pitch) = self.resolve(event) else {
            log::trace!("Ignoring {} of {:?} (repeat: {})", kind, event.key, event.is_repeat);
            return false;
        };
        let output = self.output(kind);
        output.call(&pitch);
        true
    }

    pub fn press(&self, event: &KeyEvent) -> bool {
        self.dispatch(EventKind::Press, event)
    }

    pub fn release(&self, event: &KeyEvent) -> bool {
        self.dispatch(EventKind::Release, event)
    }

    /// Create a new trigger that dispatches `kind` notifications
    ///
    /// Every call yields a distinct handle.
    pub fn trigger(&self, kind: EventKind) -> Trigger {
        let dispatcher = self.clone();
        Trigger::new(move |event| {
            dispatcher.dispatch(kind, event);
        })
    }

    /// Current tuning
    pub fn configuration(&self) -> Configuration {
        self.read().configuration
    }

    /// Snapshot of the current frequency table
    pub fn table(&self) -> FrequencyTable {
        self.read().table.clone()
    }

    /// Current output for `kind`
    pub fn output(&self, kind: EventKind) -> Output {
        let state = self.read();
        match kind {
            EventKind::Press => state.press_output.clone(),
            EventKind::Release => state.release_output.clone(),
        }
    }

    /// Replace the tuning, rebuilding the table when pitch inputs changed
    pub(crate) fn set_configuration(&self, configuration: Configuration) {
        let mut state = self.write();
        let old = state.configuration;
        state.configuration = configuration;
        if old.base_frequency() != configuration.base_frequency()
            || old.first_octave() != configuration.first_octave()
            || old.second_octave() != configuration.second_octave()
        {
            state.table = build_table(&configuration);
        }
    }

    pub(crate) fn set_output(&self, kind: EventKind, output: Output) {
        let mut state = self.write();
        match kind {
            EventKind::Press => state.press_output = output,
            EventKind::Release => state.release_output = output,
        }
    }
}

fn build_table(configuration: &Configuration) -> FrequencyTable {
    frequency::build(
        configuration.base_frequency(),
        configuration.first_octave(),
        configuration.second_octave(),
    )
}
