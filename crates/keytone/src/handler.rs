//! Trigger and output handles
//!
//! Both are opaque callbacks compared by identity: two handles are equal only
//! when they are clones of the same allocation, never because they behave the
//! same.

use std::fmt;
use std::sync::Arc;

use crate::event::{EventKind, KeyEvent, PitchEvent};

type TriggerFn = dyn Fn(&KeyEvent) + Send + Sync;
type OutputFn = dyn Fn(&PitchEvent) + Send + Sync;

/// Handler subscribed to an event source
#[derive(Clone)]
pub struct Trigger(Arc<TriggerFn>);

impl Trigger {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&KeyEvent) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, event: &KeyEvent) {
        (self.0)(event)
    }

    fn addr(&self) -> *const () {
        Arc::as_ptr(&self.0) as *const ()
    }
}

impl PartialEq for Trigger {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for Trigger {}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Trigger({:p})", self.addr())
    }
}

/// Sink for resolved pitch events
#[derive(Clone)]
pub struct Output(Arc<OutputFn>);

impl Output {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&PitchEvent) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, event: &PitchEvent) {
        (self.0)(event)
    }

    fn addr(&self) -> *const () {
        Arc::as_ptr(&self.0) as *const ()
    }
}

impl PartialEq for Output {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for Output {}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Output({:p})", self.addr())
    }
}

/// Provides the stand-in handlers used when none is configured
pub trait Fallback: Send + Sync {
    /// Trigger installed when a trigger setter receives `None` or on reset
    fn trigger(&self, kind: EventKind) -> Trigger;

    /// Output installed when none is given, an output setter receives `None`,
    /// or on reset
    fn output(&self, kind: EventKind) -> Output;
}

/// Fallback that only reports through the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFallback;

impl Fallback for LogFallback {
    fn trigger(&self, kind: EventKind) -> Trigger {
        Trigger::new(move |event| {
            log::info!("{} event: {}", kind, event.key);
        })
    }

    fn output(&self, kind: EventKind) -> Output {
        let label = match kind {
            EventKind::Press => "Attack",
            EventKind::Release => "Release",
        };
        Output::new(move |event| {
            log::info!("{} event: {}", label, event);
        })
    }
}
