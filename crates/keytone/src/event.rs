//! Key notifications, pitch events and the event source seam
//!
//! The controller never talks to a concrete input system. It subscribes its
//! triggers to an [`EventSource`]; [`KeyEventBus`] is the in-process
//! implementation the terminal and OS listeners feed.

use std::fmt;
use std::sync::{PoisonError, RwLock};

use crate::handler::Trigger;

/// Kind of key notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A key went down
    Press,
    /// A key went up
    Release,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Press => write!(f, "press"),
            EventKind::Release => write!(f, "release"),
        }
    }
}

/// Raw key notification as delivered by an event source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    /// Key name as reported by the source (not normalized)
    pub key: String,
    /// Whether the source flagged this as an auto-repeat
    pub is_repeat: bool,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            is_repeat: false,
        }
    }

    pub fn repeat(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            is_repeat: true,
        }
    }
}

/// A key event tagged with its kind, as sent over channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyNotification {
    pub kind: EventKind,
    pub event: KeyEvent,
}

/// Resolved pitch delivered to an output callback
#[derive(Debug, Clone, PartialEq)]
pub struct PitchEvent {
    /// Key name exactly as the source reported it
    pub key: String,
    /// Frequency in Hz, rounded to 3 decimal places
    pub frequency: f64,
    /// Note name with octave, e.g. "A4"
    pub note: String,
    /// Configured velocity, if any
    pub velocity: Option<u8>,
}

impl fmt::Display for PitchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {:.3} Hz", self.key, self.note, self.frequency)?;
        if let Some(velocity) = self.velocity {
            write!(f, " vel {}", velocity)?;
        }
        Ok(())
    }
}

/// Something that delivers key notifications to subscribed triggers
///
/// Handlers are compared by identity; subscribing the same trigger twice for
/// one kind has no additional effect.
pub trait EventSource: Send + Sync {
    /// Start delivering `kind` notifications to `trigger`
    fn subscribe(&self, kind: EventKind, trigger: Trigger);

    /// Stop delivering `kind` notifications to `trigger`
    fn unsubscribe(&self, kind: EventKind, trigger: &Trigger);
}

/// In-process event source
#[derive(Debug, Default)]
pub struct KeyEventBus {
    press: RwLock<Vec<Trigger>>,
    release: RwLock<Vec<Trigger>>,
}

impl KeyEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn handlers(&self, kind: EventKind) -> &RwLock<Vec<Trigger>> {
        match kind {
            EventKind::Press => &self.press,
            EventKind::Release => &self.release,
        }
    }

    /// Deliver a notification to every trigger subscribed for `kind`
    ///
    /// Triggers run in subscription order on a snapshot, so a trigger may
    /// subscribe or unsubscribe without deadlocking. Returns how many ran.
    pub fn emit(&self, kind: EventKind, event: &KeyEvent) -> usize {
        let snapshot: Vec<Trigger> = self
            .handlers(kind)
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for trigger in &snapshot {
            trigger.call(event);
        }
        snapshot.len()
    }

    /// Deliver a tagged notification
    pub fn dispatch(&self, notification: &KeyNotification) -> usize {
        self.emit(notification.kind, &notification.event)
    }

    /// Number of triggers subscribed for `kind`
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.handlers(kind)
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check whether `trigger` is subscribed for `kind`
    pub fn is_subscribed(&self, kind: EventKind, trigger: &Trigger) -> bool {
        self.handlers(kind)
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(trigger)
    }
}

impl EventSource for KeyEventBus {
    fn subscribe(&self, kind: EventKind, trigger: Trigger) {
        let mut handlers = self
            .handlers(kind)
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if !handlers.contains(&trigger) {
            handlers.push(trigger);
        }
    }

    fn unsubscribe(&self, kind: EventKind, trigger: &Trigger) {
        self.handlers(kind)
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|t| t != trigger);
    }
}
