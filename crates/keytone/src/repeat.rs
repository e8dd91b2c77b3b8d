//! Held-key tracking
//!
//! Neither rdev nor a plain terminal says whether a press is an auto-repeat.
//! [`RepeatTracker`] remembers which keys are down, flags presses of a held
//! key as repeats, and can synthesize releases for keys that stopped
//! repeating (terminals without key-up reporting never send a release).

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::event::{EventKind, KeyEvent, KeyNotification};

/// Default time after the last press before a held key counts as released
pub const DEFAULT_RELEASE_MS: u64 = 700;

/// Turns raw press/release edges into notifications with repeat flags
#[derive(Debug)]
pub struct RepeatTracker {
    /// Held keys and the time of their latest press or repeat
    held: HashMap<String, Instant>,
    release_after: Duration,
}

impl Default for RepeatTracker {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_RELEASE_MS))
    }
}

impl RepeatTracker {
    pub fn new(release_after: Duration) -> Self {
        Self {
            held: HashMap::new(),
            release_after,
        }
    }

    pub fn release_after(&self) -> Duration {
        self.release_after
    }

    pub fn is_held(&self, label: &str) -> bool {
        self.held.contains_key(label)
    }

    /// Record a press; a press of a key that is already down is a repeat
    pub fn press(&mut self, label: &str) -> KeyNotification {
        let is_repeat = self
            .held
            .insert(label.to_string(), Instant::now())
            .is_some();
        press_notification(label, is_repeat)
    }

    /// Record a press the source already reported as an auto-repeat
    pub fn repeat(&mut self, label: &str) -> KeyNotification {
        self.held.insert(label.to_string(), Instant::now());
        press_notification(label, true)
    }

    /// Record a release
    pub fn release(&mut self, label: &str) -> KeyNotification {
        self.held.remove(label);
        KeyNotification {
            kind: EventKind::Release,
            event: KeyEvent::new(label),
        }
    }

    /// Release every key not pressed again within `release_after`
    pub fn expired(&mut self) -> Vec<KeyNotification> {
        self.expired_at(Instant::now())
    }

    /// Same as [`expired`](Self::expired), measured against `now`
    pub fn expired_at(&mut self, now: Instant) -> Vec<KeyNotification> {
        let release_after = self.release_after;
        let mut labels: Vec<String> = self
            .held
            .iter()
            .filter(|(_, &last)| now.saturating_duration_since(last) > release_after)
            .map(|(label, _)| label.clone())
            .collect();
        labels.sort();

        labels.iter().map(|label| self.release(label)).collect()
    }

    /// Release every held key
    pub fn release_all(&mut self) -> Vec<KeyNotification> {
        let mut labels: Vec<String> = self.held.keys().cloned().collect();
        labels.sort();
        labels.iter().map(|label| self.release(label)).collect()
    }
}

fn press_notification(label: &str, is_repeat: bool) -> KeyNotification {
    KeyNotification {
        kind: EventKind::Press,
        event: KeyEvent {
            key: label.to_string(),
            is_repeat,
        },
    }
}
