//! Link state machine
//!
//! ```text
//!            link()                     restart() (some trigger changed)
//!  Unlinked ─────────▶ Linked ◀─────────────────────────┐
//!     ▲                  │  └───────────────────────────┘
//!     └──────────────────┘
//!          unlink()
//! ```
//!
//! While linked, the manager remembers exactly which trigger handles it
//! registered with the event source. Those are the handles it unsubscribes
//! later, even if the configured triggers have been replaced since.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::event::{EventKind, EventSource};
use crate::handler::Trigger;

/// Subscription state of a controller
#[derive(Debug, Clone, Default)]
pub enum LinkState {
    #[default]
    Unlinked,
    Linked { press: Trigger, release: Trigger },
}

impl LinkState {
    pub fn is_linked(&self) -> bool {
        matches!(self, LinkState::Linked { .. })
    }

    /// Trigger currently registered for `kind`
    pub fn linked(&self, kind: EventKind) -> Option<&Trigger> {
        match (self, kind) {
            (LinkState::Unlinked, _) => None,
            (LinkState::Linked { press, .. }, EventKind::Press) => Some(press),
            (LinkState::Linked { release, .. }, EventKind::Release) => Some(release),
        }
    }
}

/// Which subscriptions a `restart()` swaps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartPlan {
    Both,
    PressOnly,
    ReleaseOnly,
}

impl RestartPlan {
    /// Plan from the two change axes; `None` when nothing changed
    pub fn from_changes(press_changed: bool, release_changed: bool) -> Option<Self> {
        match (press_changed, release_changed) {
            (true, true) => Some(RestartPlan::Both),
            (true, false) => Some(RestartPlan::PressOnly),
            (false, true) => Some(RestartPlan::ReleaseOnly),
            (false, false) => None,
        }
    }

    pub fn kinds(self) -> &'static [EventKind] {
        match self {
            RestartPlan::Both => &[EventKind::Press, EventKind::Release],
            RestartPlan::PressOnly => &[EventKind::Press],
            RestartPlan::ReleaseOnly => &[EventKind::Release],
        }
    }
}

/// Subscribes triggers to an event source and tracks what is linked
pub struct LinkManager {
    source: Arc<dyn EventSource>,
    state: LinkState,
}

impl LinkManager {
    pub fn new(source: Arc<dyn EventSource>) -> Self {
        Self {
            source,
            state: LinkState::Unlinked,
        }
    }

    pub fn state(&self) -> &LinkState {
        &self.state
    }

    pub fn is_linked(&self) -> bool {
        self.state.is_linked()
    }

    pub fn linked(&self, kind: EventKind) -> Option<&Trigger> {
        self.state.linked(kind)
    }

    pub fn source(&self) -> &Arc<dyn EventSource> {
        &self.source
    }

    /// Subscribe `press` and `release`
    pub fn link(&mut self, press: &Trigger, release: &Trigger) -> Result<()> {
        if let LinkState::Linked {
            press: linked_press,
            release: linked_release,
        } = &self.state
        {
            return if linked_press != press || linked_release != release {
                Err(Error::LinkMismatch)
            } else {
                Err(Error::AlreadyLinked)
            };
        }

        self.source.subscribe(EventKind::Press, press.clone());
        self.source.subscribe(EventKind::Release, release.clone());
        self.state = LinkState::Linked {
            press: press.clone(),
            release: release.clone(),
        };
        log::debug!("Linked press {:?} and release {:?}", press, release);
        Ok(())
    }

    /// Remove both subscriptions; no-op when unlinked
    pub fn unlink(&mut self) {
        if let LinkState::Linked { press, release } = std::mem::take(&mut self.state) {
            self.source.unsubscribe(EventKind::Press, &press);
            self.source.unsubscribe(EventKind::Release, &release);
            log::debug!("Unlinked press {:?} and release {:?}", press, release);
        }
    }

    /// Swap whichever linked triggers differ from `press` / `release`
    pub fn restart(&mut self, press: &Trigger, release: &Trigger) -> Result<RestartPlan> {
        let LinkState::Linked {
            press: linked_press,
            release: linked_release,
        } = &mut self.state
        else {
            return Err(Error::NotLinked);
        };

        let plan = RestartPlan::from_changes(linked_press != press, linked_release != release)
            .ok_or(Error::NoChange)?;

        for &kind in plan.kinds() {
            let (linked, configured) = match kind {
                EventKind::Press => (&mut *linked_press, press),
                EventKind::Release => (&mut *linked_release, release),
            };
            self.source.unsubscribe(kind, linked);
            self.source.subscribe(kind, configured.clone());
            log::debug!("Restarted {} trigger {:?} -> {:?}", kind, linked, configured);
            *linked = configured.clone();
        }
        Ok(plan)
    }
}

impl Drop for LinkManager {
    fn drop(&mut self) {
        self.unlink();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::KeyEventBus;

    fn manager() -> (LinkManager, Arc<KeyEventBus>) {
        let bus = Arc::new(KeyEventBus::new());
        (LinkManager::new(bus.clone()), bus)
    }

    fn noop() -> Trigger {
        Trigger::new(|_| {})
    }

    #[test]
    fn test_link_subscribes_both() {
        let (mut manager, bus) = manager();
        let (press, release) = (noop(), noop());

        manager.link(&press, &release).unwrap();

        assert!(manager.is_linked());
        assert!(bus.is_subscribed(EventKind::Press, &press));
        assert!(bus.is_subscribed(EventKind::Release, &release));
        assert_eq!(manager.linked(EventKind::Press), Some(&press));
        assert_eq!(manager.linked(EventKind::Release), Some(&release));
    }

    #[test]
    fn test_link_twice() {
        let (mut manager, _bus) = manager();
        let (press, release) = (noop(), noop());
        manager.link(&press, &release).unwrap();

        assert!(matches!(manager.link(&press, &release), Err(Error::AlreadyLinked)));
        assert!(matches!(manager.link(&noop(), &release), Err(Error::LinkMismatch)));
        assert!(matches!(manager.link(&press, &noop()), Err(Error::LinkMismatch)));
    }

    #[test]
    fn test_unlink_is_idempotent() {
        let (mut manager, bus) = manager();
        let (press, release) = (noop(), noop());
        manager.link(&press, &release).unwrap();

        manager.unlink();
        manager.unlink();

        assert!(!manager.is_linked());
        assert_eq!(manager.linked(EventKind::Press), None);
        assert_eq!(bus.subscriber_count(EventKind::Press), 0);
        assert_eq!(bus.subscriber_count(EventKind::Release), 0);
    }

    #[test]
    fn test_restart_requires_link() {
        let (mut manager, _bus) = manager();
        assert!(matches!(manager.restart(&noop(), &noop()), Err(Error::NotLinked)));
    }

    #[test]
    fn test_restart_without_change() {
        let (mut manager, _bus) = manager();
        let (press, release) = (noop(), noop());
        manager.link(&press, &release).unwrap();

        assert!(matches!(manager.restart(&press, &release), Err(Error::NoChange)));
    }

    #[test]
    fn test_restart_press_only() {
        let (mut manager, bus) = manager();
        let (press, release, new_press) = (noop(), noop(), noop());
        manager.link(&press, &release).unwrap();

        let plan = manager.restart(&new_press, &release).unwrap();

        assert_eq!(plan, RestartPlan::PressOnly);
        assert_eq!(manager.linked(EventKind::Press), Some(&new_press));
        assert_eq!(manager.linked(EventKind::Release), Some(&release));
        assert!(!bus.is_subscribed(EventKind::Press, &press));
        assert!(bus.is_subscribed(EventKind::Press, &new_press));
        assert!(bus.is_subscribed(EventKind::Release, &release));
    }

    #[test]
    fn test_restart_release_only() {
        let (mut manager, bus) = manager();
        let (press, release, new_release) = (noop(), noop(), noop());
        manager.link(&press, &release).unwrap();

        let plan = manager.restart(&press, &new_release).unwrap();

        assert_eq!(plan, RestartPlan::ReleaseOnly);
        assert_eq!(manager.linked(EventKind::Press), Some(&press));
        assert!(bus.is_subscribed(EventKind::Release, &new_release));
        assert_eq!(bus.subscriber_count(EventKind::Release), 1);
    }

    #[test]
    fn test_restart_both() {
        let (mut manager, bus) = manager();
        manager.link(&noop(), &noop()).unwrap();
        let (press, release) = (noop(), noop());

        assert_eq!(manager.restart(&press, &release).unwrap(), RestartPlan::Both);
        assert!(bus.is_subscribed(EventKind::Press, &press));
        assert!(bus.is_subscribed(EventKind::Release, &release));
        assert_eq!(bus.subscriber_count(EventKind::Press), 1);
        assert_eq!(bus.subscriber_count(EventKind::Release), 1);
    }

    #[test]
    fn test_drop_unlinks() {
        let (mut manager, bus) = manager();
        manager.link(&noop(), &noop()).unwrap();
        drop(manager);
        assert_eq!(bus.subscriber_count(EventKind::Press), 0);
    }
}
