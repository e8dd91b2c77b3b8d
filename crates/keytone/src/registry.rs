//! Configured triggers and outputs
//!
//! Holds the press/release triggers the controller would subscribe on the
//! next `link()` or `restart()`, and forwards output changes to the
//! dispatcher. Replacing a handle with itself is rejected so callers notice
//! when an update would have no effect.

use std::sync::Arc;

use crate::dispatch::Dispatcher;
use crate::error::{Error, Result};
use crate::event::EventKind;
use crate::handler::{Fallback, Output, Trigger};

pub struct TriggerRegistry {
    press: Trigger,
    release: Trigger,
    dispatcher: Dispatcher,
    fallback: Arc<dyn Fallback>,
}

impl TriggerRegistry {
    /// Registry whose triggers dispatch through `dispatcher`
    pub fn new(dispatcher: Dispatcher, fallback: Arc<dyn Fallback>) -> Self {
        Self {
            press: dispatcher.trigger(EventKind::Press),
            release: dispatcher.trigger(EventKind::Release),
            dispatcher,
            fallback,
        }
    }

    pub fn trigger(&self, kind: EventKind) -> &Trigger {
        match kind {
            EventKind::Press => &self.press,
            EventKind::Release => &self.release,
        }
    }

    pub fn output(&self, kind: EventKind) -> Output {
        self.dispatcher.output(kind)
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn fallback(&self) -> &Arc<dyn Fallback> {
        &self.fallback
    }

    /// Store a new trigger for `kind`; `None` installs the fallback trigger
    pub fn set_trigger(&mut self, kind: EventKind, trigger: Option<Trigger>) -> Result<()> {
        let trigger = match trigger {
            Some(t) if &t == self.trigger(kind) => return Err(Error::duplicate_trigger(kind)),
            Some(t) => t,
            None => self.fallback.trigger(kind),
        };
        log::debug!("Configured {} trigger {:?}", kind, trigger);
        match kind {
            EventKind::Press => self.press = trigger,
            EventKind::Release => self.release = trigger,
        }
        Ok(())
    }

    /// Store a new output for `kind`; `None` installs the fallback output
    pub fn set_output(&mut self, kind: EventKind, output: Option<Output>) -> Result<()> {
        let output = match output {
            Some(o) if o == self.dispatcher.output(kind) => {
                return Err(Error::duplicate_output(kind));
            }
            Some(o) => o,
            None => self.fallback.output(kind),
        };
        self.dispatcher.set_output(kind, output);
        Ok(())
    }

    /// Put fallback handlers in every role
    pub fn reset(&mut self) {
        self.press = self.fallback.trigger(EventKind::Press);
        self.release = self.fallback.trigger(EventKind::Release);
        self.dispatcher
            .set_output(EventKind::Press, self.fallback.output(EventKind::Press));
        self.dispatcher
            .set_output(EventKind::Release, self.fallback.output(EventKind::Release));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::Configuration;
    use crate::handler::LogFallback;

    fn registry() -> TriggerRegistry {
        let fallback: Arc<dyn Fallback> = Arc::new(LogFallback);
        let dispatcher = Dispatcher::new(
            Configuration::default(),
            fallback.output(EventKind::Press),
            fallback.output(EventKind::Release),
        );
        TriggerRegistry::new(dispatcher, fallback)
    }

    #[test]
    fn test_set_trigger_replaces_only_that_role() {
        let mut registry = registry();
        let release = registry.trigger(EventKind::Release).clone();
        let trigger = Trigger::new(|_| {});

        registry.set_trigger(EventKind::Press, Some(trigger.clone())).unwrap();

        assert_eq!(registry.trigger(EventKind::Press), &trigger);
        assert_eq!(registry.trigger(EventKind::Release), &release);
    }

    #[test]
    fn test_same_trigger_is_rejected() {
        let mut registry = registry();
        let current = registry.trigger(EventKind::Release).clone();

        let err = registry.set_trigger(EventKind::Release, Some(current)).unwrap_err();
        assert!(matches!(err, Error::DuplicateHandler { role: "release trigger" }));
    }

    #[test]
    fn test_none_installs_fallback_trigger() {
        let mut registry = registry();
        let before = registry.trigger(EventKind::Press).clone();

        registry.set_trigger(EventKind::Press, None).unwrap();
        assert_ne!(registry.trigger(EventKind::Press), &before);

        // Each fallback is a new handle, so clearing twice is not a duplicate
        registry.set_trigger(EventKind::Press, None).unwrap();
    }

    #[test]
    fn test_outputs_reach_dispatcher() {
        let mut registry = registry();
        let output = Output::new(|_| {});

        registry.set_output(EventKind::Press, Some(output.clone())).unwrap();
        assert_eq!(registry.dispatcher().output(EventKind::Press), output);

        let err = registry.set_output(EventKind::Press, Some(output.clone())).unwrap_err();
        assert!(matches!(err, Error::DuplicateHandler { role: "press output" }));

        registry.set_output(EventKind::Press, None).unwrap();
        assert_ne!(registry.output(EventKind::Press), output);
    }

    #[test]
    fn test_reset_replaces_every_handler() {
        let mut registry = registry();
        let press = registry.trigger(EventKind::Press).clone();
        let output = registry.output(EventKind::Release);

        registry.reset();

        assert_ne!(registry.trigger(EventKind::Press), &press);
        assert_ne!(registry.output(EventKind::Release), output);
    }
}
