//! Keyboard pitch controller
//!
//! Ties the pieces together: a validated [`Configuration`] and its frequency
//! table, the [`TriggerRegistry`] of configured handlers, and the
//! [`LinkManager`] that keeps the event source subscriptions in sync.

use std::sync::Arc;

use crate::configuration::{
    Configuration, DEFAULT_BASE_FREQUENCY, DEFAULT_FIRST_OCTAVE, DEFAULT_SECOND_OCTAVE,
    DEFAULT_VELOCITY,
};
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::event::{EventKind, EventSource};
use crate::frequency::FrequencyTable;
use crate::handler::{Fallback, LogFallback, Output, Trigger};
use crate::link::{LinkManager, LinkState, RestartPlan};
use crate::registry::TriggerRegistry;

/// Construction options for a [`KeyboardController`]
#[derive(Clone)]
pub struct ControllerOptions {
    /// Receives press pitch events (default: fallback output)
    pub press_output: Option<Output>,
    /// Receives release pitch events (default: fallback output)
    pub release_output: Option<Output>,
    pub base_frequency: f64,
    pub first_octave: u8,
    pub second_octave: u8,
    pub velocity: Option<u8>,
    /// Source of stand-in handlers (default: [`LogFallback`])
    pub fallback: Arc<dyn Fallback>,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            press_output: None,
            release_output: None,
            base_frequency: DEFAULT_BASE_FREQUENCY,
            first_octave: DEFAULT_FIRST_OCTAVE,
            second_octave: DEFAULT_SECOND_OCTAVE,
            velocity: Some(DEFAULT_VELOCITY),
            fallback: Arc::new(LogFallback),
        }
    }
}

impl ControllerOptions {
    pub fn press_output(mut self, output: Output) -> Self {
        self.press_output = Some(output);
        self
    }

    pub fn release_output(mut self, output: Output) -> Self {
        self.release_output = Some(output);
        self
    }

    pub fn configuration(mut self, configuration: Configuration) -> Self {
        self.base_frequency = configuration.base_frequency();
        self.first_octave = configuration.first_octave();
        self.second_octave = configuration.second_octave();
        self.velocity = configuration.velocity();
        self
    }

    pub fn fallback(mut self, fallback: Arc<dyn Fallback>) -> Self {
        self.fallback = fallback;
        self
    }
}

/// Maps key notifications from an event source to pitch events
///
/// The default press/release triggers look the key up in the current
/// frequency table and call the configured outputs. Linking subscribes the
/// configured triggers; replacing a trigger while linked takes effect on
/// `restart()` (or immediately with auto-restart enabled).
pub struct KeyboardController {
    registry: TriggerRegistry,
    links: LinkManager,
    auto_restart: bool,
}

impl KeyboardController {
    /// Create a controller with default tuning and fallback outputs
    pub fn new(source: Arc<dyn EventSource>) -> Self {
        let options = ControllerOptions::default();
        let dispatcher = Dispatcher::new(
            Configuration::default(),
            options.fallback.output(EventKind::Press),
            options.fallback.output(EventKind::Release),
        );
        Self::from_parts(source, dispatcher, options.fallback)
    }

    /// Create a controller, validating the tuning in `options`
    pub fn with_options(source: Arc<dyn EventSource>, options: ControllerOptions) -> Result<Self> {
        let configuration = Configuration::new(
            options.base_frequency,
            options.first_octave,
            options.second_octave,
            options.velocity,
        )?;
        let press_output = options
            .press_output
            .unwrap_or_else(|| options.fallback.output(EventKind::Press));
        let release_output = options
            .release_output
            .unwrap_or_else(|| options.fallback.output(EventKind::Release));
        let dispatcher = Dispatcher::new(configuration, press_output, release_output);
        Ok(Self::from_parts(source, dispatcher, options.fallback))
    }

    fn from_parts(
        source: Arc<dyn EventSource>,
        dispatcher: Dispatcher,
        fallback: Arc<dyn Fallback>,
    ) -> Self {
        Self {
            registry: TriggerRegistry::new(dispatcher, fallback),
            links: LinkManager::new(source),
            auto_restart: false,
        }
    }

    /// Handle for custom triggers that want the default lookup-and-dispatch
    pub fn dispatcher(&self) -> Dispatcher {
        self.registry.dispatcher().clone()
    }

    /// Snapshot of the current frequency table
    pub fn table(&self) -> FrequencyTable {
        self.registry.dispatcher().table()
    }

    // Tuning

    pub fn configuration(&self) -> Configuration {
        self.registry.dispatcher().configuration()
    }

    /// Replace the whole tuning at once
    pub fn set_configuration(&mut self, configuration: Configuration) {
        self.registry.dispatcher().set_configuration(configuration);
    }

    pub fn base_frequency(&self) -> f64 {
        self.configuration().base_frequency()
    }

    pub fn set_base_frequency(&mut self, base_frequency: f64) -> Result<()> {
        let configuration = self.configuration().with_base_frequency(base_frequency)?;
        self.set_configuration(configuration);
        Ok(())
    }

    pub fn first_octave(&self) -> u8 {
        self.configuration().first_octave()
    }

    pub fn set_first_octave(&mut self, octave: u8) -> Result<()> {
        let configuration = self.configuration().with_first_octave(octave)?;
        self.set_configuration(configuration);
        Ok(())
    }

    pub fn second_octave(&self) -> u8 {
        self.configuration().second_octave()
    }

    pub fn set_second_octave(&mut self, octave: u8) -> Result<()> {
        let configuration = self.configuration().with_second_octave(octave)?;
        self.set_configuration(configuration);
        Ok(())
    }

    pub fn velocity(&self) -> Option<u8> {
        self.configuration().velocity()
    }

    pub fn set_velocity(&mut self, velocity: Option<u8>) -> Result<()> {
        let configuration = self.configuration().with_velocity(velocity)?;
        self.set_configuration(configuration);
        Ok(())
    }

    // Handlers

    pub fn auto_restart(&self) -> bool {
        self.auto_restart
    }

    /// When enabled, replacing a trigger on a linked controller restarts it
    pub fn set_auto_restart(&mut self, auto_restart: bool) {
        self.auto_restart = auto_restart;
    }

    pub fn press_trigger(&self) -> &Trigger {
        self.registry.trigger(EventKind::Press)
    }

    pub fn release_trigger(&self) -> &Trigger {
        self.registry.trigger(EventKind::Release)
    }

    /// Replace the press trigger (`None` installs the fallback trigger)
    ///
    /// With auto-restart enabled and the controller linked, `restart()` runs
    /// afterwards and its error is returned; the new trigger stays configured
    /// either way.
    pub fn set_press_trigger(&mut self, trigger: Option<Trigger>) -> Result<()> {
        self.set_trigger(EventKind::Press, trigger)
    }

    /// Replace the release trigger (`None` installs the fallback trigger)
    ///
    /// Same auto-restart behavior as [`set_press_trigger`](Self::set_press_trigger).
    pub fn set_release_trigger(&mut self, trigger: Option<Trigger>) -> Result<()> {
        self.set_trigger(EventKind::Release, trigger)
    }

    fn set_trigger(&mut self, kind: EventKind, trigger: Option<Trigger>) -> Result<()> {
        self.registry.set_trigger(kind, trigger)?;
        if self.auto_restart && self.is_linked() {
            self.restart()?;
        }
        Ok(())
    }

    pub fn press_output(&self) -> Output {
        self.registry.output(EventKind::Press)
    }

    pub fn release_output(&self) -> Output {
        self.registry.output(EventKind::Release)
    }

    /// Replace the press output (`None` installs the fallback output)
    pub fn set_press_output(&mut self, output: Option<Output>) -> Result<()> {
        self.registry.set_output(EventKind::Press, output)
    }

    /// Replace the release output (`None` installs the fallback output)
    pub fn set_release_output(&mut self, output: Option<Output>) -> Result<()> {
        self.registry.set_output(EventKind::Release, output)
    }

    // Linking

    pub fn is_linked(&self) -> bool {
        self.links.is_linked()
    }

    pub fn link_state(&self) -> &LinkState {
        self.links.state()
    }

    pub fn linked_press_trigger(&self) -> Option<&Trigger> {
        self.links.linked(EventKind::Press)
    }

    pub fn linked_release_trigger(&self) -> Option<&Trigger> {
        self.links.linked(EventKind::Release)
    }

    /// Subscribe the configured triggers to the event source
    pub fn link(&mut self) -> Result<()> {
        self.links.link(
            self.registry.trigger(EventKind::Press),
            self.registry.trigger(EventKind::Release),
        )
    }

    /// Remove both subscriptions (no-op when unlinked)
    pub fn unlink(&mut self) {
        self.links.unlink();
    }

    /// Resubscribe whichever configured triggers differ from the linked ones
    pub fn restart(&mut self) -> Result<RestartPlan> {
        self.links.restart(
            self.registry.trigger(EventKind::Press),
            self.registry.trigger(EventKind::Release),
        )
    }

    /// Unlink and return to the baseline tuning with fallback handlers
    pub fn reset(&mut self) {
        self.links.unlink();
        self.set_configuration(Configuration::baseline());
        self.registry.reset();
        self.auto_restart = false;
        log::debug!("Controller reset");
    }
}
