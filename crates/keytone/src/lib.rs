//! keytone - computer keyboard to pitch controller
//!
//! Turns key presses and releases into pitch events (frequency, note name
//! and optional velocity) for two configurable octaves.
//! Features include:
//!
//! - Equal-tempered frequency table for 24 keys on a QWERTY keyboard
//! - Trigger handles subscribed to an injectable event source
//! - `link` / `unlink` / `restart` / `reset` lifecycle with identity checks
//! - Terminal and OS-level key input
//! - Configurable via TOML file
//!
//! # Usage as a Library
//!
//! ```no_run
//! use std::sync::Arc;
//! use keytone::{ControllerOptions, EventKind, KeyEvent, KeyEventBus, KeyboardController, Output};
//!
//! let bus = Arc::new(KeyEventBus::new());
//! let options = ControllerOptions::default()
//!     .press_output(Output::new(|e| println!("on  {} {:.3} Hz", e.note, e.frequency)))
//!     .release_output(Output::new(|e| println!("off {}", e.note)));
//! let mut controller = KeyboardController::with_options(bus.clone(), options)?;
//! controller.link()?;
//!
//! // Whatever produces key events feeds the bus
//! bus.emit(EventKind::Press, &KeyEvent::new("n")); // on  A4 440.000 Hz
//! # Ok::<(), keytone::Error>(())
//! ```

pub mod config;
pub mod configuration;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod frequency;
pub mod handler;
pub mod link;
pub mod os_keyboard;
pub mod registry;
pub mod repeat;

// Re-export main types
pub use config::{Config, InputSource};
pub use configuration::Configuration;
pub use controller::{ControllerOptions, KeyboardController};
pub use dispatch::Dispatcher;
pub use error::{Error, Result};
pub use event::{EventKind, EventSource, KeyEvent, KeyEventBus, KeyNotification, PitchEvent};
pub use frequency::{FrequencyTable, KeyBinding, OctaveSlot, PitchClass, ResolvedKey};
pub use handler::{Fallback, LogFallback, Output, Trigger};
pub use link::{LinkState, RestartPlan};
pub use os_keyboard::{is_available as os_keyboard_available, OsKeyboardListener};
pub use repeat::RepeatTracker;
