//! OS-level keyboard input using rdev
//!
//! Terminals rarely report key releases, so this listener intercepts
//! keyboard events at the OS level instead. rdev reports held keys as a
//! stream of presses; a [`RepeatTracker`] flags the extra presses as repeats.
//!
//! If rdev cannot hook the keyboard (Wayland, a locked-down X session) the
//! listener thread exits and [`OsKeyboardListener::try_recv`] reports
//! [`Error::Listener`] so callers can fall back to terminal input.

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use rdev::{listen, Event, EventType, Key};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::error::{Error, Result};
use crate::event::KeyNotification;
use crate::repeat::RepeatTracker;

/// OS-level keyboard listener that forwards press and release notifications
pub struct OsKeyboardListener {
    /// Channel receiver for key notifications
    event_rx: Receiver<KeyNotification>,
    /// Shutdown flag
    shutdown: Arc<AtomicBool>,
    /// Listener thread handle
    _thread: JoinHandle<()>,
}

impl OsKeyboardListener {
    /// Start the OS keyboard listener
    ///
    /// Returns None if the listener couldn't be started (e.g., on systems without X11)
    pub fn new() -> Option<Self> {
        if !is_available() {
            return None;
        }

        let (tx, rx) = unbounded();
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let thread = thread::spawn(move || {
            run_listener(tx, shutdown_clone);
        });

        Some(Self {
            event_rx: rx,
            shutdown,
            _thread: thread,
        })
    }

    /// Try to receive a notification (non-blocking)
    ///
    /// Fails with [`Error::Listener`] once the listener thread has stopped.
    pub fn try_recv(&self) -> Result<Option<KeyNotification>> {
        receive(&self.event_rx)
    }

    /// Get the notification receiver for use in select! or other patterns
    pub fn receiver(&self) -> &Receiver<KeyNotification> {
        &self.event_rx
    }
}

impl Drop for OsKeyboardListener {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

/// Map rdev Key to the label an event source reports (US QWERTY)
pub fn key_to_label(key: Key) -> Option<&'static str> {
    let label = match key {
        Key::KeyA => "a",
        Key::KeyB => "b",
        Key::KeyC => "c",
        Key::KeyD => "d",
        Key::KeyE => "e",
        Key::KeyF => "f",
        Key::KeyG => "g",
        Key::KeyH => "h",
        Key::KeyI => "i",
        Key::KeyJ => "j",
        Key::KeyK => "k",
        Key::KeyL => "l",
        Key::KeyM => "m",
        Key::KeyN => "n",
        Key::KeyO => "o",
        Key::KeyP => "p",
        Key::KeyQ => "q",
        Key::KeyR => "r",
        Key::KeyS => "s",
        Key::KeyT => "t",
        Key::KeyU => "u",
        Key::KeyV => "v",
        Key::KeyW => "w",
        Key::KeyX => "x",
        Key::KeyY => "y",
        Key::KeyZ => "z",
        Key::Num0 => "0",
        Key::Num1 => "1",
        Key::Num2 => "2",
        Key::Num3 => "3",
        Key::Num4 => "4",
        Key::Num5 => "5",
        Key::Num6 => "6",
        Key::Num7 => "7",
        Key::Num8 => "8",
        Key::Num9 => "9",
        Key::Escape => "Escape",
        Key::Space => " ",
        _ => return None,
    };
    Some(label)
}

/// Non-blocking receive that tells an empty channel from a dead listener
fn receive(rx: &Receiver<KeyNotification>) -> Result<Option<KeyNotification>> {
    match rx.try_recv() {
        Ok(notification) => Ok(Some(notification)),
        Err(TryRecvError::Empty) => Ok(None),
        Err(TryRecvError::Disconnected) => Err(Error::Listener(
            "OS keyboard listener stopped".to_string(),
        )),
    }
}

/// Run the rdev listener (blocking - runs in its own thread)
fn run_listener(tx: Sender<KeyNotification>, shutdown: Arc<AtomicBool>) {
    // rdev may keep the callback alive after `listen` fails, so the sender
    // lives in a slot that is emptied on error to disconnect the channel.
    let sender = Arc::new(Mutex::new(Some(tx)));
    let callback_sender = sender.clone();
    let mut tracker = RepeatTracker::default();
    let callback = move |event: Event| {
        if shutdown.load(Ordering::Relaxed) {
            return;
        }

        let notification = match event.event_type {
            EventType::KeyPress(key) => key_to_label(key).map(|label| tracker.press(label)),
            EventType::KeyRelease(key) => key_to_label(key).map(|label| tracker.release(label)),
            _ => None,
        };
        if let Some(notification) = notification {
            if let Ok(slot) = callback_sender.lock() {
                if let Some(tx) = slot.as_ref() {
                    let _ = tx.send(notification);
                }
            }
        }
    };

    // This blocks until an error occurs
    if let Err(e) = listen(callback) {
        log::error!("OS keyboard listener error: {:?}", e);
    }
    if let Ok(mut slot) = sender.lock() {
        slot.take();
    };
}

/// Check if the OS keyboard listener is likely to work on this system
pub fn is_available() -> bool {
    // On Linux, rdev requires X11 or Wayland
    #[cfg(target_os = "linux")]
    {
        std::env::var("DISPLAY").is_ok() || std::env::var("WAYLAND_DISPLAY").is_ok()
    }

    #[cfg(not(target_os = "linux"))]
    {
        true
    }
}
