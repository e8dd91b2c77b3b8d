//! Error types for keytone

use thiserror::Error;

use crate::event::EventKind;

/// Result type alias for keytone operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in keytone
#[derive(Debug, Error)]
pub enum Error {
    /// A tuning value was outside its documented bounds
    #[error("{name} out of range: {value} (expected {bounds})")]
    ConfigurationRange {
        name: &'static str,
        value: String,
        bounds: &'static str,
    },

    /// A setter received the handler that is already stored
    #[error("The new {role} is the one already stored in the controller. Pass a different handler to update it.")]
    DuplicateHandler { role: &'static str },

    /// `link()` called on a linked controller whose triggers are unchanged
    #[error("The controller is already linked")]
    AlreadyLinked,

    /// `link()` called on a linked controller whose triggers were replaced
    #[error("The controller is already linked. To use a new trigger unlink the controller and link it again, or use restart()")]
    LinkMismatch,

    /// `restart()` called on an unlinked controller
    #[error("The controller is not linked. restart() can only be performed on a linked controller; call link() first")]
    NotLinked,

    /// `restart()` called while both triggers still match the linked ones
    #[error("Both press and release triggers are already linked, nothing to restart. Change a trigger and try again")]
    NoChange,

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Keyboard listener error
    #[error("Listener error: {0}")]
    Listener(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Error {
    pub(crate) fn range(name: &'static str, value: impl ToString, bounds: &'static str) -> Self {
        Error::ConfigurationRange {
            name,
            value: value.to_string(),
            bounds,
        }
    }

    pub(crate) fn duplicate_trigger(kind: EventKind) -> Self {
        let role = match kind {
            EventKind::Press => "press trigger",
            EventKind::Release => "release trigger",
        };
        Error::DuplicateHandler { role }
    }

    pub(crate) fn duplicate_output(kind: EventKind) -> Self {
        let role = match kind {
            EventKind::Press => "press output",
            EventKind::Release => "release output",
        };
        Error::DuplicateHandler { role }
    }
}
