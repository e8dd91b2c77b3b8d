//! Configuration file support for keytone
//!
//! Configuration is stored in TOML format at:
//! - Linux: `~/.config/keytone/config.toml`
//! - macOS: `~/Library/Application Support/keytone/config.toml`
//! - Windows: `%APPDATA%\keytone\config.toml`

use crate::configuration::{
    Configuration, DEFAULT_BASE_FREQUENCY, DEFAULT_FIRST_OCTAVE, DEFAULT_SECOND_OCTAVE,
    DEFAULT_VELOCITY,
};
use crate::error::{Error, Result};
use crate::repeat::DEFAULT_RELEASE_MS;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = r#"# keytone configuration file

[tuning]
# Frequency of A in octave 4, in Hz (1 <= f <= 20000)
base_frequency = 440.0

# Octave played by the bottom/home rows (1-7)
first_octave = 4

# Octave played by the QWERTY/number rows (1-7)
second_octave = 5

# Velocity attached to pitch events (0-100)
velocity = 100

[controller]
# Resubscribe automatically when a trigger is replaced while linked
auto_restart = false

[input]
# Where key events come from: "terminal" or "os"
# "os" listens at the OS level and detects key releases reliably
source = "terminal"

# Terminals without key-up reporting: a held key counts as released this many
# milliseconds after its last press or auto-repeat
release_ms = 700
"#;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tuning settings
    pub tuning: TuningSettings,
    /// Controller behavior
    pub controller: ControllerSettings,
    /// Input settings
    pub input: InputSettings,
}

impl Config {
    /// Load configuration from the default config file location
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Err(Error::Config(format!("Config file not found at {:?}", path)))
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration or return default if not found
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                log::debug!("Using default configuration: {}", e);
                Self::default()
            }
        }
    }

    /// Save configuration to the default config file location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Some(proj_dirs) = ProjectDirs::from("", "", "keytone") {
            Ok(proj_dirs.config_dir().join("config.toml"))
        } else {
            Err(Error::Config("Could not determine config directory".to_string()))
        }
    }

    /// Create a default config file with comments
    pub fn create_default_config_file() -> Result<PathBuf> {
        let path = Self::config_path()?;
        Self::write_default_config_file(&path)?;
        Ok(path)
    }

    /// Write the commented default config to `path`
    pub fn write_default_config_file(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, DEFAULT_CONFIG_FILE)?;
        Ok(())
    }

    /// Validate the tuning section
    ///
    /// Out-of-range values are reported, never clamped.
    pub fn tuning(&self) -> Result<Configuration> {
        Configuration::new(
            self.tuning.base_frequency,
            self.tuning.first_octave,
            self.tuning.second_octave,
            self.tuning.velocity,
        )
    }
}

/// Tuning settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningSettings {
    /// Frequency of A4 in Hz
    pub base_frequency: f64,
    /// Octave of the bottom/home rows
    pub first_octave: u8,
    /// Octave of the QWERTY/number rows
    pub second_octave: u8,
    /// Velocity attached to pitch events
    pub velocity: Option<u8>,
}

impl Default for TuningSettings {
    fn default() -> Self {
        Self {
            base_frequency: DEFAULT_BASE_FREQUENCY,
            first_octave: DEFAULT_FIRST_OCTAVE,
            second_octave: DEFAULT_SECOND_OCTAVE,
            velocity: Some(DEFAULT_VELOCITY),
        }
    }
}

/// Controller behavior settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
    /// Restart automatically when a trigger is replaced while linked
    pub auto_restart: bool,
}

/// Key event source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputSource {
    /// Terminal key events (crossterm)
    #[default]
    Terminal,
    /// OS-level key events (rdev)
    Os,
}

/// Input settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    pub source: InputSource,
    /// Auto-release delay for terminal keys, in milliseconds
    pub release_ms: u64,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            source: InputSource::default(),
            release_ms: DEFAULT_RELEASE_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.tuning.base_frequency, 440.0);
        assert_eq!(config.tuning.first_octave, 4);
        assert_eq!(config.tuning.second_octave, 5);
        assert_eq!(config.tuning.velocity, Some(100));
        assert!(!config.controller.auto_restart);
        assert_eq!(config.input.source, InputSource::Terminal);
        assert_eq!(config.input.release_ms, DEFAULT_RELEASE_MS);
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = Config::default();
        config.tuning.base_frequency = 432.0;
        config.input.source = InputSource::Os;
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.tuning.base_frequency, 432.0);
        assert_eq!(parsed.input.source, InputSource::Os);
    }

    #[test]
    fn test_default_file_parses_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keytone").join("config.toml");

        Config::write_default_config_file(&path).unwrap();
        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.tuning().unwrap(), Configuration::default());
        assert!(!config.controller.auto_restart);
        assert_eq!(config.input.source, InputSource::Terminal);
        assert_eq!(config.input.release_ms, DEFAULT_RELEASE_MS);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.tuning.second_octave = 6;
        config.controller.auto_restart = true;

        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();

        assert_eq!(loaded.tuning.second_octave, 6);
        assert!(loaded.controller.auto_restart);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("[tuning]\nbase_frequency = 415.0\n").unwrap();
        let tuning = config.tuning().unwrap();
        assert_eq!(tuning.base_frequency(), 415.0);
        assert_eq!(tuning.first_octave(), 4);
    }

    #[test]
    fn test_out_of_range_tuning_is_reported() {
        let config: Config = toml::from_str("[tuning]\nfirst_octave = 9\n").unwrap();
        assert!(matches!(config.tuning(), Err(Error::ConfigurationRange { .. })));
    }

    #[test]
    fn test_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[tuning\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::TomlParse(_))));
    }
}
