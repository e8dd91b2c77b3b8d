//! Validated tuning configuration
//!
//! All bounds are checked before anything is stored, so a rejected value
//! never leaves a half-updated controller behind.

use crate::error::{Error, Result};

/// Default base frequency (A4) in Hz
pub const DEFAULT_BASE_FREQUENCY: f64 = 440.0;

/// Default octave for the first slot
pub const DEFAULT_FIRST_OCTAVE: u8 = 4;

/// Default octave for the second slot
pub const DEFAULT_SECOND_OCTAVE: u8 = 5;

/// Default velocity for key presses
pub const DEFAULT_VELOCITY: u8 = 100;

/// Lower bound for the base frequency in Hz
///
/// Keeps the lowest table entry (C in octave 1, about 0.074 x base) well
/// above zero after rounding to 3 decimals.
pub const MIN_BASE_FREQUENCY: f64 = 1.0;

/// Upper bound for the base frequency in Hz
pub const MAX_BASE_FREQUENCY: f64 = 20000.0;

pub const MIN_OCTAVE: u8 = 1;
pub const MAX_OCTAVE: u8 = 7;
pub const MAX_VELOCITY: u8 = 100;

/// Base frequency restored by `reset()`
pub const BASELINE_BASE_FREQUENCY: f64 = 220.0;
pub const BASELINE_FIRST_OCTAVE: u8 = 1;
pub const BASELINE_SECOND_OCTAVE: u8 = 2;

/// Tuning configuration of a controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Configuration {
    base_frequency: f64,
    first_octave: u8,
    second_octave: u8,
    velocity: Option<u8>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            base_frequency: DEFAULT_BASE_FREQUENCY,
            first_octave: DEFAULT_FIRST_OCTAVE,
            second_octave: DEFAULT_SECOND_OCTAVE,
            velocity: Some(DEFAULT_VELOCITY),
        }
    }
}

impl Configuration {
    /// Create a configuration, validating every field
    pub fn new(
        base_frequency: f64,
        first_octave: u8,
        second_octave: u8,
        velocity: Option<u8>,
    ) -> Result<Self> {
        validate_base_frequency(base_frequency)?;
        validate_octave("first octave", first_octave)?;
        validate_octave("second octave", second_octave)?;
        validate_velocity(velocity)?;
        Ok(Self {
            base_frequency,
            first_octave,
            second_octave,
            velocity,
        })
    }

    /// The configuration `reset()` returns to
    pub fn baseline() -> Self {
        Self {
            base_frequency: BASELINE_BASE_FREQUENCY,
            first_octave: BASELINE_FIRST_OCTAVE,
            second_octave: BASELINE_SECOND_OCTAVE,
            velocity: Some(DEFAULT_VELOCITY),
        }
    }

    pub fn base_frequency(&self) -> f64 {
        self.base_frequency
    }

    pub fn first_octave(&self) -> u8 {
        self.first_octave
    }

    pub fn second_octave(&self) -> u8 {
        self.second_octave
    }

    pub fn velocity(&self) -> Option<u8> {
        self.velocity
    }

    /// Copy with a new base frequency
    pub fn with_base_frequency(self, base_frequency: f64) -> Result<Self> {
        validate_base_frequency(base_frequency)?;
        Ok(Self {
            base_frequency,
            ..self
        })
    }

    /// Copy with a new first octave
    pub fn with_first_octave(self, first_octave: u8) -> Result<Self> {
        validate_octave("first octave", first_octave)?;
        Ok(Self {
            first_octave,
            ..self
        })
    }

    /// Copy with a new second octave
    pub fn with_second_octave(self, second_octave: u8) -> Result<Self> {
        validate_octave("second octave", second_octave)?;
        Ok(Self {
            second_octave,
            ..self
        })
    }

    /// Copy with a new velocity (`None` drops velocity from pitch events)
    pub fn with_velocity(self, velocity: Option<u8>) -> Result<Self> {
        validate_velocity(velocity)?;
        Ok(Self { velocity, ..self })
    }
}

fn validate_base_frequency(value: f64) -> Result<()> {
    // NaN fails both comparisons
    if (MIN_BASE_FREQUENCY..=MAX_BASE_FREQUENCY).contains(&value) {
        Ok(())
    } else {
        Err(Error::range("base frequency", value, "1 <= Hz <= 20000"))
    }
}

fn validate_octave(name: &'static str, value: u8) -> Result<()> {
    if (MIN_OCTAVE..=MAX_OCTAVE).contains(&value) {
        Ok(())
    } else {
        Err(Error::range(name, value, "an octave between 1 and 7"))
    }
}

fn validate_velocity(value: Option<u8>) -> Result<()> {
    match value {
        Some(v) if v > MAX_VELOCITY => Err(Error::range("velocity", v, "0..=100")),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_range_error(result: Result<Configuration>) -> bool {
        matches!(result, Err(Error::ConfigurationRange { .. }))
    }

    #[test]
    fn test_default_configuration() {
        let config = Configuration::default();
        assert_eq!(config.base_frequency(), 440.0);
        assert_eq!(config.first_octave(), 4);
        assert_eq!(config.second_octave(), 5);
        assert_eq!(config.velocity(), Some(100));
    }

    #[test]
    fn test_base_frequency_bounds() {
        let config = Configuration::default();
        assert!(is_range_error(config.with_base_frequency(-1.0)));
        assert!(is_range_error(config.with_base_frequency(0.0)));
        assert!(is_range_error(config.with_base_frequency(25000.0)));
        assert!(is_range_error(config.with_base_frequency(f64::NAN)));
        assert!(is_range_error(config.with_base_frequency(f64::INFINITY)));
        assert_eq!(
            config.with_base_frequency(20000.0).unwrap().base_frequency(),
            20000.0
        );
    }

    #[test]
    fn test_tiny_base_frequency_rejected() {
        assert!(is_range_error(Configuration::new(5e-324, 1, 2, None)));
        assert!(is_range_error(Configuration::new(0.5, 1, 2, None)));

        let lowest = Configuration::new(MIN_BASE_FREQUENCY, 1, 1, None).unwrap();
        let table = crate::frequency::build(
            lowest.base_frequency(),
            lowest.first_octave(),
            lowest.second_octave(),
        );
        for entry in table.iter() {
            assert!(entry.frequency.is_finite());
            assert!(entry.reported_frequency() > 0.0, "{} is not positive", entry.note);
        }
    }

    #[test]
    fn test_octave_bounds() {
        let config = Configuration::default();
        assert!(is_range_error(config.with_first_octave(0)));
        assert!(is_range_error(config.with_first_octave(8)));
        assert!(is_range_error(config.with_second_octave(0)));
        assert!(is_range_error(config.with_second_octave(8)));
        assert_eq!(config.with_first_octave(1).unwrap().first_octave(), 1);
        assert_eq!(config.with_second_octave(7).unwrap().second_octave(), 7);
    }

    #[test]
    fn test_velocity_bounds() {
        let config = Configuration::default();
        assert!(is_range_error(config.with_velocity(Some(101))));
        assert_eq!(config.with_velocity(Some(0)).unwrap().velocity(), Some(0));
        assert_eq!(config.with_velocity(None).unwrap().velocity(), None);
    }

    #[test]
    fn test_new_rejects_any_bad_field() {
        assert!(is_range_error(Configuration::new(440.0, 4, 9, Some(100))));
        assert!(is_range_error(Configuration::new(440.0, 4, 5, Some(200))));
        assert!(Configuration::new(440.0, 4, 5, None).is_ok());
    }

    #[test]
    fn test_baseline_differs_from_default() {
        let baseline = Configuration::baseline();
        assert_eq!(baseline.base_frequency(), 220.0);
        assert_eq!(baseline.first_octave(), 1);
        assert_eq!(baseline.second_octave(), 2);
        assert_ne!(baseline, Configuration::default());
    }
}
