//! Simulation configuration.
//!
//! Built in code with the `with_*` methods or loaded from JSON:
//!
//! ```json
//! {
//!     "particle_count": 200000,
//!     "shape": "Fox",
//!     "manual_colors": { "enabled": true, "start": "#ff0000", "end": "#0000ff", "emissive_intensity": 0.5 }
//! }
//! ```
//!
//! Missing fields take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::shaders::WORKGROUP_SIZE;
use crate::shape::{Palette, Shape};

/// Largest particle count a single 1D dispatch can cover. The device may
/// allow fewer; see [`particle_limit`](crate::particle_limit).
pub const MAX_PARTICLES: u32 = 65_535 * WORKGROUP_SIZE;

/// Colors used instead of the shape palette when `enabled` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManualColors {
    pub enabled: bool,
    pub start: String,
    pub end: String,
    pub emissive_intensity: f32,
}

impl Default for ManualColors {
    fn default() -> Self {
        Self {
            enabled: false,
            start: "#ff6a00".to_string(),
            end: "#42f5f2".to_string(),
            emissive_intensity: 0.1,
        }
    }
}

impl ManualColors {
    pub fn palette(&self) -> Result<Palette, ConfigError> {
        Palette::from_hex(&self.start, &self.end, self.emissive_intensity)
    }
}

/// Everything needed to build a [`Simulation`](crate::Simulation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MorphConfig {
    /// Number of particle slots. Fixed for the lifetime of a simulation.
    pub particle_count: u32,
    /// Shape selected at startup.
    pub shape: Shape,
    /// Manual color override.
    pub manual_colors: ManualColors,
    /// Multiplier on the noise offset. `0.0` disables jitter.
    pub jitter_strength: f32,
    /// Seed for target sampling. `None` draws from OS entropy.
    pub sampler_seed: Option<u64>,
}

impl Default for MorphConfig {
    fn default() -> Self {
        Self {
            particle_count: 500_000,
            shape: Shape::default(),
            manual_colors: ManualColors::default(),
            jitter_strength: 1.0,
            sampler_seed: None,
        }
    }
}

impl MorphConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of particles.
    pub fn with_particle_count(mut self, count: u32) -> Self {
        self.particle_count = count;
        self
    }

    /// Set the shape selected at startup.
    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = shape;
        self
    }

    /// Enable manual colors with the given sRGB hex strings.
    pub fn with_manual_colors(mut self, start: &str, end: &str, emissive_intensity: f32) -> Self {
        self.manual_colors = ManualColors {
            enabled: true,
            start: start.to_string(),
            end: end.to_string(),
            emissive_intensity,
        };
        self
    }

    /// Scale the noise offset applied each update.
    pub fn with_jitter_strength(mut self, strength: f32) -> Self {
        self.jitter_strength = strength;
        self
    }

    /// Fix the target sampling seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.sampler_seed = Some(seed);
        self
    }

    /// Parse from a JSON string and validate.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON file and validate.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    /// Reject configurations that cannot be simulated.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.particle_count == 0 {
            return Err(ConfigError::ZeroParticles);
        }
        if self.particle_count > MAX_PARTICLES {
            return Err(ConfigError::TooManyParticles {
                requested: self.particle_count,
                max: MAX_PARTICLES,
            });
        }
        self.manual_colors.palette()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MorphConfig::default();
        assert_eq!(config.particle_count, 500_000);
        assert_eq!(config.shape, Shape::Humanoid);
        assert!(!config.manual_colors.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_particles_rejected() {
        let config = MorphConfig::new().with_particle_count(0);
        assert!(matches!(config.validate(), Err(ConfigError::ZeroParticles)));
    }

    #[test]
    fn test_too_many_particles_rejected() {
        let config = MorphConfig::new().with_particle_count(MAX_PARTICLES + 1);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TooManyParticles { .. })
        ));
    }

    #[test]
    fn test_from_json_partial() {
        let config = MorphConfig::from_json(r#"{ "particle_count": 4, "shape": "Book" }"#).unwrap();
        assert_eq!(config.particle_count, 4);
        assert_eq!(config.shape, Shape::Book);
        assert_eq!(config.jitter_strength, 1.0);
    }

    #[test]
    fn test_from_json_unknown_shape() {
        let err = MorphConfig::from_json(r#"{ "shape": "Dragon" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_from_json_bad_color() {
        let err = MorphConfig::from_json(r#"{ "manual_colors": { "start": "red" } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidColor(_)));
    }

    #[test]
    fn test_json_round_trip() {
        let config = MorphConfig::new()
            .with_particle_count(1024)
            .with_shape(Shape::Fox)
            .with_manual_colors("#ffffff", "#000000", 2.0)
            .with_seed(9);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(MorphConfig::from_json(&json).unwrap(), config);
    }
}
