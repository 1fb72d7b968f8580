//! Streaming configuration.
//!
//! Loaded from TOML. Missing keys fall back to defaults so a partial file
//! only needs the values it overrides:
//!
//! ```toml
//! view_diameter = 12
//! seed = 7
//! ```

use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::coords::{DEFAULT_CHUNK_SIZE, DEFAULT_VIEW_DIAMETER};
use crate::error::ConfigError;

#[cfg(feature = "native")]
const CONFIG_FILE: &str = "terrain_stream.toml";

/// Configuration for a [`ChunkManager`](crate::ChunkManager) and its default
/// height source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
  /// Side length of the resident window in chunks.
  pub view_diameter: u32,
  /// Side length of a chunk in heightmap pixels.
  pub chunk_size: u32,
  /// Seed for the height generator.
  pub seed: u64,
  /// Size of the coarsest noise features, in pixels.
  pub feature_scale: f32,
  /// Heights span `0.0..amplitude`.
  pub amplitude: f32,
  /// Number of fractal octaves summed by the generator.
  pub octaves: u32,
  /// Generate entering chunks on the rayon pool.
  pub parallel_generation: bool,
  /// Number of advance timings kept for diagnostics.
  pub stats_window: usize,
}

impl Default for StreamingConfig {
  fn default() -> Self {
    Self {
      view_diameter: DEFAULT_VIEW_DIAMETER,
      chunk_size: DEFAULT_CHUNK_SIZE,
      seed: 42,
      feature_scale: 64.0,
      amplitude: 48.0,
      octaves: 4,
      parallel_generation: true,
      stats_window: 120,
    }
  }
}

impl StreamingConfig {
  /// Creates a config with the given window and chunk sizes, defaults
  /// elsewhere.
  pub fn new(view_diameter: u32, chunk_size: u32) -> Self {
    Self {
      view_diameter,
      chunk_size,
      ..Self::default()
    }
  }

  /// Sets the generator seed.
  pub fn with_seed(mut self, seed: u64) -> Self {
    self.seed = seed;
    self
  }

  /// Enables or disables parallel chunk generation.
  pub fn with_parallel_generation(mut self, enabled: bool) -> Self {
    self.parallel_generation = enabled;
    self
  }

  /// Number of slots (and resident chunks) in the window.
  pub fn slot_count(&self) -> usize {
    (self.view_diameter as usize) * (self.view_diameter as usize)
  }

  /// Side length of the atlas buffer in pixels.
  pub fn atlas_side(&self) -> u32 {
    self.view_diameter * self.chunk_size
  }

  /// Number of height samples per chunk.
  pub fn samples_per_chunk(&self) -> usize {
    (self.chunk_size as usize) * (self.chunk_size as usize)
  }

  /// Checks that every field is usable.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.view_diameter == 0 {
      return Err(ConfigError::Invalid("view_diameter must be > 0".into()));
    }
    if self.chunk_size == 0 {
      return Err(ConfigError::Invalid("chunk_size must be > 0".into()));
    }
    if self.view_diameter.checked_mul(self.chunk_size).is_none() {
      return Err(ConfigError::Invalid(format!(
        "atlas side {} x {} overflows",
        self.view_diameter, self.chunk_size
      )));
    }
    if !self.feature_scale.is_finite() || self.feature_scale <= 0.0 {
      return Err(ConfigError::Invalid(format!(
        "feature_scale must be finite and > 0, got {}",
        self.feature_scale
      )));
    }
    if !self.amplitude.is_finite() || self.amplitude < 0.0 {
      return Err(ConfigError::Invalid(format!(
        "amplitude must be finite and >= 0, got {}",
        self.amplitude
      )));
    }
    if self.octaves == 0 {
      return Err(ConfigError::Invalid("octaves must be > 0".into()));
    }
    if self.stats_window == 0 {
      return Err(ConfigError::Invalid("stats_window must be > 0".into()));
    }
    Ok(())
  }

  /// Parses and validates a config from TOML text.
  pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
    let config: Self = toml::from_str(contents)?;
    config.validate()?;
    Ok(config)
  }

  /// Serializes the config as pretty TOML.
  pub fn to_toml_string(&self) -> Result<String, ConfigError> {
    toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
  }

  /// Reads and validates a config file.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    Self::from_toml_str(&contents)
  }

  /// Reads a config file, falling back to defaults if it is missing or
  /// invalid.
  pub fn load_or_default(path: impl AsRef<Path>) -> Self {
    let path = path.as_ref();
    if !path.exists() {
      return Self::default();
    }
    match Self::load(path) {
      Ok(config) => {
        info!("Loaded streaming config from {}", path.display());
        config
      }
      Err(e) => {
        warn!("Failed to load streaming config {}: {e}, using defaults", path.display());
        Self::default()
      }
    }
  }

  /// Returns the platform config file location, if one exists.
  pub fn default_path() -> Option<PathBuf> {
    #[cfg(feature = "native")]
    {
      let config_dir = dirs::config_dir()?;
      Some(config_dir.join("terrain_stream").join(CONFIG_FILE))
    }
    #[cfg(not(feature = "native"))]
    {
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_describe_a_ten_chunk_window() {
    let config = StreamingConfig::default();
    assert_eq!(config.view_diameter, 10);
    assert_eq!(config.chunk_size, 32);
    assert_eq!(config.atlas_side(), 320);
    assert_eq!(config.slot_count(), 100);
    assert!(config.validate().is_ok());
  }

  #[test]
  fn partial_toml_keeps_defaults() {
    let config = StreamingConfig::from_toml_str("view_diameter = 3\nchunk_size = 2\n").unwrap();
    assert_eq!(config.view_diameter, 3);
    assert_eq!(config.chunk_size, 2);
    assert_eq!(config.seed, StreamingConfig::default().seed);
  }

  #[test]
  fn zero_sizes_are_rejected() {
    assert!(matches!(
      StreamingConfig::new(0, 32).validate(),
      Err(ConfigError::Invalid(_))
    ));
    assert!(matches!(
      StreamingConfig::new(10, 0).validate(),
      Err(ConfigError::Invalid(_))
    ));
  }

  #[test]
  fn bad_feature_scale_is_rejected() {
    let mut config = StreamingConfig::default();
    config.feature_scale = f32::NAN;
    assert!(config.validate().is_err());
    config.feature_scale = 0.0;
    assert!(config.validate().is_err());
  }

  #[test]
  fn malformed_toml_is_a_parse_error() {
    let err = StreamingConfig::from_toml_str("view_diameter = \"wide\"").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
  }

  #[test]
  fn toml_roundtrip() {
    let config = StreamingConfig::new(6, 16).with_seed(9);
    let text = config.to_toml_string().unwrap();
    assert_eq!(StreamingConfig::from_toml_str(&text).unwrap(), config);
  }
}
