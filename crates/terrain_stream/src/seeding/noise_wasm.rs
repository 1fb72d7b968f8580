//! Pure-Rust noise height source for wasm, where fastnoise2's C++ library
//! is unavailable.

use ::noise::{Fbm, MultiFractal, NoiseFn, SuperSimplex};

use super::HeightSource;
use crate::config::StreamingConfig;
use crate::coords::GridCoord;

/// Procedural height source using fractal SuperSimplex noise.
///
/// Same constructor surface as the native fastnoise2 source; the two
/// backends do not produce identical heights.
pub struct NoiseHeightSource {
  fbm: Fbm<SuperSimplex>,
  chunk_size: u32,
  amplitude: f32,
}

impl NoiseHeightSource {
  /// Creates a new noise source.
  ///
  /// - `seed`: Deterministic seed for noise generation.
  /// - `chunk_size`: Must match the streamer's chunk size.
  /// - `feature_scale`: Controls feature size (larger = larger features).
  pub fn new(seed: i32, chunk_size: u32, feature_scale: f32) -> Self {
    let fbm = Fbm::<SuperSimplex>::new(seed as u32)
      .set_frequency(1.0 / feature_scale as f64)
      .set_octaves(1);
    Self {
      fbm,
      chunk_size,
      amplitude: 1.0,
    }
  }

  /// Builds a source from the generator fields of a config.
  pub fn from_config(config: &StreamingConfig) -> Self {
    Self::new(config.seed as i32, config.chunk_size, config.feature_scale)
      .with_amplitude(config.amplitude)
      .with_octaves(config.octaves)
  }

  /// Sets the output range to `0.0..=amplitude`.
  pub fn with_amplitude(mut self, amplitude: f32) -> Self {
    self.amplitude = amplitude;
    self
  }

  /// Sets the number of octaves (at least one).
  pub fn with_octaves(mut self, octaves: u32) -> Self {
    self.fbm = self.fbm.set_octaves(octaves.max(1) as usize);
    self
  }

  /// Samples the noise at an absolute world pixel.
  pub fn sample(&self, wx: i64, wz: i64) -> f32 {
    let value = self.fbm.get([wx as f64, wz as f64]) as f32;
    ((value + 1.0) * 0.5).clamp(0.0, 1.0) * self.amplitude
  }
}

impl HeightSource for NoiseHeightSource {
  fn height(&self, coord: GridCoord, local_x: u32, local_z: u32) -> f32 {
    let (wx, wz) = coord.world_pixel(self.chunk_size, local_x, local_z);
    self.sample(wx, wz)
  }
}
