//! Noise-based height source using fastnoise2.

use fastnoise2::SafeNode;
use fastnoise2::generator::prelude::{Generator, GeneratorWrapper};
use fastnoise2::generator::simplex::supersimplex_scaled;

use super::HeightSource;
use crate::config::StreamingConfig;
use crate::coords::GridCoord;

/// Procedural height source using fractal SuperSimplex noise.
///
/// Each octave is its own generator at half the previous feature scale and
/// half the weight. Heights depend only on the absolute world pixel, so
/// chunk borders are seamless and a regenerated chunk is bit-identical.
pub struct NoiseHeightSource {
  octaves: Vec<GeneratorWrapper<SafeNode>>,
  seed: i32,
  chunk_size: u32,
  feature_scale: f32,
  amplitude: f32,
}

impl NoiseHeightSource {
  /// Creates a new noise source.
  ///
  /// - `seed`: Deterministic seed for noise generation.
  /// - `chunk_size`: Must match the streamer's chunk size.
  /// - `feature_scale`: Controls feature size (larger = larger features).
  pub fn new(seed: i32, chunk_size: u32, feature_scale: f32) -> Self {
    Self {
      octaves: vec![supersimplex_scaled(feature_scale).build()],
      seed,
      chunk_size,
      feature_scale,
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
    let mut scale = self.feature_scale;
    self.octaves = (0..octaves.max(1))
      .map(|_| {
        let node = supersimplex_scaled(scale).build();
        scale *= 0.5;
        node
      })
      .collect();
    self
  }

  /// Samples the noise at an absolute world pixel.
  pub fn sample(&self, wx: i64, wz: i64) -> f32 {
    let (x, z) = (wx as f32, wz as f32);
    let mut total = 0.0;
    let mut weight = 0.0;
    let mut gain = 1.0;
    for (i, node) in self.octaves.iter().enumerate() {
      // Distinct seed per octave so layers do not line up
      total += gain * node.gen_single_2d(x, z, self.seed.wrapping_add(i as i32));
      weight += gain;
      gain *= 0.5;
    }
    // Map [-1, 1] to [0, amplitude]
    ((total / weight + 1.0) * 0.5).clamp(0.0, 1.0) * self.amplitude
  }
}

impl HeightSource for NoiseHeightSource {
  fn height(&self, coord: GridCoord, local_x: u32, local_z: u32) -> f32 {
    let (wx, wz) = coord.world_pixel(self.chunk_size, local_x, local_z);
    self.sample(wx, wz)
  }
}
