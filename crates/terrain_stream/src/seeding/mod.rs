//! Height sources - generating chunk height data.
//!
//! The [`HeightSource`] trait is the contract every generator satisfies: a
//! pure, deterministic height per chunk coordinate and local pixel. Evicted
//! chunks are simply regenerated when they re-enter the window, so nothing is
//! cached to disk.

#[cfg(not(target_family = "wasm"))]
mod noise;
#[cfg(target_family = "wasm")]
#[path = "noise_wasm.rs"]
mod noise;

pub use noise::NoiseHeightSource;

use crate::coords::GridCoord;

/// Deterministic height generator.
///
/// Implementations must return the same value for the same inputs and must
/// not fail. A generator wrapping a fallible backend has to resolve failures
/// before it is handed to the streamer.
pub trait HeightSource: Send + Sync {
  /// Returns the height at `(local_x, local_z)` inside the chunk at `coord`.
  fn height(&self, coord: GridCoord, local_x: u32, local_z: u32) -> f32;

  /// Fills a whole chunk in row-major order (`z * chunk_size + x`).
  fn fill(&self, coord: GridCoord, chunk_size: u32, out: &mut [f32]) {
    debug_assert_eq!(out.len(), (chunk_size as usize) * (chunk_size as usize));
    for (i, sample) in out.iter_mut().enumerate() {
      let lx = (i % chunk_size as usize) as u32;
      let lz = (i / chunk_size as usize) as u32;
      *sample = self.height(coord, lx, lz);
    }
  }
}

impl<F> HeightSource for F
where
  F: Fn(GridCoord, u32, u32) -> f32 + Send + Sync,
{
  fn height(&self, coord: GridCoord, local_x: u32, local_z: u32) -> f32 {
    self(coord, local_x, local_z)
  }
}

/// Uniform height everywhere.
///
/// Every chunk gets a zero-extent bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlatHeightSource(pub f32);

impl HeightSource for FlatHeightSource {
  fn height(&self, _coord: GridCoord, _local_x: u32, _local_z: u32) -> f32 {
    self.0
  }

  fn fill(&self, _coord: GridCoord, _chunk_size: u32, out: &mut [f32]) {
    out.fill(self.0);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn closures_are_height_sources() {
    let source = |c: GridCoord, x: u32, z: u32| (c.x * 100 + c.z) as f32 + (x + z) as f32;
    assert_eq!(source.height(GridCoord::new(1, 2), 3, 4), 109.0);
  }

  #[test]
  fn default_fill_is_row_major() {
    let source = |_: GridCoord, x: u32, z: u32| (z * 10 + x) as f32;
    let mut out = vec![0.0; 4];
    source.fill(GridCoord::new(0, 0), 2, &mut out);
    assert_eq!(out, vec![0.0, 1.0, 10.0, 11.0]);
  }

  #[test]
  fn flat_source_fills_uniformly() {
    let mut out = vec![0.0; 9];
    FlatHeightSource(2.5).fill(GridCoord::new(-4, 8), 3, &mut out);
    assert!(out.iter().all(|&h| h == 2.5));
  }
}
