//! Chunk - a square patch of terrain height samples.
//!
//! A chunk holds `chunk_size²` heights in row-major local pixel order plus
//! its cached vertical [`Bounds`]. Heights are written once, at generation,
//! and never change while the chunk is resident.

use crate::bounds::{Bounds, compute_bounds};
use crate::coords::{GridCoord, LocalPos};
use crate::seeding::HeightSource;

/// Height data for one grid coordinate.
#[derive(Clone, Debug, PartialEq)]
pub struct Chunk {
  coord: GridCoord,
  size: u32,
  heights: Box<[f32]>,
  bounds: Bounds,
}

impl Chunk {
  /// Generates the chunk at `coord` from a height source.
  pub fn generate(coord: GridCoord, size: u32, source: &dyn HeightSource) -> Self {
    let len = (size as usize) * (size as usize);
    let mut chunk = Self {
      coord,
      size,
      heights: vec![0.0; len].into_boxed_slice(),
      bounds: Bounds::ZERO,
    };
    chunk.regenerate(coord, source);
    chunk
  }

  /// Builds a chunk from existing height data.
  ///
  /// Returns `None` if `heights` is not `size²` long.
  pub fn from_heights(coord: GridCoord, size: u32, heights: Vec<f32>) -> Option<Self> {
    if heights.len() != (size as usize) * (size as usize) {
      return None;
    }
    let bounds = compute_bounds(&heights);
    Some(Self {
      coord,
      size,
      heights: heights.into_boxed_slice(),
      bounds,
    })
  }

  /// Reuses this chunk's buffer for a different coordinate.
  ///
  /// Overwrites every sample and recomputes bounds, so nothing from the
  /// previous occupant survives.
  pub fn regenerate(&mut self, coord: GridCoord, source: &dyn HeightSource) {
    self.coord = coord;
    source.fill(coord, self.size, &mut self.heights);
    self.bounds = compute_bounds(&self.heights);
  }

  /// Returns the grid coordinate of this chunk.
  #[inline]
  pub fn coord(&self) -> GridCoord {
    self.coord
  }

  /// Returns the side length in pixels.
  #[inline]
  pub fn size(&self) -> u32 {
    self.size
  }

  /// Returns the height samples in row-major order.
  #[inline]
  pub fn heights(&self) -> &[f32] {
    &self.heights
  }

  /// Returns the cached vertical bounds.
  #[inline]
  pub fn bounds(&self) -> Bounds {
    self.bounds
  }

  /// Returns the height at a local pixel, or `None` if outside the chunk.
  pub fn height_at(&self, pos: LocalPos) -> Option<f32> {
    if pos.x < self.size && pos.z < self.size {
      Some(self.heights[pos.index(self.size)])
    } else {
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::seeding::FlatHeightSource;

  fn ramp(c: GridCoord, x: u32, z: u32) -> f32 {
    (c.x * 1000 + c.z * 100) as f32 + (z * 10 + x) as f32
  }

  #[test]
  fn generation_fills_row_major_and_bounds() {
    let chunk = Chunk::generate(GridCoord::new(0, 0), 2, &ramp);
    assert_eq!(chunk.heights(), &[0.0, 1.0, 10.0, 11.0]);
    assert_eq!(chunk.bounds().min_y, 0.0);
    assert_eq!(chunk.bounds().extent_y, 11.0);
    assert_eq!(chunk.height_at(LocalPos::new(1, 1)), Some(11.0));
    assert_eq!(chunk.height_at(LocalPos::new(2, 0)), None);
  }

  #[test]
  fn regenerate_replaces_previous_occupant() {
    let mut chunk = Chunk::generate(GridCoord::new(0, 0), 2, &ramp);
    chunk.regenerate(GridCoord::new(1, 0), &ramp);
    assert_eq!(chunk.coord(), GridCoord::new(1, 0));
    assert_eq!(chunk, Chunk::generate(GridCoord::new(1, 0), 2, &ramp));
  }

  #[test]
  fn flat_chunk_has_degenerate_bounds() {
    let chunk = Chunk::generate(GridCoord::new(3, 3), 4, &FlatHeightSource(9.0));
    assert_eq!(chunk.bounds().min_y, 9.0);
    assert_eq!(chunk.bounds().extent_y, 0.0);
  }

  #[test]
  fn from_heights_checks_length() {
    assert!(Chunk::from_heights(GridCoord::new(0, 0), 2, vec![0.0; 3]).is_none());
    let chunk = Chunk::from_heights(GridCoord::new(0, 0), 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    assert_eq!(chunk.bounds().max_y(), 4.0);
  }
}
