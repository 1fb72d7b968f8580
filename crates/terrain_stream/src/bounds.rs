//! Vertical bounds of chunk height data.
//!
//! Bounds feed the per-instance bounding boxes the renderer draws: the box
//! for a chunk starts at `min_y` and is `extent_y` tall. Heights never change
//! while a chunk is resident, so bounds are computed once at generation and
//! cached.

use crate::atlas::SlotIndex;
use crate::coords::GridCoord;

/// Vertical interval `[min_y, min_y + extent_y]` covering a chunk.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bounds {
  pub min_y: f32,
  /// Always `>= 0`. Zero for a chunk of uniform height.
  pub extent_y: f32,
}

impl Bounds {
  /// Bounds of an empty or perfectly flat-at-zero chunk.
  pub const ZERO: Self = Self {
    min_y: 0.0,
    extent_y: 0.0,
  };

  /// Returns the top of the interval.
  #[inline]
  pub fn max_y(&self) -> f32 {
    self.min_y + self.extent_y
  }

  /// Returns true if `height` lies inside the interval.
  #[inline]
  pub fn contains(&self, height: f32) -> bool {
    height >= self.min_y && height <= self.max_y()
  }
}

/// Computes bounds with a single linear scan tracking running min and max.
///
/// An empty slice yields [`Bounds::ZERO`].
pub fn compute_bounds(heights: &[f32]) -> Bounds {
  let Some((&first, rest)) = heights.split_first() else {
    return Bounds::ZERO;
  };

  let mut min = first;
  let mut max = first;
  for &h in rest {
    if h < min {
      min = h;
    }
    if h > max {
      max = h;
    }
  }

  // Rounding in `max - min` can leave `min + extent` a hair below `max`.
  let mut extent = max - min;
  while min + extent < max {
    extent = next_up(extent);
  }

  Bounds {
    min_y: min,
    extent_y: extent,
  }
}

/// Smallest f32 greater than a non-negative finite `x`.
fn next_up(x: f32) -> f32 {
  f32::from_bits(x.to_bits() + 1)
}

/// Bounding data for one slot, as handed to the renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundsRecord {
  pub slot: SlotIndex,
  pub grid_x: i32,
  pub grid_z: i32,
  pub min_y: f32,
  pub extent_y: f32,
}

impl BoundsRecord {
  /// Creates a record for the chunk at `coord` occupying `slot`.
  pub fn new(slot: SlotIndex, coord: GridCoord, bounds: Bounds) -> Self {
    Self {
      slot,
      grid_x: coord.x,
      grid_z: coord.z,
      min_y: bounds.min_y,
      extent_y: bounds.extent_y,
    }
  }

  /// Grid coordinate of the chunk this record describes.
  pub fn coord(&self) -> GridCoord {
    GridCoord::new(self.grid_x, self.grid_z)
  }

  /// Per-instance transform `[x, min_y, z, extent_y]`.
  ///
  /// x/z are the chunk origin in world units; the renderer scales a unit box
  /// by `chunk_size` horizontally and `extent_y` vertically.
  pub fn instance_transform(&self, chunk_size: u32) -> [f32; 4] {
    let size = chunk_size as f32;
    [
      self.grid_x as f32 * size,
      self.min_y,
      self.grid_z as f32 * size,
      self.extent_y,
    ]
  }
}

/// Per-slot cache of bounds records.
pub struct BoundsTracker {
  records: Vec<Option<BoundsRecord>>,
}

impl BoundsTracker {
  /// Creates a tracker with `slot_count` empty entries.
  pub fn new(slot_count: usize) -> Self {
    Self {
      records: vec![None; slot_count],
    }
  }

  /// Computes bounds for a height array.
  #[inline]
  pub fn compute_bounds(heights: &[f32]) -> Bounds {
    compute_bounds(heights)
  }

  /// Stores the record for its slot, replacing the previous occupant.
  pub fn set(&mut self, record: BoundsRecord) {
    self.records[record.slot.0] = Some(record);
  }

  /// Forgets the record cached for a slot.
  pub fn clear(&mut self, slot: SlotIndex) {
    self.records[slot.0] = None;
  }

  /// Returns the record cached for a slot.
  pub fn record(&self, slot: SlotIndex) -> Option<&BoundsRecord> {
    self.records.get(slot.0)?.as_ref()
  }

  /// Iterates cached records in slot order.
  pub fn records(&self) -> impl Iterator<Item = &BoundsRecord> + '_ {
    self.records.iter().flatten()
  }

  /// Number of slots tracked.
  pub fn slot_count(&self) -> usize {
    self.records.len()
  }

  /// Builds the full instance-transform buffer, one entry per slot.
  ///
  /// Empty slots produce a zero transform.
  pub fn instance_transforms(&self, chunk_size: u32) -> Vec<[f32; 4]> {
    self
      .records
      .iter()
      .map(|r| r.map_or([0.0; 4], |r| r.instance_transform(chunk_size)))
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bounds_cover_every_sample() {
    let heights = [3.0, -1.5, 7.25, 0.0, 2.0];
    let bounds = compute_bounds(&heights);
    assert_eq!(bounds.min_y, -1.5);
    assert_eq!(bounds.extent_y, 8.75);
    assert!(heights.iter().all(|&h| bounds.contains(h)));
  }

  #[test]
  fn uniform_heights_have_zero_extent() {
    let bounds = compute_bounds(&[4.0; 16]);
    assert_eq!(bounds.min_y, 4.0);
    assert_eq!(bounds.extent_y, 0.0);
  }

  #[test]
  fn empty_heights_are_zero() {
    assert_eq!(compute_bounds(&[]), Bounds::ZERO);
  }

  #[test]
  fn extent_survives_rounding() {
    let heights = [-1.0e7, 0.1, 3.3];
    let bounds = compute_bounds(&heights);
    assert!(bounds.extent_y >= 0.0);
    assert!(heights.iter().all(|&h| bounds.contains(h)));
  }

  #[test]
  fn instance_transform_scales_grid_position() {
    let record = BoundsRecord::new(
      SlotIndex(4),
      GridCoord::new(-2, 3),
      Bounds {
        min_y: 1.0,
        extent_y: 5.0,
      },
    );
    assert_eq!(record.instance_transform(32), [-64.0, 1.0, 96.0, 5.0]);
    assert_eq!(record.coord(), GridCoord::new(-2, 3));
  }

  #[test]
  fn tracker_replaces_slot_records() {
    let mut tracker = BoundsTracker::new(4);
    let a = BoundsRecord::new(SlotIndex(1), GridCoord::new(0, 0), Bounds::ZERO);
    let b = BoundsRecord::new(SlotIndex(1), GridCoord::new(5, 0), Bounds::ZERO);
    tracker.set(a);
    tracker.set(b);
    assert_eq!(tracker.record(SlotIndex(1)).map(|r| r.grid_x), Some(5));
    assert_eq!(tracker.records().count(), 1);
    assert_eq!(tracker.instance_transforms(2)[1], [10.0, 0.0, 0.0, 0.0]);

    tracker.clear(SlotIndex(1));
    assert!(tracker.record(SlotIndex(1)).is_none());
  }
}
