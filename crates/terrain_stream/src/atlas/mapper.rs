//! Grid coordinate ↔ atlas slot bijection.
//!
//! The first window is laid out in row-major scan order; its minimum corner
//! becomes the anchor. From then on every coordinate targets slot
//! `((x - anchor.x) mod d) + ((z - anchor.z) mod d) * d`. A column leaving
//! one side of the window and the column entering on the opposite side are
//! exactly `d` apart, so they share slots: the exiting slots are reassigned
//! in place and only that strip of the atlas is rewritten.

use std::collections::{HashMap, HashSet};

use super::{AtlasRegion, SlotIndex};
use crate::coords::GridCoord;
use crate::error::{Result, StreamError};
use crate::world::ViewWindow;

/// Bijection between resident grid coordinates and atlas slots.
pub struct AtlasMapper {
  diameter: u32,
  chunk_size: u32,
  /// Window minimum at the last scan-order layout.
  anchor: Option<GridCoord>,
  /// Maps resident positions to slot indices.
  slot_of: HashMap<GridCoord, SlotIndex>,
  /// Inverse of `slot_of`, indexed by slot.
  occupants: Vec<Option<GridCoord>>,
}

impl AtlasMapper {
  /// Creates an empty mapper for a `diameter × diameter` atlas.
  pub fn new(diameter: u32, chunk_size: u32) -> Self {
    let slot_count = (diameter as usize) * (diameter as usize);
    Self {
      diameter,
      chunk_size,
      anchor: None,
      slot_of: HashMap::with_capacity(slot_count),
      occupants: vec![None; slot_count],
    }
  }

  /// Total number of slots.
  #[inline]
  pub fn slot_count(&self) -> usize {
    self.occupants.len()
  }

  /// Number of occupied slots.
  #[inline]
  pub fn len(&self) -> usize {
    self.slot_of.len()
  }

  /// Returns true if no slot is occupied.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.slot_of.is_empty()
  }

  /// Returns the fixed pixel rectangle of a slot.
  #[inline]
  pub fn region(&self, slot: SlotIndex) -> AtlasRegion {
    AtlasRegion::for_slot(slot, self.diameter, self.chunk_size)
  }

  /// Returns the slot currently holding `coord`.
  pub fn slot_of(&self, coord: GridCoord) -> Option<SlotIndex> {
    self.slot_of.get(&coord).copied()
  }

  /// Returns the coordinate currently held by `slot`.
  pub fn occupant(&self, slot: SlotIndex) -> Option<GridCoord> {
    self.occupants.get(slot.0).copied().flatten()
  }

  /// Returns the atlas rectangle the renderer must overwrite with `coord`'s
  /// heights.
  pub fn patch_for(&self, coord: GridCoord) -> Result<AtlasRegion> {
    self
      .slot_of(coord)
      .map(|slot| self.region(slot))
      .ok_or(StreamError::NotResident(coord))
  }

  /// Iterates occupied slots in slot order.
  pub fn iter(&self) -> impl Iterator<Item = (SlotIndex, GridCoord)> + '_ {
    self
      .occupants
      .iter()
      .enumerate()
      .filter_map(|(i, c)| c.map(|c| (SlotIndex(i), c)))
  }

  /// Slot a coordinate lands in under the current anchor.
  pub fn target_slot(&self, coord: GridCoord) -> Option<SlotIndex> {
    let anchor = self.anchor?;
    let d = self.diameter as i64;
    let sx = (coord.x as i64 - anchor.x as i64).rem_euclid(d);
    let sz = (coord.z as i64 - anchor.z as i64).rem_euclid(d);
    Some(SlotIndex((sz * d + sx) as usize))
  }

  /// Drops every assignment and lays `window` out in row-major scan order.
  ///
  /// Returns the new `(slot, coord)` pairs in slot order.
  pub fn assign_scan_order(&mut self, window: &ViewWindow) -> Result<Vec<(SlotIndex, GridCoord)>> {
    if window.diameter != self.diameter {
      return Err(StreamError::invariant(format!(
        "window diameter {} does not match atlas diameter {}",
        window.diameter, self.diameter
      )));
    }

    self.slot_of.clear();
    self.occupants.fill(None);
    self.anchor = Some(window.min());

    let mut assigned = Vec::with_capacity(self.slot_count());
    for (i, coord) in window.positions().enumerate() {
      let slot = SlotIndex(i);
      self.slot_of.insert(coord, slot);
      self.occupants[i] = Some(coord);
      assigned.push((slot, coord));
    }
    Ok(assigned)
  }

  /// Validates a window shift without touching any state.
  ///
  /// Every leaving coordinate must be mapped, no entering coordinate may be,
  /// and the entering coordinates must target exactly the slots the leaving
  /// ones free. Returns the `(coord, slot)` plan for the entering side.
  pub fn plan_shift(
    &self,
    leaving: &[GridCoord],
    entering: &[GridCoord],
  ) -> Result<Vec<(GridCoord, SlotIndex)>> {
    if leaving.len() != entering.len() {
      return Err(StreamError::invariant(format!(
        "{} chunks leaving but {} entering",
        leaving.len(),
        entering.len()
      )));
    }

    let mut freed = HashSet::with_capacity(leaving.len());
    for &coord in leaving {
      let slot = self.slot_of(coord).ok_or(StreamError::NotResident(coord))?;
      if !freed.insert(slot) {
        return Err(StreamError::invariant(format!(
          "slot {} freed twice",
          slot.0
        )));
      }
    }

    let mut plan = Vec::with_capacity(entering.len());
    for &coord in entering {
      if self.slot_of.contains_key(&coord) {
        return Err(StreamError::DuplicateCoord(coord));
      }
      let slot = self
        .target_slot(coord)
        .ok_or_else(|| StreamError::invariant("atlas mapper has no anchor"))?;
      if !freed.remove(&slot) {
        return Err(StreamError::invariant(format!(
          "entering chunk {coord} targets slot {} which is not being freed",
          slot.0
        )));
      }
      plan.push((coord, slot));
    }
    Ok(plan)
  }

  /// Frees the slot held by `coord`.
  pub fn release(&mut self, coord: GridCoord) -> Result<SlotIndex> {
    let slot = self
      .slot_of
      .remove(&coord)
      .ok_or(StreamError::NotResident(coord))?;
    self.occupants[slot.0] = None;
    Ok(slot)
  }

  /// Places `coord` in a free slot.
  pub fn assign(&mut self, coord: GridCoord, slot: SlotIndex) -> Result<()> {
    let Some(occupant) = self.occupants.get(slot.0) else {
      return Err(StreamError::invariant(format!(
        "slot {} out of range",
        slot.0
      )));
    };
    if let Some(other) = occupant {
      return Err(StreamError::invariant(format!(
        "slot {} already holds {other}",
        slot.0
      )));
    }
    if self.slot_of.contains_key(&coord) {
      return Err(StreamError::DuplicateCoord(coord));
    }
    self.slot_of.insert(coord, slot);
    self.occupants[slot.0] = Some(coord);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::world::compute_position_changes;

  fn mapper_at(center: GridCoord, diameter: u32) -> (AtlasMapper, ViewWindow) {
    let window = ViewWindow::new(center, diameter);
    let mut mapper = AtlasMapper::new(diameter, 2);
    mapper.assign_scan_order(&window).unwrap();
    (mapper, window)
  }

  #[test]
  fn scan_order_matches_target_slots() {
    let (mapper, window) = mapper_at(GridCoord::new(7, -3), 4);
    for coord in window.positions() {
      assert_eq!(mapper.slot_of(coord), mapper.target_slot(coord));
    }
    assert_eq!(mapper.occupant(SlotIndex(0)), Some(window.min()));
  }

  #[test]
  fn exiting_column_slots_go_to_entering_column() {
    let (mapper, window) = mapper_at(GridCoord::new(0, 0), 3);
    let next = window.recentered(GridCoord::new(1, 0));
    let (leaving, entering) = compute_position_changes(&window, &next);
    let plan = mapper.plan_shift(&leaving, &entering).unwrap();

    for (coord, slot) in plan {
      // Entering x=2 replaces leaving x=-1 in the same row
      assert_eq!(coord.x, 2);
      assert_eq!(mapper.occupant(slot), Some(GridCoord::new(-1, coord.z)));
    }
  }

  #[test]
  fn patch_for_uses_slot_region() {
    let (mapper, _) = mapper_at(GridCoord::new(0, 0), 3);
    let region = mapper.patch_for(GridCoord::new(1, 1)).unwrap();
    assert_eq!((region.origin_x, region.origin_z, region.size), (4, 4, 2));
    assert!(matches!(
      mapper.patch_for(GridCoord::new(9, 9)),
      Err(StreamError::NotResident(_))
    ));
  }

  #[test]
  fn plan_rejects_unknown_leaving_coord() {
    let (mapper, _) = mapper_at(GridCoord::new(0, 0), 3);
    let err = mapper
      .plan_shift(&[GridCoord::new(40, 40)], &[GridCoord::new(2, 0)])
      .unwrap_err();
    assert!(matches!(err, StreamError::NotResident(_)));
  }

  #[test]
  fn plan_rejects_mismatched_slots() {
    let (mapper, _) = mapper_at(GridCoord::new(0, 0), 3);
    // (2, 0) targets the slot of (-1, 0), not of (-1, 1)
    let err = mapper
      .plan_shift(&[GridCoord::new(-1, 1)], &[GridCoord::new(2, 0)])
      .unwrap_err();
    assert!(matches!(err, StreamError::InvariantViolation(_)));
  }

  #[test]
  fn assign_refuses_occupied_slot() {
    let (mut mapper, _) = mapper_at(GridCoord::new(0, 0), 3);
    let err = mapper.assign(GridCoord::new(5, 5), SlotIndex(0)).unwrap_err();
    assert!(matches!(err, StreamError::InvariantViolation(_)));

    let slot = mapper.release(GridCoord::new(-1, -1)).unwrap();
    assert_eq!(slot, SlotIndex(0));
    mapper.assign(GridCoord::new(5, 5), slot).unwrap();
    assert_eq!(mapper.slot_of(GridCoord::new(5, 5)), Some(SlotIndex(0)));
    assert_eq!(mapper.len(), 9);
  }
}
