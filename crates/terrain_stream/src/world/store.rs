//! Chunk store - owns the height data of resident chunks.
//!
//! Residency is decided entirely by the view window; the store never evicts
//! on its own.

use std::collections::HashMap;

use crate::coords::GridCoord;
use crate::error::{Result, StreamError};
use crate::primitives::Chunk;

/// Resident chunks keyed by grid coordinate.
pub struct ChunkStore {
  chunks: HashMap<GridCoord, Chunk>,
}

impl ChunkStore {
  /// Creates an empty store sized for `capacity` chunks.
  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      chunks: HashMap::with_capacity(capacity),
    }
  }

  /// Stores a freshly generated chunk.
  pub fn insert(&mut self, chunk: Chunk) -> Result<()> {
    let coord = chunk.coord();
    if self.chunks.contains_key(&coord) {
      return Err(StreamError::DuplicateCoord(coord));
    }
    self.chunks.insert(coord, chunk);
    Ok(())
  }

  /// Evicts a chunk, handing its data back to the caller for reuse.
  pub fn remove(&mut self, coord: GridCoord) -> Result<Chunk> {
    self
      .chunks
      .remove(&coord)
      .ok_or(StreamError::NotResident(coord))
  }

  /// Returns the chunk at `coord`.
  pub fn get(&self, coord: GridCoord) -> Result<&Chunk> {
    self
      .chunks
      .get(&coord)
      .ok_or(StreamError::NotResident(coord))
  }

  /// Returns true if `coord` is resident.
  #[inline]
  pub fn contains(&self, coord: GridCoord) -> bool {
    self.chunks.contains_key(&coord)
  }

  /// Number of resident chunks.
  #[inline]
  pub fn len(&self) -> usize {
    self.chunks.len()
  }

  /// Returns true if nothing is resident.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.chunks.is_empty()
  }

  /// Iterates resident coordinates in arbitrary order.
  pub fn coords(&self) -> impl Iterator<Item = GridCoord> + '_ {
    self.chunks.keys().copied()
  }

  /// Iterates resident chunks in arbitrary order.
  pub fn iter(&self) -> impl Iterator<Item = &Chunk> + '_ {
    self.chunks.values()
  }
}
