//! Coordinate types and spatial constants.
//!
//! Defines the coordinate system for streamed terrain:
//! - [`WorldPos`]: Viewer position in world units (one unit per heightmap
//!   pixel)
//! - [`GridCoord`]: Chunk grid position (i32, unbounded lattice)
//! - [`LocalPos`]: Pixel position within a chunk

/// Default side length of the resident window, in chunks.
pub const DEFAULT_VIEW_DIAMETER: u32 = 10;

/// Default side length of a chunk, in heightmap pixels.
pub const DEFAULT_CHUNK_SIZE: u32 = 32;

/// Position in the chunk grid.
///
/// Each chunk spans `chunk_size` pixels along x and z.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCoord {
  pub x: i32,
  pub z: i32,
}

impl GridCoord {
  /// Creates a new grid coordinate.
  pub const fn new(x: i32, z: i32) -> Self {
    Self { x, z }
  }

  /// Returns this coordinate translated by the given offset, saturating at
  /// the edge of the i32 lattice.
  pub const fn offset(self, dx: i32, dz: i32) -> Self {
    Self {
      x: self.x.saturating_add(dx),
      z: self.z.saturating_add(dz),
    }
  }

  /// Returns this coordinate translated by the given offset, or `None` if it
  /// leaves the i32 lattice.
  pub const fn checked_offset(self, dx: i32, dz: i32) -> Option<Self> {
    match (self.x.checked_add(dx), self.z.checked_add(dz)) {
      (Some(x), Some(z)) => Some(Self { x, z }),
      _ => None,
    }
  }

  /// Returns the world-space origin (min corner) of this chunk.
  pub fn to_world(self, chunk_size: u32) -> WorldPos {
    let size = chunk_size as f32;
    WorldPos::new(self.x as f32 * size, self.z as f32 * size)
  }

  /// Returns the absolute pixel coordinate of a local sample in this chunk.
  ///
  /// Widened to i64 so far-away chunks do not overflow.
  #[inline]
  pub fn world_pixel(self, chunk_size: u32, local_x: u32, local_z: u32) -> (i64, i64) {
    let size = chunk_size as i64;
    (
      self.x as i64 * size + local_x as i64,
      self.z as i64 * size + local_z as i64,
    )
  }
}

impl std::fmt::Display for GridCoord {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "({}, {})", self.x, self.z)
  }
}

/// Viewer position in world units on the horizontal plane.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WorldPos {
  pub x: f32,
  pub z: f32,
}

impl WorldPos {
  /// Creates a new world position.
  pub const fn new(x: f32, z: f32) -> Self {
    Self { x, z }
  }

  /// Converts to the grid coordinate of the chunk containing this position.
  ///
  /// Uses floor division, so `-0.5` maps to chunk `-1` rather than `0`.
  /// Positions beyond the i32 grid saturate; NaN maps to 0. Use
  /// [`checked_to_grid`](Self::checked_to_grid) to reject those instead.
  pub fn to_grid(self, chunk_size: u32) -> GridCoord {
    let size = chunk_size as f32;
    GridCoord::new(
      (self.x / size).floor() as i32,
      (self.z / size).floor() as i32,
    )
  }

  /// Like [`to_grid`](Self::to_grid), but `None` for non-finite positions or
  /// chunks outside the i32 grid.
  pub fn checked_to_grid(self, chunk_size: u32) -> Option<GridCoord> {
    let size = chunk_size as f64;
    let axis = |v: f32| {
      let cell = (v as f64 / size).floor();
      (cell.is_finite() && cell >= i32::MIN as f64 && cell <= i32::MAX as f64)
        .then_some(cell as i32)
    };
    Some(GridCoord::new(axis(self.x)?, axis(self.z)?))
  }
}

/// Position within a chunk (0 to chunk_size-1 on each axis).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocalPos {
  pub x: u32,
  pub z: u32,
}

impl LocalPos {
  /// Creates a new local position.
  pub const fn new(x: u32, z: u32) -> Self {
    Self { x, z }
  }

  /// Row-major index into a chunk's height array.
  #[inline]
  pub const fn index(self, chunk_size: u32) -> usize {
    (self.z as usize) * (chunk_size as usize) + (self.x as usize)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn world_to_grid_floors_negative_positions() {
    assert_eq!(WorldPos::new(0.0, 0.0).to_grid(32), GridCoord::new(0, 0));
    assert_eq!(WorldPos::new(31.9, 32.0).to_grid(32), GridCoord::new(0, 1));
    assert_eq!(WorldPos::new(-0.5, -32.0).to_grid(32), GridCoord::new(-1, -1));
    assert_eq!(WorldPos::new(-32.5, 5.0).to_grid(32), GridCoord::new(-2, 0));
  }

  #[test]
  fn far_positions_leave_the_grid() {
    assert_eq!(WorldPos::new(-0.5, 64.0).checked_to_grid(32), Some(GridCoord::new(-1, 2)));
    assert_eq!(WorldPos::new(1.0e12, 0.0).checked_to_grid(32), None);
    assert_eq!(WorldPos::new(0.0, f32::NAN).checked_to_grid(32), None);
    assert_eq!(WorldPos::new(f32::NEG_INFINITY, 0.0).checked_to_grid(32), None);
  }

  #[test]
  fn offset_at_lattice_edge_does_not_wrap() {
    let edge = GridCoord::new(i32::MAX, i32::MIN);
    assert_eq!(edge.offset(1, -1), edge);
    assert_eq!(edge.checked_offset(1, 0), None);
    assert_eq!(edge.checked_offset(-1, 1), Some(GridCoord::new(i32::MAX - 1, i32::MIN + 1)));
  }

  #[test]
  fn world_pixel_is_seamless_across_chunks() {
    let a = GridCoord::new(-1, 0).world_pixel(4, 3, 0);
    let b = GridCoord::new(0, 0).world_pixel(4, 0, 0);
    assert_eq!(a.0 + 1, b.0);
  }

  #[test]
  fn local_index_is_row_major() {
    assert_eq!(LocalPos::new(1, 0).index(4), 1);
    assert_eq!(LocalPos::new(0, 1).index(4), 4);
    assert_eq!(LocalPos::new(3, 3).index(4), 15);
  }
}
