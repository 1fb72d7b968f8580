//! Heightmap atlas addressing.
//!
//! The atlas is one square buffer of `diameter * chunk_size` pixels per side,
//! split into `diameter²` fixed slots. Slots are permanent pixel rectangles;
//! which chunk occupies a slot changes as the window scrolls.
//!
//! - [`AtlasMapper`]: grid coordinate ↔ slot bijection
//! - [`HeightAtlas`]: CPU mirror of the GPU height texture

mod buffer;
mod mapper;

pub use buffer::HeightAtlas;
pub use mapper::AtlasMapper;

use crate::coords::GridCoord;
use crate::error::{Result, StreamError};

/// Bytes per R32Float texel.
const TEXEL: usize = std::mem::size_of::<f32>();

/// Index of a slot in the atlas, `0..diameter²`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotIndex(pub usize);

/// Fixed pixel rectangle of one slot inside the atlas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AtlasRegion {
  pub origin_x: u32,
  pub origin_z: u32,
  /// Side length in pixels (the chunk size).
  pub size: u32,
}

impl AtlasRegion {
  /// Returns the rectangle of `slot` in an atlas `diameter` slots wide.
  pub fn for_slot(slot: SlotIndex, diameter: u32, chunk_size: u32) -> Self {
    let d = diameter as usize;
    Self {
      origin_x: (slot.0 % d) as u32 * chunk_size,
      origin_z: (slot.0 / d) as u32 * chunk_size,
      size: chunk_size,
    }
  }

  /// Number of texels covered.
  pub fn texel_count(&self) -> usize {
    (self.size as usize) * (self.size as usize)
  }
}

/// A chunk's heights and the atlas rectangle they belong in.
///
/// The renderer copies `heights` (row-major, `size` texels per row) into its
/// GPU texture at `region`.
#[derive(Clone, Debug, PartialEq)]
pub struct AtlasPatch {
  pub slot: SlotIndex,
  pub coord: GridCoord,
  pub region: AtlasRegion,
  pub heights: Vec<f32>,
}

impl AtlasPatch {
  /// Returns the heights as little-endian bytes for an R32Float upload.
  pub fn to_le_bytes(&self) -> Vec<u8> {
    self.heights.iter().flat_map(|h| h.to_le_bytes()).collect()
  }

  /// Checks that the patch fits a full R32Float atlas buffer of
  /// `atlas_len` bytes and `atlas_side` texels per side.
  pub fn check_fits(&self, atlas_len: usize, atlas_side: u32) -> Result<()> {
    let side = atlas_side as usize;
    let size = self.region.size as usize;
    let (ox, oz) = (self.region.origin_x as usize, self.region.origin_z as usize);

    if size == 0
      || self.heights.len() != self.region.texel_count()
      || ox + size > side
      || oz + size > side
      || atlas_len != side * side * TEXEL
    {
      return Err(StreamError::invariant(format!(
        "patch for slot {} does not fit a {atlas_side}² atlas",
        self.slot.0
      )));
    }
    Ok(())
  }

  /// Copies the patch row by row into a full R32Float atlas byte buffer.
  pub fn copy_into(&self, atlas_bytes: &mut [u8], atlas_side: u32) -> Result<()> {
    self.check_fits(atlas_bytes.len(), atlas_side)?;
    let side = atlas_side as usize;
    let size = self.region.size as usize;
    let (ox, oz) = (self.region.origin_x as usize, self.region.origin_z as usize);

    for (row, src) in self.heights.chunks_exact(size).enumerate() {
      let start = ((oz + row) * side + ox) * TEXEL;
      let dst = &mut atlas_bytes[start..start + size * TEXEL];
      for (out, h) in dst.chunks_exact_mut(TEXEL).zip(src) {
        out.copy_from_slice(&h.to_le_bytes());
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn slot_regions_follow_row_major_layout() {
    assert_eq!(
      AtlasRegion::for_slot(SlotIndex(0), 3, 2),
      AtlasRegion {
        origin_x: 0,
        origin_z: 0,
        size: 2
      }
    );
    assert_eq!(
      AtlasRegion::for_slot(SlotIndex(5), 3, 2),
      AtlasRegion {
        origin_x: 4,
        origin_z: 2,
        size: 2
      }
    );
    assert_eq!(AtlasRegion::for_slot(SlotIndex(8), 3, 2).texel_count(), 4);
  }

  #[test]
  fn patch_bytes_are_little_endian_f32() {
    let patch = AtlasPatch {
      slot: SlotIndex(0),
      coord: GridCoord::new(0, 0),
      region: AtlasRegion::for_slot(SlotIndex(0), 1, 1),
      heights: vec![1.0],
    };
    assert_eq!(patch.to_le_bytes(), 1.0f32.to_le_bytes().to_vec());
  }

  #[test]
  fn copy_into_lands_in_slot_rows() {
    let patch = AtlasPatch {
      slot: SlotIndex(3),
      coord: GridCoord::new(0, 0),
      region: AtlasRegion::for_slot(SlotIndex(3), 2, 2),
      heights: vec![1.0, 2.0, 3.0, 4.0],
    };
    let mut bytes = vec![0u8; 4 * 4 * 4];
    patch.copy_into(&mut bytes, 4).unwrap();

    let texel = |x: usize, z: usize| {
      let i = (z * 4 + x) * 4;
      f32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]])
    };
    assert_eq!(texel(2, 2), 1.0);
    assert_eq!(texel(3, 2), 2.0);
    assert_eq!(texel(2, 3), 3.0);
    assert_eq!(texel(3, 3), 4.0);
    assert_eq!(texel(1, 2), 0.0);
  }

  #[test]
  fn copy_into_rejects_wrong_atlas() {
    let patch = AtlasPatch {
      slot: SlotIndex(3),
      coord: GridCoord::new(0, 0),
      region: AtlasRegion::for_slot(SlotIndex(3), 2, 2),
      heights: vec![0.0; 4],
    };
    let mut bytes = vec![0u8; 2 * 2 * 4];
    assert!(patch.copy_into(&mut bytes, 2).is_err());
  }
}
