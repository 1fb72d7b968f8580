//! CPU mirror of the GPU height texture.

use super::AtlasRegion;
use crate::error::{Result, StreamError};
use crate::primitives::Surface;

/// Fixed-size single-channel float atlas.
///
/// Allocated once at `(diameter * chunk_size)²` texels and never resized.
pub struct HeightAtlas {
  surface: Surface<f32>,
}

impl HeightAtlas {
  /// Allocates a zeroed atlas.
  pub fn new(diameter: u32, chunk_size: u32) -> Self {
    let side = diameter * chunk_size;
    Self {
      surface: Surface::new(side, side),
    }
  }

  /// Side length in texels.
  #[inline]
  pub fn side(&self) -> u32 {
    self.surface.width()
  }

  /// Checks that `len` row-major texels exactly fill `region` and that the
  /// region lies inside the atlas.
  pub fn check_region(&self, region: AtlasRegion, len: usize) -> Result<()> {
    if len != region.texel_count() {
      return Err(StreamError::invariant(format!(
        "patch has {len} texels, region needs {}",
        region.texel_count()
      )));
    }
    let side = self.side() as u64;
    let size = region.size as u64;
    if region.origin_x as u64 + size > side || region.origin_z as u64 + size > side {
      return Err(self.outside(region));
    }
    Ok(())
  }

  /// Copies row-major chunk heights into `region`.
  pub fn write_region(&mut self, region: AtlasRegion, heights: &[f32]) -> Result<()> {
    self.check_region(region, heights.len())?;
    if !self
      .surface
      .write_rect(region.origin_x, region.origin_z, region.size, heights)
    {
      return Err(self.outside(region));
    }
    Ok(())
  }

  /// Returns a row-major copy of `region`.
  pub fn read_region(&self, region: AtlasRegion) -> Result<Vec<f32>> {
    self
      .surface
      .read_rect(region.origin_x, region.origin_z, region.size, region.size)
      .ok_or_else(|| self.outside(region))
  }

  /// Returns the texel at (x, z).
  pub fn texel(&self, x: u32, z: u32) -> Option<f32> {
    self.surface.get(x, z).copied()
  }

  /// Returns all texels in row-major order.
  pub fn as_slice(&self) -> &[f32] {
    self.surface.as_slice()
  }

  /// Returns all texels as little-endian bytes for a full R32Float upload.
  pub fn to_le_bytes(&self) -> Vec<u8> {
    self.as_slice().iter().flat_map(|h| h.to_le_bytes()).collect()
  }

  fn outside(&self, region: AtlasRegion) -> StreamError {
    StreamError::invariant(format!(
      "region {region:?} exceeds atlas side {}",
      self.side()
    ))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::atlas::SlotIndex;

  #[test]
  fn write_then_read_region() {
    let mut atlas = HeightAtlas::new(3, 2);
    assert_eq!(atlas.side(), 6);
    let region = AtlasRegion::for_slot(SlotIndex(4), 3, 2);
    atlas.write_region(region, &[1.0, 2.0, 3.0, 4.0]).unwrap();

    assert_eq!(atlas.read_region(region).unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
    assert_eq!(atlas.texel(2, 2), Some(1.0));
    assert_eq!(atlas.texel(3, 3), Some(4.0));
    // Neighbouring slot untouched
    assert_eq!(atlas.texel(4, 2), Some(0.0));
  }

  #[test]
  fn mismatched_patch_is_rejected_without_writing() {
    let mut atlas = HeightAtlas::new(2, 2);
    let region = AtlasRegion::for_slot(SlotIndex(0), 2, 2);
    assert!(atlas.write_region(region, &[1.0; 3]).is_err());
    assert!(atlas.as_slice().iter().all(|&h| h == 0.0));
  }

  #[test]
  fn out_of_atlas_region_is_rejected() {
    let atlas = HeightAtlas::new(2, 2);
    let region = AtlasRegion {
      origin_x: 3,
      origin_z: 0,
      size: 2,
    };
    assert!(matches!(
      atlas.read_region(region),
      Err(StreamError::InvariantViolation(_))
    ));
    assert!(atlas.check_region(region, 4).is_err());
    assert!(atlas.check_region(AtlasRegion::for_slot(SlotIndex(3), 2, 2), 4).is_ok());
  }
}
