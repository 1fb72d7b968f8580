//! Row-major 2D buffer with rectangle copies.
//!
//! The height atlas is a `Surface<f32>`; chunks move in and out of it as
//! whole rectangles, one row at a time.

/// A `width × height` grid stored as `z * width + x`.
#[derive(Clone, Debug, PartialEq)]
pub struct Surface<T> {
  data: Box<[T]>,
  width: u32,
  height: u32,
}

impl<T: Copy + Default> Surface<T> {
  /// Allocates a surface of default values.
  pub fn new(width: u32, height: u32) -> Self {
    let len = (width as usize) * (height as usize);
    Self {
      data: vec![T::default(); len].into_boxed_slice(),
      width,
      height,
    }
  }

  /// Copies `src` into the rectangle at `(x, z)` that is `rect_width` wide.
  ///
  /// `src` is row-major and must hold whole rows. Returns `false` and writes
  /// nothing if the rectangle does not fit.
  pub fn write_rect(&mut self, x: u32, z: u32, rect_width: u32, src: &[T]) -> bool {
    let Some(rows) = self.rect_rows(x, z, rect_width, src.len()) else {
      return false;
    };
    let stride = self.width as usize;
    let w = rect_width as usize;
    let origin = (z as usize) * stride + x as usize;
    for (row, line) in src.chunks_exact(w).take(rows).enumerate() {
      let start = origin + row * stride;
      self.data[start..start + w].copy_from_slice(line);
    }
    true
  }

  /// Returns a row-major copy of the `rect_width × rect_height` rectangle at
  /// `(x, z)`, or `None` if it does not fit.
  pub fn read_rect(&self, x: u32, z: u32, rect_width: u32, rect_height: u32) -> Option<Vec<T>> {
    let len = (rect_width as usize) * (rect_height as usize);
    let rows = self.rect_rows(x, z, rect_width, len)?;
    let stride = self.width as usize;
    let w = rect_width as usize;
    let origin = (z as usize) * stride + x as usize;

    let mut out = Vec::with_capacity(len);
    for row in 0..rows {
      let start = origin + row * stride;
      out.extend_from_slice(&self.data[start..start + w]);
    }
    Some(out)
  }
}

impl<T> Surface<T> {
  #[inline]
  pub fn width(&self) -> u32 {
    self.width
  }

  #[inline]
  pub fn height(&self) -> u32 {
    self.height
  }

  /// Returns the element at (x, z), or `None` if out of bounds.
  #[inline]
  pub fn get(&self, x: u32, z: u32) -> Option<&T> {
    if x < self.width && z < self.height {
      self.data.get((z as usize) * (self.width as usize) + x as usize)
    } else {
      None
    }
  }

  /// Returns the whole buffer in row-major order.
  #[inline]
  pub fn as_slice(&self) -> &[T] {
    &self.data
  }

  /// Number of rows a `rect_width`-wide rectangle of `len` elements covers,
  /// if it fits at `(x, z)`.
  fn rect_rows(&self, x: u32, z: u32, rect_width: u32, len: usize) -> Option<usize> {
    let w = rect_width as usize;
    if w == 0 || len % w != 0 {
      return None;
    }
    let rows = len / w;
    let fits_x = (x as usize) + w <= self.width as usize;
    let fits_z = (z as usize) + rows <= self.height as usize;
    (fits_x && fits_z).then_some(rows)
  }
}
