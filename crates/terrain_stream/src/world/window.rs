//! View window - the square of grid coordinates kept resident.

use crate::coords::GridCoord;
use crate::error::{Result, StreamError};

/// Square window of `diameter × diameter` coordinates around `center`.
///
/// Spans `center - diameter/2 ..< center - diameter/2 + diameter` on each
/// axis. With diameter 10 around the origin that is `-5..5`; with diameter 3
/// it is `-1..=1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewWindow {
  pub center: GridCoord,
  pub diameter: u32,
}

impl ViewWindow {
  /// Creates a window.
  ///
  /// Does not check that the window fits the i32 grid; see
  /// [`try_new`](Self::try_new).
  pub const fn new(center: GridCoord, diameter: u32) -> Self {
    Self { center, diameter }
  }

  /// Creates a window, rejecting centers whose window would leave the i32
  /// chunk grid.
  pub fn try_new(center: GridCoord, diameter: u32) -> Result<Self> {
    let window = Self::new(center, diameter);
    if window.fits_grid() {
      Ok(window)
    } else {
      Err(StreamError::WindowOutOfRange(center))
    }
  }

  /// Returns true if every position and the exclusive upper bound are
  /// representable as i32.
  pub fn fits_grid(&self) -> bool {
    let half = (self.diameter / 2) as i64;
    let d = self.diameter as i64;
    let fits = |c: i32| {
      let min = c as i64 - half;
      min >= i32::MIN as i64 && min + d <= i32::MAX as i64
    };
    fits(self.center.x) && fits(self.center.z)
  }

  /// Lowest coordinate on both axes (the window's first scan position).
  pub fn min(&self) -> GridCoord {
    let half = (self.diameter / 2) as i32;
    self.center.offset(-half, -half)
  }

  /// One past the highest coordinate on both axes.
  pub fn max_exclusive(&self) -> GridCoord {
    let d = self.diameter as i32;
    self.min().offset(d, d)
  }

  /// Returns true if `coord` lies inside the window.
  pub fn contains(&self, coord: GridCoord) -> bool {
    let min = self.min();
    let max = self.max_exclusive();
    coord.x >= min.x && coord.x < max.x && coord.z >= min.z && coord.z < max.z
  }

  /// Number of coordinates in the window.
  pub fn len(&self) -> usize {
    (self.diameter as usize) * (self.diameter as usize)
  }

  /// Returns true for a zero-diameter window.
  pub fn is_empty(&self) -> bool {
    self.diameter == 0
  }

  /// Iterates the window in row-major scan order (z outer, x inner).
  pub fn positions(&self) -> impl Iterator<Item = GridCoord> {
    let min = self.min();
    let max = self.max_exclusive();
    (min.z..max.z).flat_map(move |z| (min.x..max.x).map(move |x| GridCoord::new(x, z)))
  }

  /// Returns the same window moved to a new center.
  pub fn recentered(&self, center: GridCoord) -> Self {
    Self::new(center, self.diameter)
  }
}

/// Computes which coordinates leave and enter when moving between windows.
///
/// Returns `(leaving, entering)`, each in row-major scan order of its own
/// window so results are deterministic. Work is proportional to the rows
/// scanned plus the strips returned, not to the window area.
pub fn compute_position_changes(
  old: &ViewWindow,
  new: &ViewWindow,
) -> (Vec<GridCoord>, Vec<GridCoord>) {
  (strip_difference(old, new), strip_difference(new, old))
}

/// Positions of `from` not covered by `other`, in scan order of `from`.
fn strip_difference(from: &ViewWindow, other: &ViewWindow) -> Vec<GridCoord> {
  let (fmin, fmax) = (from.min(), from.max_exclusive());
  let (omin, omax) = (other.min(), other.max_exclusive());
  let row = move |z: i32, x0: i32, x1: i32| (x0..x1).map(move |x| GridCoord::new(x, z));

  let mut out = Vec::new();
  for z in fmin.z..fmax.z {
    if z < omin.z || z >= omax.z {
      out.extend(row(z, fmin.x, fmax.x));
    } else {
      // Left and right remainders of a row that overlaps `other`
      out.extend(row(z, fmin.x, fmax.x.min(omin.x)));
      out.extend(row(z, fmin.x.max(omax.x), fmax.x));
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn odd_window_is_centered() {
    let window = ViewWindow::new(GridCoord::new(0, 0), 3);
    let positions: Vec<_> = window.positions().collect();
    assert_eq!(positions.len(), 9);
    assert_eq!(positions[0], GridCoord::new(-1, -1));
    assert_eq!(positions[1], GridCoord::new(0, -1));
    assert_eq!(positions[8], GridCoord::new(1, 1));
  }

  #[test]
  fn even_window_spans_half_open_range() {
    let window = ViewWindow::new(GridCoord::new(0, 0), 10);
    assert_eq!(window.min(), GridCoord::new(-5, -5));
    assert_eq!(window.max_exclusive(), GridCoord::new(5, 5));
    assert!(window.contains(GridCoord::new(4, -5)));
    assert!(!window.contains(GridCoord::new(5, 0)));
  }

  #[test]
  fn unit_step_swaps_one_column() {
    let old = ViewWindow::new(GridCoord::new(0, 0), 3);
    let new = old.recentered(GridCoord::new(1, 0));
    let (leaving, entering) = compute_position_changes(&old, &new);
    assert_eq!(
      leaving,
      vec![GridCoord::new(-1, -1), GridCoord::new(-1, 0), GridCoord::new(-1, 1)]
    );
    assert_eq!(
      entering,
      vec![GridCoord::new(2, -1), GridCoord::new(2, 0), GridCoord::new(2, 1)]
    );
  }

  #[test]
  fn far_jump_replaces_everything() {
    let old = ViewWindow::new(GridCoord::new(0, 0), 4);
    let new = old.recentered(GridCoord::new(100, -40));
    let (leaving, entering) = compute_position_changes(&old, &new);
    assert_eq!(leaving.len(), 16);
    assert_eq!(entering.len(), 16);
  }

  #[test]
  fn strips_match_position_filter() {
    let old = ViewWindow::new(GridCoord::new(0, 0), 5);
    for (dx, dz) in [(1, 0), (0, -1), (2, 3), (-4, 1), (-3, -3), (5, 0), (9, -12)] {
      let new = old.recentered(GridCoord::new(dx, dz));
      let (leaving, entering) = compute_position_changes(&old, &new);

      let expected_leaving: Vec<_> = old.positions().filter(|c| !new.contains(*c)).collect();
      let expected_entering: Vec<_> = new.positions().filter(|c| !old.contains(*c)).collect();
      assert_eq!(leaving, expected_leaving, "leaving for ({dx}, {dz})");
      assert_eq!(entering, expected_entering, "entering for ({dx}, {dz})");
    }
  }

  #[test]
  fn window_must_fit_the_grid() {
    let edge = GridCoord::new(i32::MAX - 2, i32::MIN + 1);
    let window = ViewWindow::try_new(edge, 3).unwrap();
    assert_eq!(window.min(), GridCoord::new(i32::MAX - 3, i32::MIN));
    assert_eq!(window.max_exclusive(), GridCoord::new(i32::MAX, i32::MIN + 3));
    assert_eq!(window.positions().count(), 9);

    for center in [
      GridCoord::new(i32::MAX - 1, 0),
      GridCoord::new(0, i32::MIN),
      GridCoord::new(i32::MAX, i32::MAX),
    ] {
      assert!(matches!(
        ViewWindow::try_new(center, 3),
        Err(StreamError::WindowOutOfRange(c)) if c == center
      ));
    }
  }

  #[test]
  fn diagonal_step_touches_row_and_column() {
    let old = ViewWindow::new(GridCoord::new(0, 0), 4);
    let new = old.recentered(GridCoord::new(1, 1));
    let (leaving, entering) = compute_position_changes(&old, &new);
    assert_eq!(leaving.len(), 2 * 4 - 1);
    assert_eq!(entering.len(), 2 * 4 - 1);
  }
}
