use std::collections::VecDeque;

/// Rolling window of the most recent `capacity` samples.
///
/// The sum is kept incrementally; extremes and percentiles are computed on
/// demand since they are only read by diagnostics.
#[derive(Clone, Debug)]
pub struct TimeSeries {
  samples: VecDeque<f32>,
  capacity: usize,
  sum: f64,
}

impl TimeSeries {
  pub fn new(capacity: usize) -> Self {
    let capacity = capacity.max(1);
    Self {
      samples: VecDeque::with_capacity(capacity),
      capacity,
      sum: 0.0,
    }
  }

  /// Appends a sample, dropping the oldest once full.
  pub fn push(&mut self, value: f32) {
    if self.samples.len() == self.capacity
      && let Some(oldest) = self.samples.pop_front()
    {
      self.sum -= oldest as f64;
    }
    self.samples.push_back(value);
    self.sum += value as f64;
  }

  pub fn len(&self) -> usize {
    self.samples.len()
  }

  pub fn is_empty(&self) -> bool {
    self.samples.is_empty()
  }

  /// Most recent sample.
  pub fn last(&self) -> Option<f32> {
    self.samples.back().copied()
  }

  pub fn min(&self) -> Option<f32> {
    self.samples.iter().copied().reduce(f32::min)
  }

  pub fn max(&self) -> Option<f32> {
    self.samples.iter().copied().reduce(f32::max)
  }

  /// Mean of the window, `0.0` when empty.
  pub fn mean(&self) -> f32 {
    if self.samples.is_empty() {
      0.0
    } else {
      (self.sum / self.samples.len() as f64) as f32
    }
  }

  /// Nearest-rank percentile, `p` in `0.0..=1.0`.
  pub fn percentile(&self, p: f32) -> Option<f32> {
    if self.samples.is_empty() {
      return None;
    }
    let mut sorted: Vec<f32> = self.samples.iter().copied().collect();
    sorted.sort_unstable_by(f32::total_cmp);
    let rank = (p.clamp(0.0, 1.0) * (sorted.len() - 1) as f32).round() as usize;
    sorted.get(rank).copied()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn old_samples_leave_the_window() {
    let mut series = TimeSeries::new(3);
    for v in [5.0, 1.0, 3.0, 4.0] {
      series.push(v);
    }
    assert_eq!(series.len(), 3);
    assert_eq!(series.max(), Some(4.0));
    assert_eq!(series.min(), Some(1.0));
    assert_eq!(series.last(), Some(4.0));
    assert!((series.mean() - 8.0 / 3.0).abs() < 1e-5);
  }

  #[test]
  fn percentiles_use_nearest_rank() {
    let mut series = TimeSeries::new(10);
    assert_eq!(series.percentile(0.5), None);
    for v in [9.0, 1.0, 5.0, 3.0, 7.0] {
      series.push(v);
    }
    assert_eq!(series.percentile(0.0), Some(1.0));
    assert_eq!(series.percentile(0.5), Some(5.0));
    assert_eq!(series.percentile(1.0), Some(9.0));
  }
}
