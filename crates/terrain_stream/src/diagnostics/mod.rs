//! Streaming diagnostics.
//!
//! Counters and rolling timings updated by the chunk manager. Cheap enough to
//! keep on unconditionally.

mod time_series;

pub use time_series::TimeSeries;

/// Running statistics for a [`ChunkManager`](crate::ChunkManager).
#[derive(Clone, Debug)]
pub struct StreamingStats {
  /// Wall time of recent non-empty `initialize`/`advance` calls, in
  /// milliseconds.
  pub step_ms: TimeSeries,
  /// Number of `advance` calls that changed the window.
  pub advances: u64,
  /// Number of `advance` calls that were no-ops.
  pub no_op_advances: u64,
  /// Total chunks generated, including initialization.
  pub chunks_generated: u64,
  /// Total chunks evicted.
  pub chunks_evicted: u64,
  /// Slots rewritten by the most recent call.
  pub slots_touched_last: usize,
}

impl StreamingStats {
  pub fn new(window: usize) -> Self {
    Self {
      step_ms: TimeSeries::new(window),
      advances: 0,
      no_op_advances: 0,
      chunks_generated: 0,
      chunks_evicted: 0,
      slots_touched_last: 0,
    }
  }

  pub(crate) fn record_initialize(&mut self, generated: usize, elapsed_ms: f32) {
    self.chunks_generated += generated as u64;
    self.slots_touched_last = generated;
    self.step_ms.push(elapsed_ms);
  }

  pub(crate) fn record_advance(&mut self, evicted: usize, generated: usize, elapsed_ms: f32) {
    self.advances += 1;
    self.chunks_evicted += evicted as u64;
    self.chunks_generated += generated as u64;
    self.slots_touched_last = generated;
    self.step_ms.push(elapsed_ms);
  }

  pub(crate) fn record_no_op(&mut self) {
    self.no_op_advances += 1;
    self.slots_touched_last = 0;
  }
}
