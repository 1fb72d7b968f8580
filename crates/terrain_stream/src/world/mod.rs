//! Chunk streaming around a moving viewer.
//!
//! [`ChunkManager`] owns everything resident: the chunk store, the slot
//! mapping, the cached bounds and the CPU atlas mirror. Each call either
//! fully re-syncs the window or fails before touching any of them.
//!
//! ```text
//! viewer -> GridCoord -> advance -> diff windows -> evict -> generate
//!        -> bounds -> reassign slots -> UpdateResult (patches + bounds)
//! ```

mod store;
mod window;

pub use store::ChunkStore;
pub use window::{ViewWindow, compute_position_changes};

use std::sync::Arc;

use log::{debug, error, info};
use rayon::prelude::*;
// WASM compat: std::time::Instant panics on wasm32
use web_time::Instant;

use crate::atlas::{AtlasMapper, AtlasPatch, AtlasRegion, HeightAtlas, SlotIndex};
use crate::bounds::{BoundsRecord, BoundsTracker};
use crate::config::StreamingConfig;
use crate::coords::{GridCoord, WorldPos};
use crate::diagnostics::StreamingStats;
use crate::error::{Result, StreamError};
use crate::primitives::Chunk;
use crate::seeding::{HeightSource, NoiseHeightSource};

/// Lifecycle of a [`ChunkManager`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamState {
  /// No window has been built yet.
  Uninitialized,
  /// Every slot holds a resident chunk.
  Steady,
}

/// Slots that changed in one `initialize`/`advance` call.
///
/// `patches` and `bounds` are parallel: same length, both sorted by slot.
/// The renderer applies them as partial texture uploads and partial
/// instance-transform rewrites.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateResult {
  pub patches: Vec<AtlasPatch>,
  pub bounds: Vec<BoundsRecord>,
}

impl UpdateResult {
  /// Returns an empty result (nothing changed).
  pub fn empty() -> Self {
    Self::default()
  }

  fn with_capacity(capacity: usize) -> Self {
    Self {
      patches: Vec::with_capacity(capacity),
      bounds: Vec::with_capacity(capacity),
    }
  }

  fn push(&mut self, patch: AtlasPatch, record: BoundsRecord) {
    self.patches.push(patch);
    self.bounds.push(record);
  }

  fn sort_by_slot(&mut self) {
    self.patches.sort_unstable_by_key(|p| p.slot);
    self.bounds.sort_unstable_by_key(|r| r.slot);
  }

  /// Returns true if no slot changed.
  pub fn is_empty(&self) -> bool {
    self.patches.is_empty()
  }

  /// Number of slots changed.
  pub fn len(&self) -> usize {
    self.patches.len()
  }

  /// Slots touched, in ascending order.
  pub fn slots(&self) -> impl Iterator<Item = SlotIndex> + '_ {
    self.patches.iter().map(|p| p.slot)
  }

  /// Iterates `(patch, bounds)` pairs per changed slot.
  pub fn iter(&self) -> impl Iterator<Item = (&AtlasPatch, &BoundsRecord)> + '_ {
    self.patches.iter().zip(self.bounds.iter())
  }
}

/// Streams terrain chunks through a fixed-size heightmap atlas.
pub struct ChunkManager {
  config: StreamingConfig,
  /// Height generator shared with rayon workers.
  source: Arc<dyn HeightSource>,
  state: StreamState,
  /// Current window; meaningless while uninitialized.
  window: ViewWindow,
  store: ChunkStore,
  mapper: AtlasMapper,
  bounds: BoundsTracker,
  atlas: HeightAtlas,
  stats: StreamingStats,
}

impl ChunkManager {
  /// Creates a manager with the given height source.
  ///
  /// The atlas is allocated here, once, at its final size.
  pub fn new(config: StreamingConfig, source: Arc<dyn HeightSource>) -> Result<Self> {
    config.validate()?;
    let d = config.view_diameter;
    let c = config.chunk_size;
    let slots = config.slot_count();

    Ok(Self {
      source,
      state: StreamState::Uninitialized,
      window: ViewWindow::new(GridCoord::default(), d),
      store: ChunkStore::with_capacity(slots),
      mapper: AtlasMapper::new(d, c),
      bounds: BoundsTracker::new(slots),
      atlas: HeightAtlas::new(d, c),
      stats: StreamingStats::new(config.stats_window),
      config,
    })
  }

  /// Creates a manager that owns `source`.
  pub fn with_source(config: StreamingConfig, source: impl HeightSource + 'static) -> Result<Self> {
    Self::new(config, Arc::new(source))
  }

  /// Creates a manager using the noise generator described by `config`.
  pub fn from_config(config: StreamingConfig) -> Result<Self> {
    let source = NoiseHeightSource::from_config(&config);
    Self::with_source(config, source)
  }

  // === Streaming ===

  /// Builds the full window around `center` from scratch.
  ///
  /// Every chunk is generated and every slot written, in row-major scan
  /// order, so the result is a full-atlas upload. Calling this again while
  /// steady rebuilds the window at the new center. The new window is built
  /// aside and swapped in only once every step has succeeded; on error the
  /// previous window stays resident.
  pub fn initialize(&mut self, center: GridCoord) -> Result<UpdateResult> {
    let start = Instant::now();
    let diameter = self.config.view_diameter;
    let window = ViewWindow::try_new(center, diameter)
      .inspect_err(|e| error!("Rejected initialize at {center}: {e}"))?;

    let mut mapper = AtlasMapper::new(diameter, self.config.chunk_size);
    let assigned = mapper.assign_scan_order(&window)?;
    let coords: Vec<_> = assigned.iter().map(|&(_, coord)| coord).collect();
    let chunks = self.generate_chunks(&coords, Vec::new());

    let slots = self.config.slot_count();
    let mut store = ChunkStore::with_capacity(slots);
    let mut bounds = BoundsTracker::new(slots);
    let mut result = UpdateResult::with_capacity(assigned.len());
    for (&(slot, coord), chunk) in assigned.iter().zip(chunks) {
      let region = mapper.region(slot);
      self.atlas.check_region(region, chunk.heights().len())?;

      let record = BoundsRecord::new(slot, coord, chunk.bounds());
      bounds.set(record);
      let patch = AtlasPatch {
        slot,
        coord,
        region,
        heights: chunk.heights().to_vec(),
      };
      result.push(patch, record);
      store.insert(chunk)?;
    }

    // Every region was checked above
    for patch in &result.patches {
      self.atlas.write_region(patch.region, &patch.heights)?;
    }
    self.mapper = mapper;
    self.store = store;
    self.bounds = bounds;
    self.window = window;
    self.state = StreamState::Steady;

    let elapsed_ms = start.elapsed().as_secs_f32() * 1000.0;
    self.stats.record_initialize(result.len(), elapsed_ms);
    info!(
      "Initialized terrain window at {center}: {} chunks in {elapsed_ms:.2} ms",
      result.len()
    );
    Ok(result)
  }

  /// Moves the window to `new_center`, streaming chunks in and out.
  ///
  /// Returns only the slots whose occupant changed, so the cost is
  /// proportional to the strip of chunks crossed, not to the window area.
  /// Moving to the current center is a no-op.
  pub fn advance(&mut self, new_center: GridCoord) -> Result<UpdateResult> {
    if self.state == StreamState::Uninitialized {
      return Err(StreamError::NotInitialized);
    }
    if new_center == self.window.center {
      self.stats.record_no_op();
      return Ok(UpdateResult::empty());
    }

    let start = Instant::now();
    let new_window = ViewWindow::try_new(new_center, self.window.diameter)
      .inspect_err(|e| error!("Rejected advance to {new_center}: {e}"))?;
    let (leaving, entering) = compute_position_changes(&self.window, &new_window);

    let plan = self
      .validate_shift(&leaving, &entering)
      .inspect_err(|e| error!("Rejected advance to {new_center}: {e}"))?;

    // Evictions resolve before any insertion reuses their slots
    let mut recycled = Vec::with_capacity(leaving.len());
    for &coord in &leaving {
      let slot = self.mapper.release(coord)?;
      self.bounds.clear(slot);
      recycled.push(self.store.remove(coord)?);
    }

    let coords: Vec<_> = plan.iter().map(|&(coord, _)| coord).collect();
    let chunks = self.generate_chunks(&coords, recycled);

    let mut result = UpdateResult::with_capacity(plan.len());
    for (&(coord, slot), chunk) in plan.iter().zip(chunks) {
      self.mapper.assign(coord, slot)?;
      let (patch, record) = self.commit_chunk(slot, chunk)?;
      result.push(patch, record);
    }
    result.sort_by_slot();

    self.window = new_window;

    let elapsed_ms = start.elapsed().as_secs_f32() * 1000.0;
    self
      .stats
      .record_advance(leaving.len(), result.len(), elapsed_ms);
    debug!(
      "Advanced terrain window to {new_center}: {} evicted, {} generated in {elapsed_ms:.2} ms",
      leaving.len(),
      result.len()
    );
    Ok(result)
  }

  /// Converts a viewer position and advances, initializing on first use.
  ///
  /// Positions that are not finite or fall outside the chunk grid are
  /// rejected without touching the window.
  pub fn advance_to_world(&mut self, pos: WorldPos) -> Result<UpdateResult> {
    let center = pos
      .checked_to_grid(self.config.chunk_size)
      .ok_or(StreamError::PositionOutOfRange(pos))
      .inspect_err(|e| error!("Rejected viewer position: {e}"))?;
    match self.state {
      StreamState::Uninitialized => self.initialize(center),
      StreamState::Steady => self.advance(center),
    }
  }

  /// Returns every resident slot as a patch, e.g. to rebuild a lost GPU
  /// texture.
  pub fn snapshot(&self) -> Result<UpdateResult> {
    let mut result = UpdateResult::with_capacity(self.mapper.len());
    for (slot, coord) in self.mapper.iter() {
      let chunk = self.store.get(coord)?;
      let region = self.mapper.region(slot);
      let record = BoundsRecord::new(slot, coord, chunk.bounds());
      result.push(
        AtlasPatch {
          slot,
          coord,
          region,
          heights: chunk.heights().to_vec(),
        },
        record,
      );
    }
    Ok(result)
  }

  /// Checks that a shift can be applied, without mutating anything.
  fn validate_shift(
    &self,
    leaving: &[GridCoord],
    entering: &[GridCoord],
  ) -> Result<Vec<(GridCoord, SlotIndex)>> {
    if let Some(&coord) = leaving.iter().find(|&&c| !self.store.contains(c)) {
      return Err(StreamError::NotResident(coord));
    }
    if let Some(&coord) = entering.iter().find(|&&c| self.store.contains(c)) {
      return Err(StreamError::DuplicateCoord(coord));
    }
    self.mapper.plan_shift(leaving, entering)
  }

  /// Generates chunks for `coords`, reusing evicted buffers where possible.
  ///
  /// Runs on the rayon pool when enabled; always joins before returning.
  /// Output order matches `coords`.
  fn generate_chunks(&self, coords: &[GridCoord], mut recycled: Vec<Chunk>) -> Vec<Chunk> {
    let size = self.config.chunk_size;
    let source: &dyn HeightSource = self.source.as_ref();

    let jobs: Vec<_> = coords.iter().map(|&coord| (coord, recycled.pop())).collect();
    let build = |(coord, reuse): (GridCoord, Option<Chunk>)| match reuse {
      Some(mut chunk) => {
        chunk.regenerate(coord, source);
        chunk
      }
      None => Chunk::generate(coord, size, source),
    };

    if self.config.parallel_generation {
      jobs.into_par_iter().map(build).collect()
    } else {
      jobs.into_iter().map(build).collect()
    }
  }

  /// Writes a generated chunk into its slot: atlas mirror, bounds cache and
  /// store.
  fn commit_chunk(&mut self, slot: SlotIndex, chunk: Chunk) -> Result<(AtlasPatch, BoundsRecord)> {
    let coord = chunk.coord();
    let region = self.mapper.region(slot);
    self.atlas.write_region(region, chunk.heights())?;

    let record = BoundsRecord::new(slot, coord, chunk.bounds());
    self.bounds.set(record);

    let patch = AtlasPatch {
      slot,
      coord,
      region,
      heights: chunk.heights().to_vec(),
    };
    self.store.insert(chunk)?;
    Ok((patch, record))
  }

  // === Queries ===

  /// Returns the lifecycle state.
  pub fn state(&self) -> StreamState {
    self.state
  }

  /// Returns true once `initialize` has succeeded.
  pub fn is_initialized(&self) -> bool {
    self.state == StreamState::Steady
  }

  /// Returns the current window center, if initialized.
  pub fn center(&self) -> Option<GridCoord> {
    self.is_initialized().then_some(self.window.center)
  }

  /// Returns the current window, if initialized.
  pub fn window(&self) -> Option<ViewWindow> {
    self.is_initialized().then_some(self.window)
  }

  /// Returns the configuration.
  pub fn config(&self) -> &StreamingConfig {
    &self.config
  }

  /// Returns the resident chunk at `coord`.
  pub fn chunk(&self, coord: GridCoord) -> Result<&Chunk> {
    self.store.get(coord)
  }

  /// Returns the slot holding `coord`.
  pub fn slot_of(&self, coord: GridCoord) -> Option<SlotIndex> {
    self.mapper.slot_of(coord)
  }

  /// Returns the atlas rectangle holding `coord`.
  pub fn patch_for(&self, coord: GridCoord) -> Result<AtlasRegion> {
    self.mapper.patch_for(coord)
  }

  /// Returns the slot mapping.
  pub fn mapper(&self) -> &AtlasMapper {
    &self.mapper
  }

  /// Iterates resident coordinates in arbitrary order.
  pub fn resident_coords(&self) -> impl Iterator<Item = GridCoord> + '_ {
    self.store.coords()
  }

  /// Number of resident chunks.
  pub fn resident_count(&self) -> usize {
    self.store.len()
  }

  /// Returns the CPU atlas mirror.
  pub fn atlas(&self) -> &HeightAtlas {
    &self.atlas
  }

  /// Returns the per-slot bounds cache.
  pub fn bounds(&self) -> &BoundsTracker {
    &self.bounds
  }

  /// Builds the full instance-transform buffer, one `[x, min_y, z, extent_y]`
  /// per slot.
  pub fn instance_transforms(&self) -> Vec<[f32; 4]> {
    self.bounds.instance_transforms(self.config.chunk_size)
  }

  /// Returns streaming statistics.
  pub fn stats(&self) -> &StreamingStats {
    &self.stats
  }
}
