//! Terrain Stream - chunked heightmap streaming through a fixed-size atlas.
//!
//! Keeps a square window of terrain chunks resident around a moving viewer.
//! Each chunk's heights live in a permanent slot of one square atlas so a
//! renderer can draw the whole window as a single instanced grid mesh. When
//! the viewer crosses a chunk boundary only the strip of chunks crossed is
//! regenerated, and only their slots are reported for upload.
//!
//! # Example
//! ```
//! use terrain_stream::{ChunkManager, GridCoord, StreamingConfig};
//!
//! let config = StreamingConfig::new(3, 8).with_parallel_generation(false);
//! let mut manager = ChunkManager::from_config(config).unwrap();
//!
//! let full = manager.initialize(GridCoord::new(0, 0)).unwrap();
//! assert_eq!(full.len(), 9);
//!
//! let step = manager.advance(GridCoord::new(1, 0)).unwrap();
//! assert_eq!(step.len(), 3);
//! ```

pub mod atlas;
pub mod bounds;
pub mod config;
pub mod coords;
pub mod diagnostics;
pub mod error;
#[cfg(feature = "bevy")]
pub mod plugin;
pub mod primitives;
pub mod seeding;
pub mod world;

pub use atlas::{AtlasMapper, AtlasPatch, AtlasRegion, HeightAtlas, SlotIndex};
pub use bounds::{Bounds, BoundsRecord, BoundsTracker, compute_bounds};
pub use config::StreamingConfig;
pub use coords::{DEFAULT_CHUNK_SIZE, DEFAULT_VIEW_DIAMETER, GridCoord, LocalPos, WorldPos};
pub use diagnostics::{StreamingStats, TimeSeries};
pub use error::{ConfigError, Result, StreamError};
#[cfg(feature = "bevy")]
pub use plugin::{
  HeightmapAtlasImage, HeightmapStreaming, HeightmapStreamingPlugin, InstanceTransforms,
  StreamingCamera,
};
pub use primitives::{Chunk, Surface};
pub use seeding::{FlatHeightSource, HeightSource, NoiseHeightSource};
pub use world::{
  ChunkManager, ChunkStore, StreamState, UpdateResult, ViewWindow, compute_position_changes,
};
