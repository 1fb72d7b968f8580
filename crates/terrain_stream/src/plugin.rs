//! Bevy integration.
//!
//! Streams the heightmap around the entity tagged [`StreamingCamera`]. The
//! atlas lives in one R32Float image; every frame only the slots that
//! changed are copied into it, and the instance-transform buffer is patched
//! the same way.

use bevy::asset::RenderAssetUsages;
use bevy::image::ImageSampler;
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};

use crate::config::StreamingConfig;
use crate::coords::WorldPos;
use crate::error::{Result, StreamError};
use crate::world::{ChunkManager, UpdateResult};

/// Marker component for the camera that drives streaming.
#[derive(Component)]
pub struct StreamingCamera;

/// The chunk manager, as a resource.
#[derive(Resource, Deref, DerefMut)]
pub struct HeightmapStreaming(pub ChunkManager);

/// Handle to the GPU height atlas.
#[derive(Resource, Clone)]
pub struct HeightmapAtlasImage(pub Handle<Image>);

/// Per-slot `[x, min_y, z, extent_y]` for the instanced terrain mesh.
#[derive(Resource, Clone, Default)]
pub struct InstanceTransforms(pub Vec<[f32; 4]>);

/// Streams heightmap chunks into an atlas texture.
#[derive(Default)]
pub struct HeightmapStreamingPlugin {
  pub config: StreamingConfig,
}

impl HeightmapStreamingPlugin {
  pub fn new(config: StreamingConfig) -> Self {
    Self { config }
  }
}

impl Plugin for HeightmapStreamingPlugin {
  fn build(&self, app: &mut App) {
    let manager = match ChunkManager::from_config(self.config.clone()) {
      Ok(manager) => manager,
      Err(e) => {
        error!("Heightmap streaming disabled: {e}");
        return;
      }
    };

    app
      .insert_resource(InstanceTransforms(vec![[0.0; 4]; self.config.slot_count()]))
      .insert_resource(HeightmapStreaming(manager))
      .add_systems(Startup, setup_atlas_image)
      .add_systems(Update, stream_heightmap);
  }
}

/// Creates an R32Float texture with nearest-neighbor sampling.
pub fn create_height_texture(images: &mut Assets<Image>, side: u32) -> Handle<Image> {
  let size = Extent3d {
    width: side,
    height: side,
    depth_or_array_layers: 1,
  };

  let mut image = Image::new_fill(
    size,
    TextureDimension::D2,
    &0.0f32.to_le_bytes(),
    TextureFormat::R32Float,
    RenderAssetUsages::MAIN_WORLD | RenderAssetUsages::RENDER_WORLD,
  );

  // Heights must never blend across slot borders
  image.sampler = ImageSampler::nearest();

  images.add(image)
}

/// Copies every patch of `update` into the atlas image.
///
/// All patches are checked before any byte is written, so a patch that does
/// not fit leaves the image untouched.
pub fn upload_patches(update: &UpdateResult, side: u32, image: &mut Image) -> Result<()> {
  let Some(ref mut data) = image.data else {
    return Err(StreamError::invariant("atlas image has no CPU-side data"));
  };
  for patch in &update.patches {
    patch.check_fits(data.len(), side)?;
  }
  for patch in &update.patches {
    patch.copy_into(data, side)?;
  }
  Ok(())
}

/// Rewrites the instance transforms of the slots `update` touched.
pub fn apply_bounds(
  update: &UpdateResult,
  chunk_size: u32,
  transforms: &mut InstanceTransforms,
) -> Result<()> {
  if let Some(record) = update.bounds.iter().find(|r| r.slot.0 >= transforms.0.len()) {
    return Err(StreamError::invariant(format!(
      "slot {} outside {} instance transforms",
      record.slot.0,
      transforms.0.len()
    )));
  }
  for record in &update.bounds {
    transforms.0[record.slot.0] = record.instance_transform(chunk_size);
  }
  Ok(())
}

fn setup_atlas_image(
  mut commands: Commands,
  mut images: ResMut<Assets<Image>>,
  streaming: Res<HeightmapStreaming>,
) {
  let handle = create_height_texture(&mut images, streaming.config().atlas_side());
  commands.insert_resource(HeightmapAtlasImage(handle));
}

/// System: advances the window to the camera and uploads changed slots.
fn stream_heightmap(
  camera_query: Query<&GlobalTransform, With<StreamingCamera>>,
  mut streaming: ResMut<HeightmapStreaming>,
  atlas_image: Option<Res<HeightmapAtlasImage>>,
  mut images: ResMut<Assets<Image>>,
  mut transforms: ResMut<InstanceTransforms>,
) {
  let Ok(camera_transform) = camera_query.single() else {
    return;
  };
  let Some(atlas_image) = atlas_image else {
    return;
  };

  let cam = camera_transform.translation();
  let update = match streaming.advance_to_world(WorldPos::new(cam.x, cam.z)) {
    Ok(update) => update,
    Err(e) => {
      error!("Heightmap streaming failed: {e}");
      return;
    }
  };
  if update.is_empty() {
    return;
  }

  let config = streaming.config();
  let Some(image) = images.get_mut(&atlas_image.0) else {
    return;
  };
  if let Err(e) = upload_patches(&update, config.atlas_side(), image) {
    error!("Atlas upload aborted: {e}");
    return;
  }
  if let Err(e) = apply_bounds(&update, config.chunk_size, &mut transforms) {
    error!("Instance transform update aborted: {e}");
  }
}
