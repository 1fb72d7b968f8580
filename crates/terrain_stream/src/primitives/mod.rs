mod chunk;
mod surface;

pub use chunk::Chunk;
pub use surface::Surface;
