//! GPU capability traits consumed by the world and the texture palette.
//!
//! The voxel core never talks to a graphics API directly. It writes bytes into opaque
//! per-chunk buffers and asks the backend to draw them with a translation. `wgpu_backend`
//! implements these traits on top of wgpu and `headless` records calls for tests and for
//! machines without a GPU.
//!
//! Every method runs on the thread that owns the backend.

use std::any::Any;

use cgmath::Vector3;

use crate::core::EngineError;
use crate::engine_state::camera_state::Camera;
use crate::engine_state::voxels::position::ChunkPosition;

/// A chunk's vertex and index buffers.
pub trait GpuBuffers: Any {
    /// Replaces the buffer contents with freshly meshed bytes.
    ///
    /// `indices` holds 32-bit indices.
    fn update(&mut self, vertices: &[u8], indices: &[u8]);

    /// Used by backends to recover their concrete buffer type.
    fn as_any(&self) -> &dyn Any;
}

/// All block textures with their mip chains, ready to become one layered GPU texture.
///
/// `data` is RGBA8, layer-major: every mip of layer 0, then every mip of layer 1, and so on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureArrayData {
    /// Edge length of mip level 0.
    pub size: u32,
    /// Number of mip levels per layer.
    pub mip_level_count: u32,
    /// Number of layers.
    pub layer_count: u32,
    /// Pixel bytes.
    pub data: Vec<u8>,
}

impl TextureArrayData {
    /// Bytes taken by one layer including its mips.
    pub fn layer_stride(&self) -> usize {
        mip_chain_len(self.size, self.mip_level_count) * 4
    }

    /// Pixel bytes of mip level 0 of `layer`.
    pub fn layer_pixels(&self, layer: u32) -> &[u8] {
        let start = self.layer_stride() * layer as usize;
        let len = (self.size * self.size * 4) as usize;
        &self.data[start..start + len]
    }
}

/// Number of mip levels down to 1x1 for a square texture of edge `size`.
pub fn mip_level_count(size: u32) -> u32 {
    size.max(1).ilog2() + 1
}

/// Pixel count of a full mip chain.
pub fn mip_chain_len(size: u32, levels: u32) -> usize {
    (0..levels)
        .map(|level| {
            let edge = (size >> level).max(1) as usize;
            edge * edge
        })
        .sum()
}

/// The drawing side of a graphics backend.
pub trait RenderBackend {
    /// Creates empty buffers for the chunk at `position`.
    fn create_chunk_buffers(&mut self, position: ChunkPosition) -> Box<dyn GpuBuffers>;

    /// Uploads the block texture array, replacing any earlier one.
    fn upload_texture_array(&mut self, texture: &TextureArrayData) -> Result<(), EngineError>;

    /// Draws `index_count` indices from `buffers`, offset by `translation`.
    fn draw_chunk(&mut self, buffers: &dyn GpuBuffers, translation: Vector3<f32>, index_count: u32);

    /// Sets the viewpoint the next frame is rendered from.
    fn set_camera(&mut self, _camera: &Camera) {}

    /// Called before the first draw of a frame.
    fn begin_frame(&mut self) {}

    /// Called after the last draw of a frame.
    fn end_frame(&mut self) -> Result<(), EngineError> {
        Ok(())
    }
}
