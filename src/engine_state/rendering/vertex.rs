//! Vertex data structures and layouts for voxel rendering.
//!
//! This module defines the packed vertex format used for chunk meshes and provides
//! the accessors needed to recover each attribute on the CPU side.

use cgmath::Point3;

use crate::engine_state::voxels::block::BlockSide;

/// Bits of `packed` holding the quad corner (`u + 2 * v`).
const UV_CORNER_MASK: u16 = 0b11;
/// Offset of the block side inside `packed`.
const SIDE_SHIFT: u16 = 2;
const SIDE_MASK: u16 = 0b111;
/// Offset of the texture layer inside `packed`.
const LAYER_SHIFT: u16 = 5;

/// A vertex of a chunk mesh.
///
/// Positions are block corners in chunk-local space, so every component lies in
/// `[0, CHUNK_SIZE]`. The remaining attributes share one 16-bit field:
///
/// ```text
/// bit 15         5 4   2 1  0
///     | layer    | side | uv |
/// ```
///
/// The shader rebuilds texture coordinates from the uv corner and the face normal from
/// the side. Side and uv corner together keep the corners of different faces distinct,
/// so a vertex is only shared by the two triangles of one face.
///
/// # Memory Layout
/// - Position: 3x u16 (6 bytes)
/// - Packed layer, side, uv corner: u16 (2 bytes)
///
/// Total size: 8 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    position: [u16; 3],
    packed: u16,
}

impl Vertex {
    /// Creates a new vertex.
    ///
    /// # Arguments
    /// * `position` - Block corner in chunk-local space
    /// * `uv_corner` - Quad corner, `u + 2 * v` with `u` and `v` in `{0, 1}`
    /// * `side` - Face the vertex belongs to
    /// * `texture_layer` - Layer of the block texture array
    pub fn new(position: Point3<u16>, uv_corner: u8, side: BlockSide, texture_layer: u8) -> Self {
        let packed = (u16::from(texture_layer) << LAYER_SHIFT)
            | ((side as u16 & SIDE_MASK) << SIDE_SHIFT)
            | (u16::from(uv_corner) & UV_CORNER_MASK);
        Vertex {
            position: [position.x, position.y, position.z],
            packed,
        }
    }

    /// Chunk-local corner position.
    pub fn position(&self) -> Point3<u16> {
        Point3::new(self.position[0], self.position[1], self.position[2])
    }

    /// Quad corner index, `u + 2 * v`.
    pub fn uv_corner(&self) -> u8 {
        (self.packed & UV_CORNER_MASK) as u8
    }

    /// Texture array layer.
    pub fn texture_layer(&self) -> u8 {
        (self.packed >> LAYER_SHIFT) as u8
    }

    /// Face the vertex belongs to.
    pub fn side(&self) -> Option<BlockSide> {
        BlockSide::from_index(((self.packed >> SIDE_SHIFT) & SIDE_MASK) as u8)
    }

    /// Returns the vertex buffer layout description for the shader pipeline.
    ///
    /// # Shader Attributes
    /// - `location = 0`: position and packed attributes (vec4<u32>, read from four u16)
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Uint16x4,
            }],
        }
    }
}
