//! Mesh data structures for chunk rendering.
//!
//! A `Mesh` collects the exposed faces of one chunk into a vertex list and an index list
//! ready to be copied into GPU buffers.

use std::collections::HashMap;

use cgmath::Point3;

use super::face::{face_corners, face_indices};
use crate::engine_state::rendering::Vertex;
use crate::engine_state::voxels::block::BlockSide;
use crate::engine_state::voxels::position::BlockPosition;

/// Vertex and index lists of one chunk, with per-mesh vertex deduplication.
///
/// Vertices keep insertion order, so meshing the same blocks twice yields identical
/// buffers. The lookup table only maps a vertex to its index and never affects order.
/// It can be released once a mesh is only kept around for copying, and is rebuilt on the
/// next `add_face`.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    lookup: HashMap<Vertex, u32>,
}

impl Mesh {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one block face.
    ///
    /// # Arguments
    /// * `side` - Which face of the block to emit
    /// * `local` - Chunk-local position of the block
    /// * `texture_layer` - Texture array layer of the block
    pub fn add_face(&mut self, side: BlockSide, local: BlockPosition, texture_layer: u8) {
        let base = Point3::new(local.x as u16, local.y as u16, local.z as u16);
        let mut corner_indices = [0u32; 4];

        for (slot, corner) in corner_indices.iter_mut().zip(face_corners(side)) {
            let position = Point3::new(
                base.x + corner.offset[0],
                base.y + corner.offset[1],
                base.z + corner.offset[2],
            );
            *slot = self.push_vertex(Vertex::new(position, corner.uv_corner, side, texture_layer));
        }

        self.indices
            .extend(face_indices(side).iter().map(|&i| corner_indices[i as usize]));
    }

    /// Frees the deduplication table, keeping vertices and indices.
    pub fn release_lookup(&mut self) {
        self.lookup = HashMap::new();
    }

    fn push_vertex(&mut self, vertex: Vertex) -> u32 {
        if self.lookup.len() != self.vertices.len() {
            self.lookup = self
                .vertices
                .iter()
                .enumerate()
                .map(|(index, &vertex)| (vertex, index as u32))
                .collect();
        }
        if let Some(&index) = self.lookup.get(&vertex) {
            return index;
        }
        let index = self.vertices.len() as u32;
        self.vertices.push(vertex);
        self.lookup.insert(vertex, index);
        index
    }

    /// Emitted vertices in insertion order.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Triangle list indices into `vertices`.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of indices; six per emitted face.
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Number of faces emitted so far.
    pub fn face_count(&self) -> usize {
        self.indices.len() / 6
    }

    /// Whether no face was emitted.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Vertex list as raw bytes for upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index list as raw bytes for upload.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}
