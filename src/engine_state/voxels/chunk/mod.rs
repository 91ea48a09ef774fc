//! # Chunk Module
//!
//! This module provides the `Chunk` struct: the unit of storage, meshing and streaming.
//!
//! ## State Machine
//!
//! A chunk carries two independent status fields.
//!
//! Mesh dirtiness:
//!
//! ```text
//! Okay --set_block--> Dirty --full mesh--> Refresh --upload--> Okay
//! ```
//!
//! Neighbour status is `NeighbourCreate` whenever a chunk appeared next to this one (or a
//! border block next to it changed) since its last full mesh, meaning its border faces may
//! be stale. It is cleared whenever a full mesh is produced.
//!
//! The transition helpers (`mark_dirty`, `mark_refresh`, `mark_done`) are the only way to
//! change dirtiness.

use log::debug;

use super::block::BlockType;
use super::position::{chunk_translation, BlockPosition, ChunkPosition};
use crate::engine_state::rendering::backend::{GpuBuffers, RenderBackend};
use crate::engine_state::rendering::meshing::Mesh;

pub mod chunk_generation;
pub mod storage;

use storage::BlockStorage;

/// Mesh freshness of a chunk.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Dirtiness {
    /// The uploaded mesh matches the blocks.
    Okay,
    /// Blocks changed since the last full mesh.
    Dirty,
    /// A full mesh is waiting to be uploaded.
    Refresh,
}

/// Whether the chunk's border faces may be stale.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NeighbourStatus {
    /// Border faces are up to date.
    None,
    /// An adjacent chunk was created or edited at the shared border.
    NeighbourCreate,
}

/// A `CHUNK_SIZE`³ cube of blocks plus its mesh and GPU state.
pub struct Chunk {
    position: ChunkPosition,
    storage: BlockStorage,
    /// Faces decidable without neighbours, kept so border remeshes skip the interior pass.
    interior_mesh: Option<Mesh>,
    /// Complete mesh awaiting upload.
    mesh: Option<Mesh>,
    buffers: Option<Box<dyn GpuBuffers>>,
    index_count: u32,
    dirtiness: Dirtiness,
    neighbour_status: NeighbourStatus,
}

impl std::fmt::Debug for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunk")
            .field("position", &self.position)
            .field("storage", &self.storage)
            .field("index_count", &self.index_count)
            .field("dirtiness", &self.dirtiness)
            .field("neighbour_status", &self.neighbour_status)
            .finish()
    }
}

impl Chunk {
    /// Creates a chunk from generated blocks. New chunks start out dirty.
    ///
    /// # Arguments
    /// * `position` - The chunk coordinate
    /// * `storage` - The chunk's blocks
    pub fn new(position: ChunkPosition, storage: BlockStorage) -> Self {
        Chunk {
            position,
            storage,
            interior_mesh: None,
            mesh: None,
            buffers: None,
            index_count: 0,
            dirtiness: Dirtiness::Dirty,
            neighbour_status: NeighbourStatus::None,
        }
    }

    /// Creates an all-air chunk.
    pub fn empty(position: ChunkPosition) -> Self {
        Self::new(position, BlockStorage::new())
    }

    /// The chunk coordinate.
    pub fn position(&self) -> ChunkPosition {
        self.position
    }

    /// The chunk's blocks.
    pub fn storage(&self) -> &BlockStorage {
        &self.storage
    }

    /// Block at a local position.
    pub fn get_block(&self, local: BlockPosition) -> BlockType {
        self.storage.get(local)
    }

    /// Writes a block at a local position and marks the chunk dirty.
    pub fn set_block(&mut self, local: BlockPosition, block: BlockType) {
        self.storage.set(local, block);
        self.mark_dirty();
    }

    /// Current mesh dirtiness.
    pub fn dirtiness(&self) -> Dirtiness {
        self.dirtiness
    }

    /// Current neighbour status.
    pub fn neighbour_status(&self) -> NeighbourStatus {
        self.neighbour_status
    }

    /// Number of indices in the uploaded mesh.
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// The chunk's GPU buffers, once created.
    pub fn buffers(&self) -> Option<&dyn GpuBuffers> {
        self.buffers.as_deref()
    }

    /// Cached interior faces, if computed since the last edit.
    pub fn interior_mesh(&self) -> Option<&Mesh> {
        self.interior_mesh.as_ref()
    }

    pub(crate) fn set_interior_mesh(&mut self, mut mesh: Mesh) {
        mesh.release_lookup();
        self.interior_mesh = Some(mesh);
    }

    /// Blocks changed: drops cached and pending meshes.
    pub fn mark_dirty(&mut self) {
        self.dirtiness = Dirtiness::Dirty;
        self.interior_mesh = None;
        self.mesh = None;
    }

    /// A full mesh was produced and awaits upload.
    pub fn mark_refresh(&mut self, mesh: Mesh) {
        self.mesh = Some(mesh);
        self.dirtiness = Dirtiness::Refresh;
        self.neighbour_status = NeighbourStatus::None;
    }

    /// The pending mesh reached the GPU.
    pub fn mark_done(&mut self) {
        self.mesh = None;
        self.dirtiness = Dirtiness::Okay;
    }

    /// A neighbouring chunk appeared or changed at the shared border.
    pub fn mark_neighbour_created(&mut self) {
        self.neighbour_status = NeighbourStatus::NeighbourCreate;
    }

    /// Uploads the pending mesh, creating the buffers on first use.
    ///
    /// # Returns
    /// Whether anything was uploaded.
    pub fn upload(&mut self, backend: &mut dyn RenderBackend) -> bool {
        if self.dirtiness != Dirtiness::Refresh {
            return false;
        }
        let Some(mesh) = self.mesh.take() else {
            return false;
        };

        let position = self.position;
        let buffers = self
            .buffers
            .get_or_insert_with(|| backend.create_chunk_buffers(position));
        buffers.update(mesh.vertex_bytes(), mesh.index_bytes());
        self.index_count = mesh.index_count();
        debug!(
            "Uploaded chunk {:?}: {} vertices ({} bytes), {} indices ({} bytes)",
            self.position,
            mesh.vertices().len(),
            mesh.vertex_bytes().len(),
            mesh.index_count(),
            mesh.index_bytes().len()
        );
        self.mark_done();
        true
    }

    /// Draws the uploaded mesh, translated to the chunk's world offset.
    ///
    /// No-op until a non-empty mesh has been uploaded.
    pub fn render(&self, backend: &mut dyn RenderBackend) -> bool {
        if self.index_count == 0 {
            return false;
        }
        match &self.buffers {
            Some(buffers) => {
                backend.draw_chunk(buffers.as_ref(), chunk_translation(self.position), self.index_count);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::rendering::headless::HeadlessBackend;
    use crate::engine_state::voxels::block::BlockSide;
    use cgmath::Point3;

    const ORIGIN: BlockPosition = Point3 { x: 0, y: 0, z: 0 };

    fn mesh_with_one_face() -> Mesh {
        let mut mesh = Mesh::new();
        mesh.add_face(BlockSide::Y_POS, ORIGIN, 1);
        mesh
    }

    #[test]
    fn new_chunks_are_dirty() {
        let chunk = Chunk::empty(Point3::new(0, 0, 0));
        assert_eq!(chunk.dirtiness(), Dirtiness::Dirty);
        assert_eq!(chunk.neighbour_status(), NeighbourStatus::None);
    }

    #[test]
    fn refresh_then_upload_returns_to_okay() {
        let mut backend = HeadlessBackend::new();
        let mut chunk = Chunk::empty(Point3::new(1, 0, -1));
        chunk.mark_neighbour_created();
        chunk.mark_refresh(mesh_with_one_face());
        assert_eq!(chunk.dirtiness(), Dirtiness::Refresh);
        assert_eq!(chunk.neighbour_status(), NeighbourStatus::None);

        assert!(chunk.upload(&mut backend));
        assert_eq!(chunk.dirtiness(), Dirtiness::Okay);
        assert_eq!(chunk.index_count(), 6);
        assert!(!chunk.upload(&mut backend));
        assert_eq!(backend.buffers_created(), 1);
    }

    #[test]
    fn render_is_a_no_op_without_an_upload() {
        let mut backend = HeadlessBackend::new();
        let mut chunk = Chunk::empty(Point3::new(0, 0, 0));
        assert!(!chunk.render(&mut backend));

        chunk.mark_refresh(Mesh::new());
        chunk.upload(&mut backend);
        assert!(!chunk.render(&mut backend));
        assert!(backend.draws().is_empty());
    }

    #[test]
    fn render_translates_by_chunk_offset() {
        let mut backend = HeadlessBackend::new();
        let mut chunk = Chunk::empty(Point3::new(-1, 2, 0));
        chunk.mark_refresh(mesh_with_one_face());
        chunk.upload(&mut backend);
        assert!(chunk.render(&mut backend));
        let draw = &backend.draws()[0];
        assert_eq!(draw.translation, cgmath::Vector3::new(-32.0, 64.0, 0.0));
        assert_eq!(draw.index_count, 6);
    }

    #[test]
    fn editing_drops_cached_meshes() {
        let mut chunk = Chunk::empty(Point3::new(0, 0, 0));
        chunk.set_interior_mesh(Mesh::new());
        chunk.mark_refresh(mesh_with_one_face());
        chunk.set_block(ORIGIN, BlockType::STONE);
        assert_eq!(chunk.dirtiness(), Dirtiness::Dirty);
        assert!(chunk.interior_mesh().is_none());
        assert_eq!(chunk.get_block(ORIGIN), BlockType::STONE);
    }
}
