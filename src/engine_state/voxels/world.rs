//! # World Module
//!
//! This module provides the `World` struct, the sole owner of every resident chunk.
//!
//! ## Architecture
//!
//! Chunks live in a hash map keyed by chunk coordinate. Neighbours are never stored;
//! they are found by offsetting a coordinate and looking it up, so removing a chunk can
//! never leave a dangling link behind.
//!
//! ## Frame Loop
//!
//! - `update` drains the generation queue until the per-frame time budget is spent.
//!   Each new chunk gets its interior mesh right away.
//! - `render` walks the cube of chunks around the viewer, nearest first. Missing chunks
//!   are queued, dirty chunks are meshed once all six neighbours exist, fresh meshes are
//!   uploaded and every non-empty chunk is drawn.
//!
//! The queue reaches one ring further than the draw radius so that chunks on the edge of
//! the view have all their neighbours and can be meshed. When the viewer crosses into
//! another chunk, queued coordinates and resident chunks beyond that reach are dropped.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use cgmath::{Point3, Vector3};
use log::{debug, trace, warn};
use web_time::Instant;

use super::block::{BlockRegistry, BlockSide, BlockType};
use super::chunk::chunk_generation::{generator_for, ChunkGenerator};
use super::chunk::{Chunk, Dirtiness, NeighbourStatus};
use super::position::{chunk_of, local_of, BlockPosition, ChunkPosition, CHUNK_SIZE};
use crate::core::settings::MAX_VIEW_DISTANCE;
use crate::core::{EngineError, EngineSettings};
use crate::engine_state::rendering::backend::RenderBackend;
use crate::engine_state::rendering::meshing::{
    generate_edge_faces, generate_interior_mesh, ChunkNeighbours,
};

/// Counters describing one `render` call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RenderStats {
    /// Chunks that received a full mesh.
    pub meshed: usize,
    /// Chunks whose mesh was uploaded.
    pub uploaded: usize,
    /// Chunks drawn.
    pub drawn: usize,
    /// Coordinates newly queued for generation.
    pub queued: usize,
}

/// A voxel world composed of chunks.
pub struct World {
    chunks: HashMap<ChunkPosition, Chunk>,
    registry: BlockRegistry,
    generator: Box<dyn ChunkGenerator>,
    generation_queue: VecDeque<ChunkPosition>,
    pending: HashSet<ChunkPosition>,
    view_distance: i32,
    /// Offsets of the streamed cube, nearest first, flagged when inside the draw radius.
    view_offsets: Vec<(Vector3<i32>, bool)>,
    generation_budget: Duration,
    /// Chunk the viewer stood in during the last `render`.
    centre: Option<ChunkPosition>,
}

impl World {
    /// Creates an empty world.
    ///
    /// # Arguments
    /// * `registry` - Properties of every block id the generator or edits may produce
    /// * `generator` - Terrain used for newly streamed chunks
    /// * `view_distance` - Draw radius in chunks, clamped to `MAX_VIEW_DISTANCE`
    /// * `generation_budget` - Time `update` may spend generating per call
    pub fn new(
        registry: BlockRegistry,
        generator: Box<dyn ChunkGenerator>,
        view_distance: u32,
        generation_budget: Duration,
    ) -> Self {
        let view_distance = match i32::try_from(view_distance) {
            Ok(distance) if view_distance <= MAX_VIEW_DISTANCE => distance,
            _ => {
                warn!("View distance {view_distance} clamped to {MAX_VIEW_DISTANCE}");
                MAX_VIEW_DISTANCE as i32
            }
        };
        World {
            chunks: HashMap::new(),
            registry,
            generator,
            generation_queue: VecDeque::new(),
            pending: HashSet::new(),
            view_distance,
            view_offsets: view_offsets(view_distance),
            generation_budget,
            centre: None,
        }
    }

    /// Creates a world configured from the settings.
    pub fn from_settings(registry: BlockRegistry, settings: &EngineSettings) -> Self {
        Self::new(
            registry,
            generator_for(settings.terrain, settings.world_seed),
            settings.view_distance,
            settings.generation_budget(),
        )
    }

    /// The block registry.
    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    /// Draw radius in chunks.
    pub fn view_distance(&self) -> u32 {
        self.view_distance as u32
    }

    /// The chunk at `position`, if resident.
    pub fn get_or_none(&self, position: ChunkPosition) -> Option<&Chunk> {
        self.chunks.get(&position)
    }

    /// Number of resident chunks.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Number of coordinates waiting for generation.
    pub fn pending_generation(&self) -> usize {
        self.generation_queue.len()
    }

    /// Dirtiness and neighbour status of the chunk at `position`.
    pub fn chunk_status(&self, position: ChunkPosition) -> Option<(Dirtiness, NeighbourStatus)> {
        self.chunks
            .get(&position)
            .map(|chunk| (chunk.dirtiness(), chunk.neighbour_status()))
    }

    /// Adds a chunk, replacing any chunk at the same coordinate, and flags every existing
    /// neighbour so it re-examines the shared border.
    pub fn insert(&mut self, chunk: Chunk) {
        let position = chunk.position();
        for side in BlockSide::all() {
            if let Some(neighbour) = self.chunks.get_mut(&(position + side.normal())) {
                neighbour.mark_neighbour_created();
            }
        }
        self.pending.remove(&position);
        self.chunks.insert(position, chunk);
    }

    /// Removes a chunk together with its GPU buffers.
    pub fn remove_chunk(&mut self, position: ChunkPosition) -> Option<Chunk> {
        let removed = self.chunks.remove(&position);
        if removed.is_some() {
            trace!("Removed chunk {position:?}");
        }
        removed
    }

    /// Queues `position` for generation unless it is resident or already queued.
    ///
    /// # Returns
    /// Whether the coordinate was newly queued.
    pub fn request_chunk(&mut self, position: ChunkPosition) -> bool {
        if self.chunks.contains_key(&position) || !self.pending.insert(position) {
            return false;
        }
        self.generation_queue.push_back(position);
        true
    }

    /// Block at a world position; air when the owning chunk is not resident.
    pub fn get_block(&self, world: BlockPosition) -> BlockType {
        self.chunks
            .get(&chunk_of(world))
            .map_or(BlockType::AIR, |chunk| chunk.get_block(local_of(world)))
    }

    /// Writes a block at a world position.
    ///
    /// The owning chunk becomes dirty. When the block lies on the chunk border, the
    /// chunk across that border is flagged so it recomputes its facing faces.
    ///
    /// # Returns
    /// `false` when the owning chunk is not resident or `block` is not registered.
    pub fn set_block(&mut self, world: BlockPosition, block: BlockType) -> bool {
        if !self.registry.is_registered(block) {
            warn!("Refusing to place unregistered block {} at {world:?}", block.0);
            return false;
        }
        let position = chunk_of(world);
        let local = local_of(world);
        let Some(chunk) = self.chunks.get_mut(&position) else {
            return false;
        };
        chunk.set_block(local, block);

        for side in BlockSide::all() {
            let normal = side.normal();
            let across = local + normal;
            let crosses = [across.x, across.y, across.z]
                .iter()
                .any(|c| !(0..CHUNK_SIZE).contains(c));
            if crosses {
                if let Some(neighbour) = self.chunks.get_mut(&(position + normal)) {
                    neighbour.mark_neighbour_created();
                }
            }
        }
        true
    }

    /// Generates queued chunks until the configured budget is spent.
    pub fn update(&mut self) -> Result<usize, EngineError> {
        self.update_with_budget(self.generation_budget)
    }

    /// Generates queued chunks until `budget` is spent. At least one chunk is generated
    /// when the queue is not empty.
    ///
    /// # Returns
    /// Number of chunks generated.
    ///
    /// # Errors
    /// Fails if a generated chunk holds an unregistered block.
    pub fn update_with_budget(&mut self, budget: Duration) -> Result<usize, EngineError> {
        let start = Instant::now();
        let mut generated = 0;

        while generated == 0 || start.elapsed() < budget {
            let Some(position) = self.generation_queue.pop_front() else {
                break;
            };
            self.pending.remove(&position);
            if self.chunks.contains_key(&position) {
                continue;
            }

            let storage = self.generator.generate(position);
            let interior = generate_interior_mesh(&storage, &self.registry)?;
            let mut chunk = Chunk::new(position, storage);
            chunk.set_interior_mesh(interior);
            self.insert(chunk);
            generated += 1;
        }

        if generated > 0 {
            debug!(
                "Generated {generated} chunks in {:?}, {} deferred",
                start.elapsed(),
                self.generation_queue.len()
            );
        }
        Ok(generated)
    }

    fn neighbours(&self, position: ChunkPosition) -> Option<ChunkNeighbours<'_>> {
        let storage = |side: BlockSide| {
            self.chunks
                .get(&(position + side.normal()))
                .map(Chunk::storage)
        };
        Some(ChunkNeighbours::new([
            storage(BlockSide::X_POS)?,
            storage(BlockSide::X_NEG)?,
            storage(BlockSide::Y_POS)?,
            storage(BlockSide::Y_NEG)?,
            storage(BlockSide::Z_POS)?,
            storage(BlockSide::Z_NEG)?,
        ]))
    }

    /// Runs the mesh generator for one chunk if it needs it.
    ///
    /// A dirty chunk, or a clean chunk flagged `NeighbourCreate`, gets a full mesh once all
    /// six neighbours are resident and moves to `Refresh`. Otherwise only its interior mesh
    /// is brought up to date and its state is left alone.
    ///
    /// # Returns
    /// Whether a full mesh was produced.
    ///
    /// # Errors
    /// Fails if the chunk or a neighbour holds an unregistered block.
    pub fn mesh_chunk(&mut self, position: ChunkPosition) -> Result<bool, EngineError> {
        let (interior, full) = {
            let Some(chunk) = self.chunks.get(&position) else {
                return Ok(false);
            };
            let wants_mesh = chunk.dirtiness() == Dirtiness::Dirty
                || (chunk.dirtiness() == Dirtiness::Okay
                    && chunk.neighbour_status() == NeighbourStatus::NeighbourCreate);
            if !wants_mesh {
                return Ok(false);
            }

            let fresh_interior = match chunk.interior_mesh() {
                Some(_) => None,
                None => Some(generate_interior_mesh(chunk.storage(), &self.registry)?),
            };
            let full = match (self.neighbours(position), fresh_interior.as_ref().or(chunk.interior_mesh())) {
                (Some(neighbours), Some(interior)) => {
                    let mut mesh = interior.clone();
                    generate_edge_faces(&mut mesh, chunk.storage(), &neighbours, &self.registry)?;
                    Some(mesh)
                }
                _ => None,
            };
            (fresh_interior, full)
        };

        let Some(chunk) = self.chunks.get_mut(&position) else {
            return Ok(false);
        };
        if let Some(interior) = interior {
            chunk.set_interior_mesh(interior);
        }
        match full {
            Some(mesh) => {
                trace!("Meshed chunk {position:?}: {} faces", mesh.face_count());
                chunk.mark_refresh(mesh);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Drops queued coordinates and resident chunks farther than one ring past the view
    /// distance from `centre`.
    fn forget_outside(&mut self, centre: ChunkPosition) {
        let reach = self.view_distance + 1;
        let within = |position: &ChunkPosition| {
            let offset = position - centre;
            offset.x.abs().max(offset.y.abs()).max(offset.z.abs()) <= reach
        };

        let queued = self.generation_queue.len();
        self.generation_queue.retain(|position| within(position));
        self.pending.retain(|position| within(position));

        let distant: Vec<ChunkPosition> = self
            .chunks
            .keys()
            .filter(|position| !within(position))
            .copied()
            .collect();
        for position in &distant {
            self.remove_chunk(*position);
        }

        if !distant.is_empty() || queued > self.generation_queue.len() {
            debug!(
                "Viewer entered {centre:?}: dropped {} queued, evicted {} chunks",
                queued - self.generation_queue.len(),
                distant.len()
            );
        }
    }

    /// Streams, meshes, uploads and draws the chunks around `viewer`.
    ///
    /// # Arguments
    /// * `backend` - Receives uploads and draw calls
    /// * `viewer` - Viewer position in world space
    ///
    /// # Errors
    /// Fails if meshing hits an unregistered block.
    pub fn render(
        &mut self,
        backend: &mut dyn RenderBackend,
        viewer: Point3<f32>,
    ) -> Result<RenderStats, EngineError> {
        let centre = chunk_of(Point3::new(
            viewer.x.floor() as i32,
            viewer.y.floor() as i32,
            viewer.z.floor() as i32,
        ));
        if self.centre != Some(centre) {
            self.forget_outside(centre);
            self.centre = Some(centre);
        }
        let mut stats = RenderStats::default();

        for i in 0..self.view_offsets.len() {
            let (offset, drawn) = self.view_offsets[i];
            let position = centre + offset;

            if !self.chunks.contains_key(&position) {
                if self.request_chunk(position) {
                    stats.queued += 1;
                }
                continue;
            }
            if !drawn {
                continue;
            }

            if self.mesh_chunk(position)? {
                stats.meshed += 1;
            }
            if let Some(chunk) = self.chunks.get_mut(&position) {
                if chunk.upload(backend) {
                    stats.uploaded += 1;
                }
                if chunk.render(backend) {
                    stats.drawn += 1;
                }
            }
        }

        if stats.meshed > 0 || stats.queued > 0 {
            debug!(
                "Render around {centre:?}: {} meshed, {} uploaded, {} drawn, {} queued",
                stats.meshed, stats.uploaded, stats.drawn, stats.queued
            );
        }
        Ok(stats)
    }
}

/// Offsets of the cube of radius `view_distance + 1`, nearest first. Offsets inside
/// `view_distance` are flagged for drawing.
fn view_offsets(view_distance: i32) -> Vec<(Vector3<i32>, bool)> {
    let reach = view_distance + 1;
    let mut offsets = Vec::with_capacity(((2 * reach + 1) as usize).pow(3));
    for x in -reach..=reach {
        for y in -reach..=reach {
            for z in -reach..=reach {
                let drawn = x.abs().max(y.abs()).max(z.abs()) <= view_distance;
                offsets.push((Vector3::new(x, y, z), drawn));
            }
        }
    }
    offsets.sort_by_key(|(offset, _)| offset.x * offset.x + offset.y * offset.y + offset.z * offset.z);
    offsets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::rendering::headless::HeadlessBackend;
    use crate::engine_state::voxels::block::{BlockProperties, Visibility};
    use crate::engine_state::voxels::chunk::chunk_generation::{EmptyTerrain, FlatTerrain};

    fn registry() -> BlockRegistry {
        let mut registry = BlockRegistry::new();
        for block in [BlockType::STONE, BlockType::DIRT, BlockType::GRASS] {
            registry.register(
                block,
                BlockProperties {
                    visibility: Visibility::Opaque,
                    texture_layer: block.0,
                    produces_light: false,
                },
            );
        }
        registry.register(
            BlockType::WATER,
            BlockProperties {
                visibility: Visibility::Translucent,
                texture_layer: 6,
                produces_light: false,
            },
        );
        registry
    }

    fn empty_world(view_distance: u32) -> World {
        World::new(registry(), Box::new(EmptyTerrain), view_distance, Duration::from_secs(10))
    }

    #[test]
    fn blocks_outside_resident_chunks_read_as_air() {
        let mut world = empty_world(1);
        assert_eq!(world.get_block(Point3::new(0, 0, 0)), BlockType::AIR);
        assert!(!world.set_block(Point3::new(0, 0, 0), BlockType::STONE));
    }

    #[test]
    fn set_block_marks_chunk_dirty() {
        let mut world = empty_world(1);
        let mut chunk = Chunk::empty(Point3::new(-1, 0, 0));
        chunk.mark_done();
        world.insert(chunk);

        assert!(world.set_block(Point3::new(-5, 3, 3), BlockType::STONE));
        assert_eq!(world.get_block(Point3::new(-5, 3, 3)), BlockType::STONE);
        assert_eq!(
            world.chunk_status(Point3::new(-1, 0, 0)).map(|s| s.0),
            Some(Dirtiness::Dirty)
        );
    }

    #[test]
    fn unregistered_blocks_are_rejected() {
        let mut world = empty_world(1);
        world.insert(Chunk::empty(Point3::new(0, 0, 0)));
        assert!(!world.set_block(Point3::new(1, 1, 1), BlockType::LAMP));
        assert_eq!(world.get_block(Point3::new(1, 1, 1)), BlockType::AIR);
    }

    #[test]
    fn inserting_flags_existing_neighbours() {
        let mut world = empty_world(1);
        world.insert(Chunk::empty(Point3::new(0, 0, 0)));
        world.insert(Chunk::empty(Point3::new(5, 5, 5)));
        world.insert(Chunk::empty(Point3::new(0, 1, 0)));
        assert_eq!(
            world.chunk_status(Point3::new(0, 0, 0)).map(|s| s.1),
            Some(NeighbourStatus::NeighbourCreate)
        );
        assert_eq!(
            world.chunk_status(Point3::new(5, 5, 5)).map(|s| s.1),
            Some(NeighbourStatus::None)
        );
    }

    #[test]
    fn border_edits_flag_the_chunk_across_the_border() {
        let mut world = empty_world(1);
        world.insert(Chunk::empty(Point3::new(0, 0, 0)));
        world.insert(Chunk::empty(Point3::new(1, 0, 0)));
        world.insert(Chunk::empty(Point3::new(0, 0, -1)));
        // Clear the flags raised by insertion.
        for position in [Point3::new(0, 0, 0), Point3::new(1, 0, 0), Point3::new(0, 0, -1)] {
            if let Some(chunk) = world.chunks.get_mut(&position) {
                chunk.mark_refresh(crate::engine_state::rendering::meshing::Mesh::new());
            }
        }

        assert!(world.set_block(Point3::new(CHUNK_SIZE - 1, 4, 4), BlockType::STONE));
        assert_eq!(
            world.chunk_status(Point3::new(1, 0, 0)).map(|s| s.1),
            Some(NeighbourStatus::NeighbourCreate)
        );
        assert_eq!(
            world.chunk_status(Point3::new(0, 0, -1)).map(|s| s.1),
            Some(NeighbourStatus::None)
        );
    }

    #[test]
    fn meshing_waits_for_all_six_neighbours() {
        let mut world = empty_world(1);
        let origin = Point3::new(0, 0, 0);
        world.insert(Chunk::empty(origin));
        assert!(world.set_block(Point3::new(3, 3, 3), BlockType::STONE));

        assert!(!world.mesh_chunk(origin).expect("mesh"));
        assert!(!world.mesh_chunk(origin).expect("mesh"));
        assert_eq!(world.chunk_status(origin).map(|s| s.0), Some(Dirtiness::Dirty));
        assert!(world.get_or_none(origin).and_then(Chunk::interior_mesh).is_some());

        for side in BlockSide::all() {
            world.insert(Chunk::empty(origin + side.normal()));
        }
        assert!(world.mesh_chunk(origin).expect("mesh"));
        assert_eq!(
            world.chunk_status(origin),
            Some((Dirtiness::Refresh, NeighbourStatus::None))
        );
    }

    #[test]
    fn update_respects_the_queue_and_generates_at_least_one() {
        let mut world = World::new(registry(), Box::new(FlatTerrain), 1, Duration::ZERO);
        for x in 0..4 {
            assert!(world.request_chunk(Point3::new(x, -1, 0)));
        }
        assert!(!world.request_chunk(Point3::new(0, -1, 0)));
        assert_eq!(world.pending_generation(), 4);

        assert_eq!(world.update().expect("update"), 1);
        assert_eq!(world.chunk_count(), 1);
        assert_eq!(world.update_with_budget(Duration::from_secs(10)).expect("update"), 3);
        assert_eq!(world.pending_generation(), 0);
        assert!(!world.request_chunk(Point3::new(0, -1, 0)));
    }

    #[test]
    fn render_streams_meshes_and_draws() {
        let mut world = World::new(registry(), Box::new(FlatTerrain), 1, Duration::from_secs(10));
        let mut backend = HeadlessBackend::new();
        let viewer = Point3::new(0.5, 0.5, 0.5);

        let first = world.render(&mut backend, viewer).expect("render");
        assert_eq!(first.queued, 125);
        assert_eq!(first.drawn, 0);

        world.update().expect("update");
        assert_eq!(world.chunk_count(), 125);

        let second = world.render(&mut backend, viewer).expect("render");
        assert_eq!(second.meshed, 27);
        assert_eq!(second.uploaded, 27);
        // Only the nine chunks holding the grass surface have faces.
        assert_eq!(second.drawn, 9);
        let draws = backend.take_draws();
        assert!(draws.iter().all(|draw| draw.index_count % 6 == 0 && draw.index_count > 0));
    }

    #[test]
    fn removing_a_chunk_frees_it() {
        let mut world = empty_world(1);
        world.insert(Chunk::empty(Point3::new(2, 2, 2)));
        assert!(world.remove_chunk(Point3::new(2, 2, 2)).is_some());
        assert!(world.remove_chunk(Point3::new(2, 2, 2)).is_none());
        assert_eq!(world.chunk_count(), 0);
        assert!(world.request_chunk(Point3::new(2, 2, 2)));
    }

    #[test]
    fn moving_viewer_keeps_queue_and_chunks_bounded() {
        let mut world = empty_world(1);
        let mut backend = HeadlessBackend::new();
        let reach_volume = 5 * 5 * 5;

        for step in 0..50 {
            let viewer = Point3::new(0.5 + 64.0 * step as f32, 0.5, 0.5);
            world.render(&mut backend, viewer).expect("render");
            world.update_with_budget(Duration::ZERO).expect("update");
            assert!(world.pending_generation() <= reach_volume);
            assert!(world.chunk_count() <= reach_volume);
        }

        assert!(world.get_or_none(Point3::new(0, 0, 0)).is_none());
        let centre = Point3::new(49 * 2, 0, 0);
        assert!(world
            .generation_queue
            .iter()
            .all(|position| (position.x - centre.x).abs() <= 2));
        assert_eq!(world.pending.len(), world.generation_queue.len());
    }

    #[test]
    fn oversized_view_distance_is_clamped() {
        let world = empty_world(u32::MAX);
        assert_eq!(world.view_distance(), MAX_VIEW_DISTANCE);
        let world = empty_world(MAX_VIEW_DISTANCE + 1);
        assert_eq!(world.view_distance(), MAX_VIEW_DISTANCE);
        assert_eq!(empty_world(3).view_distance(), 3);
    }

    #[test]
    fn view_offsets_start_at_the_centre() {
        let offsets = view_offsets(2);
        assert_eq!(offsets.len(), 7 * 7 * 7);
        assert_eq!(offsets[0], (Vector3::new(0, 0, 0), true));
        assert_eq!(offsets.iter().filter(|(_, drawn)| *drawn).count(), 125);
    }
}
