//! Dense block storage for one chunk.

use cgmath::Point3;

use crate::core::EngineError;
use crate::engine_state::voxels::block::{BlockRegistry, BlockType};
use crate::engine_state::voxels::position::{
    in_chunk_bounds, BlockPosition, CHUNK_PLANE_SIZE, CHUNK_SIZE, CHUNK_VOLUME,
};

/// A `CHUNK_SIZE`³ array of block ids, laid out x-fastest then y then z.
///
/// Starts out as all air.
#[derive(Clone, PartialEq, Eq)]
pub struct BlockStorage {
    blocks: Box<[BlockType]>,
}

impl std::fmt::Debug for BlockStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockStorage")
            .field("solid_blocks", &self.solid_count())
            .finish()
    }
}

impl Default for BlockStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockStorage {
    /// Creates storage filled with air.
    pub fn new() -> Self {
        Self {
            blocks: vec![BlockType::AIR; CHUNK_VOLUME].into_boxed_slice(),
        }
    }

    #[inline]
    fn index(local: BlockPosition) -> usize {
        local.x as usize + local.y as usize * CHUNK_SIZE as usize + local.z as usize * CHUNK_PLANE_SIZE
    }

    /// Block at `local`. The caller guarantees `local` is in bounds.
    ///
    /// # Panics
    /// Panics when `local` is outside the chunk.
    #[inline]
    pub fn get(&self, local: BlockPosition) -> BlockType {
        self.blocks[Self::index(local)]
    }

    /// Block at `local` and whether `local` was in bounds. Out of bounds reads yield air.
    pub fn get_bounded(&self, local: BlockPosition) -> (BlockType, bool) {
        if in_chunk_bounds(local) {
            (self.get(local), true)
        } else {
            (BlockType::AIR, false)
        }
    }

    /// Writes `block` at `local`. The caller guarantees `local` is in bounds.
    ///
    /// # Panics
    /// Panics when `local` is outside the chunk.
    #[inline]
    pub fn set(&mut self, local: BlockPosition, block: BlockType) {
        self.blocks[Self::index(local)] = block;
    }

    /// Whether a face looking into `local` would be visible, judged from this chunk alone.
    ///
    /// Out of bounds positions count as exposed because the answer lives in another chunk.
    ///
    /// # Errors
    /// Fails if the block at `local` has no registry entry.
    pub fn is_face_exposed(
        &self,
        local: BlockPosition,
        registry: &BlockRegistry,
    ) -> Result<bool, EngineError> {
        let (block, in_bounds) = self.get_bounded(local);
        if !in_bounds {
            return Ok(true);
        }
        Ok(registry.get(block)?.visibility.exposes_neighbour())
    }

    /// Number of non-air blocks.
    pub fn solid_count(&self) -> usize {
        self.blocks.iter().filter(|block| !block.is_air()).count()
    }

    /// Iterates every local position in storage order.
    pub fn positions() -> impl Iterator<Item = BlockPosition> {
        (0..CHUNK_SIZE).flat_map(|z| {
            (0..CHUNK_SIZE).flat_map(move |y| (0..CHUNK_SIZE).map(move |x| Point3::new(x, y, z)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::{BlockProperties, Visibility};

    fn registry() -> BlockRegistry {
        let mut registry = BlockRegistry::new();
        registry.register(
            BlockType::STONE,
            BlockProperties {
                visibility: Visibility::Opaque,
                texture_layer: 1,
                produces_light: false,
            },
        );
        registry.register(
            BlockType::GLASS,
            BlockProperties {
                visibility: Visibility::TransparentTexture,
                texture_layer: 2,
                produces_light: false,
            },
        );
        registry
    }

    #[test]
    fn new_storage_is_air() {
        let storage = BlockStorage::new();
        assert_eq!(storage.solid_count(), 0);
        assert_eq!(storage.get(Point3::new(31, 31, 31)), BlockType::AIR);
    }

    #[test]
    fn set_then_get() {
        let mut storage = BlockStorage::new();
        storage.set(Point3::new(1, 2, 3), BlockType::STONE);
        assert_eq!(storage.get(Point3::new(1, 2, 3)), BlockType::STONE);
        assert_eq!(storage.get(Point3::new(3, 2, 1)), BlockType::AIR);
        assert_eq!(storage.solid_count(), 1);
    }

    #[test]
    fn get_bounded_flags_out_of_range() {
        let mut storage = BlockStorage::new();
        storage.set(Point3::new(0, 0, 0), BlockType::STONE);
        assert_eq!(storage.get_bounded(Point3::new(0, 0, 0)), (BlockType::STONE, true));
        assert_eq!(storage.get_bounded(Point3::new(-1, 0, 0)), (BlockType::AIR, false));
        assert_eq!(storage.get_bounded(Point3::new(0, CHUNK_SIZE, 0)), (BlockType::AIR, false));
    }

    #[test]
    fn face_exposure_follows_visibility() {
        let registry = registry();
        let mut storage = BlockStorage::new();
        storage.set(Point3::new(4, 4, 4), BlockType::STONE);
        storage.set(Point3::new(5, 4, 4), BlockType::GLASS);

        assert!(!storage.is_face_exposed(Point3::new(4, 4, 4), &registry).expect("lookup"));
        assert!(storage.is_face_exposed(Point3::new(5, 4, 4), &registry).expect("lookup"));
        assert!(storage.is_face_exposed(Point3::new(6, 4, 4), &registry).expect("lookup"));
        assert!(storage.is_face_exposed(Point3::new(-1, 4, 4), &registry).expect("lookup"));
    }

    #[test]
    fn unregistered_block_is_an_error() {
        let mut storage = BlockStorage::new();
        storage.set(Point3::new(0, 0, 0), BlockType::WATER);
        assert!(storage.is_face_exposed(Point3::new(0, 0, 0), &registry()).is_err());
    }

    #[test]
    fn positions_cover_the_whole_chunk() {
        assert_eq!(BlockStorage::positions().count(), CHUNK_VOLUME);
    }
}
