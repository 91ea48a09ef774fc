//! Chunk mesh generation.
//!
//! Meshing runs in two passes so a chunk's bulk geometry can be built as soon as the chunk
//! exists, while only its thin border shells wait for the neighbouring chunks:
//!
//! 1. **Interior pass** ([`generate_interior_mesh`]): every drawable block is compared
//!    against the six blocks next to it inside the same chunk. Faces pointing out of the
//!    chunk are skipped.
//! 2. **Edge pass** ([`generate_edge_faces`]): every boundary block is compared against the
//!    touching block of the neighbouring chunk on that side, found by mirroring the local
//!    coordinate across the shared boundary (`0` looks at the neighbour's `CHUNK_SIZE - 1`
//!    and vice versa).
//!
//! A face is emitted when the block is drawable (visibility at most `TransparentTexture`)
//! and the block in front of it does not occlude (visibility above `Opaque`).

use cgmath::Point3;

use crate::core::EngineError;
use crate::engine_state::voxels::block::{BlockRegistry, BlockSide};
use crate::engine_state::voxels::chunk::storage::BlockStorage;
use crate::engine_state::voxels::position::{BlockPosition, CHUNK_SIZE};

pub mod mesh;

pub use mesh::Mesh;

/// Block storage of the six chunks touching a chunk, indexed by `BlockSide`.
#[derive(Clone, Copy)]
pub struct ChunkNeighbours<'a> {
    storages: [&'a BlockStorage; 6],
}

impl<'a> ChunkNeighbours<'a> {
    /// Wraps the six neighbour storages, ordered as `BlockSide::all()`.
    pub fn new(storages: [&'a BlockStorage; 6]) -> Self {
        Self { storages }
    }

    /// Storage of the chunk on `side`.
    pub fn get(&self, side: BlockSide) -> &'a BlockStorage {
        self.storages[side as usize]
    }
}

/// Builds the faces of `storage` that can be decided without neighbouring chunks.
///
/// # Errors
/// Fails if the chunk contains a block id missing from `registry`.
pub fn generate_interior_mesh(
    storage: &BlockStorage,
    registry: &BlockRegistry,
) -> Result<Mesh, EngineError> {
    let mut mesh = Mesh::new();

    for local in BlockStorage::positions() {
        let block = storage.get(local);
        if block.is_air() {
            continue;
        }
        let properties = registry.get(block)?;
        if !properties.visibility.is_meshed() {
            continue;
        }

        for side in BlockSide::all() {
            let (facing, in_bounds) = storage.get_bounded(local + side.normal());
            if !in_bounds {
                continue;
            }
            if registry.get(facing)?.visibility.exposes_neighbour() {
                mesh.add_face(side, local, properties.texture_layer);
            }
        }
    }

    Ok(mesh)
}

/// Appends the boundary faces of `storage` to `mesh`, looking into `neighbours`.
///
/// # Errors
/// Fails if either chunk contains a block id missing from `registry`.
pub fn generate_edge_faces(
    mesh: &mut Mesh,
    storage: &BlockStorage,
    neighbours: &ChunkNeighbours<'_>,
    registry: &BlockRegistry,
) -> Result<(), EngineError> {
    for side in BlockSide::all() {
        let neighbour = neighbours.get(side);
        let axis = side as usize / 2;
        let (own_layer, their_layer) = if side.is_positive() {
            (CHUNK_SIZE - 1, 0)
        } else {
            (0, CHUNK_SIZE - 1)
        };

        for a in 0..CHUNK_SIZE {
            for b in 0..CHUNK_SIZE {
                let local = boundary_cell(axis, own_layer, a, b);
                let block = storage.get(local);
                if block.is_air() {
                    continue;
                }
                let properties = registry.get(block)?;
                if !properties.visibility.is_meshed() {
                    continue;
                }

                let facing = neighbour.get(boundary_cell(axis, their_layer, a, b));
                if registry.get(facing)?.visibility.exposes_neighbour() {
                    mesh.add_face(side, local, properties.texture_layer);
                }
            }
        }
    }

    Ok(())
}

/// Builds the complete mesh of a chunk whose six neighbours are all present.
pub fn generate_chunk_mesh(
    storage: &BlockStorage,
    neighbours: &ChunkNeighbours<'_>,
    registry: &BlockRegistry,
) -> Result<Mesh, EngineError> {
    let mut mesh = generate_interior_mesh(storage, registry)?;
    generate_edge_faces(&mut mesh, storage, neighbours, registry)?;
    Ok(mesh)
}

/// Cell of the boundary plane `axis = layer`, addressed by the two remaining axes.
fn boundary_cell(axis: usize, layer: i32, a: i32, b: i32) -> BlockPosition {
    match axis {
        0 => Point3::new(layer, a, b),
        1 => Point3::new(a, layer, b),
        _ => Point3::new(a, b, layer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::{BlockProperties, BlockType, Visibility};

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
            BlockType::WATER,
            BlockProperties {
                visibility: Visibility::Translucent,
                texture_layer: 2,
                produces_light: false,
            },
        );
        registry
    }

    fn solid() -> BlockStorage {
        let mut storage = BlockStorage::new();
        for local in BlockStorage::positions() {
            storage.set(local, BlockType::STONE);
        }
        storage
    }

    #[test]
    fn isolated_block_emits_six_unshared_faces() {
        let air = BlockStorage::new();
        let mut storage = BlockStorage::new();
        storage.set(Point3::new(10, 10, 10), BlockType::STONE);

        let mesh =
            generate_chunk_mesh(&storage, &ChunkNeighbours::new([&air; 6]), &registry()).expect("mesh");
        assert_eq!(mesh.vertices().len(), 24);
        assert_eq!(mesh.indices().len(), 36);
    }

    #[test]
    fn surrounded_block_hides_only_its_own_faces() {
        let mut storage = BlockStorage::new();
        let centre = Point3::new(5, 5, 5);
        storage.set(centre, BlockType::STONE);
        for side in BlockSide::all() {
            storage.set(centre + side.normal(), BlockType::STONE);
        }
        let mesh = generate_interior_mesh(&storage, &registry()).expect("mesh");
        // Only the six outer blocks show faces, 5 each.
        assert_eq!(mesh.face_count(), 30);
    }

    #[test]
    fn solid_chunk_between_solid_neighbours_is_empty() {
        let storage = solid();
        let neighbour = solid();
        let mesh = generate_chunk_mesh(&storage, &ChunkNeighbours::new([&neighbour; 6]), &registry())
            .expect("mesh");
        assert!(mesh.is_empty());
    }

    #[test]
    fn boundary_block_looks_into_mirrored_neighbour_cell() {
        let air = BlockStorage::new();
        let mut storage = BlockStorage::new();
        storage.set(Point3::new(CHUNK_SIZE - 1, 3, 4), BlockType::STONE);

        let mut covered = BlockStorage::new();
        covered.set(Point3::new(0, 3, 4), BlockType::STONE);

        let mut neighbours = [&air; 6];
        neighbours[BlockSide::X_POS as usize] = &covered;
        let mesh = generate_chunk_mesh(&storage, &ChunkNeighbours::new(neighbours), &registry())
            .expect("mesh");
        assert_eq!(mesh.face_count(), 5);
        assert!(mesh.vertices().iter().all(|v| v.side() != Some(BlockSide::X_POS)));
    }

    #[test]
    fn low_boundary_block_looks_into_neighbours_far_cell() {
        let air = BlockStorage::new();
        for side in [BlockSide::X_NEG, BlockSide::Y_NEG, BlockSide::Z_NEG] {
            let axis = side as usize / 2;
            let mut storage = BlockStorage::new();
            storage.set(boundary_cell(axis, 0, 3, 4), BlockType::STONE);

            let mut covered = BlockStorage::new();
            covered.set(boundary_cell(axis, CHUNK_SIZE - 1, 3, 4), BlockType::STONE);

            let mut neighbours = [&air; 6];
            neighbours[side as usize] = &covered;
            let mesh = generate_chunk_mesh(&storage, &ChunkNeighbours::new(neighbours), &registry())
                .expect("mesh");
            assert_eq!(mesh.face_count(), 5, "{side:?}");
            assert!(mesh.vertices().iter().all(|v| v.side() != Some(side)), "{side:?}");
        }
    }

    #[test]
    fn interior_pass_skips_boundary_facing_faces() {
        let mut storage = BlockStorage::new();
        storage.set(Point3::new(0, 0, 0), BlockType::STONE);
        let mesh = generate_interior_mesh(&storage, &registry()).expect("mesh");
        assert_eq!(mesh.face_count(), 3);
    }

    #[test]
    fn translucent_blocks_are_not_meshed_but_expose_neighbours() {
        let mut storage = BlockStorage::new();
        storage.set(Point3::new(4, 4, 4), BlockType::WATER);
        storage.set(Point3::new(5, 4, 4), BlockType::STONE);
        let mesh = generate_interior_mesh(&storage, &registry()).expect("mesh");
        assert_eq!(mesh.face_count(), 6);
        assert!(mesh.vertices().iter().all(|v| v.texture_layer() == 1));
    }

    #[test]
    fn meshing_is_deterministic() {
        let air = BlockStorage::new();
        let mut storage = BlockStorage::new();
        for x in 0..CHUNK_SIZE {
            storage.set(Point3::new(x, (x * 7) % CHUNK_SIZE, (x * 3) % CHUNK_SIZE), BlockType::STONE);
        }
        let registry = registry();
        let neighbours = ChunkNeighbours::new([&air; 6]);
        let first = generate_chunk_mesh(&storage, &neighbours, &registry).expect("mesh");
        let second = generate_chunk_mesh(&storage, &neighbours, &registry).expect("mesh");
        assert_eq!(first.vertex_bytes(), second.vertex_bytes());
        assert_eq!(first.index_bytes(), second.index_bytes());
    }

    #[test]
    fn unregistered_blocks_fail_meshing() {
        let mut storage = BlockStorage::new();
        storage.set(Point3::new(1, 1, 1), BlockType::LAMP);
        assert!(matches!(
            generate_interior_mesh(&storage, &registry()),
            Err(EngineError::UnregisteredBlock(7))
        ));
    }
}
