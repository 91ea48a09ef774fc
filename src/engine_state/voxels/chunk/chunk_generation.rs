//! # Chunk Generation
//!
//! Terrain generators that fill a chunk's block storage. Every generator is a pure
//! function of its seed and the chunk coordinate, so a chunk that is removed and
//! generated again comes back identical.

use cgmath::Point3;
use noise::{Fbm, MultiFractal, NoiseFn, Perlin, RidgedMulti};

use super::storage::BlockStorage;
use crate::core::TerrainKind;
use crate::engine_state::voxels::block::BlockType;
use crate::engine_state::voxels::position::{local_to_world, ChunkPosition, CHUNK_SIZE};

/// Produces the blocks of a chunk.
pub trait ChunkGenerator {
    /// Generates the storage for the chunk at `position`.
    fn generate(&self, position: ChunkPosition) -> BlockStorage;
}

/// Creates the generator selected in the settings.
pub fn generator_for(kind: TerrainKind, seed: u32) -> Box<dyn ChunkGenerator> {
    match kind {
        TerrainKind::Heightmap => Box::new(HeightmapTerrain::new(seed)),
        TerrainKind::Caves => Box::new(CaveTerrain::new(seed)),
        TerrainKind::Flat => Box::new(FlatTerrain),
        TerrainKind::Empty => Box::new(EmptyTerrain),
    }
}

/// Depth of the dirt layer below the grass surface.
const DIRT_DEPTH: i32 = 3;
/// World height up to which empty space below the surface fills with water.
pub const SEA_LEVEL: i32 = 0;

/// Picks the block of a column at `world_y` given its surface height.
fn column_block(world_y: i32, height: i32) -> BlockType {
    if world_y >= height {
        if world_y < SEA_LEVEL {
            BlockType::WATER
        } else {
            BlockType::AIR
        }
    } else if world_y == height - 1 {
        BlockType::GRASS
    } else if world_y >= height - 1 - DIRT_DEPTH {
        BlockType::DIRT
    } else {
        BlockType::STONE
    }
}

/// Rolling hills with ridged mountain ranges, evaluated once per block column.
pub struct HeightmapTerrain {
    hills: Fbm<Perlin>,
    ridges: RidgedMulti<Perlin>,
}

/// Horizontal frequency of the hills.
const HILL_FREQUENCY: f64 = 0.004;
/// Horizontal frequency of the mountain ridges.
const RIDGE_FREQUENCY: f64 = 0.002;
const HILL_AMPLITUDE: f64 = 24.0;
const RIDGE_AMPLITUDE: f64 = 40.0;

impl HeightmapTerrain {
    /// Creates the generator for `seed`.
    pub fn new(seed: u32) -> Self {
        HeightmapTerrain {
            hills: Fbm::<Perlin>::new(seed).set_octaves(4).set_frequency(HILL_FREQUENCY),
            ridges: RidgedMulti::<Perlin>::new(seed.wrapping_add(1))
                .set_octaves(3)
                .set_frequency(RIDGE_FREQUENCY),
        }
    }

    /// Surface height of the column at world `(x, z)`.
    pub fn height_at(&self, x: i32, z: i32) -> i32 {
        let point = [f64::from(x), f64::from(z)];
        let hills = self.hills.get(point) * HILL_AMPLITUDE;
        let ridges = (self.ridges.get(point).max(0.0)) * RIDGE_AMPLITUDE;
        (hills + ridges).floor() as i32
    }
}

impl ChunkGenerator for HeightmapTerrain {
    fn generate(&self, position: ChunkPosition) -> BlockStorage {
        let mut storage = BlockStorage::new();
        for z in 0..CHUNK_SIZE {
            for x in 0..CHUNK_SIZE {
                let column = local_to_world(position, Point3::new(x, 0, z));
                let height = self.height_at(column.x, column.z);
                for y in 0..CHUNK_SIZE {
                    let block = column_block(column.y + y, height);
                    if !block.is_air() {
                        storage.set(Point3::new(x, y, z), block);
                    }
                }
            }
        }
        storage
    }
}

/// Threshold above which cave noise is solid stone.
pub const PERLIN_POSITIVE_THRESHOLD: f64 = 0.2;
/// Threshold below which cave noise is solid dirt.
pub const PERLIN_NEGATIVE_THRESHOLD: f64 = -0.2;
/// Scaling factor applied to world coordinates when sampling cave noise.
pub const PERLIN_SCALE_FACTOR: f64 = 0.02;

/// A 3D Perlin field where values near zero are carved out, giving tunnels and overhangs.
pub struct CaveTerrain {
    perlin: Perlin,
}

impl CaveTerrain {
    /// Creates the generator for `seed`.
    pub fn new(seed: u32) -> Self {
        CaveTerrain {
            perlin: Perlin::new(seed),
        }
    }
}

impl ChunkGenerator for CaveTerrain {
    fn generate(&self, position: ChunkPosition) -> BlockStorage {
        let mut storage = BlockStorage::new();
        for local in BlockStorage::positions() {
            let world = local_to_world(position, local);
            let sample = self.perlin.get([
                f64::from(world.x) * PERLIN_SCALE_FACTOR,
                f64::from(world.y) * PERLIN_SCALE_FACTOR,
                f64::from(world.z) * PERLIN_SCALE_FACTOR,
            ]);
            if sample > PERLIN_POSITIVE_THRESHOLD {
                storage.set(local, BlockType::STONE);
            } else if sample < PERLIN_NEGATIVE_THRESHOLD {
                storage.set(local, BlockType::DIRT);
            }
        }
        storage
    }
}

/// Grass at world height -1 over dirt and stone; air above.
pub struct FlatTerrain;

impl ChunkGenerator for FlatTerrain {
    fn generate(&self, position: ChunkPosition) -> BlockStorage {
        let mut storage = BlockStorage::new();
        for local in BlockStorage::positions() {
            let block = column_block(local_to_world(position, local).y, 0);
            if !block.is_air() {
                storage.set(local, block);
            }
        }
        storage
    }
}

/// Nothing but air.
pub struct EmptyTerrain;

impl ChunkGenerator for EmptyTerrain {
    fn generate(&self, _position: ChunkPosition) -> BlockStorage {
        BlockStorage::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generators_are_deterministic() {
        let position = Point3::new(3, -1, -7);
        for kind in [TerrainKind::Heightmap, TerrainKind::Caves, TerrainKind::Flat] {
            let a = generator_for(kind, 42).generate(position);
            let b = generator_for(kind, 42).generate(position);
            assert!(a == b, "{kind:?} differs between runs");
        }
    }

    #[test]
    fn flat_terrain_layers() {
        let below = FlatTerrain.generate(Point3::new(0, -1, 0));
        assert_eq!(below.get(Point3::new(5, CHUNK_SIZE - 1, 5)), BlockType::GRASS);
        assert_eq!(below.get(Point3::new(5, CHUNK_SIZE - 2, 5)), BlockType::DIRT);
        assert_eq!(below.get(Point3::new(5, CHUNK_SIZE - 4, 5)), BlockType::DIRT);
        assert_eq!(below.get(Point3::new(5, CHUNK_SIZE - 5, 5)), BlockType::STONE);
        assert_eq!(FlatTerrain.generate(Point3::new(0, 0, 0)).solid_count(), 0);
    }

    #[test]
    fn column_block_fills_water_below_sea_level() {
        assert_eq!(column_block(-5, -10), BlockType::WATER);
        assert_eq!(column_block(5, -10), BlockType::AIR);
        assert_eq!(column_block(-11, -10), BlockType::GRASS);
    }

    #[test]
    fn heightmap_places_grass_on_the_surface() {
        let terrain = HeightmapTerrain::new(7);
        let height = terrain.height_at(10, 20);
        let grass_chunk = (height - 1).div_euclid(CHUNK_SIZE);
        let storage = terrain.generate(Point3::new(0, grass_chunk, 0));
        let local_y = (height - 1).rem_euclid(CHUNK_SIZE);
        assert_eq!(storage.get(Point3::new(10, local_y, 20)), BlockType::GRASS);
        assert_eq!(EmptyTerrain.generate(Point3::new(0, 0, 0)).solid_count(), 0);
    }
}
