//! # Position Module
//!
//! Coordinate spaces of the voxel world and the conversions between them.
//!
//! - **World position**: a block anywhere in the world, any integer.
//! - **Chunk position**: a whole chunk, world position divided by `CHUNK_SIZE` rounding
//!   towards negative infinity.
//! - **Local position**: a block inside its chunk, always in `[0, CHUNK_SIZE)`.
//!
//! Floor division and floor modulo keep negative coordinates consistent: world `-1` is the
//! last block of chunk `-1`, not the first block of chunk `0`.

use cgmath::{Point3, Vector3};

/// Edge length of a chunk in blocks. Vertex positions are packed assuming this value.
pub const CHUNK_SIZE: i32 = 32;
/// Number of blocks in one horizontal plane of a chunk.
pub const CHUNK_PLANE_SIZE: usize = (CHUNK_SIZE * CHUNK_SIZE) as usize;
/// Number of blocks in a chunk.
pub const CHUNK_VOLUME: usize = CHUNK_PLANE_SIZE * CHUNK_SIZE as usize;

/// A chunk coordinate.
pub type ChunkPosition = Point3<i32>;
/// A world or chunk-local block coordinate.
pub type BlockPosition = Point3<i32>;

/// Chunk coordinate owning the world coordinate `c` along one axis.
pub fn world_to_chunk(c: i32) -> i32 {
    c.div_euclid(CHUNK_SIZE)
}

/// Local coordinate of the world coordinate `c` along one axis.
pub fn world_to_local(c: i32) -> i32 {
    c.rem_euclid(CHUNK_SIZE)
}

/// Chunk owning a world position.
pub fn chunk_of(world: BlockPosition) -> ChunkPosition {
    Point3::new(
        world_to_chunk(world.x),
        world_to_chunk(world.y),
        world_to_chunk(world.z),
    )
}

/// Position of a world block inside its chunk.
pub fn local_of(world: BlockPosition) -> BlockPosition {
    Point3::new(
        world_to_local(world.x),
        world_to_local(world.y),
        world_to_local(world.z),
    )
}

/// World position of the local block `local` inside chunk `chunk`.
pub fn local_to_world(chunk: ChunkPosition, local: BlockPosition) -> BlockPosition {
    Point3::new(
        chunk.x * CHUNK_SIZE + local.x,
        chunk.y * CHUNK_SIZE + local.y,
        chunk.z * CHUNK_SIZE + local.z,
    )
}

/// World-space offset of the chunk's origin corner, used as its draw translation.
pub fn chunk_translation(chunk: ChunkPosition) -> Vector3<f32> {
    Vector3::new(
        (chunk.x * CHUNK_SIZE) as f32,
        (chunk.y * CHUNK_SIZE) as f32,
        (chunk.z * CHUNK_SIZE) as f32,
    )
}

/// Whether a local position lies inside a chunk.
pub fn in_chunk_bounds(local: BlockPosition) -> bool {
    (0..CHUNK_SIZE).contains(&local.x)
        && (0..CHUNK_SIZE).contains(&local.y)
        && (0..CHUNK_SIZE).contains(&local.z)
}
