//! # Voxel Core
//!
//! Representation of the voxel world: block types, chunks and the chunk graph.
//!
//! ## Architecture
//!
//! * **Block**: block ids, visibility classes and the block registry
//! * **Chunk**: fixed-size cubes of blocks with their mesh state, plus terrain generators
//! * **Position**: world, chunk and chunk-local coordinates
//! * **World**: owns every resident chunk and drives streaming and meshing
//!
//! ## Threading
//!
//! Everything here is owned and mutated by the render thread only and uses no locks.

pub mod block;
pub mod chunk;
pub mod position;
pub mod world;
