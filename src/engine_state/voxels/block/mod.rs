//! # Block Module
//!
//! This module provides the block-related functionality for the voxel engine.
//! It includes block type ids, the block property registry, and block face handling.

pub mod block_side;
pub mod block_type;
pub mod registry;

pub use block_side::BlockSide;
pub use block_type::BlockType;
pub use registry::{BlockProperties, BlockRegistry, Visibility};

/// The underlying integer type used to represent block types in memory.
/// This is used for efficient storage of block data inside chunks.
pub type BlockTypeSize = u8;
