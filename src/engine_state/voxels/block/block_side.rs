//! # Block Side Module
//!
//! This module defines the six axis-aligned faces of a voxel block and the direction
//! arithmetic the mesh generator needs to find the block behind each face.

use cgmath::Vector3;
use num_derive::FromPrimitive;

/// Represents the six possible faces of a voxel block.
///
/// Positive directions have even discriminants and negative directions odd ones. The mesh
/// generator relies on this to pick the triangle winding of a face.
///
/// The order is: [X_POS, X_NEG, Y_POS, Y_NEG, Z_POS, Z_NEG]
#[allow(non_camel_case_types)]
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug, FromPrimitive)]
pub enum BlockSide {
    /// The face pointing towards positive X
    X_POS = 0,

    /// The face pointing towards negative X
    X_NEG = 1,

    /// The face pointing towards positive Y (top)
    Y_POS = 2,

    /// The face pointing towards negative Y (bottom)
    Y_NEG = 3,

    /// The face pointing towards positive Z
    Z_POS = 4,

    /// The face pointing towards negative Z
    Z_NEG = 5,
}

impl BlockSide {
    /// Returns an array containing all six block faces in discriminant order.
    ///
    /// # Returns
    /// An array containing all `BlockSide` variants.
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::X_POS,
            BlockSide::X_NEG,
            BlockSide::Y_POS,
            BlockSide::Y_NEG,
            BlockSide::Z_POS,
            BlockSide::Z_NEG,
        ]
    }

    /// Whether the face points along a positive axis.
    pub fn is_positive(self) -> bool {
        (self as u8) % 2 == 0
    }

    /// The face on the other side of the same axis.
    pub fn opposite(self) -> BlockSide {
        match self {
            BlockSide::X_POS => BlockSide::X_NEG,
            BlockSide::X_NEG => BlockSide::X_POS,
            BlockSide::Y_POS => BlockSide::Y_NEG,
            BlockSide::Y_NEG => BlockSide::Y_POS,
            BlockSide::Z_POS => BlockSide::Z_NEG,
            BlockSide::Z_NEG => BlockSide::Z_POS,
        }
    }

    /// Unit offset from a block to the block behind this face.
    ///
    /// The same offset moves from a chunk coordinate to the neighbouring chunk on this side.
    pub fn normal(self) -> Vector3<i32> {
        match self {
            BlockSide::X_POS => Vector3::new(1, 0, 0),
            BlockSide::X_NEG => Vector3::new(-1, 0, 0),
            BlockSide::Y_POS => Vector3::new(0, 1, 0),
            BlockSide::Y_NEG => Vector3::new(0, -1, 0),
            BlockSide::Z_POS => Vector3::new(0, 0, 1),
            BlockSide::Z_NEG => Vector3::new(0, 0, -1),
        }
    }

    /// Recovers a side from its packed discriminant.
    pub fn from_index(index: u8) -> Option<BlockSide> {
        num_traits::FromPrimitive::from_u8(index)
    }
}
