//! Per-direction quad templates used when emitting a block face.

use crate::engine_state::voxels::block::BlockSide;

/// One corner of a face template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceCorner {
    /// Offset from the block's minimum corner, each component 0 or 1.
    pub offset: [u16; 3],
    /// Quad corner, `u + 2 * v`.
    pub uv_corner: u8,
}

const fn corner(x: u16, y: u16, z: u16, u: u8, v: u8) -> FaceCorner {
    FaceCorner {
        offset: [x, y, z],
        uv_corner: u + 2 * v,
    }
}

/// The four corners of each face, indexed by `BlockSide`.
///
/// Every template walks the quad in the same rotational order so the two index orders
/// below produce outward facing triangles.
pub static FACE_CORNERS: [[FaceCorner; 4]; 6] = [
    // X_POS
    [
        corner(1, 1, 1, 1, 1),
        corner(1, 1, 0, 1, 0),
        corner(1, 0, 0, 0, 0),
        corner(1, 0, 1, 0, 1),
    ],
    // X_NEG
    [
        corner(0, 1, 1, 1, 1),
        corner(0, 1, 0, 1, 0),
        corner(0, 0, 0, 0, 0),
        corner(0, 0, 1, 0, 1),
    ],
    // Y_POS
    [
        corner(1, 1, 1, 1, 1),
        corner(0, 1, 1, 1, 0),
        corner(0, 1, 0, 0, 0),
        corner(1, 1, 0, 0, 1),
    ],
    // Y_NEG
    [
        corner(1, 0, 1, 1, 1),
        corner(0, 0, 1, 1, 0),
        corner(0, 0, 0, 0, 0),
        corner(1, 0, 0, 0, 1),
    ],
    // Z_POS
    [
        corner(1, 1, 1, 1, 1),
        corner(1, 0, 1, 1, 0),
        corner(0, 0, 1, 0, 0),
        corner(0, 1, 1, 0, 1),
    ],
    // Z_NEG
    [
        corner(1, 1, 0, 1, 1),
        corner(1, 0, 0, 1, 0),
        corner(0, 0, 0, 0, 0),
        corner(0, 1, 0, 0, 1),
    ],
];

/// Triangle order for faces on a positive axis.
pub const POSITIVE_FACE_INDICES: [u32; 6] = [3, 1, 0, 3, 2, 1];
/// Triangle order for faces on a negative axis.
pub const NEGATIVE_FACE_INDICES: [u32; 6] = [0, 1, 3, 1, 2, 3];

/// Corner template of `side`.
pub fn face_corners(side: BlockSide) -> &'static [FaceCorner; 4] {
    &FACE_CORNERS[side as usize]
}

/// Index order of `side`, relative to the face's first corner.
pub fn face_indices(side: BlockSide) -> &'static [u32; 6] {
    if side.is_positive() {
        &POSITIVE_FACE_INDICES
    } else {
        &NEGATIVE_FACE_INDICES
    }
}
