//! Mesh construction for voxel rendering.
//!
//! - [`Mesh`]: deduplicated vertex and index lists of one chunk
//! - `face`: per-direction quad templates and triangle orders

mod face;
mod mesh;

pub use face::{face_corners, face_indices, FaceCorner};
pub use mesh::Mesh;
