//! Rendering system for the voxel engine.
//!
//! This module turns chunk storage into GPU-ready geometry and hands it to a backend.
//! The voxel core only sees the `RenderBackend` and `GpuBuffers` traits; the wgpu
//! renderer and the recording headless backend both implement them.
//!
//! ## Key Components
//! - `meshing`: face culling mesh generation with an interior cache
//! - `palette`: texture name to array layer mapping, loaded on a worker pool
//! - `vertex`: the packed vertex format shared by the mesher and the shader
//! - `wgpu_backend` / `headless`: the two backends

pub mod backend;
pub mod headless;
pub mod meshing;
pub mod palette;
pub mod tasks;
pub mod texture;
pub mod vertex;
pub mod wgpu_backend;

// Re-export commonly used types
pub use backend::{GpuBuffers, RenderBackend};
pub use palette::TexturePalette;
pub use vertex::Vertex;
