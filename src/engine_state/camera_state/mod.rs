//! # Camera State Management
//!
//! The viewpoint streamed around and the projection the GPU backend renders with.

pub mod camera;

pub use camera::{Camera, CameraUniform, Projection};
