//! Background tasks for the rendering system.
//!
//! # Available Tasks
//! - `TextureLoadTask`: decodes, resizes and mip-maps one block texture

pub mod texture_load_task;
