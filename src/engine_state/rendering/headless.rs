//! A render backend without a GPU.
//!
//! Buffers keep the bytes they are given and the backend records every draw, which makes
//! it the backend of choice for tests and for machines where wgpu finds no adapter.

use std::any::Any;

use cgmath::Vector3;
use log::trace;

use super::backend::{GpuBuffers, RenderBackend, TextureArrayData};
use crate::core::EngineError;
use crate::engine_state::voxels::position::ChunkPosition;

/// CPU-side stand-in for a chunk's GPU buffers.
#[derive(Debug)]
pub struct HeadlessBuffers {
    position: ChunkPosition,
    vertices: Vec<u8>,
    indices: Vec<u8>,
    upload_count: usize,
}

impl HeadlessBuffers {
    /// Number of times `update` was called.
    pub fn upload_count(&self) -> usize {
        self.upload_count
    }

    /// Last uploaded vertex bytes.
    pub fn vertex_bytes(&self) -> &[u8] {
        &self.vertices
    }

    /// Last uploaded index bytes.
    pub fn index_bytes(&self) -> &[u8] {
        &self.indices
    }
}

impl GpuBuffers for HeadlessBuffers {
    fn update(&mut self, vertices: &[u8], indices: &[u8]) {
        self.vertices.clear();
        self.vertices.extend_from_slice(vertices);
        self.indices.clear();
        self.indices.extend_from_slice(indices);
        self.upload_count += 1;
        trace!(
            "Chunk {:?} upload #{}: {} vertex bytes, {} index bytes",
            self.position,
            self.upload_count,
            vertices.len(),
            indices.len()
        );
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    /// Chunk the buffers were created for.
    pub position: ChunkPosition,
    /// Translation applied to the chunk.
    pub translation: Vector3<f32>,
    /// Indices drawn.
    pub index_count: u32,
    /// How often the buffers had been uploaded at draw time.
    pub upload_count: usize,
}

/// Backend that records instead of rendering.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    draws: Vec<DrawCall>,
    buffers_created: usize,
    frames: usize,
    texture_array: Option<TextureArrayData>,
}

impl HeadlessBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws recorded since the last call, emptying the record.
    pub fn take_draws(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.draws)
    }

    /// Draws recorded since the last `take_draws`.
    pub fn draws(&self) -> &[DrawCall] {
        &self.draws
    }

    /// Number of chunk buffer pairs created so far.
    pub fn buffers_created(&self) -> usize {
        self.buffers_created
    }

    /// Number of completed frames.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// The uploaded texture array, if any.
    pub fn texture_array(&self) -> Option<&TextureArrayData> {
        self.texture_array.as_ref()
    }
}

impl RenderBackend for HeadlessBackend {
    fn create_chunk_buffers(&mut self, position: ChunkPosition) -> Box<dyn GpuBuffers> {
        self.buffers_created += 1;
        Box::new(HeadlessBuffers {
            position,
            vertices: Vec::new(),
            indices: Vec::new(),
            upload_count: 0,
        })
    }

    fn upload_texture_array(&mut self, texture: &TextureArrayData) -> Result<(), EngineError> {
        self.texture_array = Some(texture.clone());
        Ok(())
    }

    fn draw_chunk(&mut self, buffers: &dyn GpuBuffers, translation: Vector3<f32>, index_count: u32) {
        let (position, upload_count) = match buffers.as_any().downcast_ref::<HeadlessBuffers>() {
            Some(buffers) => (buffers.position, buffers.upload_count),
            None => (ChunkPosition::new(0, 0, 0), 0),
        };
        self.draws.push(DrawCall {
            position,
            translation,
            index_count,
            upload_count,
        });
    }

    fn end_frame(&mut self) -> Result<(), EngineError> {
        self.frames += 1;
        Ok(())
    }
}
