//! wgpu implementation of the render backend.
//!
//! Renders into an offscreen color target so it works without a window. The pipeline
//! binds three groups:
//!
//! | group | contents                               |
//! |-------|----------------------------------------|
//! | 0     | camera view-projection uniform         |
//! | 1     | block texture array and its sampler    |
//! | 2     | per-chunk translation uniform          |
//!
//! Draws are recorded during the frame and encoded into a single render pass in
//! `end_frame`.

use std::any::Any;

use cgmath::{Deg, Vector3};
use log::{debug, info, warn};
use wgpu::util::DeviceExt;

use super::backend::{GpuBuffers, RenderBackend, TextureArrayData};
use super::texture::Texture;
use super::vertex::Vertex;
use crate::core::EngineError;
use crate::engine_state::camera_state::{Camera, CameraUniform, Projection};
use crate::engine_state::voxels::position::ChunkPosition;

const CHUNK_SHADER: &str = include_str!("../../../assets/shaders/chunk.wgsl");

/// Initial buffer capacity in bytes; buffers grow to the next power of two when exceeded.
const INITIAL_BUFFER_CAPACITY: u64 = 4096;

/// A chunk's buffers on the GPU.
pub struct WgpuChunkBuffers {
    position: ChunkPosition,
    device: wgpu::Device,
    queue: wgpu::Queue,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    translation_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl WgpuChunkBuffers {
    fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        position: ChunkPosition,
    ) -> Self {
        let vertex_buffer = create_buffer(device, "Chunk Vertex Buffer", INITIAL_BUFFER_CAPACITY, wgpu::BufferUsages::VERTEX);
        let index_buffer = create_buffer(device, "Chunk Index Buffer", INITIAL_BUFFER_CAPACITY, wgpu::BufferUsages::INDEX);
        let translation_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Chunk Translation Buffer"),
            contents: bytemuck::cast_slice(&[0.0f32; 4]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Chunk Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: translation_buffer.as_entire_binding(),
            }],
        });

        Self {
            position,
            device: device.clone(),
            queue: queue.clone(),
            vertex_buffer,
            index_buffer,
            translation_buffer,
            bind_group,
        }
    }

    /// Writes `data` into `buffer`, replacing it with a larger one when it does not fit.
    fn write(&mut self, data: &[u8], vertex: bool) {
        let (buffer, label, usage) = if vertex {
            (&mut self.vertex_buffer, "Chunk Vertex Buffer", wgpu::BufferUsages::VERTEX)
        } else {
            (&mut self.index_buffer, "Chunk Index Buffer", wgpu::BufferUsages::INDEX)
        };

        let needed = data.len() as u64;
        if needed > buffer.size() {
            let capacity = needed.next_power_of_two();
            debug!(
                "Growing {} of chunk {:?} to {} bytes",
                label, self.position, capacity
            );
            *buffer = create_buffer(&self.device, label, capacity, usage);
        }
        if !data.is_empty() {
            self.queue.write_buffer(buffer, 0, data);
        }
    }
}

impl GpuBuffers for WgpuChunkBuffers {
    fn update(&mut self, vertices: &[u8], indices: &[u8]) {
        self.write(vertices, true);
        self.write(indices, false);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn create_buffer(device: &wgpu::Device, label: &str, size: u64, usage: wgpu::BufferUsages) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: usage | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// A draw recorded during the frame.
struct PendingDraw {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    index_count: u32,
}

/// Offscreen wgpu renderer for chunk meshes.
pub struct WgpuRenderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    render_pipeline: wgpu::RenderPipeline,
    camera_uniform: CameraUniform,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    projection: Projection,
    texture_bind_group_layout: wgpu::BindGroupLayout,
    texture_bind_group: Option<wgpu::BindGroup>,
    chunk_bind_group_layout: wgpu::BindGroupLayout,
    color_target: Texture,
    depth_texture: Texture,
    draws: Vec<PendingDraw>,
}

impl WgpuRenderer {
    /// Acquires an adapter and device and builds the chunk pipeline.
    ///
    /// # Arguments
    /// * `width`, `height` - Size of the offscreen render target
    ///
    /// # Errors
    /// `EngineError::GpuUnavailable` when no adapter or device can be acquired.
    pub fn new_headless(width: u32, height: u32) -> Result<Self, EngineError> {
        pollster::block_on(Self::new_async(width, height))
    }

    async fn new_async(width: u32, height: u32) -> Result<Self, EngineError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|err| EngineError::GpuUnavailable(err.to_string()))?;
        info!("Using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                label: None,
                memory_hints: wgpu::MemoryHints::MemoryUsage,
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|err| EngineError::GpuUnavailable(err.to_string()))?;

        let camera_uniform = CameraUniform::new();
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group_layout = uniform_layout(&device, "Camera Bind Group Layout", wgpu::ShaderStages::VERTEX);
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let texture_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Texture Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2Array,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let chunk_bind_group_layout = uniform_layout(&device, "Chunk Bind Group Layout", wgpu::ShaderStages::VERTEX);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Chunk Render Pipeline Layout"),
            bind_group_layouts: &[
                &camera_bind_group_layout,
                &texture_bind_group_layout,
                &chunk_bind_group_layout,
            ],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Chunk Shader"),
            source: wgpu::ShaderSource::Wgsl(CHUNK_SHADER.into()),
        });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Chunk Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[Vertex::desc()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: Texture::COLOR_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: Texture::DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let color_target = Texture::create_color_target(&device, width, height, "Color Target");
        let depth_texture = Texture::create_depth_texture(&device, width, height, "Depth Texture");

        Ok(Self {
            device,
            queue,
            render_pipeline,
            camera_uniform,
            camera_buffer,
            camera_bind_group,
            projection: Projection::new(width, height, Deg(70.0), 0.1, 1000.0),
            texture_bind_group_layout,
            texture_bind_group: None,
            chunk_bind_group_layout,
            color_target,
            depth_texture,
            draws: Vec::new(),
        })
    }
}

fn uniform_layout(device: &wgpu::Device, label: &str, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

impl RenderBackend for WgpuRenderer {
    fn create_chunk_buffers(&mut self, position: ChunkPosition) -> Box<dyn GpuBuffers> {
        Box::new(WgpuChunkBuffers::new(
            &self.device,
            &self.queue,
            &self.chunk_bind_group_layout,
            position,
        ))
    }

    fn upload_texture_array(&mut self, texture: &TextureArrayData) -> Result<(), EngineError> {
        let array = Texture::create_block_texture_array(&self.device, &self.queue, texture);
        self.texture_bind_group = Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Texture Bind Group"),
            layout: &self.texture_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&array.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&array.sampler),
                },
            ],
        }));
        info!(
            "Uploaded texture array: {} layers of {}x{}, {} mips",
            texture.layer_count, texture.size, texture.size, texture.mip_level_count
        );
        Ok(())
    }

    fn draw_chunk(&mut self, buffers: &dyn GpuBuffers, translation: Vector3<f32>, index_count: u32) {
        let Some(buffers) = buffers.as_any().downcast_ref::<WgpuChunkBuffers>() else {
            warn!("Skipping draw of buffers not created by the wgpu backend");
            return;
        };
        let translation: [f32; 4] = [translation.x, translation.y, translation.z, 0.0];
        self.queue
            .write_buffer(&buffers.translation_buffer, 0, bytemuck::cast_slice(&translation));
        self.draws.push(PendingDraw {
            vertex_buffer: buffers.vertex_buffer.clone(),
            index_buffer: buffers.index_buffer.clone(),
            bind_group: buffers.bind_group.clone(),
            index_count,
        });
    }

    fn set_camera(&mut self, camera: &Camera) {
        self.camera_uniform.update_view_proj(camera, &self.projection);
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[self.camera_uniform]));
    }

    fn begin_frame(&mut self) {
        self.draws.clear();
    }

    fn end_frame(&mut self) -> Result<(), EngineError> {
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Chunk Render Encoder"),
        });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Chunk Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.color_target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            match &self.texture_bind_group {
                Some(texture_bind_group) => {
                    render_pass.set_pipeline(&self.render_pipeline);
                    render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
                    render_pass.set_bind_group(1, texture_bind_group, &[]);
                    for draw in &self.draws {
                        render_pass.set_bind_group(2, &draw.bind_group, &[]);
                        render_pass.set_vertex_buffer(0, draw.vertex_buffer.slice(..));
                        render_pass.set_index_buffer(draw.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                        render_pass.draw_indexed(0..draw.index_count, 0, 0..1);
                    }
                }
                None if !self.draws.is_empty() => {
                    warn!("No texture array uploaded, skipping {} chunk draws", self.draws.len());
                }
                None => {}
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        debug!("Submitted frame with {} chunk draws", self.draws.len());
        self.draws.clear();
        Ok(())
    }
}
