//! # Engine State Module
//!
//! Wires the subsystems together and runs one frame at a time.
//!
//! ## Key Components
//!
//! * `EngineState` - Owns the settings, the texture palette, the world and the backend
//! * `camera_state` - The viewpoint the world streams around
//! * `rendering` - Meshing, textures and render backends
//! * `task_management` - Worker pool for texture loading
//! * `voxels` - Block types, chunks and the world
//!
//! ## Startup Order
//!
//! Textures are registered and the palette is built before any block is registered,
//! because block properties store the resolved texture layer. The world is created last.

use log::{debug, info};
use web_time::Instant;

use crate::core::{EngineError, EngineSettings};
use camera_state::Camera;
use rendering::backend::RenderBackend;
use rendering::palette::TexturePalette;
use voxels::block::block_type::DEFAULT_TEXTURES;
use voxels::block::BlockRegistry;
use voxels::world::{RenderStats, World};

pub mod camera_state;
pub mod rendering;
pub mod task_management;
pub mod voxels;

/// Counters describing one frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    /// Chunks generated this frame.
    pub generated: usize,
    /// Meshing, upload and draw counters of the render walk.
    pub render: RenderStats,
}

/// The main state container for the voxel engine.
pub struct EngineState {
    settings: EngineSettings,
    palette: TexturePalette,
    world: World,
    backend: Box<dyn RenderBackend>,
    frame_count: u64,
}

impl EngineState {
    /// Builds the palette, the block registry and the world on top of `backend`.
    ///
    /// # Errors
    /// Fails if the palette cannot be built or a default block references a texture the
    /// palette does not know.
    pub fn new(
        settings: EngineSettings,
        mut backend: Box<dyn RenderBackend>,
    ) -> Result<Self, EngineError> {
        let mut palette = TexturePalette::new();
        for (name, path) in DEFAULT_TEXTURES.entries() {
            palette.register_texture(*path, *name)?;
        }
        palette.build(
            backend.as_mut(),
            settings.texture_size,
            settings.texture_loader_threads,
        )?;

        let registry = BlockRegistry::with_default_blocks(&palette)?;
        let world = World::from_settings(registry, &settings);
        info!(
            "Engine ready: {} block types, view distance {}, {:?} terrain",
            world.registry().len(),
            settings.view_distance,
            settings.terrain
        );

        Ok(Self {
            settings,
            palette,
            world,
            backend,
            frame_count: 0,
        })
    }

    /// Runs one frame: generate within budget, then mesh, upload and draw around `camera`.
    ///
    /// # Errors
    /// Fails on an unregistered block or when the backend cannot finish the frame.
    pub fn frame(&mut self, camera: &Camera) -> Result<FrameStats, EngineError> {
        let start = Instant::now();
        self.backend.set_camera(camera);
        self.backend.begin_frame();

        let generated = self.world.update()?;
        let render = self.world.render(self.backend.as_mut(), camera.position)?;
        self.backend.end_frame()?;

        self.frame_count += 1;
        debug!(
            "Frame {} took {:?}: {} generated, {} drawn",
            self.frame_count,
            start.elapsed(),
            generated,
            render.drawn
        );
        Ok(FrameStats { generated, render })
    }

    /// The settings the engine was started with.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// The built texture palette.
    pub fn palette(&self) -> &TexturePalette {
        &self.palette
    }

    /// The world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the world, for block edits.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Frames run so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}
