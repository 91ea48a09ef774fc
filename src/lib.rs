#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel World
//!
//! A chunked voxel world engine built with Rust and WGPU.
//!
//! The world is split into 32³ chunks that are generated around a viewpoint under a
//! per-frame time budget, meshed with hidden-face culling and drawn through a render
//! backend. Block textures are loaded in parallel into a single layered texture.
//!
//! ## Key Modules
//!
//! * `core` - Errors and settings shared by every subsystem
//! * `engine_state` - Voxels, meshing, rendering and task management
//!
//! ## Usage
//!
//! ```no_run
//! fn main() {
//!     voxel_world::run();
//! }
//! ```

use cgmath::{Deg, Point3, Rad};
use log::{error, info, warn};

use crate::core::{EngineError, EngineSettings};
use crate::engine_state::camera_state::Camera;
use crate::engine_state::rendering::backend::RenderBackend;
use crate::engine_state::rendering::headless::HeadlessBackend;
use crate::engine_state::rendering::wgpu_backend::WgpuRenderer;
use crate::engine_state::EngineState;

pub mod core;
pub mod engine_state;

/// File the settings are read from at startup and written back to on shutdown.
pub const SETTINGS_PATH: &str = "settings.txt";

const DEMO_FRAMES: u32 = 600;
const RENDER_WIDTH: u32 = 1280;
const RENDER_HEIGHT: u32 = 720;

/// Runs the engine: load settings, stream the world around a moving camera, save settings.
///
/// Exits the process with a non-zero status on error.
pub fn run() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();
    info!("Logger initialized");

    if let Err(err) = run_frames(SETTINGS_PATH, DEMO_FRAMES) {
        error!("{err}");
        std::process::exit(1);
    }
}

fn run_frames(settings_path: &str, frames: u32) -> Result<(), EngineError> {
    let settings = EngineSettings::load(settings_path)?;

    let backend: Box<dyn RenderBackend> = match WgpuRenderer::new_headless(RENDER_WIDTH, RENDER_HEIGHT) {
        Ok(renderer) => Box::new(renderer),
        Err(err) => {
            warn!("{err}, falling back to the headless backend");
            Box::new(HeadlessBackend::new())
        }
    };

    let mut engine = EngineState::new(settings, backend)?;
    let mut camera = Camera::new(Point3::new(0.5, 40.0, 0.5), Deg(0.0), Deg(-20.0));

    for frame in 0..frames {
        let stats = engine.frame(&camera)?;
        if frame % 60 == 0 {
            info!(
                "Frame {frame} at {:?}: {} chunks resident, {} pending, {} drawn",
                camera.position,
                engine.world().chunk_count(),
                engine.world().pending_generation(),
                stats.render.drawn
            );
        }
        camera.advance(0.5, Rad(0.002));
    }

    engine.settings().save(settings_path)
}
