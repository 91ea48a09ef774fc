//! # Core Module
//!
//! Types shared by every subsystem of the engine that do not belong to voxels or rendering.
//!
//! ## Key Components
//! - `EngineError`: the crate-wide error type
//! - `EngineSettings`: values read from the settings file and treated as constants for a run
//!
//! ## Usage
//! ```no_run
//! use voxel_world::core::EngineSettings;
//!
//! let settings = EngineSettings::load("settings.txt").expect("settings");
//! assert!(settings.fps > 0);
//! ```

pub mod error;
pub mod settings;

pub use error::EngineError;
pub use settings::{EngineSettings, TerrainKind};
