//! # Engine Errors
//!
//! The single error type shared by every subsystem of the engine.
//!
//! Errors fall into three groups:
//! - **Setup errors** (`UnregisteredBlock`, `UnknownTexture`, `PaletteNotBuilt`,
//!   `TooManyTextures`, settings errors). These are programming or ordering mistakes and
//!   abort startup.
//! - **Resource errors** (`TextureLoad`). Reported through the log and replaced by the
//!   palette's placeholder layer, never propagated out of `TexturePalette::build`.
//! - **Platform errors** (`GpuUnavailable`). The demo falls back to the headless backend.
//!
//! Missing neighbour chunks are not errors at all; the world retries them every frame.

use std::path::PathBuf;

use thiserror::Error;

use crate::engine_state::voxels::block::BlockTypeSize;

/// Errors that can occur while setting up or running the engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A block id was looked up in the registry without ever being registered.
    #[error("block type {0} has no registry entry")]
    UnregisteredBlock(BlockTypeSize),

    /// A texture name was looked up that was never registered with the palette.
    #[error("texture '{0}' was never registered with the palette")]
    UnknownTexture(String),

    /// A texture layer was requested before the palette finished building.
    #[error("texture palette has not been built yet")]
    PaletteNotBuilt,

    /// A texture was registered after the palette was already uploaded.
    #[error("texture palette is already built, '{0}' cannot be added")]
    PaletteAlreadyBuilt(String),

    /// The palette would need more layers than a vertex can address.
    #[error("texture palette needs {count} layers but at most {max} are addressable")]
    TooManyTextures {
        /// Number of layers requested (including the placeholder layer).
        count: usize,
        /// Maximum number of layers.
        max: usize,
    },

    /// A texture file could not be opened or decoded.
    #[error("failed to load texture {}: {source}", path.display())]
    TextureLoad {
        /// Path of the offending file.
        path: PathBuf,
        /// Decoder error.
        #[source]
        source: image::ImageError,
    },

    /// The settings file exists but could not be read.
    #[error("failed to read settings file {}: {source}", path.display())]
    SettingsRead {
        /// Path of the settings file.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid TOML or has wrongly typed values.
    #[error("failed to parse settings file {}: {source}", path.display())]
    SettingsParse {
        /// Path of the settings file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// The settings could not be written back to disk.
    #[error("failed to write settings file {}: {reason}", path.display())]
    SettingsWrite {
        /// Path of the settings file.
        path: PathBuf,
        /// Serialization or IO failure description.
        reason: String,
    },

    /// A setting parsed fine but holds a value the engine cannot run with.
    #[error("invalid value for setting {key}: {reason}")]
    InvalidSetting {
        /// Settings key.
        key: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// No usable GPU adapter or device could be acquired.
    #[error("gpu unavailable: {0}")]
    GpuUnavailable(String),
}
