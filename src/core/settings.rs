//! # Settings
//!
//! Engine settings read from a flat `KEY = value` file at startup and written back on
//! shutdown. The file is TOML, so the familiar
//!
//! ```text
//! TEXTURE_SIZE = 128
//! VIEW_DISTANCE = 4
//! ```
//!
//! spelling keeps working. Keys that are missing fall back to their defaults and keys the
//! engine does not know about are ignored. A missing file is not an error: the defaults are
//! used and a warning is logged.
//!
//! The core treats every value as a constant for the lifetime of a run.

use std::path::Path;
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::error::EngineError;

/// Largest texture edge the palette accepts.
pub const MAX_TEXTURE_SIZE: u32 = 2048;
/// Largest view distance, in chunks, the world accepts.
pub const MAX_VIEW_DISTANCE: u32 = 32;

/// Which terrain generator the world uses to fill new chunks.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerrainKind {
    /// Fractal heightmap evaluated once per column.
    Heightmap,
    /// 3D noise threshold evaluated per block.
    Caves,
    /// Solid below world height zero, air above.
    Flat,
    /// Every chunk is air.
    Empty,
}

/// All tunable values consumed by the engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Edge length every block texture is resized to.
    #[serde(rename = "TEXTURE_SIZE")]
    pub texture_size: u32,
    /// Radius, in chunks, of the cube kept resident around the viewer.
    #[serde(rename = "VIEW_DISTANCE")]
    pub view_distance: u32,
    /// Target frame rate; the chunk generation budget is derived from it.
    #[serde(rename = "FPS")]
    pub fps: u32,
    /// Worker threads used to decode and resize textures.
    #[serde(rename = "TEXTURE_LOADER_THREADS")]
    pub texture_loader_threads: usize,
    /// Seed fed to the terrain noise.
    #[serde(rename = "WORLD_SEED")]
    pub world_seed: u32,
    /// Terrain generator selection.
    #[serde(rename = "TERRAIN")]
    pub terrain: TerrainKind,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            texture_size: 128,
            view_distance: 4,
            fps: 60,
            texture_loader_threads: 8,
            world_seed: 0,
            terrain: TerrainKind::Heightmap,
        }
    }
}

impl EngineSettings {
    /// Loads settings from `path`, falling back to defaults when the file does not exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed, or if any value
    /// fails [`EngineSettings::validate`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        info!("Loading settings file {}", path.display());

        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    "Unable to read settings file {}, using defaults",
                    path.display()
                );
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(EngineError::SettingsRead {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let settings = Self::parse(&contents).map_err(|source| EngineError::SettingsParse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parses settings from an in-memory `KEY = value` document.
    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Writes the settings to `path`, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        let path = path.as_ref();
        let contents = toml::to_string(self).map_err(|err| EngineError::SettingsWrite {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        std::fs::write(path, contents).map_err(|err| EngineError::SettingsWrite {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        info!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Rejects values the engine cannot run with.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.texture_size.is_power_of_two() || self.texture_size > MAX_TEXTURE_SIZE {
            return Err(EngineError::InvalidSetting {
                key: "TEXTURE_SIZE",
                reason: format!(
                    "{} is not a power of two no larger than {MAX_TEXTURE_SIZE}",
                    self.texture_size
                ),
            });
        }
        if self.view_distance > MAX_VIEW_DISTANCE {
            return Err(EngineError::InvalidSetting {
                key: "VIEW_DISTANCE",
                reason: format!(
                    "{} exceeds the maximum of {MAX_VIEW_DISTANCE} chunks",
                    self.view_distance
                ),
            });
        }
        if self.fps == 0 {
            return Err(EngineError::InvalidSetting {
                key: "FPS",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.texture_loader_threads == 0 {
            return Err(EngineError::InvalidSetting {
                key: "TEXTURE_LOADER_THREADS",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Duration of one frame at the target frame rate.
    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps.max(1)))
    }

    /// Time the streaming loop may spend generating chunks in a single frame.
    ///
    /// Half of the frame is left for meshing, uploads and drawing.
    pub fn generation_budget(&self) -> Duration {
        self.frame_duration() / 2
    }
}

#[cfg(test)]
mod tests {
    use super::{EngineSettings, TerrainKind, MAX_VIEW_DISTANCE};
    use crate::core::EngineError;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let settings = EngineSettings::parse("TEXTURE_SIZE = 64\n").expect("parse settings");
        assert_eq!(settings.texture_size, 64);
        assert_eq!(settings.view_distance, EngineSettings::default().view_distance);
        assert_eq!(settings.terrain, TerrainKind::Heightmap);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let settings =
            EngineSettings::parse("SOME_OTHER_KEY = 3\nFPS = 30\nTERRAIN = \"caves\"\n")
                .expect("parse settings");
        assert_eq!(settings.fps, 30);
        assert_eq!(settings.terrain, TerrainKind::Caves);
    }

    #[test]
    fn validate_rejects_non_power_of_two_texture_size() {
        let settings = EngineSettings {
            texture_size: 100,
            ..EngineSettings::default()
        };
        assert!(settings.validate().is_err());
        assert!(EngineSettings::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_huge_view_distance() {
        let settings = EngineSettings::parse("VIEW_DISTANCE = 100000\n").expect("parse settings");
        assert!(matches!(
            settings.validate(),
            Err(EngineError::InvalidSetting { key: "VIEW_DISTANCE", .. })
        ));

        let at_limit = EngineSettings {
            view_distance: MAX_VIEW_DISTANCE,
            ..EngineSettings::default()
        };
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let path = std::env::temp_dir().join("voxel-world-settings-that-does-not-exist.txt");
        let _ = std::fs::remove_file(&path);
        let settings = EngineSettings::load(&path).expect("defaults");
        assert_eq!(settings, EngineSettings::default());
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = std::env::temp_dir().join(format!("voxel-world-settings-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        let path = dir.join("settings.txt");

        let settings = EngineSettings {
            view_distance: 7,
            world_seed: 99,
            terrain: TerrainKind::Flat,
            ..EngineSettings::default()
        };
        settings.save(&path).expect("save settings");
        let loaded = EngineSettings::load(&path).expect("load settings");
        assert_eq!(loaded, settings);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn generation_budget_is_half_a_frame() {
        let settings = EngineSettings {
            fps: 50,
            ..EngineSettings::default()
        };
        assert_eq!(settings.frame_duration().as_millis(), 20);
        assert_eq!(settings.generation_budget().as_millis(), 10);
    }
}
