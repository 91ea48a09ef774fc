//! # Texture Palette
//!
//! Collects every block texture into one layered texture and hands out layer indices.
//!
//! Usage follows a strict order:
//! 1. `register_texture` for every texture, which only queues the file
//! 2. `build`, which decodes and resizes all queued files on a worker pool, waits for
//!    all of them, then uploads the layered texture from the calling thread
//! 3. `get_layer` by name; layer numbers depend on load completion order and must never
//!    be hardcoded
//!
//! Layer 0 is reserved for a generated magenta and black checkerboard. Any texture that
//! fails to load is logged and resolved to that layer, so a broken file shows up as an
//! obvious placeholder instead of aborting startup.

use std::collections::HashMap;
use std::path::PathBuf;

use image::{Rgba, RgbaImage};
use log::{error, info, warn};
use web_time::Instant;

use super::backend::{mip_level_count, RenderBackend, TextureArrayData};
use super::tasks::texture_load_task::{build_mip_chain, TextureLoadTask};
use crate::core::EngineError;
use crate::engine_state::task_management::TaskManager;

/// Most layers a vertex can address.
pub const MAX_TEXTURE_LAYERS: usize = 256;
/// Layer holding the placeholder texture.
pub const MISSING_TEXTURE_LAYER: u8 = 0;

const MISSING_CHECKER_CELLS: u32 = 8;
const MISSING_COLORS: [Rgba<u8>; 2] = [Rgba([255, 0, 255, 255]), Rgba([0, 0, 0, 255])];

/// Name to texture array layer mapping.
#[derive(Debug, Default)]
pub struct TexturePalette {
    queued: Vec<(String, PathBuf)>,
    layers: HashMap<String, u8>,
    layer_count: u32,
    built: bool,
}

impl TexturePalette {
    /// Creates an empty palette.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `path` to be loaded under `name`. Registering a name twice keeps the last path.
    ///
    /// # Errors
    /// Returns `EngineError::PaletteAlreadyBuilt` once `build` has run.
    pub fn register_texture(
        &mut self,
        path: impl Into<PathBuf>,
        name: impl Into<String>,
    ) -> Result<(), EngineError> {
        let name = name.into();
        if self.built {
            return Err(EngineError::PaletteAlreadyBuilt(name));
        }
        let path = path.into();
        match self.queued.iter_mut().find(|(queued, _)| *queued == name) {
            Some(entry) => entry.1 = path,
            None => self.queued.push((name, path)),
        }
        Ok(())
    }

    /// Loads every queued texture and uploads the texture array through `backend`.
    ///
    /// # Arguments
    /// * `backend` - Receives the finished texture array
    /// * `texture_size` - Edge length every texture is resized to
    /// * `threads` - Number of loader threads
    ///
    /// # Errors
    /// Fails when more textures are queued than layers exist or the upload fails.
    /// Individual load failures are logged and mapped to the placeholder layer.
    pub fn build(
        &mut self,
        backend: &mut dyn RenderBackend,
        texture_size: u32,
        threads: usize,
    ) -> Result<(), EngineError> {
        if self.built {
            warn!("Texture palette already built, ignoring rebuild");
            return Ok(());
        }
        let count = self.queued.len() + 1;
        if count > MAX_TEXTURE_LAYERS {
            return Err(EngineError::TooManyTextures {
                count,
                max: MAX_TEXTURE_LAYERS,
            });
        }

        let start = Instant::now();
        let tasks = self
            .queued
            .drain(..)
            .map(|(name, path)| TextureLoadTask::new(name, path, texture_size))
            .collect();
        let loaded = TaskManager::new(threads).run_to_completion(tasks);

        let mut data = build_mip_chain(&missing_texture(texture_size));
        let mut next_layer = u32::from(MISSING_TEXTURE_LAYER) + 1;
        for texture in loaded {
            match texture.mips {
                Ok(mips) => {
                    data.extend_from_slice(&mips);
                    self.layers.insert(texture.name, next_layer as u8);
                    next_layer += 1;
                }
                Err(err) => {
                    error!("{err}; '{}' uses the placeholder texture", texture.name);
                    self.layers.insert(texture.name, MISSING_TEXTURE_LAYER);
                }
            }
        }
        self.layer_count = next_layer;

        backend.upload_texture_array(&TextureArrayData {
            size: texture_size,
            mip_level_count: mip_level_count(texture_size),
            layer_count: self.layer_count,
            data,
        })?;
        self.built = true;

        info!(
            "Texture palette built: {} names on {} layers of {texture_size}px in {:?}",
            self.layers.len(),
            self.layer_count,
            start.elapsed()
        );
        Ok(())
    }

    /// Layer of the texture registered as `name`.
    ///
    /// # Errors
    /// `PaletteNotBuilt` before `build`, `UnknownTexture` for names never registered.
    pub fn get_layer(&self, name: &str) -> Result<u8, EngineError> {
        if !self.built {
            return Err(EngineError::PaletteNotBuilt);
        }
        self.layers
            .get(name)
            .copied()
            .ok_or_else(|| EngineError::UnknownTexture(name.to_string()))
    }

    /// Number of layers in the uploaded texture, placeholder included.
    pub fn layer_count(&self) -> u32 {
        self.layer_count
    }

    /// Layer holding the placeholder texture.
    pub fn missing_layer(&self) -> u8 {
        MISSING_TEXTURE_LAYER
    }

    /// Whether `build` has completed.
    pub fn is_built(&self) -> bool {
        self.built
    }
}

fn missing_texture(size: u32) -> RgbaImage {
    let cell = (size / MISSING_CHECKER_CELLS).max(1);
    RgbaImage::from_fn(size, size, |x, y| {
        MISSING_COLORS[(((x / cell) + (y / cell)) % 2) as usize]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::rendering::headless::HeadlessBackend;
    use std::collections::HashSet;
    use std::path::Path;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("voxel-world-palette-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    fn write_png(dir: &Path, name: &str, color: [u8; 4]) -> PathBuf {
        let path = dir.join(format!("{name}.png"));
        RgbaImage::from_pixel(4, 4, Rgba(color)).save(&path).expect("write png");
        path
    }

    #[test]
    fn lookups_fail_before_build() {
        let mut palette = TexturePalette::new();
        palette.register_texture("stone.png", "stone").expect("register");
        assert!(matches!(palette.get_layer("stone"), Err(EngineError::PaletteNotBuilt)));
    }

    #[test]
    fn layers_are_distinct_and_point_at_their_pixels() {
        let dir = temp_dir("distinct");
        let mut palette = TexturePalette::new();
        let colors: Vec<(String, [u8; 4])> = (0..6u8)
            .map(|i| (format!("tex{i}"), [i * 40, 255 - i * 40, i, 255]))
            .collect();
        for (name, color) in &colors {
            palette
                .register_texture(write_png(&dir, name, *color), name.clone())
                .expect("register");
        }

        let mut backend = HeadlessBackend::new();
        palette.build(&mut backend, 4, 3).expect("build");
        assert_eq!(palette.layer_count(), 7);

        let texture = backend.texture_array().expect("uploaded");
        let mut seen = HashSet::new();
        for (name, color) in &colors {
            let layer = palette.get_layer(name).expect("registered");
            assert_ne!(layer, palette.missing_layer());
            assert!(seen.insert(layer), "layer {layer} handed out twice");
            assert_eq!(&texture.layer_pixels(u32::from(layer))[..4], color);
        }

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn broken_textures_use_the_placeholder_layer() {
        let dir = temp_dir("broken");
        let good = write_png(&dir, "good", [1, 1, 1, 255]);
        let corrupt = dir.join("corrupt.png");
        std::fs::write(&corrupt, b"not a png").expect("write corrupt file");

        let mut palette = TexturePalette::new();
        palette.register_texture(good, "good").expect("register");
        palette.register_texture(corrupt, "corrupt").expect("register");
        palette.register_texture(dir.join("absent.png"), "absent").expect("register");

        let mut backend = HeadlessBackend::new();
        palette.build(&mut backend, 8, 2).expect("build");

        assert_eq!(palette.get_layer("corrupt").ok(), Some(MISSING_TEXTURE_LAYER));
        assert_eq!(palette.get_layer("absent").ok(), Some(MISSING_TEXTURE_LAYER));
        assert_eq!(palette.get_layer("good").ok(), Some(1));
        assert_eq!(palette.layer_count(), 2);
        let placeholder = backend.texture_array().expect("uploaded").layer_pixels(0);
        assert_eq!(&placeholder[..4], &[255, 0, 255, 255]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn unknown_names_and_late_registration_fail() {
        let mut palette = TexturePalette::new();
        let mut backend = HeadlessBackend::new();
        palette.build(&mut backend, 4, 1).expect("build");
        assert!(matches!(palette.get_layer("nope"), Err(EngineError::UnknownTexture(_))));
        assert!(matches!(
            palette.register_texture("late.png", "late"),
            Err(EngineError::PaletteAlreadyBuilt(_))
        ));
    }

    #[test]
    fn too_many_textures_is_rejected() {
        let mut palette = TexturePalette::new();
        for i in 0..MAX_TEXTURE_LAYERS {
            palette
                .register_texture(format!("{i}.png"), format!("t{i}"))
                .expect("register");
        }
        let mut backend = HeadlessBackend::new();
        assert!(matches!(
            palette.build(&mut backend, 4, 1),
            Err(EngineError::TooManyTextures { count: 257, max: 256 })
        ));
    }
}
