//! Task for decoding and resizing one block texture on a worker thread.
//!
//! The worker decodes the file, scales it to the palette's uniform edge length and
//! builds the full mip chain, so the publishing thread only has to copy bytes into the
//! texture array upload.

use std::path::PathBuf;

use image::imageops::FilterType;
use image::RgbaImage;

use crate::core::EngineError;
use crate::engine_state::task_management::task::Task;

/// Loads one texture file.
#[derive(Debug, Clone)]
pub struct TextureLoadTask {
    /// Palette name of the texture.
    pub name: String,
    /// File to decode.
    pub path: PathBuf,
    /// Edge length the image is resized to.
    pub size: u32,
}

/// Output of a `TextureLoadTask`.
#[derive(Debug)]
pub struct LoadedTexture {
    /// Palette name of the texture.
    pub name: String,
    /// RGBA8 bytes of every mip level, largest first, or the reason loading failed.
    pub mips: Result<Vec<u8>, EngineError>,
}

impl TextureLoadTask {
    /// Creates a new texture load task.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, size: u32) -> Self {
        TextureLoadTask {
            name: name.into(),
            path: path.into(),
            size,
        }
    }

    fn load(&self) -> Result<Vec<u8>, EngineError> {
        let decoded = image::open(&self.path).map_err(|source| EngineError::TextureLoad {
            path: self.path.clone(),
            source,
        })?;
        let rgba = decoded.to_rgba8();
        let base = if rgba.dimensions() == (self.size, self.size) {
            rgba
        } else {
            image::imageops::resize(&rgba, self.size, self.size, FilterType::Nearest)
        };
        Ok(build_mip_chain(&base))
    }
}

impl Task for TextureLoadTask {
    type Output = LoadedTexture;

    fn process(self) -> LoadedTexture {
        let mips = self.load();
        LoadedTexture {
            name: self.name,
            mips,
        }
    }
}

/// Concatenates `base` and every successive half-size reduction down to 1x1.
pub fn build_mip_chain(base: &RgbaImage) -> Vec<u8> {
    let mut bytes = base.as_raw().clone();
    let mut level = base.clone();
    while level.width() > 1 || level.height() > 1 {
        let width = (level.width() / 2).max(1);
        let height = (level.height() / 2).max(1);
        level = image::imageops::resize(&level, width, height, FilterType::Triangle);
        bytes.extend_from_slice(level.as_raw());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::rendering::backend::{mip_chain_len, mip_level_count};
    use image::Rgba;

    #[test]
    fn mip_chain_has_every_level() {
        let base = RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 255]));
        let chain = build_mip_chain(&base);
        assert_eq!(chain.len(), mip_chain_len(8, mip_level_count(8)) * 4);
        assert_eq!(&chain[chain.len() - 4..], &[10, 20, 30, 255]);
    }

    #[test]
    fn missing_file_reports_texture_load_error() {
        let task = TextureLoadTask::new("ghost", "/definitely/not/here.png", 4);
        let loaded = task.process();
        assert_eq!(loaded.name, "ghost");
        assert!(matches!(loaded.mips, Err(EngineError::TextureLoad { .. })));
    }

    #[test]
    fn images_are_resized_to_the_palette_size() {
        let dir = std::env::temp_dir().join(format!("voxel-world-texture-task-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        let path = dir.join("big.png");
        RgbaImage::from_pixel(32, 16, Rgba([1, 2, 3, 255]))
            .save(&path)
            .expect("write png");

        let loaded = TextureLoadTask::new("big", &path, 4).process();
        let mips = loaded.mips.expect("decoded");
        assert_eq!(mips.len(), mip_chain_len(4, mip_level_count(4)) * 4);
        assert_eq!(&mips[..4], &[1, 2, 3, 255]);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
