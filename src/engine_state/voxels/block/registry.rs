//! # Block Registry
//!
//! Maps block type ids to the static properties the mesh generator and renderer need.
//!
//! The registry is populated once during startup, after the texture palette is built
//! (properties store resolved texture layers), and is read-only afterwards. It is owned
//! by the `World` rather than living in a global, so several worlds can coexist.

use log::debug;

use super::block_type::{BlockType, DEFAULT_BLOCKS};
use super::BlockTypeSize;
use crate::core::EngineError;
use crate::engine_state::rendering::palette::TexturePalette;

/// How a block occludes the faces of the blocks next to it.
///
/// Ordering matters: anything greater than `Opaque` lets the neighbouring face show.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Visibility {
    /// Fully hides neighbouring faces.
    Opaque = 0,
    /// Solid geometry with cut-out texels, such as glass or leaves.
    TransparentTexture = 1,
    /// Partially see-through, such as water.
    Translucent = 2,
    /// Invisible, such as air.
    Transparent = 4,
}

impl Visibility {
    /// Whether blocks of this class are drawn by the chunk mesher.
    pub fn is_meshed(self) -> bool {
        self <= Visibility::TransparentTexture
    }

    /// Whether a face looking into a block of this class is visible.
    pub fn exposes_neighbour(self) -> bool {
        self > Visibility::Opaque
    }
}

/// Static properties of a block type.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BlockProperties {
    /// Occlusion class.
    pub visibility: Visibility,
    /// Layer of the texture array used for all six faces.
    pub texture_layer: u8,
    /// Whether the block emits light.
    pub produces_light: bool,
}

impl BlockProperties {
    /// Properties of air: invisible, untextured.
    pub const AIR: BlockProperties = BlockProperties {
        visibility: Visibility::Transparent,
        texture_layer: 0,
        produces_light: false,
    };
}

/// Dense table of block properties indexed by block id.
#[derive(Clone, Debug)]
pub struct BlockRegistry {
    entries: Vec<Option<BlockProperties>>,
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockRegistry {
    /// Creates a registry containing only air.
    pub fn new() -> Self {
        let mut entries = vec![None; BlockTypeSize::MAX as usize + 1];
        entries[BlockType::AIR.0 as usize] = Some(BlockProperties::AIR);
        Self { entries }
    }

    /// Creates a registry with air plus every entry of the default block table.
    ///
    /// # Arguments
    /// * `palette` - A built palette; each block's texture name is resolved against it.
    ///
    /// # Errors
    /// Fails if the palette is not built or a default texture was never registered.
    pub fn with_default_blocks(palette: &TexturePalette) -> Result<Self, EngineError> {
        let mut registry = Self::new();
        for definition in DEFAULT_BLOCKS.iter() {
            let texture_layer = palette.get_layer(definition.texture_name)?;
            registry.register(
                definition.id,
                BlockProperties {
                    visibility: definition.visibility,
                    texture_layer,
                    produces_light: definition.produces_light,
                },
            );
            debug!(
                "Registered block {} ({}) on texture layer {}",
                definition.name, definition.id.0, texture_layer
            );
        }
        Ok(registry)
    }

    /// Inserts or overwrites the properties of `id`.
    pub fn register(&mut self, id: BlockType, properties: BlockProperties) {
        self.entries[id.0 as usize] = Some(properties);
    }

    /// Looks up the properties of `id`.
    ///
    /// # Errors
    /// Returns `EngineError::UnregisteredBlock` if `id` was never registered.
    pub fn get(&self, id: BlockType) -> Result<&BlockProperties, EngineError> {
        self.entries[id.0 as usize]
            .as_ref()
            .ok_or(EngineError::UnregisteredBlock(id.0))
    }

    /// Whether `id` has an entry.
    pub fn is_registered(&self, id: BlockType) -> bool {
        self.entries[id.0 as usize].is_some()
    }

    /// Number of registered ids, air included.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_some()).count()
    }

    /// Always false, air is registered on construction.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
