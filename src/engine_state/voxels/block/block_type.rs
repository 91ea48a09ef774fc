//! # Block Type Module
//!
//! Block type ids and the default tables of blocks and textures the engine ships with.
//!
//! Block ids are a dense keyspace of small integers; `0` is reserved for air. The default
//! tables pair each block id with the name of the texture it uses, and each texture name
//! with the file it is loaded from. Textures must be registered and the palette built
//! before the blocks are registered, because block properties store the resolved layer.

use phf::phf_map;

use super::registry::Visibility;
use super::BlockTypeSize;

/// Identifies the type of a block stored in a chunk.
///
/// This is the compact value actually kept in chunk storage; everything else about the
/// block is looked up in the `BlockRegistry`.
#[repr(transparent)]
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, bytemuck::Pod, bytemuck::Zeroable,
)]
pub struct BlockType(pub BlockTypeSize);

impl BlockType {
    /// Fully transparent, renders nothing. Always registered.
    pub const AIR: BlockType = BlockType(0);
    /// Plain opaque stone.
    pub const STONE: BlockType = BlockType(1);
    /// Opaque dirt, found under grass.
    pub const DIRT: BlockType = BlockType(2);
    /// Opaque grass, the surface layer of the heightmap terrain.
    pub const GRASS: BlockType = BlockType(3);
    /// Opaque wooden planks.
    pub const WOOD: BlockType = BlockType(4);
    /// Glass: drawn with the opaque blocks but its texture has cut-out pixels.
    pub const GLASS: BlockType = BlockType(5);
    /// Partially see-through water.
    pub const WATER: BlockType = BlockType(6);
    /// Opaque block that produces light.
    pub const LAMP: BlockType = BlockType(7);

    /// Returns the raw id.
    pub fn id(self) -> BlockTypeSize {
        self.0
    }

    /// Whether this is the reserved air id.
    pub fn is_air(self) -> bool {
        self == BlockType::AIR
    }
}

impl From<BlockTypeSize> for BlockType {
    fn from(id: BlockTypeSize) -> Self {
        BlockType(id)
    }
}

/// A row of the default block table.
#[derive(Copy, Clone, Debug)]
pub struct BlockDefinition {
    /// Block id.
    pub id: BlockType,
    /// Human readable name, used in logs.
    pub name: &'static str,
    /// How the block occludes its neighbours.
    pub visibility: Visibility,
    /// Name of the palette texture the block is drawn with.
    pub texture_name: &'static str,
    /// Whether the block emits light.
    pub produces_light: bool,
}

/// Blocks registered by `BlockRegistry::with_default_blocks`. Air is registered implicitly.
pub static DEFAULT_BLOCKS: [BlockDefinition; 7] = [
    BlockDefinition {
        id: BlockType::STONE,
        name: "stone",
        visibility: Visibility::Opaque,
        texture_name: "stone",
        produces_light: false,
    },
    BlockDefinition {
        id: BlockType::DIRT,
        name: "dirt",
        visibility: Visibility::Opaque,
        texture_name: "dirt",
        produces_light: false,
    },
    BlockDefinition {
        id: BlockType::GRASS,
        name: "grass",
        visibility: Visibility::Opaque,
        texture_name: "grass",
        produces_light: false,
    },
    BlockDefinition {
        id: BlockType::WOOD,
        name: "wood",
        visibility: Visibility::Opaque,
        texture_name: "wood",
        produces_light: false,
    },
    BlockDefinition {
        id: BlockType::GLASS,
        name: "glass",
        visibility: Visibility::TransparentTexture,
        texture_name: "glass",
        produces_light: false,
    },
    BlockDefinition {
        id: BlockType::WATER,
        name: "water",
        visibility: Visibility::Translucent,
        texture_name: "water",
        produces_light: false,
    },
    BlockDefinition {
        id: BlockType::LAMP,
        name: "lamp",
        visibility: Visibility::Opaque,
        texture_name: "lamp",
        produces_light: true,
    },
];

/// Texture name to file path for every texture the default blocks reference.
pub static DEFAULT_TEXTURES: phf::Map<&'static str, &'static str> = phf_map! {
    "stone" => "assets/textures/stone.png",
    "dirt" => "assets/textures/dirt.png",
    "grass" => "assets/textures/grass.png",
    "wood" => "assets/textures/wood.png",
    "glass" => "assets/textures/glass.png",
    "water" => "assets/textures/water.png",
    "lamp" => "assets/textures/lamp.png",
};

#[cfg(test)]
mod tests {
    use super::{DEFAULT_BLOCKS, DEFAULT_TEXTURES};

    #[test]
    fn every_default_block_has_a_default_texture() {
        for definition in DEFAULT_BLOCKS.iter() {
            assert!(
                DEFAULT_TEXTURES.contains_key(definition.texture_name),
                "block {} references unknown texture {}",
                definition.name,
                definition.texture_name
            );
            assert!(!definition.id.is_air());
        }
    }
}
