use std::fmt;

/// Every state a voxel can be in. The discriminant is the raw 3-bit value
/// stored in a packed slot word.
///
/// `Uninitialized` (0) is what an untouched slot reads as: the voxel has
/// never been written and its block comes from the terrain generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum BlockType {
    #[default]
    Uninitialized = 0,
    Air = 1,
    Stone = 2,
    Dirt = 3,
    Grass = 4,
    Ore = 5,
    Wood = 6,
    Leaf = 7,
}

impl BlockType {
    /// All eight states in discriminant order.
    pub const ALL: [BlockType; 8] = [
        BlockType::Uninitialized,
        BlockType::Air,
        BlockType::Stone,
        BlockType::Dirt,
        BlockType::Grass,
        BlockType::Ore,
        BlockType::Wood,
        BlockType::Leaf,
    ];

    /// Decode a raw state. Returns `None` for anything that does not fit in
    /// three bits.
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(BlockType::Uninitialized),
            1 => Some(BlockType::Air),
            2 => Some(BlockType::Stone),
            3 => Some(BlockType::Dirt),
            4 => Some(BlockType::Grass),
            5 => Some(BlockType::Ore),
            6 => Some(BlockType::Wood),
            7 => Some(BlockType::Leaf),
            _ => None,
        }
    }

    pub const fn raw(self) -> u8 {
        self as u8
    }

    /// A block a player can hold and place: anything except Air and
    /// Uninitialized.
    pub const fn is_solid(self) -> bool {
        !matches!(self, BlockType::Air | BlockType::Uninitialized)
    }

    pub const fn name(self) -> &'static str {
        match self {
            BlockType::Uninitialized => "uninitialized",
            BlockType::Air => "air",
            BlockType::Stone => "stone",
            BlockType::Dirt => "dirt",
            BlockType::Grass => "grass",
            BlockType::Ore => "ore",
            BlockType::Wood => "wood",
            BlockType::Leaf => "leaf",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
