use super::packing::{BITS_PER_STATE, STATES_PER_SLOT};

/// Absolute voxel position in the world. `z` is the vertical axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockPos {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl BlockPos {
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    pub const fn offset(&self, dx: i64, dy: i64, dz: i64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// The storage slot this voxel lives in and its bit offset inside it.
    ///
    /// Slots group `STATES_PER_SLOT` consecutive voxels along x. Euclidean
    /// division keeps negative coordinates in the right group.
    pub const fn slot(&self) -> SlotAddr {
        let per_slot = STATES_PER_SLOT as i64;
        SlotAddr {
            key: SlotKey {
                x: self.x.div_euclid(per_slot),
                y: self.y,
                z: self.z,
            },
            offset: (self.x.rem_euclid(per_slot) as u32) * BITS_PER_STATE,
        }
    }
}

/// Index of one packed storage word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotKey {
    /// Slot column along x (`x.div_euclid(STATES_PER_SLOT)`).
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl SlotKey {
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// The voxel stored at bit offset 0 of this slot.
    pub const fn first_pos(&self) -> BlockPos {
        BlockPos::new(self.x * STATES_PER_SLOT as i64, self.y, self.z)
    }
}

/// Where a voxel's 3-bit state lives: which word, and at which bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotAddr {
    pub key: SlotKey,
    pub offset: u32,
}
