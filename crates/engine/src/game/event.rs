use super::ledger::PlayerId;
use crate::world::block::BlockType;
use crate::world::position::BlockPos;

/// A single applied change to the world -- what the game layer reports back
/// after a successful mutating call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldEvent {
    /// A player mined a block; the voxel is now air and their balance of
    /// `block` went up by one.
    BlockMined {
        pos: BlockPos,
        player: PlayerId,
        block: BlockType,
    },

    /// A player placed a block into air from their balance.
    BlockPlaced {
        pos: BlockPos,
        player: PlayerId,
        block: BlockType,
    },

    /// A raw state was written directly to the store.
    StateWritten { pos: BlockPos, state: BlockType },
}

impl WorldEvent {
    pub fn pos(&self) -> BlockPos {
        match self {
            WorldEvent::BlockMined { pos, .. }
            | WorldEvent::BlockPlaced { pos, .. }
            | WorldEvent::StateWritten { pos, .. } => *pos,
        }
    }

    /// The voxel's state after the change.
    pub fn new_state(&self) -> BlockType {
        match self {
            WorldEvent::BlockMined { .. } => BlockType::Air,
            WorldEvent::BlockPlaced { block, .. } => *block,
            WorldEvent::StateWritten { state, .. } => *state,
        }
    }

    /// The block type the change moved: what was mined or placed, or the
    /// state that was written.
    pub fn block(&self) -> BlockType {
        match self {
            WorldEvent::BlockMined { block, .. } | WorldEvent::BlockPlaced { block, .. } => *block,
            WorldEvent::StateWritten { state, .. } => *state,
        }
    }

    /// The player that caused the change, if any.
    pub fn player(&self) -> Option<PlayerId> {
        match self {
            WorldEvent::BlockMined { player, .. } | WorldEvent::BlockPlaced { player, .. } => {
                Some(*player)
            }
            WorldEvent::StateWritten { .. } => None,
        }
    }
}
