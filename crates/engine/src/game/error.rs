use thiserror::Error;

use super::ledger::PlayerId;
use crate::world::block::BlockType;
use crate::world::position::BlockPos;

/// Why a game call was rejected. Every variant is final for that call: the
/// world and the ledger are left exactly as they were.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("no block to mine at {pos:?}")]
    MiningInvalidTarget { pos: BlockPos },

    #[error("already a block here: {existing} at {pos:?}")]
    PlacementBlocked { pos: BlockPos, existing: BlockType },

    #[error("player {player} holds no {block}")]
    InsufficientBalance { player: PlayerId, block: BlockType },

    #[error("{0} cannot be held or placed")]
    InvalidBlockType(BlockType),

    #[error("state {0} does not fit in three bits")]
    InvalidState(u8),

    #[error("query of {requested} blocks exceeds the limit of {limit}")]
    QueryTooLarge { requested: usize, limit: usize },

    #[error("{count} blocks up from {start:?} runs past the top of the world")]
    QueryOutOfRange { start: BlockPos, count: usize },
}

impl GameError {
    /// Stable machine-readable name, used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            GameError::MiningInvalidTarget { .. } => "mining_invalid_target",
            GameError::PlacementBlocked { .. } => "placement_blocked",
            GameError::InsufficientBalance { .. } => "insufficient_balance",
            GameError::InvalidBlockType(_) => "invalid_block_type",
            GameError::InvalidState(_) => "invalid_state",
            GameError::QueryTooLarge { .. } => "query_too_large",
            GameError::QueryOutOfRange { .. } => "query_out_of_range",
        }
    }
}
