//! The mine/place state machine on top of the packed store.
//!
//! Per voxel:
//!
//! ```text
//!   Generated --(first read)--> HasBlock(t) --mine--> Air --place(t)--> HasBlock(t)
//! ```
//!
//! A voxel is "Generated" while its stored state is `Uninitialized`; reads
//! then fall through to the terrain generator without writing anything back.

pub mod error;
pub mod event;
pub mod ledger;

use std::sync::Arc;

use rayon::prelude::*;

use crate::terrain::TerrainGenerator;
use crate::world::World;
use crate::world::block::BlockType;
use crate::world::position::BlockPos;
use error::GameError;
use event::WorldEvent;
use ledger::{Ledger, PlayerId};

/// Upper bound on a single `get_blocks` call.
pub const MAX_BLOCKS_PER_QUERY: usize = 4096;

/// Game-facing handle: the store, the ledger and the generator together.
///
/// Cloning is cheap and every clone operates on the same world and ledger.
#[derive(Clone)]
pub struct Game {
    world: Arc<World>,
    ledger: Arc<Ledger>,
    generator: TerrainGenerator,
}

impl Game {
    pub fn new(world: Arc<World>, ledger: Arc<Ledger>, generator: TerrainGenerator) -> Self {
        Self {
            world,
            ledger,
            generator,
        }
    }

    /// A fresh, empty world with the given seed.
    pub fn with_seed(seed: u64) -> Self {
        Self::new(
            Arc::new(World::new()),
            Arc::new(Ledger::new()),
            TerrainGenerator::new(seed),
        )
    }

    pub fn world(&self) -> &Arc<World> {
        &self.world
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    pub fn generator(&self) -> &TerrainGenerator {
        &self.generator
    }

    /// Resolve a stored state, falling back to the generator when unset.
    fn resolve(&self, pos: BlockPos, stored: BlockType) -> BlockType {
        match stored {
            BlockType::Uninitialized => self.generator.generate_block(pos),
            other => other,
        }
    }

    /// The block at `pos`: the stored state if one was written, otherwise
    /// the generated one. Never writes.
    pub fn get_block(&self, pos: BlockPos) -> BlockType {
        self.resolve(pos, self.world.read_state(pos))
    }

    /// `count` blocks upward from `start` (along z), in order.
    pub fn get_blocks(&self, start: BlockPos, count: usize) -> Result<Vec<BlockType>, GameError> {
        if count > MAX_BLOCKS_PER_QUERY {
            return Err(GameError::QueryTooLarge {
                requested: count,
                limit: MAX_BLOCKS_PER_QUERY,
            });
        }
        // The last voxel read is `start.z + count - 1`.
        if count > 0 && start.z.checked_add(count as i64 - 1).is_none() {
            return Err(GameError::QueryOutOfRange { start, count });
        }
        Ok((0..count)
            .into_par_iter()
            .map(|i| self.get_block(start.offset(0, 0, i as i64)))
            .collect())
    }

    /// The natural block at `pos`, ignoring anything written there.
    pub fn generate_block(&self, pos: BlockPos) -> BlockType {
        self.generator.generate_block(pos)
    }

    /// Raw stored state, `Uninitialized` if never written.
    pub fn read_state(&self, pos: BlockPos) -> BlockType {
        self.world.read_state(pos)
    }

    /// Overwrite the raw stored state of one voxel.
    pub fn write_state(&self, pos: BlockPos, raw: u8) -> Result<WorldEvent, GameError> {
        let state = BlockType::from_raw(raw).ok_or(GameError::InvalidState(raw))?;
        self.world.write_state(pos, state);
        tracing::debug!("write_state {:?} <- {}", pos, state);
        Ok(WorldEvent::StateWritten { pos, state })
    }

    /// Mine the block at `pos` into `player`'s balance. Returns the block
    /// that was there.
    pub fn mine_block(&self, player: PlayerId, pos: BlockPos) -> Result<BlockType, GameError> {
        let mut mined = BlockType::Air;
        self.world.update_state(pos, |stored| -> Result<BlockType, GameError> {
            let block = self.resolve(pos, stored);
            if block == BlockType::Air {
                return Err(GameError::MiningInvalidTarget { pos });
            }
            // Credit under the slot lock so the two writes land together.
            self.ledger.credit(player, block);
            mined = block;
            Ok(BlockType::Air)
        })?;
        tracing::debug!("player {} mined {} at {:?}", player, mined, pos);
        Ok(mined)
    }

    /// Place one of `player`'s blocks of type `block` into the air at `pos`.
    pub fn place_block(
        &self,
        player: PlayerId,
        pos: BlockPos,
        block: BlockType,
    ) -> Result<(), GameError> {
        if !block.is_solid() {
            return Err(GameError::InvalidBlockType(block));
        }
        self.world.update_state(pos, |stored| -> Result<BlockType, GameError> {
            let existing = self.resolve(pos, stored);
            if existing != BlockType::Air {
                return Err(GameError::PlacementBlocked { pos, existing });
            }
            self.ledger
                .try_debit(player, block)
                .ok_or(GameError::InsufficientBalance { player, block })?;
            Ok(block)
        })?;
        tracing::debug!("player {} placed {} at {:?}", player, block, pos);
        Ok(())
    }

    /// [`Game::mine_block`] reporting the applied change.
    pub fn mine(&self, player: PlayerId, pos: BlockPos) -> Result<WorldEvent, GameError> {
        let block = self.mine_block(player, pos)?;
        Ok(WorldEvent::BlockMined { pos, player, block })
    }

    /// [`Game::place_block`] reporting the applied change.
    pub fn place(
        &self,
        player: PlayerId,
        pos: BlockPos,
        block: BlockType,
    ) -> Result<WorldEvent, GameError> {
        self.place_block(player, pos, block)?;
        Ok(WorldEvent::BlockPlaced { pos, player, block })
    }

    pub fn get_block_balance(&self, player: PlayerId, block: BlockType) -> u64 {
        self.ledger.balance(player, block)
    }
}
