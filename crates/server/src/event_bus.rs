//! World-change event bus.
//!
//! Every successful mutating call publishes a [`WorldChangeBatch`] to a
//! shared `tokio::sync::broadcast` channel. Live-feed WebSocket clients
//! subscribe and forward the changes.

use std::sync::Arc;

use serde::Serialize;
use terraforge_engine::game::event::WorldEvent;
use terraforge_engine::game::ledger::PlayerId;
use terraforge_engine::world::block::BlockType;
use terraforge_engine::world::position::BlockPos;

/// Recommended capacity for the broadcast channel.
pub const BUS_CAPACITY: usize = 256;

/// Where a batch of world changes originated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChangeSource {
    /// A player's mine or place call.
    Player(PlayerId),
    /// A raw `write_state` call.
    Admin,
}

/// A batch of voxel changes from one call.
///
/// Uses `Arc<[...]>` so cloning per broadcast subscriber is just a refcount bump.
#[derive(Clone, Debug)]
pub struct WorldChangeBatch {
    pub source: ChangeSource,
    pub changes: Arc<[(BlockPos, BlockType)]>,
}

impl WorldChangeBatch {
    pub fn from_events(events: &[WorldEvent]) -> Option<Self> {
        let first = events.first()?;
        let source = match first.player() {
            Some(player) => ChangeSource::Player(player),
            None => ChangeSource::Admin,
        };
        let changes: Vec<(BlockPos, BlockType)> =
            events.iter().map(|e| (e.pos(), e.new_state())).collect();
        Some(Self {
            source,
            changes: changes.into(),
        })
    }

    /// JSON-friendly view for the live feed.
    pub fn to_message(&self) -> ChangeMessage {
        ChangeMessage {
            source: match &self.source {
                ChangeSource::Player(player) => player.to_string(),
                ChangeSource::Admin => "admin".into(),
            },
            changes: self
                .changes
                .iter()
                .map(|(pos, block)| [pos.x, pos.y, pos.z, block.raw() as i64])
                .collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ChangeMessage {
    pub source: String,
    /// `[x, y, z, block_type]` per changed voxel.
    pub changes: Vec<[i64; 4]>,
}
