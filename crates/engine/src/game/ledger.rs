use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::world::block::BlockType;

/// Opaque player identifier. The server maps UUIDs onto it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(pub u128);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// Per-player, per-block-type inventory counts.
///
/// Entries are created on first credit and never removed; a missing entry
/// reads as zero. Each entry is locked independently, so a check-and-debit
/// can't race another debit of the same balance.
pub struct Ledger {
    balances: DashMap<(PlayerId, BlockType), u64>,
    dirty: AtomicBool,
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            balances: DashMap::new(),
            dirty: AtomicBool::new(false),
        }
    }

    pub fn balance(&self, player: PlayerId, block: BlockType) -> u64 {
        self.balances
            .get(&(player, block))
            .map(|count| *count)
            .unwrap_or(0)
    }

    /// Add one block to a player's balance. Returns the new count.
    pub fn credit(&self, player: PlayerId, block: BlockType) -> u64 {
        let mut count = self.balances.entry((player, block)).or_insert(0);
        *count = count.saturating_add(1);
        let new = *count;
        drop(count);
        self.dirty.store(true, Ordering::Release);
        new
    }

    /// Take one block from a player's balance if they have any. Returns the
    /// new count, or `None` (and changes nothing) if the balance is zero.
    pub fn try_debit(&self, player: PlayerId, block: BlockType) -> Option<u64> {
        let new = match self.balances.entry((player, block)) {
            Entry::Occupied(mut entry) if *entry.get() > 0 => {
                *entry.get_mut() -= 1;
                *entry.get()
            }
            _ => return None,
        };
        self.dirty.store(true, Ordering::Release);
        Some(new)
    }

    /// All non-zero balances of one player, by block type.
    pub fn balances_of(&self, player: PlayerId) -> BTreeMap<BlockType, u64> {
        BlockType::ALL
            .iter()
            .filter_map(|&block| {
                let count = self.balance(player, block);
                (count > 0).then_some((block, count))
            })
            .collect()
    }

    /// Snapshot of every non-zero entry. Order is unspecified.
    pub fn entries(&self) -> Vec<(PlayerId, BlockType, u64)> {
        self.balances
            .iter()
            .filter(|entry| *entry.value() > 0)
            .map(|entry| {
                let (player, block) = *entry.key();
                (player, block, *entry.value())
            })
            .collect()
    }

    /// Set a balance directly without marking the ledger dirty (loading).
    pub fn insert(&self, player: PlayerId, block: BlockType, count: u64) {
        self.balances.insert((player, block), count);
    }

    /// Whether anything changed since the last call, clearing the flag.
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }

    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
