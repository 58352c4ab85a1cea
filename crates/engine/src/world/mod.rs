pub mod block;
pub mod packing;
pub mod position;

use std::convert::Infallible;

use block::BlockType;
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use position::{BlockPos, SlotKey};

/// The packed voxel store. Thread-safe, lock-sharded by slot.
///
/// Holds only what has been explicitly written: a slot that was never
/// touched reads as all-`Uninitialized`, and the game layer falls back to
/// the terrain generator for those voxels.
pub struct World {
    slots: DashMap<SlotKey, u64>,
    /// Slots that have been modified since the last save.
    dirty: DashSet<SlotKey>,
}

impl World {
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
            dirty: DashSet::new(),
        }
    }

    /// Raw state of one voxel. `Uninitialized` if it was never written.
    pub fn read_state(&self, pos: BlockPos) -> BlockType {
        let addr = pos.slot();
        let raw = match self.slots.get(&addr.key) {
            Some(word) => packing::read_field(*word, addr.offset),
            None => 0,
        };
        // A 3-bit field always decodes.
        BlockType::from_raw(raw).unwrap_or_default()
    }

    /// Overwrite one voxel's raw state, leaving the rest of its slot intact.
    pub fn write_state(&self, pos: BlockPos, state: BlockType) {
        let Ok(_) = self.update_state(pos, |_| Ok::<_, Infallible>(state));
    }

    /// Atomic read-modify-write of a single voxel.
    ///
    /// The slot's write lock is held for the whole call, so no other reader
    /// or writer of the slot can interleave. `f` receives the current raw
    /// state and returns the new one, or an error, in which case nothing is
    /// written. Returns the state the voxel had before the call.
    ///
    /// `f` must not touch this `World` (it would deadlock on the shard).
    pub fn update_state<F, E>(&self, pos: BlockPos, f: F) -> Result<BlockType, E>
    where
        F: FnOnce(BlockType) -> Result<BlockType, E>,
    {
        let addr = pos.slot();
        // Holding the entry keeps the shard locked, vacant or not.
        let entry = self.slots.entry(addr.key);
        let word = match &entry {
            Entry::Occupied(occupied) => *occupied.get(),
            Entry::Vacant(_) => 0,
        };
        let current =
            BlockType::from_raw(packing::read_field(word, addr.offset)).unwrap_or_default();
        let new = f(current)?;
        if new == current {
            return Ok(current);
        }

        // All-zero words are never stored.
        let updated = packing::write_field(word, addr.offset, new.raw());
        match entry {
            Entry::Occupied(occupied) if updated == 0 => {
                occupied.remove();
            }
            Entry::Occupied(mut occupied) => {
                *occupied.get_mut() = updated;
            }
            Entry::Vacant(vacant) => {
                vacant.insert(updated);
            }
        }
        self.dirty.insert(addr.key);
        Ok(current)
    }

    /// Insert a whole slot word without marking it dirty (used for loading).
    pub fn insert_slot(&self, key: SlotKey, word: u64) {
        if word != 0 {
            self.slots.insert(key, word);
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Snapshot of every non-empty slot. Order is unspecified.
    pub fn slots(&self) -> Vec<(SlotKey, u64)> {
        self.slots
            .iter()
            .filter(|entry| *entry.value() != 0)
            .map(|entry| (*entry.key(), *entry.value()))
            .collect()
    }

    /// Drain and return all slot keys modified since the last call.
    pub fn take_dirty_slots(&self) -> Vec<SlotKey> {
        let mut dirty = Vec::new();
        // Collect then remove; a slot dirtied in between is simply saved
        // again next time.
        for entry in self.dirty.iter() {
            dirty.push(*entry);
        }
        for key in &dirty {
            self.dirty.remove(key);
        }
        dirty
    }

    /// Put slots back on the dirty list after a failed save.
    pub fn mark_dirty(&self, keys: impl IntoIterator<Item = SlotKey>) {
        for key in keys {
            self.dirty.insert(key);
        }
    }

    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
