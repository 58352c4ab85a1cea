//! World persistence as a single gzip-compressed NBT snapshot.
//!
//! Saves the stored slots, the ledger and the world seed to
//! `<dir>/world.nbt.gz`. Generated terrain is never saved: it is recomputed
//! from the seed on demand.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};

use terraforge_engine::game::Game;
use terraforge_engine::game::ledger::{Ledger, PlayerId};
use terraforge_engine::terrain::TerrainGenerator;
use terraforge_engine::world::World;
use terraforge_engine::world::block::BlockType;
use terraforge_engine::world::position::SlotKey;

/// Bumped whenever the snapshot layout changes.
const DATA_VERSION: i32 = 1;

pub const SAVE_FILE: &str = "world.nbt.gz";

// ── NBT schema ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct WorldNbt {
    #[serde(rename = "DataVersion")]
    data_version: i32,
    #[serde(rename = "Seed")]
    seed: i64,
    #[serde(rename = "Slots", default)]
    slots: Vec<SlotNbt>,
    #[serde(rename = "Balances", default)]
    balances: Vec<BalanceNbt>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SlotNbt {
    x: i64,
    y: i64,
    z: i64,
    /// The packed word, bit-cast to a signed long.
    word: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct BalanceNbt {
    /// 32 hex digits.
    player: String,
    block: i8,
    count: i64,
}

/// What one save wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveStats {
    pub slots: usize,
    pub balances: usize,
}

// ── Save ────────────────────────────────────────────────────────────────────

/// Write a full snapshot of `game` to `<dir>/world.nbt.gz` if anything
/// changed since the last save.
///
/// Returns `None` when there was nothing to save. On failure the dirty state
/// is restored, so the next attempt saves again.
pub fn save_game(game: &Game, dir: &Path) -> Result<Option<SaveStats>> {
    let world = game.world();
    let ledger = game.ledger();

    let dirty_slots = world.take_dirty_slots();
    let ledger_dirty = ledger.take_dirty();
    if dirty_slots.is_empty() && !ledger_dirty {
        tracing::debug!("World save: nothing to save");
        return Ok(None);
    }

    match write_snapshot(game, dir) {
        Ok(stats) => Ok(Some(stats)),
        Err(e) => {
            world.mark_dirty(dirty_slots);
            if ledger_dirty {
                ledger.mark_dirty();
            }
            Err(e)
        }
    }
}

fn write_snapshot(game: &Game, dir: &Path) -> Result<SaveStats> {
    let start = Instant::now();
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let nbt = snapshot(game);
    let stats = SaveStats {
        slots: nbt.slots.len(),
        balances: nbt.balances.len(),
    };
    let bytes = fastnbt::to_bytes(&nbt).context("serializing world snapshot")?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&bytes)?;
    let compressed = encoder.finish().context("compressing world snapshot")?;

    // Write beside the target then rename, so a crash never leaves a torn file.
    let path = dir.join(SAVE_FILE);
    let tmp = dir.join(format!("{}.tmp", SAVE_FILE));
    fs::write(&tmp, &compressed).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, &path).with_context(|| format!("replacing {}", path.display()))?;

    tracing::info!(
        "World saved: {} slots, {} balances, {} bytes ({:.2?})",
        stats.slots,
        stats.balances,
        compressed.len(),
        start.elapsed(),
    );
    Ok(stats)
}

fn snapshot(game: &Game) -> WorldNbt {
    let slots = game
        .world()
        .slots()
        .into_iter()
        .map(|(key, word)| SlotNbt {
            x: key.x,
            y: key.y,
            z: key.z,
            word: word as i64,
        })
        .collect();

    let balances = game
        .ledger()
        .entries()
        .into_iter()
        .map(|(player, block, count)| BalanceNbt {
            player: player.to_string(),
            block: block.raw() as i8,
            count: count as i64,
        })
        .collect();

    WorldNbt {
        data_version: DATA_VERSION,
        seed: game.generator().world_seed() as i64,
        slots,
        balances,
    }
}

// ── Load ────────────────────────────────────────────────────────────────────

/// Load the snapshot under `dir`, if there is one.
///
/// The returned game uses the saved seed and starts out clean.
pub fn load_game(dir: &Path) -> Result<Option<Game>> {
    let path = dir.join(SAVE_FILE);
    if !path.is_file() {
        return Ok(None);
    }

    let start = Instant::now();
    let file = fs::File::open(&path).with_context(|| format!("opening {}", path.display()))?;
    let mut bytes = Vec::new();
    GzDecoder::new(file)
        .read_to_end(&mut bytes)
        .with_context(|| format!("decompressing {}", path.display()))?;
    let nbt: WorldNbt =
        fastnbt::from_bytes(&bytes).with_context(|| format!("parsing {}", path.display()))?;

    if nbt.data_version != DATA_VERSION {
        bail!(
            "{}: unsupported data version {} (expected {})",
            path.display(),
            nbt.data_version,
            DATA_VERSION
        );
    }

    let world = World::new();
    for slot in &nbt.slots {
        world.insert_slot(SlotKey::new(slot.x, slot.y, slot.z), slot.word as u64);
    }

    let ledger = Ledger::new();
    for entry in &nbt.balances {
        let player = u128::from_str_radix(&entry.player, 16)
            .with_context(|| format!("bad player id {:?}", entry.player))?;
        let Some(block) = BlockType::from_raw(entry.block as u8) else {
            bail!("bad block type {} in balance of {}", entry.block, entry.player);
        };
        if entry.count < 0 {
            bail!("negative balance for {}", entry.player);
        }
        ledger.insert(PlayerId(player), block, entry.count as u64);
    }

    tracing::info!(
        "World loaded: {} slots, {} balances ({:.2?})",
        nbt.slots.len(),
        nbt.balances.len(),
        start.elapsed(),
    );

    Ok(Some(Game::new(
        Arc::new(world),
        Arc::new(ledger),
        TerrainGenerator::new(nbt.seed as u64),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use terraforge_engine::world::position::BlockPos;

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    /// A solid surface voxel at the origin column.
    fn surface(game: &Game) -> BlockPos {
        BlockPos::new(0, 0, game.generator().surface_height(0, 0))
    }

    #[test]
    fn test_save_load_roundtrip() {
        let game = Game::with_seed(7);
        let alice = PlayerId(0xa11ce);
        let top = surface(&game);

        game.mine_block(alice, top).unwrap();
        game.write_state(BlockPos::new(-30, 4, 1000), BlockType::Wood.raw())
            .unwrap();

        let tmp = temp_dir("terraforge_test_persistence");
        let saved = save_game(&game, &tmp).unwrap().expect("should save");
        assert_eq!(saved, SaveStats { slots: 2, balances: 1 });
        assert!(tmp.join(SAVE_FILE).exists());
        assert!(!tmp.join(format!("{}.tmp", SAVE_FILE)).exists());

        let loaded = load_game(&tmp).unwrap().expect("should load");
        assert_eq!(loaded.generator().world_seed(), 7);
        assert_eq!(loaded.read_state(top), BlockType::Air);
        assert_eq!(loaded.get_block(top), BlockType::Air);
        assert_eq!(
            loaded.read_state(BlockPos::new(-30, 4, 1000)),
            BlockType::Wood
        );
        assert_eq!(loaded.get_block_balance(alice, BlockType::Grass), 1);

        // Loading doesn't dirty anything.
        assert_eq!(loaded.world().dirty_count(), 0);
        assert!(!loaded.ledger().is_dirty());
        assert!(save_game(&loaded, &tmp).unwrap().is_none());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn test_incremental_save() {
        let game = Game::with_seed(1);
        let tmp = temp_dir("terraforge_test_incremental");

        // Nothing touched yet.
        assert!(save_game(&game, &tmp).unwrap().is_none());
        assert!(!tmp.join(SAVE_FILE).exists());

        game.write_state(BlockPos::new(1, 1, 1), BlockType::Stone.raw())
            .unwrap();
        assert!(save_game(&game, &tmp).unwrap().is_some());
        assert!(save_game(&game, &tmp).unwrap().is_none());

        // A ledger-only change still triggers a save.
        game.ledger().credit(PlayerId(3), BlockType::Ore);
        let saved = save_game(&game, &tmp).unwrap().expect("ledger is dirty");
        assert_eq!(saved.balances, 1);

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn test_missing_save_is_none() {
        let tmp = temp_dir("terraforge_test_missing");
        assert!(load_game(&tmp).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_save_is_error() {
        let tmp = temp_dir("terraforge_test_corrupt");
        fs::create_dir_all(&tmp).unwrap();
        fs::write(tmp.join(SAVE_FILE), b"definitely not gzip").unwrap();
        assert!(load_game(&tmp).is_err());
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn test_failed_save_keeps_dirty() {
        let game = Game::with_seed(2);
        game.write_state(BlockPos::new(0, 0, 0), BlockType::Leaf.raw())
            .unwrap();
        game.ledger().credit(PlayerId(9), BlockType::Dirt);

        // A regular file where the directory should be.
        let tmp = temp_dir("terraforge_test_failed_save");
        fs::write(&tmp, b"in the way").unwrap();
        assert!(save_game(&game, &tmp).is_err());

        assert_eq!(game.world().dirty_count(), 1);
        assert!(game.ledger().is_dirty());
        let _ = fs::remove_file(&tmp);
    }
}
