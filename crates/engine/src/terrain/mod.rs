//! Deterministic terrain generation.
//!
//! `generate_block` is a pure function of the position and the world seed:
//! no caches, no interior mutability. That makes it safe to call lazily for
//! any voxel that was never written, and from any number of threads.

pub mod fixed;
pub mod noise;

use rayon::prelude::*;

use crate::world::block::BlockType;
use crate::world::position::BlockPos;
use fixed::Fixed;
use noise::{hash3, perlin2, simplex3};

// ── Heightmap ───────────────────────────────────────────────────────────

/// Octave weights (0.5, 0.3, 0.2), shared by the heightmap and the caves.
const OCTAVE_WEIGHTS: [Fixed; 3] = [
    Fixed(1_152_921_504_606_846_976),
    Fixed(691_752_902_764_108_185),
    Fixed(461_168_601_842_738_790),
];

/// Grid size of each heightmap octave, in blocks.
const HEIGHTMAP_SCALES: [i64; 3] = [300, 100, 50];

/// Perlin output is within about ±0.71, so the surface spans roughly
/// `SURFACE_BASELINE ± 50`.
const SURFACE_AMPLITUDE: i64 = 70;
const SURFACE_BASELINE: i64 = 100;

// ── Topsoil ─────────────────────────────────────────────────────────────

/// Blocks of dirt between the grass and the stone, before displacement.
const TOPSOIL_BASELINE: i64 = 8;
const TOPSOIL_AMPLITUDE: i64 = 5;
const TOPSOIL_SCALE: i64 = 50;

// ── Caves ───────────────────────────────────────────────────────────────

const CAVE_SCALES: [i64; 3] = [20, 10, 5];

/// Fractal density at or above this is hollow (0.07).
const CAVE_THRESHOLD: Fixed = Fixed(161_409_010_644_958_576);

/// One in this many solid underground voxels is ore.
const ORE_RARITY: u8 = 8;

// ── Seeds ───────────────────────────────────────────────────────────────

const OCTAVE_SEEDS: [i64; 3] = [69, 420, 42069];
const TOPSOIL_SEED: i64 = 1337;

/// Pure voxel terrain generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerrainGenerator {
    world_seed: u64,
    octave_seeds: [i64; 3],
    topsoil_seed: i64,
    /// Horizontal shift of the whole noise domain, derived from the seed.
    shift: (i64, i64),
}

impl TerrainGenerator {
    /// Build a generator for `world_seed`. Seed 0 uses the base seeds and an
    /// unshifted domain.
    pub fn new(world_seed: u64) -> Self {
        let s = world_seed as i64;
        Self {
            world_seed,
            octave_seeds: OCTAVE_SEEDS.map(|base| base.wrapping_add(s)),
            topsoil_seed: TOPSOIL_SEED.wrapping_add(s),
            shift: (
                ((world_seed >> 8) & 0xF_FFFF) as i64,
                ((world_seed >> 28) & 0xF_FFFF) as i64,
            ),
        }
    }

    pub fn world_seed(&self) -> u64 {
        self.world_seed
    }

    /// Height of the grass layer in column `(x, y)`.
    pub fn surface_height(&self, x: i64, y: i64) -> i64 {
        let (x, y) = self.shifted(x, y);
        let mut sum = Fixed::ZERO;
        for i in 0..3 {
            let octave = perlin2(x, y, HEIGHTMAP_SCALES[i], self.octave_seeds[i]);
            sum = sum + octave * OCTAVE_WEIGHTS[i];
        }
        (sum.scale(SURFACE_AMPLITUDE) + Fixed::from_int(SURFACE_BASELINE)).floor()
    }

    /// Depth of the dirt layer below the grass in column `(x, y)`.
    pub fn topsoil_depth(&self, x: i64, y: i64) -> i64 {
        let (x, y) = self.shifted(x, y);
        let noise = perlin2(x, y, TOPSOIL_SCALE, self.topsoil_seed);
        (noise.scale(TOPSOIL_AMPLITUDE) + Fixed::from_int(TOPSOIL_BASELINE)).floor()
    }

    /// Fractal simplex density used to carve caves.
    pub fn cave_density(&self, pos: BlockPos) -> Fixed {
        let (x, y) = self.shifted(pos.x, pos.y);
        let mut sum = Fixed::ZERO;
        for i in 0..3 {
            let octave = simplex3(x, y, pos.z, CAVE_SCALES[i], self.octave_seeds[i]);
            sum = sum + octave * OCTAVE_WEIGHTS[i];
        }
        sum
    }

    /// The natural block at `pos`. Never `Uninitialized`.
    pub fn generate_block(&self, pos: BlockPos) -> BlockType {
        let surface = self.surface_height(pos.x, pos.y);
        if pos.z > surface {
            return BlockType::Air;
        }
        if pos.z == surface {
            return BlockType::Grass;
        }
        if surface - self.topsoil_depth(pos.x, pos.y) <= pos.z {
            return BlockType::Dirt;
        }
        if self.cave_density(pos) >= CAVE_THRESHOLD {
            return BlockType::Air;
        }
        if hash3(pos.x, pos.y, pos.z) % ORE_RARITY == 0 {
            BlockType::Ore
        } else {
            BlockType::Stone
        }
    }

    /// `count` blocks upward from `start`, generated in parallel. Element `i`
    /// is the block at `start.z + i`. A column running past `z = i64::MAX`
    /// is cut short there.
    pub fn generate_column(&self, start: BlockPos, count: usize) -> Vec<BlockType> {
        let room = (i64::MAX as i128 - start.z as i128 + 1) as u128;
        let count = (count as u128).min(room) as usize;
        (0..count)
            .into_par_iter()
            .map(|i| self.generate_block(start.offset(0, 0, i as i64)))
            .collect()
    }

    fn shifted(&self, x: i64, y: i64) -> (i64, i64) {
        (x.wrapping_add(self.shift.0), y.wrapping_add(self.shift.1))
    }
}

impl Default for TerrainGenerator {
    fn default() -> Self {
        Self::new(0)
    }
}
