//! Benchmark: sequential vs parallel terrain generation.
//!
//! Generates a grid of full-height columns both ways and checks they agree.
//! Run with: `cargo run --release -p terraforge-engine --example terrain_bench`

use std::time::Instant;

use terraforge_engine::terrain::TerrainGenerator;
use terraforge_engine::world::block::BlockType;
use terraforge_engine::world::position::BlockPos;

fn main() {
    let side: i64 = 16;
    let height: usize = 256;
    let generator = TerrainGenerator::new(42);

    println!("=== terraforge: Terrain Generation Benchmark ===\n");
    println!(
        "  {}x{} columns, {} voxels each ({} total)\n",
        side,
        side,
        height,
        side * side * height as i64
    );

    // --- Sequential ---
    let t0 = Instant::now();
    let mut seq = Vec::with_capacity((side * side) as usize);
    for x in 0..side {
        for y in 0..side {
            let column: Vec<BlockType> = (0..height)
                .map(|z| generator.generate_block(BlockPos::new(x, y, z as i64)))
                .collect();
            seq.push(column);
        }
    }
    let dt_seq = t0.elapsed();
    println!("  Sequential: {:>8.2?}", dt_seq);

    // --- Parallel (rayon, per column) ---
    let t0 = Instant::now();
    let mut par = Vec::with_capacity((side * side) as usize);
    for x in 0..side {
        for y in 0..side {
            par.push(generator.generate_column(BlockPos::new(x, y, 0), height));
        }
    }
    let dt_par = t0.elapsed();
    println!("  Parallel:   {:>8.2?}", dt_par);

    let speedup = dt_seq.as_secs_f64() / dt_par.as_secs_f64();
    println!("\n  Speedup: {:.2}x", speedup);

    // --- Verify identical ---
    let mismatches = seq
        .iter()
        .zip(&par)
        .flat_map(|(a, b)| a.iter().zip(b))
        .filter(|(a, b)| a != b)
        .count();

    let mut counts = [0usize; BlockType::ALL.len()];
    for block in seq.iter().flatten() {
        counts[block.raw() as usize] += 1;
    }
    println!();
    for block in BlockType::ALL {
        if counts[block.raw() as usize] > 0 {
            println!("  {:<8} {:>8}", block.name(), counts[block.raw() as usize]);
        }
    }

    if mismatches == 0 {
        println!("\n  Results: IDENTICAL");
    } else {
        println!("\n  Results: {} MISMATCHES", mismatches);
    }
}
