//! Bit-field layout of a storage slot.
//!
//! A slot is a `u64` holding `STATES_PER_SLOT` 3-bit voxel states, state `i`
//! at bits `3i..3i+3`. 21 × 3 = 63, so a field never crosses into the next
//! word and the top bit is always zero.

/// Width of one voxel state.
pub const BITS_PER_STATE: u32 = 3;
/// Voxel states per storage word.
pub const STATES_PER_SLOT: usize = (u64::BITS / BITS_PER_STATE) as usize;
/// Mask of a single state, before shifting.
pub const STATE_MASK: u64 = (1 << BITS_PER_STATE) - 1;

/// Read the state at `offset` (a bit offset, multiple of 3, below 63).
#[inline]
pub const fn read_field(word: u64, offset: u32) -> u8 {
    ((word >> offset) & STATE_MASK) as u8
}

/// Return `word` with the state at `offset` replaced by `value`.
/// Only the low three bits of `value` are used.
#[inline]
pub const fn write_field(word: u64, offset: u32, value: u8) -> u64 {
    let mask = STATE_MASK << offset;
    (word & !mask) | (((value as u64) & STATE_MASK) << offset)
}
