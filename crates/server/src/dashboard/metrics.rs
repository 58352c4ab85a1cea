//! Lock-free per-call counters.
//!
//! API handlers update these via atomic operations -- no locks, no
//! allocations, no blocking on the hot path. The live feed reads them at
//! its own pace.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering::Relaxed};
use std::time::{Duration, Instant};

use serde::Serialize;

/// Every call of the public surface, for per-call accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    GetBlock,
    GetBlocks,
    GenerateBlock,
    MineBlock,
    PlaceBlock,
    ReadState,
    WriteState,
    GetBlockBalance,
}

impl Call {
    pub const ALL: [Call; 8] = [
        Call::GetBlock,
        Call::GetBlocks,
        Call::GenerateBlock,
        Call::MineBlock,
        Call::PlaceBlock,
        Call::ReadState,
        Call::WriteState,
        Call::GetBlockBalance,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Call::GetBlock => "get_block",
            Call::GetBlocks => "get_blocks",
            Call::GenerateBlock => "generate_block",
            Call::MineBlock => "mine_block",
            Call::PlaceBlock => "place_block",
            Call::ReadState => "read_state",
            Call::WriteState => "write_state",
            Call::GetBlockBalance => "get_block_balance",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

#[derive(Default)]
struct CallCounters {
    calls: AtomicU64,
    failures: AtomicU64,
    ns_sum: AtomicU64,
}

/// Atomic per-call counters plus one latency histogram over all calls.
pub struct Metrics {
    per_call: [CallCounters; Call::ALL.len()],

    // Latency histogram buckets (call duration)
    hist_under_1us: AtomicU64,
    hist_1_10us: AtomicU64,
    hist_10_100us: AtomicU64,
    hist_100us_1ms: AtomicU64,
    hist_over_1ms: AtomicU64,

    started_at: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            per_call: Default::default(),
            hist_under_1us: AtomicU64::new(0),
            hist_1_10us: AtomicU64::new(0),
            hist_10_100us: AtomicU64::new(0),
            hist_100us_1ms: AtomicU64::new(0),
            hist_over_1ms: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    /// Called once per completed call. Zero-alloc.
    pub fn record(&self, call: Call, duration: Duration, ok: bool) {
        let counters = &self.per_call[call.index()];
        counters.calls.fetch_add(1, Relaxed);
        if !ok {
            counters.failures.fetch_add(1, Relaxed);
        }
        counters
            .ns_sum
            .fetch_add(duration.as_nanos() as u64, Relaxed);

        let us = duration.as_micros() as u64;
        match us {
            0 => {
                self.hist_under_1us.fetch_add(1, Relaxed);
            }
            1..=9 => {
                self.hist_1_10us.fetch_add(1, Relaxed);
            }
            10..=99 => {
                self.hist_10_100us.fetch_add(1, Relaxed);
            }
            100..=999 => {
                self.hist_100us_1ms.fetch_add(1, Relaxed);
            }
            _ => {
                self.hist_over_1ms.fetch_add(1, Relaxed);
            }
        }
    }

    /// Read all counters into a serializable snapshot.
    pub fn snapshot(&self, slots_stored: u64) -> MetricsSnapshot {
        let calls = Call::ALL
            .iter()
            .map(|&call| {
                let c = &self.per_call[call.index()];
                (
                    call.name(),
                    CallStats {
                        calls: c.calls.load(Relaxed),
                        failures: c.failures.load(Relaxed),
                        ns_sum: c.ns_sum.load(Relaxed),
                    },
                )
            })
            .collect();

        MetricsSnapshot {
            uptime_secs: self.started_at.elapsed().as_secs_f64(),
            slots_stored,
            calls,
            hist: [
                self.hist_under_1us.load(Relaxed),
                self.hist_1_10us.load(Relaxed),
                self.hist_10_100us.load(Relaxed),
                self.hist_100us_1ms.load(Relaxed),
                self.hist_over_1ms.load(Relaxed),
            ],
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct CallStats {
    pub calls: u64,
    pub failures: u64,
    pub ns_sum: u64,
}

/// Serializable snapshot of all metrics at a point in time.
/// Clients compute rates by diffing consecutive snapshots.
#[derive(Clone, Debug, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: f64,
    pub slots_stored: u64,
    pub calls: BTreeMap<&'static str, CallStats>,
    /// `[<1μs, 1-10μs, 10-100μs, 100μs-1ms, >1ms]`
    pub hist: [u64; 5],
}
