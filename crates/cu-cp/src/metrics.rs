//! UE-lifecycle counters (original spec §8, testable property 8).

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct CuCpMetrics {
    pub reestablishments_with_context: AtomicU64,
    pub reestablishments_without_context: AtomicU64,
    pub handovers_requested: AtomicU64,
    pub handovers_succeeded: AtomicU64,
}

impl CuCpMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reestablishment_with_context(&self) -> u64 {
        self.reestablishments_with_context.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn reestablishment_without_context(&self) -> u64 {
        self.reestablishments_without_context.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn handover_requested(&self) -> u64 {
        self.handovers_requested.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn handover_succeeded(&self) -> u64 {
        self.handovers_succeeded.fetch_add(1, Ordering::Relaxed) + 1
    }
}
