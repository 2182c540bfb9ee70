//! Rx-buffer pool configuration (original spec §4.3.2).

/// Sizing and expiry knobs for an [`crate::pool::RxBufferPool`].
#[derive(Debug, Clone, Copy)]
pub struct RxBufferPoolConfig {
    /// Maximum soft-bits a single codeblock can hold.
    pub max_codeblock_size: usize,
    /// Number of `(rnti, harq_id)` reservation slots the pool can hold.
    pub nof_buffers: usize,
    /// Total number of codeblocks shared across all reservations.
    pub nof_codeblocks: usize,
    /// Slots a reservation may sit idle (unlocked, un-renewed) before
    /// housekeeping frees it.
    pub expire_timeout_slots: u64,
    /// When true, soft-bit storage lives outside the pool (e.g. in
    /// accelerator memory) and codeblock soft-bit backing is zero-length.
    pub external_soft_bits: bool,
}

impl RxBufferPoolConfig {
    pub fn data_bits_per_codeblock(&self) -> usize {
        self.max_codeblock_size.div_ceil(3)
    }

    pub fn soft_bits_per_codeblock(&self) -> usize {
        if self.external_soft_bits {
            0
        } else {
            self.max_codeblock_size
        }
    }
}

impl Default for RxBufferPoolConfig {
    fn default() -> Self {
        Self {
            max_codeblock_size: 8448,
            nof_buffers: 16,
            nof_codeblocks: 64,
            expire_timeout_slots: 200,
            external_soft_bits: false,
        }
    }
}
