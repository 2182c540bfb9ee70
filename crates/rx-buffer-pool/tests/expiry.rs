//! End-to-end scenarios named in the original spec's testable-properties
//! section: Rx-buffer-expiry and Rx-buffer-locked-entry-never-expires.

use ran_types::{HarqProcessId, Rnti, RxBufferIdentifier};
use rx_buffer_pool::{RxBufferPool, RxBufferPoolConfig};

fn config() -> RxBufferPoolConfig {
    RxBufferPoolConfig {
        max_codeblock_size: 128,
        nof_buffers: 1,
        nof_codeblocks: 4,
        expire_timeout_slots: 16,
        external_soft_bits: false,
    }
}

fn id(rnti: u16, harq: u8) -> RxBufferIdentifier {
    RxBufferIdentifier {
        rnti: Rnti(rnti),
        harq_process_id: HarqProcessId(harq),
    }
}

#[test]
fn rx_buffer_expiry() {
    let pool = RxBufferPool::new(config());
    let start_slot = 100u64;

    let handle = pool.reserve(start_slot, id(0x1234, 3), 2, true).unwrap();
    drop(handle);

    // Before the expiry boundary, the single buffer is still reserved for
    // the old identifier, so a different one cannot be admitted.
    for slot in start_slot..start_slot + config().expire_timeout_slots {
        pool.run_slot(slot);
        assert!(
            pool.reserve(slot, id(0x5678, 1), 1, true).is_none(),
            "slot {slot} freed the buffer too early"
        );
    }

    // At the boundary, housekeeping frees the old slot for a new identifier.
    let boundary = start_slot + config().expire_timeout_slots;
    pool.run_slot(boundary);
    assert!(pool.reserve(boundary, id(0x5678, 1), 1, true).is_some());
}

#[test]
fn rx_buffer_locked_entry_never_expires() {
    let pool = RxBufferPool::new(config());
    let start_slot = 0u64;

    let handle = pool.reserve(start_slot, id(0x1234, 3), 2, true).unwrap();

    for slot in 0..200 {
        pool.run_slot(slot);
        assert!(
            pool.reserve(slot, id(0x5678, 1), 1, true).is_none(),
            "locked entry must never expire"
        );
    }

    drop(handle);
    pool.run_slot(200);
    assert!(pool.reserve(200, id(0x5678, 1), 1, true).is_some());
}
