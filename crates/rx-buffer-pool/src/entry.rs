//! Rx-buffer entry state machine (original spec §3, §4.3.4).

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use parking_lot::Mutex;
use ran_types::RxBufferIdentifier;
use thiserror::Error;

use crate::codeblock::CodeblockPool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EntryState {
    Available = 0,
    Reserved = 1,
    Locked = 2,
}

impl EntryState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Available,
            1 => Self::Reserved,
            2 => Self::Locked,
            _ => unreachable!("rx buffer entry state out of range"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntryError {
    #[error("insufficient codeblocks available")]
    InsufficientBuffers,
    #[error("entry is locked by another reservation")]
    Locked,
    #[error("invalid state transition from {from:?}")]
    InvalidTransition { from: EntryState },
}

/// One reservation slot: a fixed pool of codeblock ids, a CRC flag per
/// codeblock, and a state/identifier/expiry triple. Every field besides
/// `state` is only ever touched from the slot-processing thread *or* while
/// the caller holds the entry locked, per the original spec's concurrency
/// model (§5).
pub struct RxBufferEntry {
    state: AtomicU8,
    identifier: Mutex<RxBufferIdentifier>,
    expiration_slot: AtomicU64,
    codeblock_ids: Mutex<Vec<usize>>,
    crc: Mutex<Vec<bool>>,
}

impl RxBufferEntry {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(EntryState::Available as u8),
            identifier: Mutex::new(RxBufferIdentifier::invalid()),
            expiration_slot: AtomicU64::new(0),
            codeblock_ids: Mutex::new(Vec::new()),
            crc: Mutex::new(Vec::new()),
        }
    }

    pub fn state(&self) -> EntryState {
        EntryState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn identifier(&self) -> RxBufferIdentifier {
        *self.identifier.lock()
    }

    pub fn set_identifier(&self, id: RxBufferIdentifier) {
        *self.identifier.lock() = id;
    }

    pub fn expiration_slot(&self) -> u64 {
        self.expiration_slot.load(Ordering::Acquire)
    }

    pub fn set_expiration_slot(&self, slot: u64) {
        self.expiration_slot.store(slot, Ordering::Release);
    }

    pub fn is_free(&self) -> bool {
        self.state() == EntryState::Available
    }

    pub fn codeblock_ids(&self) -> Vec<usize> {
        self.codeblock_ids.lock().clone()
    }

    /// Mutable view of the CRC flags, handed to the PUSCH decoder
    /// (original spec §4.3.4 "`get_codeblocks_crc` returns a mutable view").
    pub fn with_crc_mut<R>(&self, f: impl FnOnce(&mut [bool]) -> R) -> R {
        f(&mut self.crc.lock())
    }

    /// Reserves `n_cb` codeblocks. Valid from `Available` (fresh
    /// allocation) or `Reserved` (resize — shrink frees surplus codeblocks,
    /// grow pulls more). A failed resize returns the entry to `Available`
    /// per the state table in the original spec.
    pub fn reserve(
        &self,
        n_cb: usize,
        reset_crc: bool,
        pool: &CodeblockPool,
    ) -> Result<(), EntryError> {
        match self.state() {
            EntryState::Locked => return Err(EntryError::Locked),
            EntryState::Available | EntryState::Reserved => {}
        }

        let mut ids = self.codeblock_ids.lock();
        let current_len = ids.len();

        if n_cb > current_len {
            match pool.acquire(n_cb - current_len) {
                Some(mut new_ids) => ids.append(&mut new_ids),
                None => {
                    // Resize failure returns the entry to Available, per
                    // the state table; a brand-new reservation simply stays
                    // Available (it never left it).
                    drop(ids);
                    self.transition_to_available();
                    return Err(EntryError::InsufficientBuffers);
                }
            }
        } else if n_cb < current_len {
            let surplus: Vec<usize> = ids.split_off(n_cb);
            pool.release(&surplus);
        }

        let mut crc = self.crc.lock();
        if reset_crc || crc.len() != ids.len() {
            *crc = vec![false; ids.len()];
        }

        self.state.store(EntryState::Reserved as u8, Ordering::Release);
        Ok(())
    }

    /// Transitions `Reserved -> Locked`. Called by the unique handle
    /// constructor; fails if the entry is not currently reserved (including
    /// if it is already locked, enforcing at-most-one concurrent user).
    pub fn lock(&self) -> Result<(), EntryError> {
        self.state
            .compare_exchange(
                EntryState::Reserved as u8,
                EntryState::Locked as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| ())
            .map_err(|_| EntryError::InvalidTransition {
                from: self.state(),
            })
    }

    /// `Locked -> Reserved`, on handle drop.
    pub fn unlock(&self) {
        let prev = self.state.swap(EntryState::Reserved as u8, Ordering::AcqRel);
        debug_assert_eq!(prev, EntryState::Locked as u8, "unlock of a non-locked entry");
    }

    /// `Locked -> Available`, freeing codeblocks and invalidating the
    /// identifier. Only valid from `Locked` (original spec §3).
    pub fn release(&self, pool: &CodeblockPool) {
        let prev = self.state.swap(EntryState::Available as u8, Ordering::AcqRel);
        debug_assert_eq!(prev, EntryState::Locked as u8, "release of a non-locked entry");
        self.free_codeblocks(pool);
    }

    /// Housekeeping path: `Reserved -> Available` if `expiration_slot <=
    /// slot`. Locked entries are deferred instead (their expiry is pushed
    /// forward by `expire_timeout_slots` to avoid indefinite pinning).
    pub fn expire(&self, slot: u64, expire_timeout_slots: u64, pool: &CodeblockPool) {
        match self.state() {
            EntryState::Locked => {
                self.expiration_slot
                    .fetch_add(expire_timeout_slots, Ordering::AcqRel);
            }
            EntryState::Reserved => {
                if self.expiration_slot() <= slot {
                    let won = self
                        .state
                        .compare_exchange(
                            EntryState::Reserved as u8,
                            EntryState::Available as u8,
                            Ordering::AcqRel,
                            Ordering::Acquire,
                        )
                        .is_ok();
                    if won {
                        self.free_codeblocks(pool);
                    }
                }
            }
            EntryState::Available => {}
        }
    }

    fn free_codeblocks(&self, pool: &CodeblockPool) {
        let mut ids = self.codeblock_ids.lock();
        pool.release(&ids);
        ids.clear();
        self.crc.lock().clear();
        *self.identifier.lock() = RxBufferIdentifier::invalid();
    }

    fn transition_to_available(&self) {
        self.state.store(EntryState::Available as u8, Ordering::Release);
    }
}

impl Default for RxBufferEntry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ran_types::{HarqProcessId, Rnti};

    fn pool() -> CodeblockPool {
        CodeblockPool::new(&crate::config::RxBufferPoolConfig {
            nof_codeblocks: 8,
            ..Default::default()
        })
    }

    #[test]
    fn fresh_reservation_moves_available_to_reserved() {
        let pool = pool();
        let entry = RxBufferEntry::new();
        entry.reserve(2, true, &pool).unwrap();
        assert_eq!(entry.state(), EntryState::Reserved);
        assert_eq!(entry.codeblock_ids().len(), 2);
    }

    #[test]
    fn shrink_on_resize_frees_surplus_codeblocks() {
        let pool = pool();
        let entry = RxBufferEntry::new();
        entry.reserve(4, true, &pool).unwrap();
        assert_eq!(pool.nof_free(), 4);
        entry.reserve(1, false, &pool).unwrap();
        assert_eq!(entry.codeblock_ids().len(), 1);
        assert_eq!(pool.nof_free(), 7);
    }

    #[test]
    fn grow_on_resize_pulls_more_codeblocks() {
        let pool = pool();
        let entry = RxBufferEntry::new();
        entry.reserve(1, true, &pool).unwrap();
        entry.reserve(3, false, &pool).unwrap();
        assert_eq!(entry.codeblock_ids().len(), 3);
    }

    #[test]
    fn failed_resize_returns_entry_to_available() {
        let pool = pool();
        let entry = RxBufferEntry::new();
        entry.reserve(8, true, &pool).unwrap();
        let other = RxBufferEntry::new();
        assert!(matches!(
            other.reserve(1, true, &pool),
            Err(EntryError::InsufficientBuffers)
        ));
        assert_eq!(other.state(), EntryState::Available);
    }

    #[test]
    fn lock_then_unlock_round_trips_through_locked() {
        let pool = pool();
        let entry = RxBufferEntry::new();
        entry.reserve(1, true, &pool).unwrap();
        entry.lock().unwrap();
        assert_eq!(entry.state(), EntryState::Locked);
        assert!(entry.lock().is_err(), "second lock must fail");
        entry.unlock();
        assert_eq!(entry.state(), EntryState::Reserved);
    }

    #[test]
    fn release_frees_codeblocks_and_invalidates_identifier() {
        let pool = pool();
        let entry = RxBufferEntry::new();
        entry.set_identifier(RxBufferIdentifier {
            rnti: Rnti(0x4601),
            harq_process_id: HarqProcessId(1),
        });
        entry.reserve(2, true, &pool).unwrap();
        entry.lock().unwrap();
        entry.release(&pool);
        assert_eq!(entry.state(), EntryState::Available);
        assert!(!entry.identifier().is_valid());
        assert_eq!(pool.nof_free(), pool.capacity());
    }

    #[test]
    fn locked_entry_never_expires() {
        let pool = pool();
        let entry = RxBufferEntry::new();
        entry.reserve(1, true, &pool).unwrap();
        entry.set_expiration_slot(10);
        entry.lock().unwrap();
        entry.expire(100, 200, &pool);
        assert_eq!(entry.state(), EntryState::Locked);
        assert!(entry.expiration_slot() > 100);
    }

    #[test]
    fn reserved_entry_expires_only_past_its_deadline() {
        let pool = pool();
        let entry = RxBufferEntry::new();
        entry.reserve(1, true, &pool).unwrap();
        entry.set_expiration_slot(10);
        entry.expire(5, 200, &pool);
        assert_eq!(entry.state(), EntryState::Reserved, "not yet expired");
        entry.expire(10, 200, &pool);
        assert_eq!(entry.state(), EntryState::Available);
    }
}
