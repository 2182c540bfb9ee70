//! Transaction manager.
//!
//! Grounded on the original spec's §3/§4.1 "transaction" contract: a
//! fixed-size pool of one-shot value slots, indexed by a rolling id, each
//! optionally guarded by a timeout. Per the Design Notes, a transaction can
//! be set and time out concurrently and the contract is first-writer-wins;
//! this is implemented with a single atomic flag per slot rather than by
//! relying on the timer having been cancelled before `set` runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use ran_types::SlotArray;
use thiserror::Error;

use crate::events::ManualEvent;
use crate::timer::{TimerOutcome, UniqueTimer};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransactionError {
    #[error("transaction manager has no free slots (capacity {capacity})")]
    NoFreeSlots { capacity: usize },
    #[error("transaction slot {id} is already in use")]
    SlotInUse { id: usize },
    #[error("no such transaction {id}")]
    NoSuchTransaction { id: usize },
}

/// What a transaction resolves to: the value the peer supplied, or the
/// manager's configured timeout sentinel.
#[derive(Debug, Clone)]
pub enum TransactionOutcome<T> {
    Value(T),
    TimedOut,
}

struct Slot<T> {
    completed: AtomicBool,
    event: ManualEvent<TransactionOutcome<T>>,
    timer: Mutex<Option<UniqueTimer>>,
}

impl<T: Clone> Slot<T> {
    fn new() -> Self {
        Self {
            completed: AtomicBool::new(false),
            event: ManualEvent::new(),
            timer: Mutex::new(None),
        }
    }
}

/// Fixed-size pool of correlation slots for request/response matching across
/// an async boundary (F1AP/E1AP/NGAP request vs. reply, in this codebase).
pub struct TransactionManager<T> {
    slots: Mutex<SlotArray<std::sync::Arc<Slot<T>>>>,
    capacity: usize,
}

/// Owns the pending transaction until it is awaited or cancelled. Dropping a
/// still-pending handle without calling [`TransactionHandle::cancel`] first
/// is a programming error (original spec §7).
pub struct TransactionHandle<'a, T: Clone> {
    id: usize,
    manager: &'a TransactionManager<T>,
    slot: std::sync::Arc<Slot<T>>,
    released: bool,
}

impl<T: Clone + Send + Sync + 'static> TransactionManager<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Mutex::new(SlotArray::new(capacity)),
            capacity,
        }
    }

    /// Allocates a transaction. If `id` is `None`, the lowest free slot is
    /// chosen (a rolling counter in effect, since slots are reused
    /// lowest-first); if `Some`, that exact slot must currently be idle.
    pub fn create_transaction(
        &self,
        id: Option<usize>,
        timeout: Option<Duration>,
    ) -> Result<TransactionHandle<'_, T>, TransactionError> {
        let slot = std::sync::Arc::new(Slot::new());
        let assigned_id = {
            let mut slots = self.slots.lock().unwrap();
            match id {
                Some(id) => {
                    slots
                        .insert_at(id, slot.clone())
                        .map_err(|_| TransactionError::SlotInUse { id })?;
                    id
                }
                None => slots
                    .insert(slot.clone())
                    .map_err(|_| TransactionError::NoFreeSlots {
                        capacity: self.capacity,
                    })?,
            }
        };

        if let Some(timeout) = timeout {
            let slot_for_timer = slot.clone();
            tokio::spawn(async move {
                let mut timer = UniqueTimer::new();
                if timer.wait(timeout).await == TimerOutcome::Expired
                    && !slot_for_timer.completed.swap(true, Ordering::SeqCst)
                {
                    slot_for_timer.event.set(TransactionOutcome::TimedOut);
                }
            });
        }

        Ok(TransactionHandle {
            id: assigned_id,
            manager: self,
            slot,
            released: false,
        })
    }

    /// Completes transaction `id` with `value`. Returns `false` (not an
    /// error) if the id does not exist or the transaction already completed
    /// — "first writer wins", per the Design Notes.
    pub fn set(&self, id: usize, value: T) -> bool {
        let slot = {
            let slots = self.slots.lock().unwrap();
            match slots.get(id) {
                Some(slot) => slot.clone(),
                None => return false,
            }
        };
        if slot.completed.swap(true, Ordering::SeqCst) {
            return false;
        }
        slot.event.set(TransactionOutcome::Value(value));
        true
    }
}

impl<'a, T: Clone> TransactionHandle<'a, T> {
    pub fn id(&self) -> usize {
        self.id
    }

    /// Suspends until the transaction is set or times out.
    pub async fn result(&self) -> TransactionOutcome<T> {
        self.slot.event.wait().await
    }

    /// Legitimately abandons a pending transaction without a value,
    /// freeing its slot. This is the only safe way to drop a handle whose
    /// transaction never completed.
    pub fn cancel(mut self) {
        self.slot.completed.store(true, Ordering::SeqCst);
        self.release();
    }

    fn release(&mut self) {
        if !self.released {
            self.manager.slots.lock().unwrap().remove(self.id).ok();
            self.released = true;
        }
    }
}

impl<'a, T: Clone> Drop for TransactionHandle<'a, T> {
    fn drop(&mut self) {
        if !self.released {
            let completed = self.slot.completed.load(Ordering::SeqCst);
            self.release();
            assert!(
                completed,
                "transaction {} destroyed while still pending (call cancel() first)",
                self.id
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_await_resolves_to_the_value() {
        let manager: TransactionManager<u32> = TransactionManager::new(4);
        let handle = manager.create_transaction(None, None).unwrap();
        let id = handle.id();
        manager.set(id, 42);
        match handle.result().await {
            TransactionOutcome::Value(v) => assert_eq!(v, 42),
            TransactionOutcome::TimedOut => panic!("expected a value"),
        }
    }

    #[tokio::test]
    async fn set_of_stale_id_returns_false() {
        let manager: TransactionManager<u32> = TransactionManager::new(4);
        assert!(!manager.set(3, 1));
    }

    #[tokio::test]
    async fn double_set_second_writer_is_discarded() {
        let manager: TransactionManager<u32> = TransactionManager::new(4);
        let handle = manager.create_transaction(None, None).unwrap();
        let id = handle.id();
        assert!(manager.set(id, 1));
        assert!(!manager.set(id, 2));
        match handle.result().await {
            TransactionOutcome::Value(v) => assert_eq!(v, 1),
            TransactionOutcome::TimedOut => panic!("expected a value"),
        }
    }

    #[tokio::test]
    async fn timeout_resolves_to_timed_out_sentinel() {
        let manager: TransactionManager<u32> = TransactionManager::new(4);
        let handle = manager
            .create_transaction(None, Some(Duration::from_millis(5)))
            .unwrap();
        match handle.result().await {
            TransactionOutcome::TimedOut => {}
            TransactionOutcome::Value(_) => panic!("expected a timeout"),
        }
    }

    #[tokio::test]
    async fn cancel_frees_the_slot_for_reuse() {
        let manager: TransactionManager<u32> = TransactionManager::new(1);
        let handle = manager.create_transaction(Some(0), None).unwrap();
        handle.cancel();
        let reused = manager.create_transaction(Some(0), None);
        assert!(reused.is_ok());
    }

    #[tokio::test]
    async fn full_manager_rejects_new_transactions() {
        let manager: TransactionManager<u32> = TransactionManager::new(1);
        let _handle = manager.create_transaction(None, None).unwrap();
        assert_eq!(
            manager.create_transaction(None, None).unwrap_err(),
            TransactionError::NoFreeSlots { capacity: 1 }
        );
    }

    #[tokio::test]
    #[should_panic(expected = "destroyed while still pending")]
    async fn dropping_a_pending_transaction_without_cancel_is_a_programming_error() {
        let manager: TransactionManager<u32> = TransactionManager::new(4);
        let _handle = manager.create_transaction(None, None).unwrap();
        // handle drops here, still pending and not cancelled.
    }
}
