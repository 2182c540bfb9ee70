//! Manual and signal events.
//!
//! Grounded on the original spec's §3/§4.1 "manual event" and "signal
//! event" awaitables. Both are implemented on top of [`tokio::sync::Notify`]
//! rather than a hand-rolled intrusive awaiter list: `Notify::notified()`
//! registers interest *before* the caller checks state, which gives us the
//! same "no suspension if already set" behaviour the original spec asks for
//! without the lost-wakeup race a naive check-then-wait implementation would
//! have.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tokio::sync::Notify;

/// A one-shot value that latches: once [`ManualEvent::set`] is called, every
/// current and future waiter observes the value, until [`ManualEvent::reset`]
/// returns it to unset.
///
/// Invariant (original spec §3): the event is in exactly one of `unset` or
/// `set(value)`. Setting an already-set event is a programming error.
pub struct ManualEvent<T> {
    value: Mutex<Option<T>>,
    notify: Notify,
}

impl<T: Clone> ManualEvent<T> {
    pub fn new() -> Self {
        Self {
            value: Mutex::new(None),
            notify: Notify::new(),
        }
    }

    /// Latches `value` and wakes every waiter. Panics if the event was
    /// already set — double-set is a programming error (original spec §7),
    /// not a recoverable condition.
    pub fn set(&self, value: T) {
        let mut guard = self.value.lock().unwrap();
        assert!(guard.is_none(), "manual_event set twice");
        *guard = Some(value);
        drop(guard);
        self.notify.notify_waiters();
    }

    /// Returns to unset. A no-op unless the event is currently set (original
    /// spec: "`reset` returns to unset only from the set state").
    pub fn reset(&self) {
        let mut guard = self.value.lock().unwrap();
        *guard = None;
    }

    pub fn is_set(&self) -> bool {
        self.value.lock().unwrap().is_some()
    }

    /// Suspends until the event is set, or returns immediately if it
    /// already is.
    pub async fn wait(&self) -> T {
        loop {
            let notified = self.notify.notified();
            if let Some(value) = self.value.lock().unwrap().clone() {
                return value;
            }
            notified.await;
        }
    }
}

impl<T: Clone> Default for ManualEvent<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// An edge-triggered event: [`SignalEvent::set`] wakes every waiter
/// currently suspended on [`SignalEvent::wait`], but does not latch — a
/// waiter that calls `wait` after the edge has passed suspends until the
/// *next* `set`. There is no `reset`: every `set` is itself an edge.
pub struct SignalEvent {
    waiters: Mutex<Vec<tokio::sync::oneshot::Sender<()>>>,
}

impl SignalEvent {
    pub fn new() -> Self {
        Self {
            waiters: Mutex::new(Vec::new()),
        }
    }

    /// Wakes every waiter registered so far. Waiters registered after this
    /// call returns do not observe this edge.
    pub fn set(&self) {
        let waiters = std::mem::take(&mut *self.waiters.lock().unwrap());
        for sender in waiters {
            let _ = sender.send(());
        }
    }

    pub async fn wait(&self) {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.waiters.lock().unwrap().push(tx);
        // A dropped sender (the event itself dropped without firing) just
        // resolves the receiver with an error we discard: the waiter simply
        // never observes an edge, matching "no reset, no latch".
        let _ = rx.await;
    }
}

impl Default for SignalEvent {
    fn default() -> Self {
        Self::new()
    }
}

/// State observed by a [`ScopedEventReceiver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopedEventOutcome<T> {
    Set(T),
    Cancelled,
}

/// Receiver half of a single-shot scoped event. Constructed in pairs with a
/// [`ScopedEventSender`] via [`scoped_event`].
pub struct ScopedEventReceiver<T> {
    rx: tokio::sync::oneshot::Receiver<T>,
}

impl<T> ScopedEventReceiver<T> {
    /// Suspends until the paired sender sets a value or is dropped.
    pub async fn wait(self) -> ScopedEventOutcome<T> {
        match self.rx.await {
            Ok(value) => ScopedEventOutcome::Set(value),
            Err(_) => ScopedEventOutcome::Cancelled,
        }
    }
}

/// Sender half of a single-shot scoped event. Dropping an unset sender is
/// the cancellation edge (original spec §3: "a `sender`... on drop, cancels
/// the receiver").
pub struct ScopedEventSender<T> {
    tx: Option<tokio::sync::oneshot::Sender<T>>,
    fired: AtomicBool,
}

impl<T> ScopedEventSender<T> {
    /// Sets the value exactly once. At most one sender exists per receiver
    /// by construction (`scoped_event` hands out exactly one of each).
    pub fn set(mut self, value: T) {
        self.fired.store(true, Ordering::Relaxed);
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(value);
        }
    }
}

impl<T> Drop for ScopedEventSender<T> {
    fn drop(&mut self) {
        // `set` takes `self` by value, so a sender that reaches here without
        // having set its value simply lets `tx` drop, which closes the
        // channel and the receiver observes `Cancelled`.
    }
}

/// Creates a single-shot, single-sender scoped event pair.
pub fn scoped_event<T>() -> (ScopedEventSender<T>, ScopedEventReceiver<T>) {
    let (tx, rx) = tokio::sync::oneshot::channel();
    (
        ScopedEventSender {
            tx: Some(tx),
            fired: AtomicBool::new(false),
        },
        ScopedEventReceiver { rx },
    )
}
