//! Lazy and eager tasks.
//!
//! Grounded on the original spec's §3/§4.1 task contracts, reimplemented per
//! its own Design Note with native `async`/`await` instead of a hand-rolled
//! frame: Rust futures are inert until polled, which gives a boxed,
//! not-yet-spawned future the "suspends at creation" semantics of a lazy
//! task for free. An eager task is one already handed to the executor via
//! [`tokio::spawn`], matching "runs to first suspension on construction".
//!
//! Both are single-shot: a `LazyTask` is consumed by awaiting it (the
//! compiler enforces "awaited at most once" through ordinary move
//! semantics), and an `EagerTask` wraps a [`tokio::task::JoinHandle`], whose
//! `poll` already returns the cached output on every subsequent poll without
//! re-running the body — "awaiting a completed task yields its value
//! without suspension" (original spec §3).

use std::future::Future;
use std::pin::Pin;

use tokio::task::JoinHandle;

/// A task that does not start running until it is awaited.
///
/// `Fut` is boxed because the procedures in this codebase build lazy tasks
/// from many different concrete future types (one per RAN procedure) and
/// need to store them behind a single type.
pub struct LazyTask<T> {
    future: Pin<Box<dyn Future<Output = T> + Send>>,
}

impl<T> LazyTask<T> {
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self {
            future: Box::pin(future),
        }
    }

    /// Runs the task to completion. Consumes `self`, so a `LazyTask` can be
    /// awaited at most once — attempting to await it twice is a compile
    /// error, not a runtime one.
    pub async fn run(self) -> T {
        self.future.await
    }
}

impl<T> Future for LazyTask<T> {
    type Output = T;

    fn poll(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Self::Output> {
        self.future.as_mut().poll(cx)
    }
}

/// A task already running on the executor. Dropping an `EagerTask` aborts
/// the underlying Tokio task — the cancel-on-drop contract the original
/// spec requires of coroutine frames (§4.1 "Cancellation path").
pub struct EagerTask<T> {
    handle: JoinHandle<T>,
}

impl<T: Send + 'static> EagerTask<T> {
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(future),
        }
    }

    /// Aborts the task without waiting for it to unwind. Safe to call after
    /// the task has already finished (a no-op in that case).
    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl<T> Future for EagerTask<T> {
    type Output = Result<T, tokio::task::JoinError>;

    fn poll(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Self::Output> {
        Pin::new(&mut self.handle).poll(cx)
    }
}

impl<T> Drop for EagerTask<T> {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
