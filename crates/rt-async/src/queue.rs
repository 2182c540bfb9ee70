//! Bounded async FIFO queue.
//!
//! Grounded on the original spec's §3 "async queue": either the ring holds
//! values or the awaiter list holds waiters, never both. [`tokio::sync::mpsc`]
//! gives us exactly this invariant for free — a bounded channel either
//! buffers up to its capacity or blocks producers, and a waiting receiver is
//! handed a value directly as soon as one is sent.

use thiserror::Error;
use tokio::sync::{mpsc, Mutex};

#[derive(Debug, Error)]
pub enum AsyncQueueError {
    #[error("async queue is full")]
    Full,
    #[error("async queue is closed")]
    Closed,
}

/// A bounded multi-producer, single-consumer FIFO. Producers clone the
/// queue (cheap, `Arc`-backed) to push; exactly one task should drive
/// [`AsyncQueue::pop`] at a time (the task sequencer's driver loop is the
/// only consumer in this codebase).
pub struct AsyncQueue<T> {
    sender: mpsc::Sender<T>,
    receiver: Mutex<mpsc::Receiver<T>>,
}

impl<T> AsyncQueue<T> {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity);
        Self {
            sender,
            receiver: Mutex::new(receiver),
        }
    }

    /// Non-suspending push. Fails with `Full` iff the queue holds `capacity`
    /// elements and no awaiter is ready to receive immediately (original
    /// spec, testable property 4).
    pub fn try_push(&self, value: T) -> Result<(), AsyncQueueError> {
        self.sender.try_send(value).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => AsyncQueueError::Full,
            mpsc::error::TrySendError::Closed(_) => AsyncQueueError::Closed,
        })
    }

    /// Suspending push: waits for room if the queue is full.
    pub async fn push(&self, value: T) -> Result<(), AsyncQueueError> {
        self.sender
            .send(value)
            .await
            .map_err(|_| AsyncQueueError::Closed)
    }

    /// Suspends until a value is available, or returns `None` once every
    /// sender has been dropped and the buffer is drained.
    pub async fn pop(&self) -> Option<T> {
        self.receiver.lock().await.recv().await
    }

    /// A second handle to the same queue for producers.
    pub fn sender(&self) -> AsyncQueueSender<T> {
        AsyncQueueSender {
            sender: self.sender.clone(),
        }
    }
}

/// A cloneable producer handle, for callers that only need to push.
#[derive(Clone)]
pub struct AsyncQueueSender<T> {
    sender: mpsc::Sender<T>,
}

impl<T> AsyncQueueSender<T> {
    pub fn try_push(&self, value: T) -> Result<(), AsyncQueueError> {
        self.sender.try_send(value).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => AsyncQueueError::Full,
            mpsc::error::TrySendError::Closed(_) => AsyncQueueError::Closed,
        })
    }

    pub async fn push(&self, value: T) -> Result<(), AsyncQueueError> {
        self.sender
            .send(value)
            .await
            .map_err(|_| AsyncQueueError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn try_push_fails_only_when_full_and_no_waiting_consumer() {
        let queue: AsyncQueue<u32> = AsyncQueue::new(1);
        queue.try_push(1).unwrap();
        assert!(matches!(queue.try_push(2), Err(AsyncQueueError::Full)));
        assert_eq!(queue.pop().await, Some(1));
        queue.try_push(3).unwrap();
        assert_eq!(queue.pop().await, Some(3));
    }

    #[tokio::test]
    async fn pop_delivers_in_fifo_order() {
        let queue: AsyncQueue<u32> = AsyncQueue::new(4);
        queue.try_push(1).unwrap();
        queue.try_push(2).unwrap();
        queue.try_push(3).unwrap();
        assert_eq!(queue.pop().await, Some(1));
        assert_eq!(queue.pop().await, Some(2));
        assert_eq!(queue.pop().await, Some(3));
    }

    #[tokio::test]
    async fn cloned_sender_handle_pushes_into_the_same_queue() {
        let queue: AsyncQueue<u32> = AsyncQueue::new(4);
        let sender = queue.sender();
        sender.push(1).await.unwrap();
        sender.try_push(2).unwrap();
        assert_eq!(queue.pop().await, Some(1));
        assert_eq!(queue.pop().await, Some(2));
    }
}
