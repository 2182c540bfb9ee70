//! Cooperative task/coroutine runtime (C1 in the design).
//!
//! Every asynchronous RAN procedure in this workspace — UE attach,
//! reestablishment, handover, context release, F1/E1/NG setup — is modelled
//! as a native Rust `async fn` composed from the primitives here: tasks,
//! events, a bounded queue, a per-entity sequencer, and a transaction
//! manager for request/response correlation.

pub mod events;
pub mod queue;
pub mod sequencer;
pub mod task;
pub mod timer;
pub mod transaction;

pub use events::{scoped_event, ManualEvent, ScopedEventOutcome, ScopedEventReceiver, ScopedEventSender, SignalEvent};
pub use queue::{AsyncQueue, AsyncQueueError, AsyncQueueSender};
pub use sequencer::{SequencerError, TaskSequencer};
pub use task::{EagerTask, LazyTask};
pub use timer::{TimerOutcome, UniqueTimer};
pub use transaction::{TransactionError, TransactionHandle, TransactionManager, TransactionOutcome};
