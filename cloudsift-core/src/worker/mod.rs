//! Bounded worker pool executing scan tasks.
//!
//! A [`WorkerPool`] owns a fixed set of Tokio workers pulling [`Task`]s from
//! a bounded queue. Submission applies backpressure once the queue is full,
//! every task runs under its own cancellation token and timeout, and failures
//! are counted rather than propagated. [`WorkerPool::execute_tasks`] reports
//! the outcome of each task of a batch as a [`BatchReport`].

mod metrics;
mod outcome;
mod pool;
mod shared;
mod task;

pub use outcome::{BatchReport, TaskOutcome};
pub use pool::{DEFAULT_TASK_TIMEOUT, WorkerPool};
pub use shared::{init_shared_pool, shared_pool};
pub use task::{Task, TaskFuture};
