//! Execution units that a [`Pool`](crate::pool::Pool) hands tasks to.
//!
//! A [`WorkerFactory`] is the fixed (function, context, resources) triple a
//! pool is built from. The pool calls [`WorkerFactory::create`] lazily, at most
//! once per slot, and then reuses the resulting [`Worker`] for every task that
//! lands on that slot.
//!
//! # Available Workers
//!
//! | Worker | Runs on | Use for |
//! |--------|---------|---------|
//! | [`ThreadWorker`] | a dedicated OS thread per worker | blocking or CPU-bound work |
//! | [`TaskWorker`] | the tokio runtime | async work |

mod task;
mod thread;

use std::any::Any;

use async_trait::async_trait;

use crate::pool::PoolResult;

pub use task::{TaskWorker, TaskWorkers};
pub use thread::{ThreadError, ThreadWorker, ThreadWorkers};

/// A reusable execution unit that runs one task at a time.
#[async_trait]
pub trait Worker: Send + Sync + 'static {
    /// Arguments of one task.
    type Args: Send + 'static;

    /// Successful result of one task.
    type Output: Send + 'static;

    /// Failure reported by the worker. The pool never inspects it.
    type Error: Send + 'static;

    /// Runs a single task to completion.
    async fn run(&self, args: Self::Args) -> Result<Self::Output, Self::Error>;

    /// Releases whatever the worker holds. Called once, on pool disposal.
    fn dispose(&self) {}
}

/// Builds the workers of a pool.
pub trait WorkerFactory: Send + Sync + 'static {
    /// The worker type this factory produces.
    type Worker: Worker;

    /// Creates the worker for slot `index` of the pool called `pool`.
    fn create(&self, index: usize, pool: &str) -> PoolResult<Self::Worker>;
}

/// Task arguments accepted by the workers of `F`.
pub type ArgsOf<F> = <<F as WorkerFactory>::Worker as Worker>::Args;

/// Task output produced by the workers of `F`.
pub type OutputOf<F> = <<F as WorkerFactory>::Worker as Worker>::Output;

/// Task error reported by the workers of `F`.
pub type ErrorOf<F> = <<F as WorkerFactory>::Worker as Worker>::Error;

/// Extract a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
