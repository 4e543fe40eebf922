//! Unbounded FIFO queue in front of a [`Pool`].
//!
//! ```text
//! submit ──▶ ┌──────────────┐  drain   ┌──────┐
//!            │ VecDeque<Task>│ ───────▶ │ Pool │ ──▶ Worker
//!            └──────────────┘          └──┬───┘
//!                    ▲                    │ slot freed
//!                    └──── dispatcher ◀───┘
//! ```
//!
//! `submit` buffers the task and drains immediately, so an idle queue starts
//! work without a round trip through the dispatcher. Every released slot
//! wakes the dispatcher, which drains again.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;

use crate::config::PoolConfig;
use crate::pool::{Outcome, Pool, PoolResult, PoolStats, RejectKind, Rejected, Settle, TaskError};
use crate::worker::{ArgsOf, ErrorOf, OutputOf, WorkerFactory};

/// A buffered task: its arguments and where its result goes.
struct Task<F: WorkerFactory> {
    args: ArgsOf<F>,
    settle: Settle<OutputOf<F>, ErrorOf<F>>,
}

struct Buffer<F: WorkerFactory> {
    tasks: VecDeque<Task<F>>,
    disposed: bool,
}

struct Inner<F: WorkerFactory> {
    pool: Pool<F>,
    buffer: Mutex<Buffer<F>>,
}

impl<F: WorkerFactory> Inner<F> {
    fn buffer(&self) -> MutexGuard<'_, Buffer<F>> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move tasks from the head of the buffer into the pool until either runs
    /// out.
    fn drain(&self) {
        let mut buffer = self.buffer();
        let mut dispatched = 0usize;

        while self.pool.ready() {
            let Some(task) = buffer.tasks.pop_front() else {
                break;
            };

            match self.pool.admit(task.args, task.settle) {
                Ok(()) => dispatched += 1,
                Err(Rejected {
                    args: (args, settle),
                    kind: RejectKind::NoSlot,
                }) => {
                    buffer.tasks.push_front(Task { args, settle });
                    break;
                }
                Err(Rejected {
                    args: (_, settle),
                    kind: RejectKind::Fault(e),
                }) => {
                    tracing::error!(pool = %self.pool.name(), error = %e, "task dropped by pool fault");
                    let _ = settle.send(Err(TaskError::Pool(e)));
                }
            }
        }

        if dispatched > 0 {
            tracing::debug!(
                pool = %self.pool.name(),
                dispatched,
                pending = buffer.tasks.len(),
                "queue drained"
            );
        }
    }
}

/// Accepts any number of tasks and runs them on a [`Pool`] in submission
/// order.
///
/// Dispatch is FIFO; completion order depends on the workers. Dropping the
/// queue disposes it.
pub struct Queue<F: WorkerFactory> {
    inner: Arc<Inner<F>>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl<F: WorkerFactory> Queue<F> {
    /// Create a queue over a new pool on the current tokio runtime.
    pub fn new(name: impl Into<String>, capacity: usize, factory: F) -> PoolResult<Self> {
        Ok(Self::with_pool(Pool::new(name, capacity, factory)?))
    }

    /// Create a queue from loaded configuration.
    pub fn from_config(config: &PoolConfig, factory: F) -> PoolResult<Self> {
        Ok(Self::with_pool(Pool::from_config(config, factory)?))
    }

    /// Put a queue in front of an existing pool.
    ///
    /// The queue must be the only one submitting to `pool`.
    pub fn with_pool(pool: Pool<F>) -> Self {
        let inner = Arc::new(Inner {
            pool: pool.clone(),
            buffer: Mutex::new(Buffer {
                tasks: VecDeque::new(),
                disposed: false,
            }),
        });

        let dispatcher = pool.runtime().spawn(dispatch(Arc::clone(&inner)));

        Self {
            inner,
            dispatcher: Mutex::new(Some(dispatcher)),
        }
    }

    /// Always true until disposal: the queue never turns a task away.
    pub fn ready(&self) -> bool {
        !self.inner.buffer().disposed
    }

    /// Buffer a task and return its outcome.
    ///
    /// After disposal the outcome settles immediately with
    /// [`TaskError::Disposed`].
    pub fn submit(&self, args: ArgsOf<F>) -> Outcome<OutputOf<F>, ErrorOf<F>> {
        let (settle, outcome) = Outcome::channel();

        {
            let mut buffer = self.inner.buffer();
            if buffer.disposed {
                tracing::warn!(pool = %self.inner.pool.name(), "submit after dispose");
                return Outcome::disposed();
            }
            buffer.tasks.push_back(Task { args, settle });
        }

        self.inner.drain();
        outcome
    }

    /// Number of tasks waiting for a slot.
    pub fn pending_count(&self) -> usize {
        self.inner.buffer().tasks.len()
    }

    /// Number of tasks currently running.
    pub fn active_count(&self) -> usize {
        self.inner.pool.active_count()
    }

    /// Maximum number of concurrent tasks. Zero after disposal.
    pub fn capacity(&self) -> usize {
        self.inner.pool.capacity()
    }

    /// The underlying pool.
    pub fn pool(&self) -> &Pool<F> {
        &self.inner.pool
    }

    /// Snapshot of the pool's counters plus the buffer length.
    pub fn stats(&self) -> PoolStats {
        let pending = self.pending_count();
        PoolStats {
            pending,
            ..self.inner.pool.stats()
        }
    }

    /// Dispose the pool, then drop every buffered task.
    ///
    /// Dropped tasks settle with [`TaskError::Disposed`]. Running tasks are
    /// left alone. Calling this again is a no-op.
    pub fn dispose(&self) {
        self.inner.pool.dispose();

        let dropped: Vec<_> = {
            let mut buffer = self.inner.buffer();
            buffer.disposed = true;
            buffer.tasks.drain(..).collect()
        };

        if let Some(dispatcher) = self
            .dispatcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            dispatcher.abort();
        }

        if !dropped.is_empty() {
            tracing::info!(
                pool = %self.inner.pool.name(),
                dropped = dropped.len(),
                "pending tasks dropped"
            );
        }
        // Dropping the senders settles each outcome as Disposed.
        drop(dropped);
    }
}

impl<F: WorkerFactory> Drop for Queue<F> {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Dispatcher loop: one drain per freed slot.
async fn dispatch<F: WorkerFactory>(inner: Arc<Inner<F>>) {
    loop {
        inner.pool.slot_freed().await;
        inner.drain();
    }
}
