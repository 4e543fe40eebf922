//! Bounded pool of lazily created, reusable workers.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::Notify;

use super::error::{PoolError, PoolResult, Rejected, TaskError};
use super::outcome::{Outcome, Settle};
use super::PoolStats;
use crate::config::PoolConfig;
use crate::worker::{panic_message, ArgsOf, ErrorOf, OutputOf, Worker, WorkerFactory};

/// One worker slot. Slots are allocated up front; workers are not.
struct Slot<W> {
    worker: Option<Arc<W>>,
    running: bool,
}

/// Admission bookkeeping. Only ever touched under the state lock.
struct State<W> {
    capacity: usize,
    active: usize,
    slots: Vec<Slot<W>>,
}

impl<W> State<W> {
    fn new(capacity: usize) -> Self {
        let slots = (0..capacity)
            .map(|_| Slot {
                worker: None,
                running: false,
            })
            .collect();

        Self {
            capacity,
            active: 0,
            slots,
        }
    }

    #[inline]
    fn ready(&self) -> bool {
        self.active < self.capacity
    }

    fn worker_count(&self) -> usize {
        self.slots.iter().filter(|s| s.worker.is_some()).count()
    }

    /// Take a slot for one task: bump the active count and pick an idle
    /// worker, creating one if every existing worker is busy.
    ///
    /// The caller has checked `ready()`. Nothing is changed on error.
    fn claim<F>(&mut self, factory: &F, pool: &str) -> PoolResult<(usize, Arc<W>)>
    where
        F: WorkerFactory<Worker = W>,
    {
        let idle = self
            .slots
            .iter()
            .position(|s| s.worker.is_some() && !s.running);

        let index = match idle.or_else(|| self.slots.iter().position(|s| s.worker.is_none())) {
            Some(index) => index,
            None => {
                return Err(PoolError::Inconsistent {
                    active: self.active,
                    capacity: self.capacity,
                })
            }
        };

        let slot = &mut self.slots[index];
        let worker = match slot.worker.clone() {
            Some(worker) => worker,
            None => {
                let worker = Arc::new(factory.create(index, pool)?);
                slot.worker = Some(Arc::clone(&worker));
                worker
            }
        };

        slot.running = true;
        self.active = (self.active + 1).min(self.capacity);
        Ok((index, worker))
    }

    /// Give a slot back. Tolerates slots that disposal already cleared.
    fn release(&mut self, index: usize) {
        self.active = self.active.saturating_sub(1);
        if let Some(slot) = self.slots.get_mut(index) {
            slot.running = false;
        }
    }
}

#[derive(Default)]
struct Counters {
    admitted: AtomicU64,
    rejected: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
}

struct Shared<F: WorkerFactory> {
    name: String,
    factory: F,
    state: Mutex<State<F::Worker>>,
    /// Signalled once per released slot.
    slot_freed: Notify,
    runtime: Handle,
    counters: Counters,
}

impl<F: WorkerFactory> Shared<F> {
    fn state(&self) -> MutexGuard<'_, State<F::Worker>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self, index: usize) {
        let active = {
            let mut state = self.state();
            state.release(index);
            state.active
        };
        tracing::trace!(pool = %self.name, worker = index, active, "slot released");
        self.slot_freed.notify_one();
    }
}

/// Releases its slot when dropped, so a panicking or aborted execution
/// still frees capacity.
struct SlotGuard<F: WorkerFactory> {
    shared: Arc<Shared<F>>,
    index: usize,
}

impl<F: WorkerFactory> Drop for SlotGuard<F> {
    fn drop(&mut self) {
        self.shared.release(self.index);
    }
}

/// Admits at most `capacity` concurrent tasks onto reusable workers.
///
/// [`submit`](Pool::submit) either starts the task right away or hands the
/// arguments back with [`RejectKind::NoSlot`](super::RejectKind::NoSlot).
/// It never waits. Use [`Queue`](crate::queue::Queue) to buffer instead.
///
/// Cloning a `Pool` yields another handle to the same slots.
pub struct Pool<F: WorkerFactory> {
    shared: Arc<Shared<F>>,
}

impl<F: WorkerFactory> Clone for Pool<F> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<F: WorkerFactory> Pool<F> {
    /// Create a pool on the current tokio runtime.
    ///
    /// # Arguments
    /// * `name` - Name for logging and worker thread names
    /// * `capacity` - Maximum number of concurrent tasks (and workers)
    /// * `factory` - Builds the workers
    pub fn new(name: impl Into<String>, capacity: usize, factory: F) -> PoolResult<Self> {
        let runtime = Handle::try_current().map_err(|_| PoolError::NoRuntime)?;
        Ok(Self::with_runtime(name, capacity, factory, runtime))
    }

    /// Create a pool from loaded configuration.
    pub fn from_config(config: &PoolConfig, factory: F) -> PoolResult<Self> {
        Self::new(config.name.clone(), config.capacity(), factory)
    }

    /// Create a pool whose executions are driven by `runtime`.
    pub fn with_runtime(
        name: impl Into<String>,
        capacity: usize,
        factory: F,
        runtime: Handle,
    ) -> Self {
        let name = name.into();

        tracing::info!(pool = %name, capacity, "pool created");

        Self {
            shared: Arc::new(Shared {
                name,
                factory,
                state: Mutex::new(State::new(capacity)),
                slot_freed: Notify::new(),
                runtime,
                counters: Counters::default(),
            }),
        }
    }

    /// Whether a task would be admitted right now.
    pub fn ready(&self) -> bool {
        self.shared.state().ready()
    }

    /// Number of tasks currently admitted.
    pub fn active_count(&self) -> usize {
        self.shared.state().active
    }

    /// Maximum number of concurrent tasks. Zero after disposal.
    pub fn capacity(&self) -> usize {
        self.shared.state().capacity
    }

    /// Number of workers created so far.
    pub fn worker_count(&self) -> usize {
        self.shared.state().worker_count()
    }

    /// Pool name.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Snapshot of counters and occupancy.
    pub fn stats(&self) -> PoolStats {
        let (capacity, active, workers) = {
            let state = self.shared.state();
            (state.capacity, state.active, state.worker_count())
        };
        let counters = &self.shared.counters;

        PoolStats {
            name: self.shared.name.clone(),
            capacity,
            active,
            workers,
            pending: 0,
            admitted: counters.admitted.load(Ordering::Relaxed),
            rejected: counters.rejected.load(Ordering::Relaxed),
            succeeded: counters.succeeded.load(Ordering::Relaxed),
            failed: counters.failed.load(Ordering::Relaxed),
        }
    }

    /// Start a task if a slot is free.
    ///
    /// Returns the task's [`Outcome`], or the arguments back inside
    /// [`Rejected`] when the pool is full, disposed, or faulted.
    pub fn submit(
        &self,
        args: ArgsOf<F>,
    ) -> Result<Outcome<OutputOf<F>, ErrorOf<F>>, Rejected<ArgsOf<F>>> {
        let (settle, outcome) = Outcome::channel();
        match self.admit(args, settle) {
            Ok(()) => Ok(outcome),
            Err(rejected) => Err(rejected.map_args(|(args, _)| args)),
        }
    }

    /// Admit a task whose outcome is written to `settle`.
    ///
    /// On rejection both the arguments and `settle` come back untouched.
    pub(crate) fn admit(
        &self,
        args: ArgsOf<F>,
        settle: Settle<OutputOf<F>, ErrorOf<F>>,
    ) -> Result<(), Rejected<(ArgsOf<F>, Settle<OutputOf<F>, ErrorOf<F>>)>> {
        let shared = &self.shared;

        let claimed = {
            let mut state = shared.state();
            if !state.ready() {
                drop(state);
                shared.counters.rejected.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(pool = %shared.name, "no free slot");
                return Err(Rejected::no_slot((args, settle)));
            }
            let claim = state.claim(&shared.factory, &shared.name);
            let active = state.active;
            claim.map(|claim| (claim, active))
        };

        let ((index, worker), active) = match claimed {
            Ok(claimed) => claimed,
            Err(e) => {
                shared.counters.rejected.fetch_add(1, Ordering::Relaxed);
                tracing::error!(pool = %shared.name, error = %e, "{}", e.message());
                return Err(Rejected::fault((args, settle), e));
            }
        };

        shared.counters.admitted.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(pool = %shared.name, worker = index, active, "task admitted");

        let guard = SlotGuard {
            shared: Arc::clone(shared),
            index,
        };

        shared.runtime.spawn(async move {
            let result = AssertUnwindSafe(worker.run(args)).catch_unwind().await;

            let counters = &guard.shared.counters;
            let result = match result {
                Ok(Ok(output)) => {
                    counters.succeeded.fetch_add(1, Ordering::Relaxed);
                    Ok(output)
                }
                Ok(Err(e)) => {
                    counters.failed.fetch_add(1, Ordering::Relaxed);
                    Err(TaskError::Worker(e))
                }
                Err(payload) => {
                    counters.failed.fetch_add(1, Ordering::Relaxed);
                    let msg = panic_message(payload.as_ref());
                    tracing::warn!(pool = %guard.shared.name, worker = index, panic = %msg, "task panicked");
                    Err(TaskError::Panicked(msg))
                }
            };

            // Free the slot before the caller can observe the result.
            drop(guard);
            let _ = settle.send(result);
        });

        Ok(())
    }

    /// Stop admitting work and release every worker.
    ///
    /// In-flight tasks are neither awaited nor cancelled; their outcomes still
    /// settle if their workers finish. Calling this again is a no-op.
    pub fn dispose(&self) {
        let workers: Vec<_> = {
            let mut state = self.shared.state();
            state.capacity = 0;
            state.active = 0;
            state.slots.drain(..).filter_map(|s| s.worker).collect()
        };

        let released = workers.len();
        for worker in workers {
            worker.dispose();
        }

        tracing::info!(pool = %self.shared.name, workers = released, "pool disposed");
        self.shared.slot_freed.notify_one();
    }

    /// Wait until a slot has been released (or the pool disposed) since the
    /// last call.
    pub(crate) async fn slot_freed(&self) {
        self.shared.slot_freed.notified().await;
    }

    pub(crate) fn runtime(&self) -> &Handle {
        &self.shared.runtime
    }
}
