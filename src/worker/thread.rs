//! Workers backed by dedicated OS threads.

use std::fmt;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::oneshot;

use super::{panic_message, Worker, WorkerFactory};
use crate::pool::{PoolError, PoolResult};

/// Failure of a task run on a [`ThreadWorker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadError<E> {
    /// The function returned an error.
    Failed(E),
    /// The function panicked. The thread survives and keeps serving.
    Panicked(String),
    /// The worker thread is gone (disposed or dead).
    Gone,
}

impl<E: fmt::Display> fmt::Display for ThreadError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreadError::Failed(e) => write!(f, "{}", e),
            ThreadError::Panicked(msg) => write!(f, "worker thread panicked: {}", msg),
            ThreadError::Gone => write!(f, "worker thread is gone"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for ThreadError<E> {}

/// A job wrapper with response channel.
struct Job<A, T, E> {
    args: A,
    response_tx: oneshot::Sender<Result<T, ThreadError<E>>>,
    /// When the job was handed to the thread.
    queued_at: Instant,
}

/// Factory for [`ThreadWorker`]s.
///
/// Every worker thread gets its own clone of `context`, which the function
/// may mutate freely between tasks. `resources` is shared read-only.
pub struct ThreadWorkers<F, C, A, T, E> {
    func: Arc<F>,
    context: C,
    resources: Arc<[String]>,
    _marker: PhantomData<fn(A) -> (T, E)>,
}

impl<F, C, A, T, E> ThreadWorkers<F, C, A, T, E>
where
    F: Fn(&mut C, &[String], A) -> Result<T, E> + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    /// Create a factory from a function and its initial context.
    pub fn new(func: F, context: C) -> Self {
        Self {
            func: Arc::new(func),
            context,
            resources: Arc::from(Vec::new()),
            _marker: PhantomData,
        }
    }

    /// Attach side resources handed to every call.
    pub fn with_resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources = resources.into_iter().map(Into::into).collect();
        self
    }

    /// Side resources handed to every call.
    pub fn resources(&self) -> &[String] {
        &self.resources
    }
}

impl<F, C, A, T, E> WorkerFactory for ThreadWorkers<F, C, A, T, E>
where
    F: Fn(&mut C, &[String], A) -> Result<T, E> + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
    A: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    type Worker = ThreadWorker<A, T, E>;

    fn create(&self, index: usize, pool: &str) -> PoolResult<Self::Worker> {
        let (request_tx, request_rx) = mpsc::channel::<Job<A, T, E>>();
        let func = Arc::clone(&self.func);
        let context = self.context.clone();
        let resources = Arc::clone(&self.resources);
        let name = format!("{}-{}", pool, index);

        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || worker_loop(index, request_rx, func, context, resources))
            .map_err(|e| PoolError::Spawn {
                index,
                message: e.to_string(),
            })?;

        tracing::debug!(worker = %name, "worker thread spawned");

        Ok(ThreadWorker {
            index,
            name,
            request_tx: Mutex::new(Some(request_tx)),
            handle: Mutex::new(Some(handle)),
        })
    }
}

/// Worker thread main loop.
fn worker_loop<F, C, A, T, E>(
    index: usize,
    rx: mpsc::Receiver<Job<A, T, E>>,
    func: Arc<F>,
    mut context: C,
    resources: Arc<[String]>,
) where
    F: Fn(&mut C, &[String], A) -> Result<T, E>,
{
    tracing::debug!(worker = index, "worker started");

    while let Ok(Job {
        args,
        response_tx,
        queued_at,
    }) = rx.recv()
    {
        tracing::trace!(
            worker = index,
            wait_us = queued_at.elapsed().as_micros() as u64,
            "job received"
        );

        let result = match panic::catch_unwind(AssertUnwindSafe(|| {
            func(&mut context, &resources, args)
        })) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(ThreadError::Failed(e)),
            Err(payload) => {
                let msg = panic_message(payload.as_ref());
                tracing::warn!(worker = index, panic = %msg, "job panicked");
                Err(ThreadError::Panicked(msg))
            }
        };

        let _ = response_tx.send(result);
    }

    // Channel closed, disposed
    tracing::debug!(worker = index, "worker stopped");
}

/// A worker that owns one OS thread.
pub struct ThreadWorker<A, T, E> {
    index: usize,
    name: String,
    /// Channel to send jobs to the thread. `None` once disposed.
    request_tx: Mutex<Option<mpsc::Sender<Job<A, T, E>>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl<A, T, E> ThreadWorker<A, T, E> {
    /// Slot index of this worker.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Thread name, `{pool}-{index}`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the thread is still attached and running.
    pub fn is_alive(&self) -> bool {
        self.handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

#[async_trait]
impl<A, T, E> Worker for ThreadWorker<A, T, E>
where
    A: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    type Args = A;
    type Output = T;
    type Error = ThreadError<E>;

    async fn run(&self, args: A) -> Result<T, ThreadError<E>> {
        let (response_tx, response_rx) = oneshot::channel();
        let job = Job {
            args,
            response_tx,
            queued_at: Instant::now(),
        };

        {
            let guard = self
                .request_tx
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let tx = guard.as_ref().ok_or(ThreadError::Gone)?;
            tx.send(job).map_err(|_| ThreadError::Gone)?;
        }

        match response_rx.await {
            Ok(result) => result,
            Err(_) => Err(ThreadError::Gone),
        }
    }

    fn dispose(&self) {
        // Dropping the sender lets the thread exit after its current job.
        let tx = self
            .request_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if tx.is_none() {
            return;
        }

        // Detach: in-flight work is not awaited.
        self.handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        tracing::debug!(worker = %self.name, "worker thread released");
    }
}
