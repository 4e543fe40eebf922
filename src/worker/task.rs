//! Workers that run an async function on the tokio runtime.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use super::{Worker, WorkerFactory};
use crate::pool::PoolResult;

/// Factory for [`TaskWorker`]s.
///
/// The function receives a clone of `context` and the shared resource list on
/// every call.
pub struct TaskWorkers<F, C, A, Fut> {
    func: Arc<F>,
    context: C,
    resources: Arc<[String]>,
    _marker: PhantomData<fn(A) -> Fut>,
}

impl<F, C, A, Fut, T, E> TaskWorkers<F, C, A, Fut>
where
    F: Fn(C, Arc<[String]>, A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    C: Clone + Send + Sync + 'static,
{
    /// Create a factory from an async function and its initial context.
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
}

impl<F, C, A, Fut, T, E> WorkerFactory for TaskWorkers<F, C, A, Fut>
where
    F: Fn(C, Arc<[String]>, A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    C: Clone + Send + Sync + 'static,
    A: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    type Worker = TaskWorker<F, C, A, Fut>;

    fn create(&self, index: usize, pool: &str) -> PoolResult<Self::Worker> {
        tracing::debug!(pool = %pool, worker = index, "task worker created");

        Ok(TaskWorker {
            index,
            func: Arc::clone(&self.func),
            context: self.context.clone(),
            resources: Arc::clone(&self.resources),
            _marker: PhantomData,
        })
    }
}

/// A worker whose executions are futures on the runtime.
pub struct TaskWorker<F, C, A, Fut> {
    index: usize,
    func: Arc<F>,
    context: C,
    resources: Arc<[String]>,
    _marker: PhantomData<fn(A) -> Fut>,
}

impl<F, C, A, Fut> TaskWorker<F, C, A, Fut> {
    /// Slot index of this worker.
    pub fn index(&self) -> usize {
        self.index
    }
}

#[async_trait]
impl<F, C, A, Fut, T, E> Worker for TaskWorker<F, C, A, Fut>
where
    F: Fn(C, Arc<[String]>, A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    C: Clone + Send + Sync + 'static,
    A: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    type Args = A;
    type Output = T;
    type Error = E;

    async fn run(&self, args: A) -> Result<T, E> {
        (self.func)(self.context.clone(), Arc::clone(&self.resources), args).await
    }
}
