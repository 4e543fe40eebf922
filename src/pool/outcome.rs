//! One-shot task outcomes.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use super::error::{TaskError, TaskResult};

/// Sending half of an outcome. Written exactly once by whoever runs the task.
pub(crate) type Settle<T, E> = oneshot::Sender<TaskResult<T, E>>;

/// The eventual result of one task.
///
/// Resolves once, to the worker's output or to a [`TaskError`]. Dropping an
/// `Outcome` does not cancel the task; it only discards the result.
#[must_use = "an Outcome does nothing unless awaited"]
#[derive(Debug)]
pub struct Outcome<T, E> {
    rx: oneshot::Receiver<TaskResult<T, E>>,
}

impl<T, E> Outcome<T, E> {
    /// Create a connected (settle, outcome) pair.
    pub(crate) fn channel() -> (Settle<T, E>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }

    /// An outcome that is already settled as [`TaskError::Disposed`].
    pub(crate) fn disposed() -> Self {
        let (_, outcome) = Self::channel();
        outcome
    }
}

impl<T, E> Future for Outcome<T, E> {
    type Output = TaskResult<T, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // A sender dropped without writing means the task never ran.
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|res| res.unwrap_or(Err(TaskError::Disposed)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_outcome_resolves_once_written() {
        let (settle, outcome) = Outcome::<u32, String>::channel();
        settle.send(Ok(7)).unwrap();
        assert_eq!(outcome.await, Ok(7));
    }

    #[tokio::test]
    async fn test_dropped_sender_is_disposed() {
        let (settle, outcome) = Outcome::<u32, String>::channel();
        drop(settle);
        assert_eq!(outcome.await, Err(TaskError::Disposed));

        assert_eq!(
            Outcome::<u32, String>::disposed().await,
            Err(TaskError::Disposed)
        );
    }

    #[tokio::test]
    async fn test_outcome_pending_until_settled() {
        let (settle, outcome) = Outcome::<&str, ()>::channel();
        let mut outcome = tokio_test::task::spawn(outcome);
        tokio_test::assert_pending!(outcome.poll());

        settle.send(Ok("done")).unwrap();
        assert!(outcome.is_woken());
        tokio_test::assert_ready_eq!(outcome.poll(), Ok("done"));
    }
}
