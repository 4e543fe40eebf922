//! Pool error types.

use std::fmt;

use thiserror::Error;

/// Errors raised by the pool's own bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// The pool believed a slot was free but no idle worker existed.
    #[error("inconsistent pool state: {active}/{capacity} active but no idle worker")]
    Inconsistent {
        /// Active count at the time of the fault.
        active: usize,
        /// Capacity at the time of the fault.
        capacity: usize,
    },

    /// A worker could not be created.
    #[error("failed to spawn worker {index}: {message}")]
    Spawn {
        /// Slot index of the worker.
        index: usize,
        /// Underlying failure.
        message: String,
    },

    /// No tokio runtime was available at construction time.
    #[error("no tokio runtime available")]
    NoRuntime,
}

impl PoolError {
    /// Check if this is an internal consistency fault.
    pub fn is_inconsistent(&self) -> bool {
        matches!(self, PoolError::Inconsistent { .. })
    }

    /// Get the error message for logging.
    pub fn message(&self) -> &str {
        match self {
            PoolError::Inconsistent { .. } => "Inconsistent pool state",
            PoolError::Spawn { .. } => "Worker spawn failed",
            PoolError::NoRuntime => "No runtime",
        }
    }
}

/// Why an admission attempt was turned down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectKind {
    /// Every slot is taken (or the pool is disposed). Retry later.
    NoSlot,
    /// Bookkeeping or worker construction failed.
    Fault(PoolError),
}

/// A rejected admission. Hands the arguments back to the caller.
#[derive(Debug)]
pub struct Rejected<A> {
    /// The arguments that were not admitted.
    pub args: A,
    /// Reason for the rejection.
    pub kind: RejectKind,
}

impl<A> Rejected<A> {
    pub(crate) fn no_slot(args: A) -> Self {
        Self {
            args,
            kind: RejectKind::NoSlot,
        }
    }

    pub(crate) fn fault(args: A, error: PoolError) -> Self {
        Self {
            args,
            kind: RejectKind::Fault(error),
        }
    }

    /// Check if the pool simply had no free slot.
    pub fn is_no_slot(&self) -> bool {
        matches!(self.kind, RejectKind::NoSlot)
    }

    /// Recover the arguments.
    pub fn into_args(self) -> A {
        self.args
    }

    pub(crate) fn map_args<B>(self, f: impl FnOnce(A) -> B) -> Rejected<B> {
        Rejected {
            args: f(self.args),
            kind: self.kind,
        }
    }
}

impl<A> fmt::Display for Rejected<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            RejectKind::NoSlot => write!(f, "admission rejected: no free slot"),
            RejectKind::Fault(e) => write!(f, "admission rejected: {}", e),
        }
    }
}

impl<A: fmt::Debug> std::error::Error for Rejected<A> {}

/// Failure of a single task, delivered through its [`Outcome`](super::Outcome).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskError<E> {
    /// The worker reported a failure. The error is passed through unchanged.
    Worker(E),

    /// The execution future panicked.
    Panicked(String),

    /// The task was dropped before it could run.
    Disposed,

    /// The pool could not admit the task.
    Pool(PoolError),
}

impl<E: fmt::Display> fmt::Display for TaskError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskError::Worker(e) => write!(f, "worker failed: {}", e),
            TaskError::Panicked(msg) => write!(f, "worker panicked: {}", msg),
            TaskError::Disposed => write!(f, "task dropped: scheduler disposed"),
            TaskError::Pool(e) => write!(f, "{}", e),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for TaskError<E> {}

impl<E> TaskError<E> {
    /// Check if the worker itself failed.
    pub fn is_worker(&self) -> bool {
        matches!(self, TaskError::Worker(_))
    }

    /// Check if the task was dropped by disposal.
    pub fn is_disposed(&self) -> bool {
        matches!(self, TaskError::Disposed)
    }

    /// Take the worker's error, if that is what this is.
    pub fn into_worker(self) -> Option<E> {
        match self {
            TaskError::Worker(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type alias for task outcomes.
pub type TaskResult<T, E> = Result<T, TaskError<E>>;

/// Result type alias for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inconsistent() {
        let err = PoolError::Inconsistent {
            active: 2,
            capacity: 4,
        };
        assert!(err.is_inconsistent());
        assert!(err.to_string().contains("2/4"));
        assert_eq!(err.message(), "Inconsistent pool state");
    }

    #[test]
    fn test_rejected_returns_args() {
        let rejected = Rejected::no_slot(vec![1, 2, 3]);
        assert!(rejected.is_no_slot());
        assert_eq!(rejected.into_args(), vec![1, 2, 3]);

        let rejected = Rejected::fault("job", PoolError::NoRuntime);
        assert!(!rejected.is_no_slot());
        assert!(rejected.to_string().contains("no tokio runtime"));
        assert_eq!(rejected.kind, RejectKind::Fault(PoolError::NoRuntime));
    }

    #[test]
    fn test_task_error_passes_worker_error_through() {
        let err: TaskError<String> = TaskError::Worker("boom".to_string());
        assert!(err.is_worker());
        assert_eq!(err.to_string(), "worker failed: boom");
        assert_eq!(err.into_worker().as_deref(), Some("boom"));

        let err: TaskError<String> = TaskError::Disposed;
        assert!(err.is_disposed());
        assert!(err.into_worker().is_none());
    }
}
