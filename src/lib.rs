//! tokio_slots - bounded-concurrency task scheduling on Tokio.
//!
//! Runs one fixed worker function across many inputs with at most N tasks in
//! flight. Excess work is either refused ([`Pool`]) or buffered and released
//! in submission order as slots free up ([`Queue`]).
//!
//! # Features
//!
//! - **Backpressure**: [`Pool::submit`] never waits; a full pool hands the
//!   arguments back
//! - **FIFO dispatch**: [`Queue`] admits buffered tasks strictly in order
//! - **Lazy workers**: workers are created on first demand, up to capacity,
//!   and reused afterwards
//! - **Failure isolation**: a failing or panicking task frees its slot and
//!   never affects its siblings
//! - **Structured logging**: every admission and release is a `tracing` event
//!
//! # Example
//!
//! ```rust,ignore
//! use tokio_slots::{Queue, ThreadWorkers};
//!
//! let workers = ThreadWorkers::new(|_: &mut (), _: &[String], n: u64| Ok::<_, String>(n * n), ());
//! let queue = Queue::new("squares", 2, workers)?;
//!
//! let outcomes: Vec<_> = (0..10).map(|n| queue.submit(n)).collect();
//! for outcome in outcomes {
//!     println!("{}", outcome.await?);
//! }
//! queue.dispose();
//! ```

/// Package version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod logging;
pub mod pool;
pub mod queue;
pub mod worker;

// Re-exports for convenience
pub use config::{Config, PoolConfig};
pub use pool::{Outcome, Pool, PoolError, PoolStats, RejectKind, Rejected, TaskError};
pub use queue::Queue;
pub use worker::{TaskWorkers, ThreadError, ThreadWorkers, Worker, WorkerFactory};
