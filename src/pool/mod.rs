//! Bounded admission onto reusable workers.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                           Pool                             │
//! ├────────────────────────────────────────────────────────────┤
//! │   submit(args) ──▶ active < capacity ? ──no──▶ Rejected    │
//! │                          │ yes                             │
//! │                          ▼                                 │
//! │  ┌─────────┐    ┌─────────┐    ┌─────────┐                 │
//! │  │ Slot 0  │    │ Slot 1  │    │ Slot 2  │  ...  (fixed)   │
//! │  │ Worker  │    │ Worker  │    │ (empty) │                 │
//! │  └────┬────┘    └────┬────┘    └─────────┘                 │
//! │       │              │                                     │
//! │       ▼              ▼                                     │
//! │   oneshot ──────▶ Outcome   (slot released first)          │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Slots are allocated up front, one per unit of capacity. Workers are built
//! lazily: a new one only appears when every existing worker is busy.

mod error;
mod outcome;
mod slots;

pub use error::{PoolError, PoolResult, RejectKind, Rejected, TaskError, TaskResult};
pub use outcome::Outcome;
pub use slots::Pool;

pub(crate) use outcome::Settle;

use serde::Serialize;

/// Point-in-time view of a pool (or queue) for monitoring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Pool name.
    pub name: String,
    /// Current capacity (zero once disposed).
    pub capacity: usize,
    /// Tasks currently admitted.
    pub active: usize,
    /// Workers created so far.
    pub workers: usize,
    /// Tasks waiting in a queue's buffer. Always zero for a bare pool.
    pub pending: usize,
    /// Tasks admitted since creation.
    pub admitted: u64,
    /// Admission attempts turned down.
    pub rejected: u64,
    /// Tasks that completed successfully.
    pub succeeded: u64,
    /// Tasks that failed or panicked.
    pub failed: u64,
}

impl PoolStats {
    /// Fraction of capacity in use, between 0.0 and 1.0.
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.active as f64 / self.capacity as f64
        }
    }
}
