//! Integration tests for tokio_slots
//!
//! These exercise the public Pool and Queue API end to end, with both
//! runtime-backed and thread-backed workers.
//!
//! Run with: cargo test --test integration

mod helpers;
mod pool;
mod queue;
