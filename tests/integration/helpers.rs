//! Test helpers and utilities

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_slots::{TaskWorkers, Worker, WorkerFactory};

/// One unit of test work.
#[derive(Debug, Clone, Copy)]
pub struct Job {
    pub id: u64,
    pub delay_ms: u64,
    pub fail: bool,
}

impl Job {
    pub fn ok(id: u64, delay_ms: u64) -> Self {
        Self {
            id,
            delay_ms,
            fail: false,
        }
    }

    pub fn failing(id: u64, delay_ms: u64) -> Self {
        Self {
            id,
            delay_ms,
            fail: true,
        }
    }
}

/// Records how many jobs run at once and in which order they start.
#[derive(Default)]
pub struct Probe {
    running: AtomicUsize,
    peak: AtomicUsize,
    started: Mutex<Vec<u64>>,
}

#[allow(dead_code)]
impl Probe {
    pub fn enter(&self, id: u64) {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.started.lock().unwrap().push(id);
    }

    pub fn exit(&self) {
        self.running.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn running(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn started(&self) -> Vec<u64> {
        self.started.lock().unwrap().clone()
    }
}

/// Async workers that sleep for the job's delay and answer `id * 10`.
pub fn probed_workers(
    probe: Arc<Probe>,
) -> impl WorkerFactory<Worker = impl Worker<Args = Job, Output = u64, Error = String>> {
    TaskWorkers::new(
        |probe: Arc<Probe>, _: Arc<[String]>, job: Job| async move {
            probe.enter(job.id);
            tokio::time::sleep(Duration::from_millis(job.delay_ms)).await;
            probe.exit();

            if job.fail {
                Err(format!("job {} failed", job.id))
            } else {
                Ok(job.id * 10)
            }
        },
        probe,
    )
}
