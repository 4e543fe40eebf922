//! Queue draining tests

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_slots::{Queue, TaskError};

use crate::helpers::{probed_workers, Job, Probe};

#[tokio::test(start_paused = true)]
async fn test_capacity_two_five_tasks() {
    let probe = Arc::new(Probe::default());
    let queue = Queue::new("five", 2, probed_workers(probe.clone())).unwrap();
    let started_at = Instant::now();

    let outcomes: Vec<_> = (0..5).map(|id| queue.submit(Job::ok(id, 100))).collect();
    assert_eq!(queue.active_count(), 2);
    assert_eq!(queue.pending_count(), 3);

    // Jobs 0,1 run 0-100ms, jobs 2,3 run 100-200ms, job 4 runs 200-300ms.
    for (at_ms, running, pending) in [(50, 2, 3), (150, 2, 1), (250, 1, 0)] {
        tokio::time::sleep_until(started_at + Duration::from_millis(at_ms)).await;
        assert_eq!(probe.running(), running, "running at {}ms", at_ms);
        assert_eq!(queue.active_count(), running, "active at {}ms", at_ms);
        assert_eq!(queue.pending_count(), pending, "pending at {}ms", at_ms);
    }

    let results = futures_util::future::join_all(outcomes).await;
    assert_eq!(results, vec![Ok(0), Ok(10), Ok(20), Ok(30), Ok(40)]);

    // Two at a time: 100ms + 100ms + 100ms.
    let elapsed = started_at.elapsed();
    assert!(elapsed >= Duration::from_millis(300), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(400), "elapsed {:?}", elapsed);

    assert_eq!(probe.peak(), 2);
    assert_eq!(probe.running(), 0);
    assert_eq!(queue.active_count(), 0);
    assert_eq!(queue.pending_count(), 0);
    assert_eq!(queue.pool().worker_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_fifo_dispatch() {
    let probe = Arc::new(Probe::default());
    let queue = Queue::new("fifo", 1, probed_workers(probe.clone())).unwrap();

    // Later jobs are shorter, so completion order would differ if dispatch
    // were not FIFO.
    let outcomes: Vec<_> = (0..6)
        .map(|id| queue.submit(Job::ok(id, 60 - id * 10)))
        .collect();

    futures_util::future::join_all(outcomes).await;
    assert_eq!(probe.started(), vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(probe.peak(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failure_does_not_lock_the_slot() {
    let probe = Arc::new(Probe::default());
    let queue = Queue::new("failure", 1, probed_workers(probe)).unwrap();

    let t1 = queue.submit(Job::failing(1, 10));
    let t2 = queue.submit(Job::ok(2, 10));

    let err = tokio_test::assert_err!(t1.await);
    assert_eq!(err, TaskError::Worker("job 1 failed".to_string()));
    assert_eq!(tokio_test::assert_ok!(t2.await), 20);
}

#[tokio::test(start_paused = true)]
async fn test_every_task_settles() {
    let probe = Arc::new(Probe::default());
    let queue = Queue::new("many", 4, probed_workers(probe.clone())).unwrap();

    let outcomes: Vec<_> = (0..50)
        .map(|id| {
            let delay = 5 + (id * 7) % 23;
            if id % 5 == 0 {
                queue.submit(Job::failing(id, delay))
            } else {
                queue.submit(Job::ok(id, delay))
            }
        })
        .collect();

    let results = futures_util::future::join_all(outcomes).await;
    let failed = results.iter().filter(|r| r.is_err()).count();
    assert_eq!(failed, 10);
    for (id, result) in results.iter().enumerate() {
        if id % 5 != 0 {
            assert_eq!(result, &Ok(id as u64 * 10));
        }
    }

    let stats = queue.stats();
    assert_eq!(stats.admitted, 50);
    assert_eq!(stats.succeeded, 40);
    assert_eq!(stats.failed, 10);
    assert_eq!(stats.pending, 0);
    assert_eq!(stats.active, 0);
    assert!(probe.peak() <= 4);
}

#[tokio::test(start_paused = true)]
async fn test_dispose_mid_drain() {
    let probe = Arc::new(Probe::default());
    let queue = Queue::new("dispose", 2, probed_workers(probe)).unwrap();

    let outcomes: Vec<_> = (0..5).map(|id| queue.submit(Job::ok(id, 50))).collect();
    queue.dispose();
    queue.dispose();

    let results = futures_util::future::join_all(outcomes).await;
    assert_eq!(results[0], Ok(0));
    assert_eq!(results[1], Ok(10));
    assert!(results[2..].iter().all(|r| r == &Err(TaskError::Disposed)));

    assert_eq!(queue.capacity(), 0);
    assert_eq!(queue.pending_count(), 0);
    assert_eq!(queue.pool().worker_count(), 0);
}
