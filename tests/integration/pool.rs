//! Pool admission tests

use std::sync::Arc;

use tokio_slots::{Pool, PoolConfig, RejectKind, TaskError, ThreadError, ThreadWorkers};

use crate::helpers::{probed_workers, Job, Probe};

#[tokio::test(start_paused = true)]
async fn test_full_pool_hands_args_back() {
    let probe = Arc::new(Probe::default());
    let pool = Pool::new("admission", 2, probed_workers(probe.clone())).unwrap();

    let a = pool.submit(Job::ok(1, 100)).unwrap();
    let b = pool.submit(Job::ok(2, 100)).unwrap();

    let rejected = pool.submit(Job::ok(3, 100)).unwrap_err();
    assert_eq!(rejected.kind, RejectKind::NoSlot);
    assert_eq!(rejected.args.id, 3);
    assert_eq!(pool.active_count(), 2);

    tokio_test::assert_ok!(a.await);
    tokio_test::assert_ok!(b.await);
    assert_eq!(probe.peak(), 2);

    // Retrying the handed-back job now succeeds.
    let retried = pool.submit(rejected.into_args()).unwrap();
    assert_eq!(retried.await, Ok(30));
}

#[tokio::test(start_paused = true)]
async fn test_from_config() {
    let probe = Arc::new(Probe::default());
    let config = PoolConfig::new("configured", 3);
    let pool = Pool::from_config(&config, probed_workers(probe)).unwrap();

    assert_eq!(pool.name(), "configured");
    assert_eq!(pool.capacity(), 3);
    assert_eq!(pool.worker_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_thread_workers_run_in_parallel() {
    let probe = Arc::new(Probe::default());
    let workers = ThreadWorkers::new(
        |probe: &mut Arc<Probe>, _: &[String], job: Job| -> Result<u64, String> {
            probe.enter(job.id);
            std::thread::sleep(std::time::Duration::from_millis(job.delay_ms));
            probe.exit();
            if job.fail {
                Err("failed".into())
            } else {
                Ok(job.id)
            }
        },
        probe.clone(),
    );
    let pool = Pool::new("threads", 3, workers).unwrap();

    let outcomes: Vec<_> = (0..3)
        .map(|id| pool.submit(Job::ok(id, 50)).unwrap())
        .collect();
    assert!(!pool.ready());

    let results = futures_util::future::join_all(outcomes).await;
    assert_eq!(results, vec![Ok(0), Ok(1), Ok(2)]);
    assert!(probe.peak() <= 3);
    assert_eq!(pool.worker_count(), 3);

    let failed = pool.submit(Job::failing(9, 1)).unwrap().await;
    assert_eq!(
        failed,
        Err(TaskError::Worker(ThreadError::Failed("failed".to_string())))
    );

    pool.dispose();
    assert_eq!(pool.worker_count(), 0);
    assert!(pool.submit(Job::ok(10, 1)).unwrap_err().is_no_slot());
}
