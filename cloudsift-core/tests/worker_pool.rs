use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use anyhow::anyhow;
use cloudsift_core::worker::{Task, TaskOutcome, WorkerPool};

fn sleeping_task(ms: u64) -> Task {
    Task::new(move |_| async move {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Ok::<_, anyhow::Error>(())
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_tasks_never_exceed_worker_count() {
    const WORKERS: usize = 3;
    let pool = WorkerPool::new(WORKERS).unwrap();
    let in_flight = Arc::new(AtomicUsize::new(0));
    let observed_max = Arc::new(AtomicUsize::new(0));

    let tasks = (0..24)
        .map(|_| {
            let in_flight = Arc::clone(&in_flight);
            let observed_max = Arc::clone(&observed_max);
            Task::new(move |_| async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                observed_max.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(15)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, anyhow::Error>(())
            })
        })
        .collect();

    let report = pool.execute_tasks(tasks).await;
    pool.stop().await;

    let observed = observed_max.load(Ordering::SeqCst);
    assert_eq!(report.completed(), 24);
    assert!(observed <= WORKERS, "observed {observed} concurrent tasks");
    let metrics = pool.metrics();
    assert!(metrics.peak_workers as usize <= WORKERS);
    assert!(metrics.peak_workers as usize >= observed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn batch_accounts_for_every_task() {
    let pool = WorkerPool::new(4).unwrap();
    let tasks: Vec<Task> = (0..10)
        .map(|i| {
            Task::new(move |_| async move {
                if i % 3 == 0 {
                    Err(anyhow!("task {i} failed"))
                } else {
                    Ok(())
                }
            })
        })
        .collect();

    let report = pool.execute_tasks(tasks).await;
    let metrics = pool.metrics();
    pool.stop().await;

    assert_eq!(report.len(), 10);
    assert_eq!(report.completed(), 6);
    assert_eq!(report.failed(), 4);
    assert_eq!(metrics.total_tasks, 10);
    assert_eq!(metrics.completed_tasks + metrics.failed_tasks, 10);

    let failed: Vec<usize> = report.failures().map(|(index, _)| index).collect();
    assert_eq!(failed, vec![0, 3, 6, 9]);
    assert!(matches!(report.outcomes()[1], TaskOutcome::Completed));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn two_workers_run_five_tasks_in_three_waves() {
    let pool = WorkerPool::new(2).unwrap();
    let started = Instant::now();

    let report = pool
        .execute_tasks((0..5).map(|_| sleeping_task(50)).collect())
        .await;
    let elapsed = started.elapsed();
    pool.stop().await;

    assert_eq!(report.completed(), 5);
    assert!(elapsed >= Duration::from_millis(150), "took {elapsed:?}");
    assert!(elapsed < Duration::from_secs(2), "took {elapsed:?}");
    assert_eq!(pool.metrics().peak_workers, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stop_is_idempotent_under_concurrent_callers() {
    let pool = Arc::new(WorkerPool::new(4).unwrap());
    pool.start();
    for _ in 0..8 {
        pool.submit(sleeping_task(10)).await;
    }

    let stoppers: Vec<_> = (0..8)
        .map(|_| {
            let pool = Arc::clone(&pool);
            tokio::spawn(async move { pool.stop().await })
        })
        .collect();
    for stopper in stoppers {
        stopper.await.unwrap();
    }
    pool.stop().await;

    assert!(pool.is_stopping());
    let metrics = pool.metrics();
    assert_eq!(metrics.current_workers, 0);
    assert!(metrics.completed_tasks + metrics.failed_tasks <= metrics.total_tasks);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stop_drains_queued_tasks() {
    let pool = WorkerPool::new(1).unwrap();
    pool.start();
    let ran = Arc::new(AtomicUsize::new(0));

    for _ in 0..2 {
        let ran = Arc::clone(&ran);
        pool.submit(Task::new(move |token| async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            // Drained tasks get a fresh token.
            if !token.is_cancelled() {
                ran.fetch_add(1, Ordering::SeqCst);
            }
            Ok::<_, anyhow::Error>(())
        }))
        .await;
    }

    pool.stop().await;

    let metrics = pool.metrics();
    assert_eq!(metrics.total_tasks, 2);
    assert_eq!(metrics.completed_tasks, 2);
    assert!(ran.load(Ordering::SeqCst) >= 1);
}
