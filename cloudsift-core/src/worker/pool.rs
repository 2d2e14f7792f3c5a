use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use anyhow::anyhow;
use cloudsift_model::PoolMetricsSnapshot;
use futures::FutureExt;
use futures::future::join_all;
use tokio::sync::{Mutex as AsyncMutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::metrics::PoolMetrics;
use super::outcome::{BatchReport, TaskOutcome};
use super::task::Task;
use crate::error::PoolError;

/// Upper bound on the run time of a single task.
pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(30);

const QUEUE_FACTOR: usize = 2;

enum Job {
    Run {
        task: Task,
        notify: Option<oneshot::Sender<TaskOutcome>>,
    },
    /// Resolves once every job queued before it has been picked up.
    Marker(oneshot::Sender<()>),
}

struct PoolShared {
    receiver: AsyncMutex<mpsc::Receiver<Job>>,
    metrics: PoolMetrics,
    shutdown: CancellationToken,
    task_timeout: Duration,
}

/// Fixed-size pool of Tokio workers draining a bounded task queue.
pub struct WorkerPool {
    max_workers: usize,
    shared: Arc<PoolShared>,
    sender: RwLock<Option<mpsc::Sender<Job>>>,
    worker_handles: Mutex<Vec<JoinHandle<()>>>,
    started: AtomicBool,
    stopping: AtomicBool,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("max_workers", &self.max_workers)
            .field("task_timeout", &self.shared.task_timeout)
            .field("started", &self.started.load(Ordering::SeqCst))
            .field("stopping", &self.stopping.load(Ordering::SeqCst))
            .finish()
    }
}

impl WorkerPool {
    pub fn new(max_workers: usize) -> Result<Self, PoolError> {
        Self::with_task_timeout(max_workers, DEFAULT_TASK_TIMEOUT)
    }

    pub fn with_task_timeout(max_workers: usize, task_timeout: Duration) -> Result<Self, PoolError> {
        if max_workers == 0 {
            return Err(PoolError::InvalidWorkerCount(max_workers));
        }

        let (sender, receiver) = mpsc::channel(max_workers * QUEUE_FACTOR);
        let shared = Arc::new(PoolShared {
            receiver: AsyncMutex::new(receiver),
            metrics: PoolMetrics::default(),
            shutdown: CancellationToken::new(),
            task_timeout,
        });

        Ok(Self {
            max_workers,
            shared,
            sender: RwLock::new(Some(sender)),
            worker_handles: Mutex::new(Vec::with_capacity(max_workers)),
            started: AtomicBool::new(false),
            stopping: AtomicBool::new(false),
        })
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub fn task_timeout(&self) -> Duration {
        self.shared.task_timeout
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }

    /// Spawns the workers on the current Tokio runtime.
    ///
    /// Calling `start` more than once has no effect.
    pub fn start(&self) {
        if self
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        let mut handles = self
            .worker_handles
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for worker_id in 0..self.max_workers {
            let shared = Arc::clone(&self.shared);
            handles.push(tokio::spawn(worker_loop(worker_id, shared)));
        }

        info!(
            target: "pool",
            workers = self.max_workers,
            queue = self.max_workers * QUEUE_FACTOR,
            "worker pool started"
        );
    }

    /// Queues a task, waiting for queue capacity.
    ///
    /// Returns without queueing once the pool is stopping.
    pub async fn submit(&self, task: Task) {
        if !self.enqueue(Job::Run { task, notify: None }, true).await {
            debug!(target: "pool", "submit ignored, pool is stopping");
        }
    }

    /// Runs a batch of tasks and waits until each one has an outcome.
    ///
    /// Starts the pool first if needed. Task failures never fail the batch;
    /// they are reported per task in the returned [`BatchReport`].
    pub async fn execute_tasks(&self, tasks: Vec<Task>) -> BatchReport {
        self.start();

        let mut pending = Vec::with_capacity(tasks.len());
        for task in tasks {
            let (notify, outcome) = oneshot::channel();
            // A rejected job drops its notifier, which resolves as Dropped.
            self.enqueue(
                Job::Run {
                    task,
                    notify: Some(notify),
                },
                true,
            )
            .await;
            pending.push(outcome);
        }

        let outcomes = join_all(
            pending
                .into_iter()
                .map(|outcome| async move { outcome.await.unwrap_or(TaskOutcome::Dropped) }),
        )
        .await;

        BatchReport::new(outcomes)
    }

    /// Waits until every task queued before this call has been picked up by
    /// a worker. Starts the pool if needed.
    pub async fn wait_for_tasks(&self) {
        self.start();
        let (marker, reached) = oneshot::channel();
        if self.enqueue(Job::Marker(marker), false).await {
            let _ = reached.await;
        }
    }

    /// Stops the pool: cancels running tasks, joins the workers and closes
    /// the queue.
    ///
    /// Only the first caller performs the shutdown; later or concurrent calls
    /// return immediately.
    pub async fn stop(&self) {
        if self
            .stopping
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        info!(target: "pool", "stopping worker pool");
        self.shared.shutdown.cancel();

        let handles = std::mem::take(
            &mut *self
                .worker_handles
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        );
        for handle in handles {
            if let Err(err) = handle.await {
                warn!(target: "pool", error = %err, "worker exited abnormally");
            }
        }

        let sender = self
            .sender
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        drop(sender);

        // Jobs queued after the workers finished draining never run.
        let mut receiver = self.shared.receiver.lock().await;
        receiver.close();
        let mut dropped = 0usize;
        while receiver.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            warn!(target: "pool", dropped, "discarded tasks queued during shutdown");
        }

        info!(target: "pool", "worker pool stopped");
    }

    pub fn metrics(&self) -> PoolMetricsSnapshot {
        self.shared.metrics.snapshot()
    }

    fn current_sender(&self) -> Option<mpsc::Sender<Job>> {
        self.sender
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    async fn enqueue(&self, job: Job, counted: bool) -> bool {
        if self.is_stopping() {
            return false;
        }
        let Some(sender) = self.current_sender() else {
            return false;
        };

        let permit = tokio::select! {
            biased;
            _ = self.shared.shutdown.cancelled() => return false,
            permit = sender.reserve() => match permit {
                Ok(permit) => permit,
                Err(_) => return false,
            },
        };

        // Sending under the read guard keeps `stop` from closing the queue
        // between the liveness check and the send.
        let guard = self
            .sender
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if guard.is_none() {
            return false;
        }
        if counted {
            self.shared.metrics.record_submitted();
        }
        permit.send(job);
        drop(guard);
        true
    }
}

async fn next_job(receiver: &AsyncMutex<mpsc::Receiver<Job>>) -> Option<Job> {
    receiver.lock().await.recv().await
}

async fn worker_loop(worker_id: usize, shared: Arc<PoolShared>) {
    trace!(target: "pool", worker = worker_id, "worker started");

    loop {
        let job = tokio::select! {
            biased;
            _ = shared.shutdown.cancelled() => break,
            job = next_job(&shared.receiver) => job,
        };
        match job {
            Some(job) => dispatch(worker_id, &shared, job, shared.shutdown.child_token()).await,
            None => {
                trace!(target: "pool", worker = worker_id, "queue closed");
                return;
            }
        }
    }

    // Drain what is already queued. The pool token is cancelled at this
    // point, so each task gets a fresh one.
    loop {
        let job = shared.receiver.lock().await.try_recv();
        match job {
            Ok(job) => dispatch(worker_id, &shared, job, CancellationToken::new()).await,
            Err(_) => break,
        }
    }

    trace!(target: "pool", worker = worker_id, "worker stopped");
}

async fn dispatch(worker_id: usize, shared: &PoolShared, job: Job, token: CancellationToken) {
    match job {
        Job::Marker(reached) => {
            let _ = reached.send(());
        }
        Job::Run { task, notify } => {
            let outcome = run_task(worker_id, shared, task, token).await;
            match notify {
                Some(notify) => {
                    let _ = notify.send(outcome);
                }
                None => {
                    if let TaskOutcome::Failed(err) = &outcome {
                        debug!(target: "pool", worker = worker_id, error = %err, "task failed");
                    }
                }
            }
        }
    }
}

async fn run_task(
    worker_id: usize,
    shared: &PoolShared,
    task: Task,
    token: CancellationToken,
) -> TaskOutcome {
    shared.metrics.worker_started();
    let started = Instant::now();

    let future = AssertUnwindSafe(task.into_future(token.clone())).catch_unwind();
    let outcome = match tokio::time::timeout(shared.task_timeout, future).await {
        Ok(Ok(Ok(()))) => TaskOutcome::Completed,
        Ok(Ok(Err(err))) => TaskOutcome::Failed(err),
        Ok(Err(panic)) => TaskOutcome::Failed(anyhow!("task panicked: {}", panic_message(&panic))),
        Err(_) => {
            token.cancel();
            warn!(
                target: "pool",
                worker = worker_id,
                timeout_ms = shared.task_timeout.as_millis() as u64,
                "task timed out"
            );
            TaskOutcome::TimedOut(shared.task_timeout)
        }
    };

    shared
        .metrics
        .record_finished(started.elapsed(), outcome.is_success());
    shared.metrics.worker_finished();
    outcome
}

fn panic_message(panic: &Box<dyn Any + Send>) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic payload"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn explode() -> anyhow::Result<()> {
        panic!("scanner exploded")
    }

    #[test]
    fn zero_workers_is_rejected() {
        let err = WorkerPool::new(0).unwrap_err();
        assert_eq!(err, PoolError::InvalidWorkerCount(0));
    }

    #[tokio::test]
    async fn submitted_tasks_run_and_are_counted() {
        let pool = WorkerPool::new(2).unwrap();
        pool.start();

        let ran = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let ran = Arc::clone(&ran);
            pool.submit(Task::new(move |_| async move {
                ran.fetch_add(1, Ordering::SeqCst);
                Ok::<_, anyhow::Error>(())
            }))
            .await;
        }
        pool.submit(Task::new(|_| async { Err::<(), _>(anyhow!("boom")) })).await;

        pool.stop().await;

        let metrics = pool.metrics();
        assert_eq!(ran.load(Ordering::SeqCst), 3);
        assert_eq!(metrics.total_tasks, 4);
        assert_eq!(metrics.completed_tasks, 3);
        assert_eq!(metrics.failed_tasks, 1);
        assert_eq!(metrics.current_workers, 0);
    }

    #[tokio::test]
    async fn panicking_task_counts_as_failure() {
        let pool = WorkerPool::new(1).unwrap();
        let report = pool
            .execute_tasks(vec![
                Task::new(|_| async { explode() }),
                Task::new(|_| async { Ok::<_, anyhow::Error>(()) }),
            ])
            .await;

        assert_eq!(report.completed(), 1);
        assert_eq!(report.failed(), 1);
        let (index, outcome) = report.failures().next().unwrap();
        assert_eq!(index, 0);
        match outcome {
            TaskOutcome::Failed(err) => assert!(err.to_string().contains("scanner exploded")),
            other => panic!("unexpected outcome {other:?}"),
        }
        pool.stop().await;
    }

    #[tokio::test]
    async fn slow_task_times_out_and_sees_cancellation() {
        let pool = WorkerPool::with_task_timeout(1, Duration::from_millis(50)).unwrap();
        let observed = Arc::new(AtomicBool::new(false));
        let seen = Arc::clone(&observed);

        let report = pool
            .execute_tasks(vec![Task::new(move |token| async move {
                let watcher = token.clone();
                tokio::spawn(async move {
                    watcher.cancelled().await;
                    seen.store(true, Ordering::SeqCst);
                });
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, anyhow::Error>(())
            })])
            .await;

        assert!(matches!(report.outcomes()[0], TaskOutcome::TimedOut(_)));
        assert_eq!(pool.metrics().failed_tasks, 1);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(observed.load(Ordering::SeqCst));
        pool.stop().await;
    }

    #[tokio::test]
    async fn submit_after_stop_is_ignored() {
        let pool = WorkerPool::new(1).unwrap();
        pool.start();
        pool.stop().await;

        pool.submit(Task::new(|_| async { Ok::<_, anyhow::Error>(()) })).await;
        assert_eq!(pool.metrics().total_tasks, 0);

        let report = pool.execute_tasks(vec![Task::new(|_| async { Ok::<_, anyhow::Error>(()) })]).await;
        assert_eq!(report.dropped(), 1);
    }

    #[tokio::test]
    async fn wait_for_tasks_returns_after_queued_work_is_picked_up() {
        let pool = WorkerPool::new(1).unwrap();
        pool.start();

        let ran = Arc::new(AtomicUsize::new(0));
        for _ in 0..4 {
            let ran = Arc::clone(&ran);
            pool.submit(Task::new(move |_| async move {
                ran.fetch_add(1, Ordering::SeqCst);
                Ok::<_, anyhow::Error>(())
            }))
            .await;
        }

        // A single worker runs jobs in order, so every earlier task has
        // finished once the marker is reached.
        pool.wait_for_tasks().await;
        assert_eq!(ran.load(Ordering::SeqCst), 4);
        pool.stop().await;
    }

    #[tokio::test]
    async fn wait_for_tasks_starts_an_idle_pool() {
        let pool = WorkerPool::new(2).unwrap();
        tokio::time::timeout(Duration::from_secs(5), pool.wait_for_tasks())
            .await
            .expect("wait_for_tasks should not block on an unstarted pool");
        assert_eq!(pool.worker_handles.lock().unwrap().len(), 2);
        pool.stop().await;

        // Stopped pools return straight away.
        tokio::time::timeout(Duration::from_secs(5), pool.wait_for_tasks())
            .await
            .expect("wait_for_tasks should return on a stopped pool");
    }

    #[tokio::test]
    async fn start_twice_spawns_workers_once() {
        let pool = WorkerPool::new(3).unwrap();
        pool.start();
        pool.start();
        assert_eq!(pool.worker_handles.lock().unwrap().len(), 3);
        pool.stop().await;
    }
}
