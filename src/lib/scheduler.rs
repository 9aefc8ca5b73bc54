//! A single-worker queue of delayed file deletions.
//!
//! Deletions are one-shot and cannot be withdrawn once scheduled. They run one
//! at a time on a background task, in fire-time order. Stopping the scheduler
//! discards whatever has not fired yet; nothing is persisted, so a restart
//! also loses pending deletions.
use std::{
    cmp::Reverse,
    collections::BinaryHeap,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use anyhow::{bail, Result};
use tokio::{
    sync::{mpsc, Notify},
    task::JoinHandle,
    time::{sleep_until, Instant},
};

/// Downloaded files are removed this long after they are written.
pub const DEFAULT_DELETION_DELAY: Duration = Duration::from_secs(30 * 60);

/// A pending deletion, identified only by its path and fire time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DeletionTask {
    pub fire_at: Instant,
    pub path: PathBuf,
}

impl DeletionTask {
    pub fn new(path: impl Into<PathBuf>, delay: Duration) -> Self {
        Self {
            fire_at: Instant::now() + delay,
            path: path.into(),
        }
    }

    /// Deletes the file now. Returns `false` if it was already gone.
    pub async fn fire(&self) -> Result<bool> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

pub struct DeletionScheduler {
    tx: mpsc::UnboundedSender<DeletionTask>,
    shutdown: Arc<Notify>,
    stopped: AtomicBool,
    pending: Arc<AtomicUsize>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl DeletionScheduler {
    /// Spawns the worker. Must be called from within a tokio runtime.
    pub fn start() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let shutdown = Arc::new(Notify::new());
        let pending = Arc::new(AtomicUsize::new(0));

        let worker = tokio::spawn(Self::run(rx, Arc::clone(&shutdown), Arc::clone(&pending)));

        Self {
            tx,
            shutdown,
            stopped: AtomicBool::new(false),
            pending,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Schedules `path` for deletion after `delay`. Fails once the scheduler
    /// has been stopped.
    pub fn schedule(&self, path: impl AsRef<Path>, delay: Duration) -> Result<DeletionTask> {
        if self.stopped.load(Ordering::SeqCst) {
            bail!("Deletion scheduler is stopped");
        }

        let task = DeletionTask::new(path.as_ref(), delay);
        self.pending.fetch_add(1, Ordering::SeqCst);
        // `stop` may have run since the check above.
        if self.is_stopped() || self.tx.send(task.clone()).is_err() {
            release(&self.pending);
            bail!("Deletion worker is not running");
        }
        debug!(
            "Scheduled deletion of {} in {:?}",
            task.path.display(),
            delay
        );
        Ok(task)
    }

    /// Number of deletions scheduled but not yet fired. Always 0 once stopped.
    pub fn pending(&self) -> usize {
        if self.is_stopped() {
            return 0;
        }
        self.pending.load(Ordering::SeqCst)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Stops accepting new tasks and shuts the worker down. Deletions that
    /// have not fired yet are dropped. Waits for a deletion that is already
    /// running, but not for pending ones.
    pub async fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        self.shutdown.notify_one();

        let worker = self.worker.lock().ok().and_then(|mut w| w.take());
        if let Some(worker) = worker {
            if let Err(err) = worker.await {
                error!("Deletion worker failed: {}", err);
            }
        }
    }

    async fn run(
        mut rx: mpsc::UnboundedReceiver<DeletionTask>,
        shutdown: Arc<Notify>,
        pending: Arc<AtomicUsize>,
    ) {
        let mut queue: BinaryHeap<Reverse<DeletionTask>> = BinaryHeap::new();

        loop {
            let next = queue.peek().map(|Reverse(task)| task.fire_at);

            tokio::select! {
                _ = shutdown.notified() => break,
                task = rx.recv() => match task {
                    Some(task) => queue.push(Reverse(task)),
                    None => break,
                },
                _ = sleep_until(next.unwrap_or_else(Instant::now)), if next.is_some() => {
                    if let Some(Reverse(task)) = queue.pop() {
                        match task.fire().await {
                            Ok(true) => info!("Deleted file: {}", task.path.display()),
                            Ok(false) => info!("File already gone: {}", task.path.display()),
                            Err(err) => error!("Couldn't delete file {}, {:#}", task.path.display(), err),
                        }
                        release(&pending);
                    }
                }
            }
        }

        if !queue.is_empty() {
            info!(
                "Deletion scheduler stopped, discarding {} pending deletions",
                queue.len()
            );
        }
        pending.store(0, Ordering::SeqCst);
    }
}

/// Decrements `pending` without wrapping below zero.
fn release(pending: &AtomicUsize) {
    let _ = pending.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
}
