use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::sync::{Mutex, MutexGuard};
use std::thread::JoinHandle;

use loglens_types::ParseLevel;

use crate::engine::Engine;

/// One unit of background indexing work.
#[derive(Debug, Clone)]
pub struct IndexJob {
    pub path: PathBuf,
    pub target: ParseLevel,
    pub force: bool,
}

/// Bounded background work queue for indexing, decoupled from interactive
/// callers.
///
/// Jobs fan out to a small worker pool; the per-session locks inside the
/// engine serialize overlapping jobs for the same file, so submitting the
/// same session twice is safe (the second run observes an up-to-date index
/// and returns immediately). A full queue applies backpressure by dropping
/// the submission and reporting it to the caller.
pub struct IndexQueue {
    sender: SyncSender<IndexJob>,
    workers: Vec<JoinHandle<()>>,
}

/// Cloneable submission handle, for callers (like the file watcher) that
/// outlive no queue of their own.
#[derive(Clone)]
pub struct QueueHandle {
    sender: SyncSender<IndexJob>,
}

impl QueueHandle {
    pub fn submit(&self, job: IndexJob) -> bool {
        match self.sender.try_send(job) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, "index queue saturated, dropping job");
                false
            }
        }
    }
}

const QUEUE_CAPACITY: usize = 256;

impl IndexQueue {
    pub fn start(engine: Arc<Engine>, worker_count: usize) -> Self {
        let (sender, receiver) = sync_channel::<IndexJob>(QUEUE_CAPACITY);
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..worker_count.max(1))
            .map(|_| {
                let engine = Arc::clone(&engine);
                let receiver = Arc::clone(&receiver);
                std::thread::spawn(move || worker_loop(engine, receiver))
            })
            .collect();

        IndexQueue { sender, workers }
    }

    pub fn handle(&self) -> QueueHandle {
        QueueHandle {
            sender: self.sender.clone(),
        }
    }

    /// Enqueue a job. Returns false when the queue is saturated.
    pub fn submit(&self, job: IndexJob) -> bool {
        match self.sender.try_send(job) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, "index queue saturated, dropping job");
                false
            }
        }
    }

    /// Drain outstanding jobs and stop the workers.
    pub fn shutdown(self) {
        drop(self.sender);
        for worker in self.workers {
            let _ = worker.join();
        }
    }
}

fn worker_loop(engine: Arc<Engine>, receiver: Arc<Mutex<Receiver<IndexJob>>>) {
    loop {
        let job = {
            let guard: MutexGuard<'_, Receiver<IndexJob>> = receiver
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            guard.recv()
        };

        let Ok(job) = job else {
            // Channel closed: queue shut down
            return;
        };

        if let Err(err) = engine.index_session(&job.path, job.target, job.force) {
            tracing::warn!(
                path = %job.path.display(),
                error = %err,
                "background indexing failed"
            );
        }
    }
}
