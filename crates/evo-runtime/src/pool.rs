//! Fixed-size worker pool executing network-evaluation jobs.
//!
//! Grounded on spec.md §5's concurrency contract ("a fixed number of
//! worker threads pull jobs from a FIFO queue; `pool.stop()` drains
//! in-flight work without interrupting it") — `examples/original_source`
//! has no equivalent source file (its thread pool came from a
//! third-party header not part of the retrieved sources), so the
//! implementation follows the crate choice already recorded in
//! `DESIGN.md`: `crossbeam-channel` for the job queue, plain
//! `std::thread` workers, matching the "dropped `shnn-async-runtime`"
//! rationale there.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};
use log::warn;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A fixed-size pool of worker threads draining a FIFO job queue.
///
/// `stop()` only flips a flag refusing new `enqueue` calls; queued and
/// in-flight jobs keep running to completion, matching spec.md §5
/// ("does not interrupt them"). `resume()` clears the flag so the same
/// pool can be reused across `conf.task.runs` repetitions. A job that
/// panics is caught so one bad evaluation can't take down a worker
/// thread for the rest of the run.
pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    handles: Vec<JoinHandle<()>>,
    stopped: Arc<AtomicBool>,
    completed: Arc<AtomicU64>,
}

impl WorkerPool {
    /// Spawn `threads` worker threads draining a shared job queue.
    ///
    /// # Panics
    /// Panics if `threads` is `0`.
    pub fn new(threads: usize) -> Self {
        assert!(threads > 0, "WorkerPool needs at least one thread");

        let (sender, receiver): (Sender<Job>, Receiver<Job>) = crossbeam_channel::unbounded();
        let stopped = Arc::new(AtomicBool::new(false));
        let completed = Arc::new(AtomicU64::new(0));

        let handles = (0..threads)
            .map(|id| {
                let receiver = receiver.clone();
                let completed = Arc::clone(&completed);
                std::thread::Builder::new()
                    .name(format!("evo-worker-{id}"))
                    .spawn(move || Self::worker_loop(id, receiver, completed))
                    .expect("failed to spawn worker thread")
            })
            .collect();

        Self {
            sender: Some(sender),
            handles,
            stopped,
            completed,
        }
    }

    fn worker_loop(id: usize, receiver: Receiver<Job>, completed: Arc<AtomicU64>) {
        while let Ok(job) = receiver.recv() {
            if std::panic::catch_unwind(std::panic::AssertUnwindSafe(job)).is_err() {
                warn!("evo-worker-{id}: job panicked, continuing");
            }
            completed.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Enqueue a job for a worker to pick up. A no-op error return (not a
    /// panic) if the pool has been `stop()`-ped — callers check `is_stopped`
    /// before enqueuing a fresh epoch's batch.
    pub fn enqueue<F>(&self, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        if self.stopped.load(Ordering::SeqCst) {
            return false;
        }
        match &self.sender {
            Some(sender) => sender.send(Box::new(job)).is_ok(),
            None => false,
        }
    }

    /// Block until every currently-queued job has completed. Implemented
    /// by enqueuing one barrier job per worker and waiting for all of
    /// them to run, which only happens once every job ahead of them in
    /// the shared queue has drained.
    pub fn wait(&self) {
        let sender = match &self.sender {
            Some(sender) => sender,
            None => return,
        };
        let (done_tx, done_rx) = crossbeam_channel::bounded::<()>(self.handles.len());
        for _ in 0..self.handles.len() {
            let done_tx = done_tx.clone();
            if sender
                .send(Box::new(move || {
                    let _ = done_tx.send(());
                }))
                .is_err()
            {
                return;
            }
        }
        drop(done_tx);
        for _ in 0..self.handles.len() {
            if done_rx.recv().is_err() {
                break;
            }
        }
    }

    /// Refuse further `enqueue` calls; jobs already queued still run.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    /// Clear the stopped flag so the pool accepts `enqueue` calls again.
    pub fn resume(&self) {
        self.stopped.store(false, Ordering::SeqCst);
    }

    /// Whether `stop()` has been called without a matching `resume()`.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Total jobs completed across this pool's whole lifetime. The task
    /// runner subtracts a stored snapshot to get a single run's
    /// evaluation count, mirroring
    /// `threadpool.tasks_completed() - evals` in
    /// `examples/original_source/src/lib/cortex/Task.cpp`.
    pub fn tasks_completed(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }

    /// Number of worker threads in the pool.
    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Drop our sender explicitly before joining: workers are blocked
        // in `receiver.recv()`, which only returns `Err` once every
        // `Sender` clone is gone. Joining first would deadlock forever.
        self.sender.take();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[test]
    fn enqueued_jobs_run_and_wait_blocks_until_drained() {
        let pool = WorkerPool::new(4);
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..50 {
            let counter = Arc::clone(&counter);
            pool.enqueue(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        pool.wait();
        assert_eq!(counter.load(Ordering::SeqCst), 50);
        assert_eq!(pool.tasks_completed(), 50);
    }

    #[test]
    fn stop_refuses_new_jobs_but_resume_reopens_the_gate() {
        let pool = WorkerPool::new(2);
        pool.stop();
        assert!(pool.is_stopped());
        let accepted = pool.enqueue(|| {});
        assert!(!accepted);

        pool.resume();
        assert!(pool.enqueue(|| {}));
        pool.wait();
    }

    #[test]
    fn a_panicking_job_does_not_take_down_the_worker() {
        let pool = WorkerPool::new(1);
        pool.enqueue(|| panic!("boom"));
        pool.wait();
        // The worker survived: a second job still runs.
        let ran = Arc::new(AtomicBool::new(false));
        let ran2 = Arc::clone(&ran);
        pool.enqueue(move || ran2.store(true, Ordering::SeqCst));
        pool.wait();
        std::thread::sleep(Duration::from_millis(10));
        assert!(ran.load(Ordering::SeqCst));
    }
}
