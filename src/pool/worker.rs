//! Worker Pool
//!
//! A fixed-size pool of OS threads consuming a shared FIFO task queue.
//!
//! ## Execution Model
//!
//! ```text
//! enqueue(task) ──> ┌─────────────────────────┐
//!                   │  queue: Mutex<VecDeque> │
//!                   │  available: Condvar     │
//!                   └───────────┬─────────────┘
//!                               │ pop (FIFO)
//!              ┌────────────────┼────────────────┐
//!              ▼                ▼                ▼
//!         worker-0          worker-1         worker-N
//! ```
//!
//! Workers block on the condition variable while the queue is empty. Any
//! ready worker may take the next task; there is no affinity. Each task is
//! a type-erased closure whose return value travels back through a one-shot
//! channel wrapped in a [`TaskHandle`].
//!
//! ## Shutdown
//!
//! [`ThreadPool::shutdown`] flips the stop flag and wakes every worker. A
//! worker exits only when it observes the flag *and* an empty queue, so
//! tasks enqueued before shutdown are always completed. Enqueues after
//! shutdown begins fail with [`PoolError::ShuttingDown`]. Shutdown joins
//! all workers and is idempotent.

use crossbeam_channel::{bounded, Receiver};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tracing::{debug, error};

/// A type-erased unit of work.
type Job = Box<dyn FnOnce() + Send + 'static>;

/// Errors produced by the pool.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// The pool is shutting down and refuses new work.
    #[error("enqueue on a shutting down thread pool")]
    ShuttingDown,

    /// The task was dropped before it produced a result.
    #[error("task was cancelled before completing")]
    Cancelled,
}

/// State shared between the pool handle and its workers.
struct Shared {
    /// Pending tasks in arrival order.
    queue: Mutex<VecDeque<Job>>,
    /// Signaled when work arrives or shutdown begins.
    available: Condvar,
    /// Set once shutdown has started; never cleared.
    stopping: AtomicBool,
}

/// One-shot handle to a task's result.
///
/// Dropping the handle detaches the task: it still runs, its result is
/// discarded.
pub struct TaskHandle<T> {
    result: Receiver<T>,
}

impl<T> TaskHandle<T> {
    /// Blocks until the task completes and returns its result.
    pub fn wait(self) -> Result<T, PoolError> {
        self.result.recv().map_err(|_| PoolError::Cancelled)
    }
}

/// A fixed-size worker pool with a FIFO task queue.
///
/// # Example
/// ```
/// use embercache::pool::ThreadPool;
///
/// let pool = ThreadPool::new(2);
/// let handle = pool.enqueue(|| 21 * 2).unwrap();
/// assert_eq!(handle.wait().unwrap(), 42);
/// pool.shutdown();
/// ```
pub struct ThreadPool {
    shared: Arc<Shared>,
    /// Drained on shutdown so the join can happen through `&self`.
    workers: Mutex<Vec<JoinHandle<()>>>,
    threads: usize,
}

impl ThreadPool {
    /// Creates a pool with `threads` workers (clamped to at least one).
    pub fn new(threads: usize) -> Self {
        let threads = threads.max(1);
        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
            stopping: AtomicBool::new(false),
        });

        let mut workers = Vec::with_capacity(threads);
        for id in 0..threads {
            let shared = Arc::clone(&shared);
            let builder = thread::Builder::new().name(format!("embercache-worker-{id}"));
            match builder.spawn(move || worker_loop(shared)) {
                Ok(handle) => workers.push(handle),
                Err(e) => error!(worker = id, error = %e, "failed to spawn worker thread"),
            }
        }

        Self {
            shared,
            workers: Mutex::new(workers),
            threads,
        }
    }

    /// Creates a pool sized to the machine's hardware parallelism.
    pub fn with_default_size() -> Self {
        Self::new(num_cpus::get())
    }

    /// Submits a task, returning a handle to its eventual result.
    ///
    /// Fails fast with [`PoolError::ShuttingDown`] once shutdown has begun.
    pub fn enqueue<F, T>(&self, task: F) -> Result<TaskHandle<T>, PoolError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        if self.shared.stopping.load(Ordering::Acquire) {
            return Err(PoolError::ShuttingDown);
        }

        let (tx, rx) = bounded(1);
        let job: Job = Box::new(move || {
            // The receiver may be gone (detached task); that is fine.
            let _ = tx.send(task());
        });

        {
            let mut queue = self.shared.queue.lock();
            // Re-check under the lock so no task slips in behind shutdown.
            if self.shared.stopping.load(Ordering::Acquire) {
                return Err(PoolError::ShuttingDown);
            }
            queue.push_back(job);
        }
        self.shared.available.notify_one();

        Ok(TaskHandle { result: rx })
    }

    /// Stops the pool: refuses new work, drains queued tasks, joins all
    /// workers. Safe to call more than once.
    pub fn shutdown(&self) {
        if !self.shared.stopping.swap(true, Ordering::AcqRel) {
            debug!("thread pool shutting down");
        }
        self.shared.available.notify_all();

        let handles: Vec<JoinHandle<()>> = self.workers.lock().drain(..).collect();
        for handle in handles {
            let _ = handle.join();
        }
    }

    /// Number of worker threads.
    pub fn size(&self) -> usize {
        self.threads
    }

    /// Number of tasks waiting to run.
    pub fn queue_size(&self) -> usize {
        self.shared.queue.lock().len()
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// The loop each worker runs: pop a task or sleep until one arrives; exit
/// when stopping and the queue is drained.
fn worker_loop(shared: Arc<Shared>) {
    loop {
        let job = {
            let mut queue = shared.queue.lock();
            loop {
                if let Some(job) = queue.pop_front() {
                    break job;
                }
                if shared.stopping.load(Ordering::Acquire) {
                    return;
                }
                shared.available.wait(&mut queue);
            }
        };
        job();
    }
}
