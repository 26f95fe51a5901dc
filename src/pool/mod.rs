//! Worker Thread Pool
//!
//! A bounded pool of worker threads behind a FIFO queue, used by the TCP
//! server to run one task per live client connection. See [`worker`] for
//! the execution and shutdown model.

pub mod worker;

pub use worker::{PoolError, TaskHandle, ThreadPool};
