//! TCP Cache Server
//!
//! The top-level component: a listening socket, an accept loop, and a
//! worker pool servicing one connection per task against the shared cache.
//! See [`tcp`] for the lifecycle contract.

pub mod tcp;

pub use tcp::{CacheServer, ServerError, DEFAULT_PORT};
