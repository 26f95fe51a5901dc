//! # embercache - A Networked In-Memory LRU Cache
//!
//! embercache is a shared hot-object cache that sits in front of a slower
//! authoritative store. Clients speak a newline-delimited text protocol
//! over TCP; the server keeps string values keyed by strings, bounds total
//! memory with a byte budget, and evicts least-recently-used entries when
//! the budget is threatened.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │                            embercache                              │
//! │                                                                    │
//! │  ┌─────────────┐    ┌──────────────┐    ┌───────────────────────┐  │
//! │  │ CacheServer │───>│  ThreadPool  │───>│  handle_connection    │  │
//! │  │ (accept)    │    │ (one task    │    │  (frame lines,        │  │
//! │  └─────────────┘    │  per client) │    │   time requests)      │  │
//! │                     └──────────────┘    └───────────┬───────────┘  │
//! │                                                     │              │
//! │  ┌─────────────┐    ┌──────────────┐    ┌───────────▼───────────┐  │
//! │  │  protocol   │<──>│CommandHandler│───>│     Cache (facade)    │  │
//! │  │ (parse /    │    │ (dispatch)   │    │  byte budget + stats  │  │
//! │  │  format)    │    └──────────────┘    │  ┌─────────────────┐  │  │
//! │  └─────────────┘                        │  │ LruCache engine │  │  │
//! │                                         │  └─────────────────┘  │  │
//! │                                         └───────────────────────┘  │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use embercache::server::CacheServer;
//! use std::sync::Arc;
//!
//! let server = Arc::new(CacheServer::new(8080, 4));
//! server.start().expect("failed to start server");
//! ```
//!
//! Then, from any TCP client:
//!
//! ```text
//! SET user:42 ada lovelace
//! OK
//! GET user:42
//! OK ada lovelace
//! STATS
//! OK size=1 hits=1 misses=0 ...
//! ```
//!
//! ## Concurrency Model
//!
//! One dedicated accept thread, a fixed pool of worker threads, one task
//! per live connection. Requests on a connection are answered strictly in
//! order; cache operations are linearizable behind the facade lock; the
//! statistics counters are lock-free atomics.

pub mod cache;
pub mod commands;
pub mod connection;
pub mod pool;
pub mod protocol;
pub mod server;

pub use cache::{Cache, CacheEntry, LruCache};
pub use commands::CommandHandler;
pub use connection::{handle_connection, ServerStats};
pub use pool::{PoolError, TaskHandle, ThreadPool};
pub use protocol::{parse_request, ParseError, Request, Response};
pub use server::{CacheServer, ServerError};

/// Crate version, taken from Cargo metadata.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
