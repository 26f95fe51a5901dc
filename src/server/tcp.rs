//! TCP Server
//!
//! Owns the cache facade, the worker pool, and the listening socket. The
//! accept loop runs on the calling thread; each accepted connection becomes
//! one task on the pool, so the accept path never blocks on client I/O.
//!
//! ## Lifecycle
//!
//! - [`CacheServer::start`] binds and listens (backlog 10, address
//!   reusable), marks the server running, and accepts until stopped. Accept
//!   failures while running are logged and skipped; a bind or listen
//!   failure is fatal and returned to the caller.
//! - [`CacheServer::stop`] clears the running flag, pokes the listener with
//!   a loopback connection to unblock `accept`, and shuts the worker pool
//!   down. It is idempotent. In-flight connection tasks notice the cleared
//!   flag at their next loop check.

use crate::cache::Cache;
use crate::commands::CommandHandler;
use crate::connection::{handle_connection, ServerStats};
use crate::pool::ThreadPool;
use parking_lot::Mutex;
use socket2::{Domain, Socket, Type};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default port of the cache service.
pub const DEFAULT_PORT: u16 = 8080;

/// Listen backlog for the accept queue.
const LISTEN_BACKLOG: i32 = 10;

/// Errors that prevent the server from starting.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The listening socket could not be created or bound.
    #[error("failed to bind port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// The bound socket refused to enter the listening state.
    #[error("failed to listen on port {port}: {source}")]
    Listen {
        port: u16,
        #[source]
        source: std::io::Error,
    },
}

/// The TCP cache server.
///
/// # Example
/// ```ignore
/// use embercache::server::CacheServer;
/// use std::sync::Arc;
///
/// let server = Arc::new(CacheServer::new(8080, 4));
/// let handle = {
///     let server = Arc::clone(&server);
///     std::thread::spawn(move || server.start())
/// };
/// // ... later, from another thread or a signal handler:
/// server.stop();
/// handle.join().unwrap().unwrap();
/// ```
pub struct CacheServer {
    cache: Arc<Cache>,
    pool: ThreadPool,
    stats: Arc<ServerStats>,
    running: Arc<AtomicBool>,
    port: u16,
    /// Actual bound address, available once `start` has bound the socket.
    /// Needed both for tests (ephemeral ports) and for the stop wakeup.
    local_addr: Mutex<Option<SocketAddr>>,
}

impl CacheServer {
    /// Creates a server with a fresh default cache.
    pub fn new(port: u16, threads: usize) -> Self {
        Self::with_cache(port, threads, Arc::new(Cache::new()))
    }

    /// Creates a server over an existing cache facade.
    pub fn with_cache(port: u16, threads: usize, cache: Arc<Cache>) -> Self {
        Self {
            cache,
            pool: ThreadPool::new(threads),
            stats: Arc::new(ServerStats::new()),
            running: Arc::new(AtomicBool::new(false)),
            port,
            local_addr: Mutex::new(None),
        }
    }

    /// Binds the listening socket and runs the accept loop.
    ///
    /// Returns once the server has been stopped, or immediately with a
    /// [`ServerError`] if the socket could not be set up.
    pub fn start(&self) -> Result<(), ServerError> {
        let listener = self.bind_listener()?;
        let addr = listener.local_addr().ok();
        *self.local_addr.lock() = addr;

        self.running.store(true, Ordering::SeqCst);
        info!(port = self.port, workers = self.pool.size(), "cache server started");

        while self.running.load(Ordering::SeqCst) {
            match listener.accept() {
                Ok((stream, peer)) => {
                    // A stop wakeup lands here too; the flag decides.
                    if !self.running.load(Ordering::SeqCst) {
                        break;
                    }
                    self.stats.connection_accepted();
                    self.dispatch(stream, peer);
                }
                Err(e) => {
                    if self.running.load(Ordering::SeqCst) {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                    break;
                }
            }
        }

        info!("accept loop exited");
        Ok(())
    }

    /// Hands an accepted connection to the worker pool.
    fn dispatch(&self, stream: TcpStream, peer: SocketAddr) {
        let handler = CommandHandler::new(Arc::clone(&self.cache), Arc::clone(&self.stats));
        let stats = Arc::clone(&self.stats);
        let running = Arc::clone(&self.running);

        match self
            .pool
            .enqueue(move || handle_connection(stream, peer, handler, stats, running))
        {
            Ok(_handle) => {
                // The task is detached; the connection owns its own lifetime.
            }
            Err(e) => {
                warn!(client = %peer, error = %e, "dropping connection, pool unavailable");
            }
        }
    }

    /// Stops the server: clears the running flag, unblocks the accept loop,
    /// and shuts down the worker pool. Idempotent.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        info!("stopping cache server");

        // Unblock a pending accept. Connecting to the loopback side of the
        // listener is the portable way to make the blocked call return.
        if let Some(addr) = *self.local_addr.lock() {
            let wake = SocketAddr::from(([127, 0, 0, 1], addr.port()));
            match TcpStream::connect_timeout(&wake, Duration::from_millis(200)) {
                Ok(_) => debug!("accept loop woken for shutdown"),
                Err(e) => debug!(error = %e, "accept wakeup connect failed"),
            }
        }

        self.pool.shutdown();
        info!("cache server stopped");
    }

    /// Whether the accept loop is live.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// The address the server is bound to, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock()
    }

    /// The cache this server fronts.
    pub fn cache(&self) -> &Arc<Cache> {
        &self.cache
    }

    /// The server's request statistics.
    pub fn stats(&self) -> &Arc<ServerStats> {
        &self.stats
    }

    /// Creates the listening socket: address-reusable, bound to all
    /// interfaces, backlog of [`LISTEN_BACKLOG`].
    fn bind_listener(&self) -> Result<TcpListener, ServerError> {
        let bind_error = |source| ServerError::Bind {
            port: self.port,
            source,
        };

        let socket = Socket::new(Domain::IPV4, Type::STREAM, None).map_err(bind_error)?;
        socket.set_reuse_address(true).map_err(bind_error)?;

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        socket.bind(&addr.into()).map_err(bind_error)?;
        socket.listen(LISTEN_BACKLOG).map_err(|source| ServerError::Listen {
            port: self.port,
            source,
        })?;

        Ok(socket.into())
    }
}
