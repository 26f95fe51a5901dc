//! Connection Handler
//!
//! Services one client connection: reads bytes, frames them into request
//! lines, executes each request, and writes the response back.
//!
//! ## Connection Lifecycle
//!
//! ```text
//! 1. Accept loop hands the socket to a pooled task
//!        │
//!        ▼
//! 2. ┌──────────────────────────────┐
//!    │ Read up to 4096 bytes        │◄──────┐
//!    │ Append to per-conn buffer    │       │
//!    │ For each complete line:      │       │
//!    │   parse → execute → respond  │       │
//!    └──────────────┬───────────────┘       │
//!                   └──── more data ────────┘
//!        │
//!        ▼
//! 3. Peer closes / I/O error / server stops → socket dropped, task ends
//! ```
//!
//! ## Framing
//!
//! TCP is a stream: one read may carry a partial request or several
//! pipelined requests. The handler owns a `BytesMut` accumulation buffer
//! and frames strictly on `\n` (an optional preceding `\r` is stripped), so
//! both cases behave correctly. Requests on a single connection are always
//! processed and answered in order.
//!
//! Buffering is bounded by the cache's byte budget: a partial line already
//! larger than the budget can never be admitted, so the handler answers the
//! admission failure immediately and discards the rest of that line instead
//! of accumulating it. The connection stays open.

use crate::commands::CommandHandler;
use crate::protocol::{parse_request, ParseError, Response};
use bytes::BytesMut;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Size of each read from the client socket.
const READ_CHUNK_SIZE: usize = 4096;

/// Room allowed for a request line beyond the cache's byte budget: the
/// verb, the key, and the separating spaces around the value.
const LINE_LIMIT_SLACK: usize = 1024;

/// Server-wide request statistics, shared by the accept loop, every
/// connection task, and the `STATS` command.
#[derive(Debug, Default)]
pub struct ServerStats {
    /// Connections accepted over the server's lifetime.
    connections_handled: AtomicU64,
    /// Requests parsed and executed over the server's lifetime.
    requests_processed: AtomicU64,
    /// Accumulated request handling time in microseconds.
    total_response_time_us: AtomicU64,
}

impl ServerStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an accepted connection.
    pub fn connection_accepted(&self) {
        self.connections_handled.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one handled request and the time it took.
    pub fn record_request(&self, elapsed: Duration) {
        self.total_response_time_us
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
        self.requests_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connections_handled(&self) -> u64 {
        self.connections_handled.load(Ordering::Relaxed)
    }

    pub fn requests_processed(&self) -> u64 {
        self.requests_processed.load(Ordering::Relaxed)
    }

    pub fn total_response_time_us(&self) -> u64 {
        self.total_response_time_us.load(Ordering::Relaxed)
    }

    /// Mean request handling time in microseconds, 0 before any requests.
    pub fn average_response_time_us(&self) -> f64 {
        let requests = self.requests_processed();
        if requests == 0 {
            return 0.0;
        }
        self.total_response_time_us() as f64 / requests as f64
    }
}

/// Services one client connection until it closes, errors, or the server
/// stops.
pub fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    handler: CommandHandler,
    stats: Arc<ServerStats>,
    running: Arc<AtomicBool>,
) {
    info!(client = %addr, "client connected");

    match connection_loop(stream, addr, &handler, &stats, &running) {
        Ok(()) => debug!(client = %addr, "client disconnected"),
        Err(e) if e.kind() == std::io::ErrorKind::ConnectionReset => {
            debug!(client = %addr, "connection reset by client")
        }
        Err(e) => warn!(client = %addr, error = %e, "connection error"),
    }
}

/// The read-frame-execute-respond loop.
fn connection_loop(
    mut stream: TcpStream,
    addr: SocketAddr,
    handler: &CommandHandler,
    stats: &ServerStats,
    running: &AtomicBool,
) -> std::io::Result<()> {
    let mut buffer = BytesMut::with_capacity(READ_CHUNK_SIZE);
    let mut chunk = [0u8; READ_CHUNK_SIZE];
    // Set once an oversized line has been answered; its remaining bytes are
    // dropped until the terminating newline arrives.
    let mut discarding = false;

    while running.load(Ordering::Relaxed) {
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            return Ok(());
        }
        trace!(client = %addr, bytes = n, "read data");
        buffer.extend_from_slice(&chunk[..n]);

        while let Some(newline) = buffer.iter().position(|&b| b == b'\n') {
            let mut frame = buffer.split_to(newline + 1);
            if discarding {
                // Tail of a line that was already answered; drop it.
                discarding = false;
                continue;
            }
            frame.truncate(frame.len() - 1);
            if frame.last() == Some(&b'\r') {
                frame.truncate(frame.len() - 1);
            }

            let started = Instant::now();
            let response = match std::str::from_utf8(&frame) {
                Ok(line) => execute_line(handler, line),
                Err(_) => Response::error("Invalid command"),
            };
            stats.record_request(started.elapsed());
            send_response(&mut stream, &addr, &response)?;
        }

        if discarding {
            buffer.clear();
            continue;
        }

        // A partial line already larger than the byte budget can never be
        // admitted; answer the admission failure now rather than buffering
        // the rest of it.
        let limit = handler.cache_capacity().saturating_add(LINE_LIMIT_SLACK);
        if buffer.len() > limit {
            warn!(
                client = %addr,
                buffered = buffer.len(),
                budget = handler.cache_capacity(),
                "request line exceeds cache budget"
            );
            let started = Instant::now();
            let response = Response::error("Failed to set value");
            stats.record_request(started.elapsed());
            send_response(&mut stream, &addr, &response)?;
            buffer.clear();
            discarding = true;
        }
    }

    Ok(())
}

/// Writes one response line back to the client.
fn send_response(
    stream: &mut TcpStream,
    addr: &SocketAddr,
    response: &Response,
) -> std::io::Result<()> {
    let mut wire = response.to_string();
    wire.push('\n');
    stream.write_all(wire.as_bytes())?;
    trace!(client = %addr, bytes = wire.len(), "sent response");
    Ok(())
}

/// Parses and executes one request line.
fn execute_line(handler: &CommandHandler, line: &str) -> Response {
    match parse_request(line) {
        Ok(request) => handler.execute(request),
        Err(ParseError::UnknownCommand(_)) => Response::error("Unknown command"),
        Err(_) => Response::error("Invalid command"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Cache;

    fn handler() -> (CommandHandler, Arc<ServerStats>) {
        let stats = Arc::new(ServerStats::new());
        (
            CommandHandler::new(Arc::new(Cache::new()), Arc::clone(&stats)),
            stats,
        )
    }

    #[test]
    fn test_execute_line_valid_command() {
        let (handler, _) = handler();
        assert_eq!(execute_line(&handler, "SET foo bar"), Response::ok());
        assert_eq!(
            execute_line(&handler, "GET foo"),
            Response::with_payload("bar")
        );
    }

    #[test]
    fn test_execute_line_error_mapping() {
        let (handler, _) = handler();
        assert_eq!(
            execute_line(&handler, "FROB x y"),
            Response::error("Unknown command")
        );
        assert_eq!(execute_line(&handler, ""), Response::error("Invalid command"));
        assert_eq!(
            execute_line(&handler, "SET key"),
            Response::error("Invalid command")
        );
    }

    #[test]
    fn test_stats_average() {
        let stats = ServerStats::new();
        assert_eq!(stats.average_response_time_us(), 0.0);

        stats.record_request(Duration::from_micros(100));
        stats.record_request(Duration::from_micros(300));

        assert_eq!(stats.requests_processed(), 2);
        assert_eq!(stats.total_response_time_us(), 400);
        assert_eq!(stats.average_response_time_us(), 200.0);
    }

    #[test]
    fn test_stats_connection_counter() {
        let stats = ServerStats::new();
        stats.connection_accepted();
        stats.connection_accepted();
        assert_eq!(stats.connections_handled(), 2);
    }
}
