//! Command Execution
//!
//! Maps parsed [`Request`]s onto the cache facade and renders the outcome
//! as a [`Response`]. One handler is created per connection; handlers are
//! cheap clones sharing the cache and the server statistics.
//!
//! ## Response Mapping
//!
//! | Request      | On success     | On failure                   |
//! |--------------|----------------|------------------------------|
//! | `SET k v`    | `OK`           | `ERROR Failed to set value`  |
//! | `GET k`      | `OK <value>`   | `ERROR NOT_FOUND`            |
//! | `DELETE k`   | `OK`           | `ERROR NOT_FOUND`            |
//! | `CLEAR`      | `OK`           | —                            |
//! | `STATS`      | `OK <counters>`| —                            |
//!
//! A `GET` that finds an empty value also reports `NOT_FOUND`: the wire
//! protocol has no way to carry an empty payload distinguishably, so the
//! reference behavior is preserved even though the facade itself can tell
//! the two cases apart.

use crate::cache::Cache;
use crate::connection::ServerStats;
use crate::protocol::{Request, Response};
use std::sync::Arc;

/// Executes requests against the cache and statistics counters.
#[derive(Clone)]
pub struct CommandHandler {
    /// The shared cache facade.
    cache: Arc<Cache>,
    /// Server-wide request/connection counters, surfaced by `STATS`.
    stats: Arc<ServerStats>,
}

impl CommandHandler {
    /// Creates a handler over the shared cache and statistics.
    pub fn new(cache: Arc<Cache>, stats: Arc<ServerStats>) -> Self {
        Self { cache, stats }
    }

    /// The byte budget of the cache behind this handler. The connection
    /// layer uses it to bound request-line buffering.
    pub fn cache_capacity(&self) -> usize {
        self.cache.capacity()
    }

    /// Executes one request and returns the response to send.
    pub fn execute(&self, request: Request) -> Response {
        match request {
            Request::Set { key, value } => {
                if self.cache.set(key, value) {
                    Response::ok()
                } else {
                    Response::error("Failed to set value")
                }
            }
            Request::Get { key } => match self.cache.get(&key) {
                Some(value) if !value.is_empty() => Response::with_payload(value),
                _ => Response::error("NOT_FOUND"),
            },
            Request::Delete { key } => {
                if self.cache.remove(&key) {
                    Response::ok()
                } else {
                    Response::error("NOT_FOUND")
                }
            }
            Request::Clear => {
                self.cache.clear();
                Response::ok()
            }
            Request::Stats => Response::with_payload(self.render_stats()),
        }
    }

    /// Renders the `STATS` payload line.
    fn render_stats(&self) -> String {
        format!(
            "size={} hits={} misses={} hit_ratio={} memory_usage={} connections={} requests={} avg_response_time={}μs",
            self.cache.size(),
            self.cache.hits(),
            self.cache.misses(),
            self.cache.hit_ratio(),
            self.cache.memory_usage(),
            self.stats.connections_handled(),
            self.stats.requests_processed(),
            self.stats.average_response_time_us(),
        )
    }
}
