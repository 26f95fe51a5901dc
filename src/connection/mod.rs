//! Client Connections
//!
//! Per-connection servicing: byte stream in, newline-framed requests
//! through the command handler, response lines out. Also home to the
//! server-wide request statistics, which are shared between the accept
//! loop, every connection task, and the `STATS` command.

pub mod handler;

pub use handler::{handle_connection, ServerStats};
