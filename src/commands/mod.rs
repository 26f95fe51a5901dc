//! Command Dispatch
//!
//! Bridges the protocol layer and the cache facade: a parsed request goes
//! in, a wire-ready response comes out. See [`handler`] for the full
//! request-to-response mapping table.

pub mod handler;

pub use handler::CommandHandler;
