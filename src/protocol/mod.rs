//! Text Line Protocol
//!
//! This module implements the codec for the embercache wire protocol:
//! newline-terminated request lines in, newline-terminated response lines
//! out. Parsing and formatting are pure functions over strings; framing
//! (accumulating bytes and splitting on `\n`) belongs to the connection
//! layer.
//!
//! ## Module Structure
//!
//! - [`types`] - the [`Request`] and [`Response`] value types
//! - [`parser`] - [`parse_request`] and [`ParseError`]

pub mod parser;
pub mod types;

pub use parser::{parse_request, ParseError};
pub use types::{Request, Response};
