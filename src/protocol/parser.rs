//! Request Line Parser
//!
//! This module parses single request lines into [`Request`] values. The
//! parser is pure: it performs no I/O, holds no state, and its only failure
//! mode is a well-formed [`ParseError`].
//!
//! ## Tokenization Rules
//!
//! - Tokens are separated by ASCII spaces.
//! - Runs of consecutive spaces collapse: empty tokens are discarded, so
//!   `SET k  v` is identical to `SET k v`. This is observable for `SET`
//!   values, where the remaining tokens are re-joined with single spaces:
//!   `SET k a  b` stores the value `a b`.
//! - The command verb is matched case-insensitively (`get`, `Get` and `GET`
//!   are the same command).
//!
//! ## Error Reporting
//!
//! An empty line or a recognized verb with too few arguments is a malformed
//! request; an unrecognized verb is reported separately so the server can
//! distinguish `ERROR Invalid command` from `ERROR Unknown command`.

use crate::protocol::types::Request;
use thiserror::Error;

/// Errors produced while parsing a request line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The line contained no tokens at all.
    #[error("empty request")]
    Empty,

    /// The command verb is not part of the protocol.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// A recognized command was missing required arguments.
    #[error("missing arguments for {command}")]
    MissingArguments { command: &'static str },
}

/// Parses one request line (without its trailing newline).
///
/// # Example
/// ```
/// use embercache::protocol::{parse_request, Request};
///
/// let req = parse_request("SET greeting hello world").unwrap();
/// assert_eq!(
///     req,
///     Request::Set {
///         key: "greeting".to_string(),
///         value: "hello world".to_string(),
///     }
/// );
/// ```
pub fn parse_request(line: &str) -> Result<Request, ParseError> {
    let mut tokens = line.split(' ').filter(|token| !token.is_empty());

    let command = tokens.next().ok_or(ParseError::Empty)?;

    match command.to_ascii_uppercase().as_str() {
        "SET" => {
            let key = tokens
                .next()
                .ok_or(ParseError::MissingArguments { command: "SET" })?;
            let value_tokens: Vec<&str> = tokens.collect();
            if value_tokens.is_empty() {
                return Err(ParseError::MissingArguments { command: "SET" });
            }
            Ok(Request::Set {
                key: key.to_string(),
                value: value_tokens.join(" "),
            })
        }
        "GET" => {
            let key = tokens
                .next()
                .ok_or(ParseError::MissingArguments { command: "GET" })?;
            Ok(Request::Get {
                key: key.to_string(),
            })
        }
        "DELETE" => {
            let key = tokens
                .next()
                .ok_or(ParseError::MissingArguments { command: "DELETE" })?;
            Ok(Request::Delete {
                key: key.to_string(),
            })
        }
        "CLEAR" => Ok(Request::Clear),
        "STATS" => Ok(Request::Stats),
        _ => Err(ParseError::UnknownCommand(command.to_string())),
    }
}
