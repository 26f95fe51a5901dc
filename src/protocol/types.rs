//! Line Protocol Data Types
//!
//! This module defines the request and response types for the embercache
//! text protocol. The protocol is deliberately minimal: one request per line,
//! one response per line, tokens separated by single ASCII spaces.
//!
//! ## Protocol Format
//!
//! Requests:
//! - `SET key value...` - store a value (the value may contain spaces)
//! - `GET key` - read a value
//! - `DELETE key` - remove a key
//! - `CLEAR` - remove all entries
//! - `STATS` - fetch server statistics
//!
//! Responses:
//! - `OK` - success without payload
//! - `OK <payload>` - success with payload
//! - `ERROR <reason>` - failure
//!
//! All lines are terminated with a single `\n` on the wire. The terminator is
//! the transport's concern; the types here render the line body only.

use std::fmt;

/// A parsed client request.
///
/// Keys never contain whitespace (the tokenizer guarantees it); values may
/// contain single spaces but never newlines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Insert or overwrite a key.
    /// Format: `SET key value...`
    Set { key: String, value: String },

    /// Read the value for a key.
    /// Format: `GET key`
    Get { key: String },

    /// Remove a key.
    /// Format: `DELETE key`
    Delete { key: String },

    /// Remove all entries.
    /// Format: `CLEAR`
    Clear,

    /// Fetch server statistics as a single payload line.
    /// Format: `STATS`
    Stats,
}

impl Request {
    /// Returns the command verb for this request.
    pub fn command(&self) -> &'static str {
        match self {
            Request::Set { .. } => "SET",
            Request::Get { .. } => "GET",
            Request::Delete { .. } => "DELETE",
            Request::Clear => "CLEAR",
            Request::Stats => "STATS",
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::Set { key, value } => write!(f, "SET {} {}", key, value),
            Request::Get { key } => write!(f, "GET {}", key),
            Request::Delete { key } => write!(f, "DELETE {}", key),
            Request::Clear => write!(f, "CLEAR"),
            Request::Stats => write!(f, "STATS"),
        }
    }
}

/// A server response.
///
/// # Example
/// ```
/// use embercache::protocol::Response;
///
/// assert_eq!(Response::ok().to_string(), "OK");
/// assert_eq!(Response::with_payload("bar").to_string(), "OK bar");
/// assert_eq!(Response::error("NOT_FOUND").to_string(), "ERROR NOT_FOUND");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// The request succeeded. `payload` carries the result of a `GET` or
    /// `STATS`; it is `None` for commands that return nothing.
    Success { payload: Option<String> },

    /// The request failed; `reason` is reported verbatim to the client.
    Error { reason: String },
}

impl Response {
    /// A bare `OK` response.
    pub fn ok() -> Self {
        Response::Success { payload: None }
    }

    /// An `OK <payload>` response.
    pub fn with_payload(payload: impl Into<String>) -> Self {
        Response::Success {
            payload: Some(payload.into()),
        }
    }

    /// An `ERROR <reason>` response.
    pub fn error(reason: impl Into<String>) -> Self {
        Response::Error {
            reason: reason.into(),
        }
    }

    /// Returns true if this response reports a failure.
    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error { .. })
    }

    /// Returns the payload of a successful response, if any.
    pub fn payload(&self) -> Option<&str> {
        match self {
            Response::Success { payload } => payload.as_deref(),
            Response::Error { .. } => None,
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Success { payload: None } => write!(f, "OK"),
            Response::Success {
                payload: Some(payload),
            } => write!(f, "OK {}", payload),
            Response::Error { reason } => write!(f, "ERROR {}", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_render() {
        let req = Request::Set {
            key: "greeting".to_string(),
            value: "hello world".to_string(),
        };
        assert_eq!(req.to_string(), "SET greeting hello world");

        let req = Request::Get {
            key: "greeting".to_string(),
        };
        assert_eq!(req.to_string(), "GET greeting");

        assert_eq!(Request::Clear.to_string(), "CLEAR");
        assert_eq!(Request::Stats.to_string(), "STATS");
    }

    #[test]
    fn test_request_command() {
        assert_eq!(
            Request::Delete {
                key: "k".to_string()
            }
            .command(),
            "DELETE"
        );
        assert_eq!(Request::Stats.command(), "STATS");
    }

    #[test]
    fn test_ok_render() {
        assert_eq!(Response::ok().to_string(), "OK");
    }

    #[test]
    fn test_payload_render() {
        let resp = Response::with_payload("hello world");
        assert_eq!(resp.to_string(), "OK hello world");
        assert_eq!(resp.payload(), Some("hello world"));
    }

    #[test]
    fn test_error_render() {
        let resp = Response::error("Failed to set value");
        assert_eq!(resp.to_string(), "ERROR Failed to set value");
        assert!(resp.is_error());
        assert_eq!(resp.payload(), None);
    }

    #[test]
    fn test_empty_payload_is_distinct_from_none() {
        // "OK " with a trailing space is what an empty payload would render
        // as; the facade never produces it, but the type keeps the two cases
        // apart.
        assert_eq!(Response::with_payload("").to_string(), "OK ");
        assert_eq!(Response::ok().to_string(), "OK");
    }
}
