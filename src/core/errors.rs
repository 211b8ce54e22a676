// src/core/errors.rs

//! Defines the primary error type for the entire crate.

use std::sync::Arc;
use thiserror::Error;

/// The main error enum, representing all possible failures in the client engine.
/// Using `thiserror` allows for clean error definitions and automatic `From` trait implementations.
#[derive(Error, Debug)]
pub enum OpalisError {
    #[error("IO Error: {0}")]
    Io(Arc<std::io::Error>),

    /// The read buffer does not yet hold one complete reply frame. This is the
    /// codec's internal "need more bytes" signal and never escapes a drive step.
    #[error("Incomplete data in stream")]
    IncompleteData,

    #[error("Syntax error")]
    SyntaxError,

    #[error("Connection closed by peer")]
    ConnectionClosed,

    #[error("Could not connect to {addr}: {reason}")]
    ConnectionFailed { addr: String, reason: String },

    /// A flattened reply would exceed the fixed output capacity.
    #[error("Reply too large: more than {0} output atoms")]
    ReplyTooLarge(usize),

    #[error("Wrong number of arguments for '{0}'")]
    WrongArgumentCount(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("CSV load error: {0}")]
    Csv(String),
}

// Manual implementation of Clone because `std::io::Error` is not cloneable.
// We wrap it in an Arc to allow for cheap, shared cloning.
impl Clone for OpalisError {
    fn clone(&self) -> Self {
        match self {
            OpalisError::Io(e) => OpalisError::Io(Arc::clone(e)),
            OpalisError::IncompleteData => OpalisError::IncompleteData,
            OpalisError::SyntaxError => OpalisError::SyntaxError,
            OpalisError::ConnectionClosed => OpalisError::ConnectionClosed,
            OpalisError::ConnectionFailed { addr, reason } => OpalisError::ConnectionFailed {
                addr: addr.clone(),
                reason: reason.clone(),
            },
            OpalisError::ReplyTooLarge(n) => OpalisError::ReplyTooLarge(*n),
            OpalisError::WrongArgumentCount(s) => OpalisError::WrongArgumentCount(s.clone()),
            OpalisError::InvalidRequest(s) => OpalisError::InvalidRequest(s.clone()),
            OpalisError::Csv(s) => OpalisError::Csv(s.clone()),
        }
    }
}

impl PartialEq for OpalisError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (OpalisError::Io(e1), OpalisError::Io(e2)) => e1.to_string() == e2.to_string(),
            (OpalisError::ReplyTooLarge(n1), OpalisError::ReplyTooLarge(n2)) => n1 == n2,
            (OpalisError::WrongArgumentCount(s1), OpalisError::WrongArgumentCount(s2)) => s1 == s2,
            (OpalisError::InvalidRequest(s1), OpalisError::InvalidRequest(s2)) => s1 == s2,
            (OpalisError::Csv(s1), OpalisError::Csv(s2)) => s1 == s2,
            (
                OpalisError::ConnectionFailed { addr: a1, reason: r1 },
                OpalisError::ConnectionFailed { addr: a2, reason: r2 },
            ) => a1 == a2 && r1 == r2,
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

// --- From trait implementations for easy error conversion ---

impl From<std::io::Error> for OpalisError {
    fn from(e: std::io::Error) -> Self {
        OpalisError::Io(Arc::new(e))
    }
}

impl From<std::str::Utf8Error> for OpalisError {
    fn from(_: std::str::Utf8Error) -> Self {
        OpalisError::SyntaxError
    }
}

impl From<std::string::FromUtf8Error> for OpalisError {
    fn from(_: std::string::FromUtf8Error) -> Self {
        OpalisError::SyntaxError
    }
}

impl From<csv::Error> for OpalisError {
    fn from(e: csv::Error) -> Self {
        OpalisError::Csv(e.to_string())
    }
}
