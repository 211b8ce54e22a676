// src/core/output.rs

//! The reply decoder: converts a reply frame into the flat, ordered output
//! sequence handed to the host.

use crate::core::OpalisError;
use crate::core::protocol::RespFrame;

/// The maximum number of output atoms one decoded reply may produce.
/// Exceeding it is a resource error, never silent truncation.
pub const MAX_REPLY_ATOMS: usize = 512;

/// One scalar of decoded output. Error and Status replies are delivered as
/// plain text on the same channel as successful replies; the transport layer
/// is the only place a failure is a typed signal.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyAtom {
    Text(String),
    Int(i64),
}

impl ReplyAtom {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ReplyAtom::Text(s) => Some(s),
            ReplyAtom::Int(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ReplyAtom::Int(i) => Some(*i),
            ReplyAtom::Text(_) => None,
        }
    }
}

impl std::fmt::Display for ReplyAtom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplyAtom::Text(s) => f.write_str(s),
            ReplyAtom::Int(i) => write!(f, "{i}"),
        }
    }
}

/// Flattens a reply frame into one ordered output sequence.
///
/// Scalars produce a single atom; both null variants produce the literal
/// text `nil`; arrays are visited left to right, each nested array inlining
/// its own flattened output at that position (depth-first order).
pub fn flatten(frame: &RespFrame) -> Result<Vec<ReplyAtom>, OpalisError> {
    let mut out = Vec::new();
    push_flat(frame, &mut out)?;
    Ok(out)
}

fn push_flat(frame: &RespFrame, out: &mut Vec<ReplyAtom>) -> Result<(), OpalisError> {
    match frame {
        RespFrame::Array(elements) => {
            for element in elements {
                push_flat(element, out)?;
            }
            Ok(())
        }
        scalar => {
            if out.len() >= MAX_REPLY_ATOMS {
                return Err(OpalisError::ReplyTooLarge(MAX_REPLY_ATOMS));
            }
            out.push(scalar_atom(scalar));
            Ok(())
        }
    }
}

fn scalar_atom(frame: &RespFrame) -> ReplyAtom {
    match frame {
        RespFrame::SimpleString(s) | RespFrame::Error(s) => ReplyAtom::Text(s.clone()),
        RespFrame::BulkString(b) => ReplyAtom::Text(String::from_utf8_lossy(b).into_owned()),
        RespFrame::Integer(i) => ReplyAtom::Int(*i),
        RespFrame::Null | RespFrame::NullArray => ReplyAtom::Text("nil".to_string()),
        // Arrays are handled by the caller.
        RespFrame::Array(_) => unreachable!("arrays are flattened, not emitted"),
    }
}
