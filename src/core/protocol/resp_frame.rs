// src/core/protocol/resp_frame.rs

//! Implements the RESP (REdis Serialization Protocol) frame structure and the
//! corresponding `Encoder` and `Decoder`. On the client side the encoder
//! serializes outbound command arrays and the decoder parses inbound replies.

use crate::core::OpalisError;
use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// The CRLF (Carriage Return, Line Feed) sequence used to terminate lines in RESP.
const CRLF: &[u8] = b"\r\n";
const CRLF_LEN: usize = 2;

// Protocol-level limits: a reply tripping these is malformed or hostile,
// not merely incomplete.
const MAX_FRAME_ELEMENTS: usize = 1_024 * 1_024;
const MAX_BULK_STRING_SIZE: usize = 512 * 1024 * 1024; // 512MB max bulk string size.
const MAX_RECURSION_DEPTH: usize = 64;

/// An enum representing a single frame in the RESP protocol.
/// This is the low-level representation of data exchanged with the store.
#[derive(Debug, Clone, PartialEq)]
pub enum RespFrame {
    SimpleString(String),
    Error(String),
    Integer(i64),
    BulkString(Bytes),
    Null,
    NullArray,
    Array(Vec<RespFrame>),
}

impl RespFrame {
    /// A convenience method to encode a frame into a `Vec<u8>`.
    /// Useful in tests and anywhere a complete byte vector is needed.
    pub fn encode_to_vec(&self) -> Result<Vec<u8>, OpalisError> {
        let mut buf = BytesMut::new();
        RespCodec.encode(self.clone(), &mut buf)?;
        Ok(buf.to_vec())
    }
}

/// A `tokio_util::codec` implementation for encoding and decoding `RespFrame`s.
///
/// The codec is sans-I/O: it only ever touches the byte buffers handed to it.
/// `decode` over the connection's read buffer is exactly the "check for one
/// buffered reply" primitive the non-blocking drive path is built on.
#[derive(Debug, Default)]
pub struct RespCodec;

impl Encoder<RespFrame> for RespCodec {
    type Error = OpalisError;

    /// Encodes a `RespFrame` into a `BytesMut` buffer according to the RESP specification.
    fn encode(&mut self, item: RespFrame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            RespFrame::SimpleString(s) => write_line(dst, b'+', s.as_bytes()),
            RespFrame::Error(s) => write_line(dst, b'-', s.as_bytes()),
            RespFrame::Integer(i) => write_line(dst, b':', i.to_string().as_bytes()),
            RespFrame::BulkString(b) => {
                write_line(dst, b'$', b.len().to_string().as_bytes());
                dst.extend_from_slice(&b);
                dst.extend_from_slice(CRLF);
            }
            RespFrame::Null => dst.extend_from_slice(b"$-1\r\n"),
            RespFrame::NullArray => dst.extend_from_slice(b"*-1\r\n"),
            RespFrame::Array(arr) => {
                write_line(dst, b'*', arr.len().to_string().as_bytes());
                for frame in arr {
                    // Recursively encode each frame in the array.
                    self.encode(frame, dst)?;
                }
            }
        }
        Ok(())
    }
}

impl Decoder for RespCodec {
    type Item = RespFrame;
    type Error = OpalisError;

    /// Decodes one `RespFrame` from a `BytesMut` buffer, consuming exactly the
    /// bytes that frame occupied. `Ok(None)` means the buffer holds only a
    /// prefix of a frame and more data is needed.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        let mut bytes = &src[..];
        match parse_frame(&mut bytes, 0) {
            Ok(frame) => {
                let consumed = src.len() - bytes.len();
                src.advance(consumed);
                Ok(Some(frame))
            }
            // `IncompleteData` signals that we need more bytes; any other
            // error is propagated up as a real protocol failure.
            Err(OpalisError::IncompleteData) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Appends `<marker><payload>\r\n` to the buffer.
fn write_line(dst: &mut BytesMut, marker: u8, payload: &[u8]) {
    dst.extend_from_slice(&[marker]);
    dst.extend_from_slice(payload);
    dst.extend_from_slice(CRLF);
}

/// Recursively parses one frame, advancing `bytes` past everything consumed.
/// `depth` tracks recursion level to prevent stack overflow on nested arrays.
fn parse_frame(bytes: &mut &[u8], depth: usize) -> Result<RespFrame, OpalisError> {
    if depth > MAX_RECURSION_DEPTH {
        return Err(OpalisError::InvalidRequest(
            "RESP recursion depth limit exceeded".to_string(),
        ));
    }

    let (marker, rest) = match bytes.split_first() {
        Some(split) => split,
        None => return Err(OpalisError::IncompleteData),
    };
    *bytes = rest;

    match marker {
        b'+' => Ok(RespFrame::SimpleString(take_line(bytes)?)),
        b'-' => Ok(RespFrame::Error(take_line(bytes)?)),
        b':' => {
            let line = take_line(bytes)?;
            let i = line.parse::<i64>().map_err(|_| OpalisError::SyntaxError)?;
            Ok(RespFrame::Integer(i))
        }
        b'$' => parse_bulk_string(bytes),
        b'*' => parse_array(bytes, depth),
        _ => Err(OpalisError::SyntaxError),
    }
}

/// Consumes one CRLF-terminated line and returns it as text.
fn take_line(bytes: &mut &[u8]) -> Result<String, OpalisError> {
    let pos = find_crlf(bytes).ok_or(OpalisError::IncompleteData)?;
    let line = String::from_utf8_lossy(&bytes[..pos]).into_owned();
    *bytes = &bytes[pos + CRLF_LEN..];
    Ok(line)
}

/// Consumes a length header line (the part after `$` or `*`). `-1` encodes
/// the null variant and is returned as `None`.
fn take_length(bytes: &mut &[u8], max: usize) -> Result<Option<usize>, OpalisError> {
    let line = take_line(bytes)?;
    let len = line.parse::<isize>().map_err(|_| OpalisError::SyntaxError)?;
    if len == -1 {
        return Ok(None);
    }
    let len = usize::try_from(len).map_err(|_| OpalisError::SyntaxError)?;
    if len > max {
        return Err(OpalisError::SyntaxError);
    }
    Ok(Some(len))
}

/// Parses a Bulk String (e.g., `$5\r\nhello\r\n`). `$-1\r\n` is Null.
fn parse_bulk_string(bytes: &mut &[u8]) -> Result<RespFrame, OpalisError> {
    let Some(len) = take_length(bytes, MAX_BULK_STRING_SIZE)? else {
        return Ok(RespFrame::Null);
    };

    if bytes.len() < len + CRLF_LEN {
        return Err(OpalisError::IncompleteData);
    }
    if &bytes[len..len + CRLF_LEN] != CRLF {
        return Err(OpalisError::SyntaxError);
    }

    let data = Bytes::copy_from_slice(&bytes[..len]);
    *bytes = &bytes[len + CRLF_LEN..];
    Ok(RespFrame::BulkString(data))
}

/// Parses an Array (e.g., `*2\r\n$3\r\nfoo\r\n$3\r\nbar\r\n`). `*-1\r\n` is NullArray.
fn parse_array(bytes: &mut &[u8], depth: usize) -> Result<RespFrame, OpalisError> {
    let Some(len) = take_length(bytes, MAX_FRAME_ELEMENTS)? else {
        return Ok(RespFrame::NullArray);
    };

    let mut frames = Vec::with_capacity(len.min(1024));
    for _ in 0..len {
        frames.push(parse_frame(bytes, depth + 1)?);
    }
    Ok(RespFrame::Array(frames))
}

/// Helper function to find the next CRLF sequence in a buffer.
fn find_crlf(src: &[u8]) -> Option<usize> {
    src.windows(CRLF_LEN).position(|window| window == CRLF)
}
