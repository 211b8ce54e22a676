// src/client/link.rs

//! The buffered link shared by every connection kind: an outbound byte queue,
//! an inbound byte queue, and the codec between them and the stream.

use crate::core::OpalisError;
use crate::core::protocol::{Command, RespCodec, RespFrame};
use bytes::{Buf, BytesMut};
use std::io::{ErrorKind, Read, Write};
use tokio_util::codec::{Decoder, Encoder};

/// Read chunk size for one non-blocking or blocking read attempt.
const READ_CHUNK: usize = 16 * 1024;

/// One buffered link to the store.
///
/// `Link` is generic over the stream so the drive logic can be exercised in
/// tests against an in-memory stub. The non-blocking primitives treat
/// `WouldBlock` as "no progress this attempt", never as a failure; a
/// zero-byte read means the peer closed the connection.
#[derive(Debug)]
pub struct Link<S> {
    stream: S,
    codec: RespCodec,
    read_buf: BytesMut,
    write_buf: BytesMut,
}

impl<S: Read + Write> Link<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            codec: RespCodec,
            read_buf: BytesMut::with_capacity(READ_CHUNK),
            write_buf: BytesMut::new(),
        }
    }

    /// Serializes a command onto the outbound queue. Nothing is written to
    /// the stream until a flush or drive attempt.
    pub fn append_command(&mut self, cmd: &Command) -> Result<(), OpalisError> {
        self.codec.encode(cmd.to_frame(), &mut self.write_buf)
    }

    /// Checks whether a complete reply is already sitting in the read buffer,
    /// without touching the stream.
    pub fn buffered_reply(&mut self) -> Result<Option<RespFrame>, OpalisError> {
        self.codec.decode(&mut self.read_buf)
    }

    /// Performs at most one write attempt against the stream, sending as much
    /// of the outbound queue as the socket accepts.
    pub fn try_write_once(&mut self) -> Result<(), OpalisError> {
        if self.write_buf.is_empty() {
            return Ok(());
        }
        match self.stream.write(&self.write_buf) {
            Ok(0) => Err(OpalisError::ConnectionClosed),
            Ok(n) => {
                self.write_buf.advance(n);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::Interrupted => {
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Performs at most one read attempt against the stream, appending
    /// whatever arrived to the read buffer.
    pub fn try_read_once(&mut self) -> Result<(), OpalisError> {
        let mut chunk = [0u8; READ_CHUNK];
        match self.stream.read(&mut chunk) {
            Ok(0) => Err(OpalisError::ConnectionClosed),
            Ok(n) => {
                self.read_buf.extend_from_slice(&chunk[..n]);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::Interrupted => {
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// One bounded progress attempt: check the read buffer for a complete
    /// reply; if none, write once, read once, and check again. Never blocks
    /// on a non-blocking stream and performs at most one read and one write.
    pub fn drive_once(&mut self) -> Result<Option<RespFrame>, OpalisError> {
        if let Some(frame) = self.buffered_reply()? {
            return Ok(Some(frame));
        }
        self.try_write_once()?;
        self.try_read_once()?;
        self.buffered_reply()
    }

    /// Blocking flush: writes the entire outbound queue. Used by the
    /// synchronous transport, where the stream is in blocking mode.
    pub fn flush_blocking(&mut self) -> Result<(), OpalisError> {
        while !self.write_buf.is_empty() {
            match self.stream.write(&self.write_buf) {
                Ok(0) => return Err(OpalisError::ConnectionClosed),
                Ok(n) => self.write_buf.advance(n),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        self.stream.flush()?;
        Ok(())
    }

    /// Blocking receive: reads from the stream until one complete reply
    /// decodes. A configured read deadline surfaces here as an I/O error.
    pub fn read_reply_blocking(&mut self) -> Result<RespFrame, OpalisError> {
        loop {
            if let Some(frame) = self.buffered_reply()? {
                return Ok(frame);
            }
            let mut chunk = [0u8; READ_CHUNK];
            match self.stream.read(&mut chunk) {
                Ok(0) => return Err(OpalisError::ConnectionClosed),
                Ok(n) => self.read_buf.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Bytes queued for transmission but not yet accepted by the socket.
    pub fn unsent_bytes(&self) -> usize {
        self.write_buf.len()
    }

    /// A reference to the underlying stream.
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// A mutable reference to the underlying stream.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }
}
