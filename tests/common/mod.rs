// tests/common/mod.rs

//! Shared test doubles: an in-memory stream with non-blocking socket
//! semantics, so the drive logic can be exercised without a network.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::{self, ErrorKind, Read, Write};

/// An in-memory stand-in for a TCP stream.
///
/// Reads drain `input`; an empty `input` behaves like an idle non-blocking
/// socket (`WouldBlock`) unless `closed` is set, in which case it reads as
/// end-of-stream. Writes append to `written`. Failure flags force hard I/O
/// errors to test the abort paths.
#[derive(Debug, Default)]
pub struct StubStream {
    pub input: VecDeque<u8>,
    pub written: Vec<u8>,
    /// Cap on bytes returned per read call, to exercise partial reads.
    pub read_limit: Option<usize>,
    pub closed: bool,
    pub fail_reads: bool,
    pub fail_writes: bool,
}

impl StubStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// A stream preloaded with reply bytes ready to be read.
    pub fn with_input(bytes: &[u8]) -> Self {
        Self {
            input: bytes.iter().copied().collect(),
            ..Self::default()
        }
    }

    /// Queues more inbound bytes, as if the server had just sent them.
    pub fn push_input(&mut self, bytes: &[u8]) {
        self.input.extend(bytes.iter().copied());
    }
}

impl Read for StubStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.fail_reads {
            return Err(io::Error::other("injected read failure"));
        }
        if self.input.is_empty() {
            if self.closed {
                return Ok(0);
            }
            return Err(io::Error::new(ErrorKind::WouldBlock, "no data"));
        }
        let limit = self.read_limit.unwrap_or(usize::MAX).min(buf.len());
        let mut n = 0;
        while n < limit {
            match self.input.pop_front() {
                Some(byte) => {
                    buf[n] = byte;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}

impl Write for StubStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fail_writes {
            return Err(io::Error::other("injected write failure"));
        }
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
