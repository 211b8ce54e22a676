// src/client/pipeline.rs

//! The asynchronous queue transport: commands are buffered without blocking
//! and replies are drained one non-blocking attempt at a time, with explicit
//! backlog accounting.

use crate::client::link::Link;
use crate::client::sync::open_stream;
use crate::config::Config;
use crate::core::OpalisError;
use crate::core::output::{ReplyAtom, flatten};
use crate::core::protocol::Command;
use std::io::{Read, Write};
use std::net::TcpStream;
use tracing::{debug, info};

/// The result of one drive attempt. `pending` is reported unconditionally so
/// the host can surface the backlog after every attempt, reply or not.
#[derive(Debug, Clone, PartialEq)]
pub struct DriveOutcome {
    pub reply: Option<Vec<ReplyAtom>>,
    pub pending: usize,
}

/// A pipelined connection. Replies arrive strictly in enqueue order, and
/// `pending` equals commands enqueued minus replies decoded at every
/// observable point.
#[derive(Debug)]
pub struct PipelineConnection<S = TcpStream> {
    link: Link<S>,
    pending: usize,
    addr: String,
}

impl PipelineConnection<TcpStream> {
    /// Connects and switches the stream to non-blocking mode. The link must
    /// not be assumed usable before the first successful drive.
    pub fn connect(config: &Config) -> Result<Self, OpalisError> {
        let addr = config.addr();
        let stream = open_stream(config)?;
        stream.set_nonblocking(true)?;
        info!("connected to store at {addr} (pipeline)");
        Ok(Self {
            link: Link::new(stream),
            pending: 0,
            addr,
        })
    }
}

impl<S: Read + Write> PipelineConnection<S> {
    /// Wraps an already-established stream. Primarily for tests.
    pub fn from_stream(stream: S) -> Self {
        Self {
            link: Link::new(stream),
            pending: 0,
            addr: String::new(),
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// A reference to the underlying stream.
    pub fn get_ref(&self) -> &S {
        self.link.get_ref()
    }

    /// A mutable reference to the underlying stream.
    pub fn get_mut(&mut self) -> &mut S {
        self.link.get_mut()
    }

    /// Commands sent but not yet matched to a decoded reply.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Serializes the command onto the outbound buffer and returns the
    /// updated pending count. Never blocks; no stream I/O happens here.
    pub fn enqueue(&mut self, cmd: &Command) -> Result<usize, OpalisError> {
        self.link.append_command(cmd)?;
        self.pending += 1;
        debug!(verb = %cmd.verb(), pending = self.pending, "enqueued");
        Ok(self.pending)
    }

    /// One non-blocking progress attempt: at most one write and one read.
    ///
    /// If a complete reply became available, it is decoded and the pending
    /// count decremented exactly once. An I/O error aborts the attempt and
    /// leaves the pending count untouched.
    pub fn drive(&mut self) -> Result<DriveOutcome, OpalisError> {
        if self.pending == 0 {
            return Ok(DriveOutcome {
                reply: None,
                pending: 0,
            });
        }
        let reply = match self.link.drive_once()? {
            Some(frame) => {
                self.pending -= 1;
                Some(flatten(&frame)?)
            }
            None => None,
        };
        Ok(DriveOutcome {
            reply,
            pending: self.pending,
        })
    }
}
