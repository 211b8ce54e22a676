// src/client/sync.rs

//! The synchronous transport: one command out, block until one reply is in.

use crate::client::link::Link;
use crate::config::Config;
use crate::core::OpalisError;
use crate::core::output::{ReplyAtom, flatten};
use crate::core::protocol::{Command, RespFrame};
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use tracing::{debug, info};

/// A blocking request/reply connection to the store.
///
/// The stream stays in blocking mode; `send` does not return until a complete
/// reply has been received and decoded. Read and write deadlines from the
/// configuration bound how long a dead peer can stall the caller.
#[derive(Debug)]
pub struct SyncConnection<S = TcpStream> {
    link: Link<S>,
    addr: String,
}

impl SyncConnection<TcpStream> {
    /// Establishes a blocking connection, bounded by the connect timeout.
    pub fn connect(config: &Config) -> Result<Self, OpalisError> {
        let addr = config.addr();
        let stream = open_stream(config)?;
        if let Some(deadline) = config.read_timeout() {
            stream.set_read_timeout(Some(deadline))?;
        }
        if let Some(deadline) = config.write_timeout() {
            stream.set_write_timeout(Some(deadline))?;
        }
        info!("connected to store at {addr} (sync)");
        Ok(Self {
            link: Link::new(stream),
            addr,
        })
    }
}

impl<S: Read + Write> SyncConnection<S> {
    /// Wraps an already-established stream. Primarily for tests.
    pub fn from_stream(stream: S) -> Self {
        Self {
            link: Link::new(stream),
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

    /// Sends one command and blocks until its reply arrives, returning the
    /// flattened output sequence.
    pub fn send(&mut self, cmd: &Command) -> Result<Vec<ReplyAtom>, OpalisError> {
        let frame = self.send_raw(cmd)?;
        flatten(&frame)
    }

    /// Sends one command and blocks until its reply arrives, returning the
    /// undecoded frame. The CSV loader uses this to tell store errors apart
    /// from successful writes before the distinction is erased by flattening.
    pub fn send_raw(&mut self, cmd: &Command) -> Result<RespFrame, OpalisError> {
        debug!(verb = %cmd.verb(), argc = cmd.len(), "sync send");
        self.link.append_command(cmd)?;
        self.link.flush_blocking()?;
        self.link.read_reply_blocking()
    }
}

/// Resolves the configured address and connects within the configured
/// timeout. Shared by all three connection kinds.
pub(crate) fn open_stream(config: &Config) -> Result<TcpStream, OpalisError> {
    let addr = config.addr();
    let sock_addr = addr
        .to_socket_addrs()
        .map_err(|e| OpalisError::ConnectionFailed {
            addr: addr.clone(),
            reason: e.to_string(),
        })?
        .next()
        .ok_or_else(|| OpalisError::ConnectionFailed {
            addr: addr.clone(),
            reason: "address resolved to nothing".to_string(),
        })?;
    let stream = TcpStream::connect_timeout(&sock_addr, config.connect_timeout()).map_err(|e| {
        OpalisError::ConnectionFailed {
            addr: addr.clone(),
            reason: e.to_string(),
        }
    })?;
    stream.set_nodelay(true)?;
    Ok(stream)
}
