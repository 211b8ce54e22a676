// src/client/subscriber.rs

//! The subscription scheduler: a polling listener that runs only while at
//! least one channel subscription is live.

use crate::client::link::Link;
use crate::client::sync::open_stream;
use crate::config::{Config, PollErrorPolicy};
use crate::core::OpalisError;
use crate::core::output::{ReplyAtom, flatten};
use crate::core::protocol::Command;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A publish/subscribe listener.
///
/// The scheduler itself owns no timer: the host loop calls `poll_once` and
/// re-arms on its own clock while `should_continue` holds. On activation the
/// first poll is due immediately, so a freshly subscribed channel is drained
/// without waiting out one interval.
#[derive(Debug)]
pub struct Subscriber<S = TcpStream> {
    link: Link<S>,
    count: usize,
    running: bool,
    poll_interval: Duration,
    on_poll_error: PollErrorPolicy,
    addr: String,
}

impl Subscriber<TcpStream> {
    /// Connects and switches the stream to non-blocking mode. The link must
    /// not be assumed usable before the first successful poll.
    pub fn connect(config: &Config) -> Result<Self, OpalisError> {
        let addr = config.addr();
        let stream = open_stream(config)?;
        stream.set_nonblocking(true)?;
        info!("connected to store at {addr} (subscribe)");
        Ok(Self {
            link: Link::new(stream),
            count: 0,
            running: false,
            poll_interval: config.poll_interval(),
            on_poll_error: config.on_poll_error,
            addr,
        })
    }
}

impl<S: Read + Write> Subscriber<S> {
    /// Wraps an already-established stream. Primarily for tests.
    pub fn from_stream(stream: S, poll_interval: Duration, on_poll_error: PollErrorPolicy) -> Self {
        Self {
            link: Link::new(stream),
            count: 0,
            running: false,
            poll_interval,
            on_poll_error,
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

    /// Live channel subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.count
    }

    /// Whether the host loop should keep polling.
    pub fn should_continue(&self) -> bool {
        self.running
    }

    /// The fixed period between polls while running.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Buffers a `subscribe` command for the given channels, fire-and-forget
    /// (the confirmation replies are drained by subsequent polls), then
    /// raises the live count and re-evaluates the scheduler.
    pub fn subscribe(&mut self, channels: &[String]) -> Result<(), OpalisError> {
        let cmd = Command::subscription("subscribe", channels)?;
        self.link.append_command(&cmd)?;
        self.count += channels.len();
        debug!(count = self.count, "subscribed");
        self.reschedule();
        Ok(())
    }

    /// Mirror of `subscribe`: buffers an `unsubscribe` command and lowers the
    /// live count, never below zero.
    pub fn unsubscribe(&mut self, channels: &[String]) -> Result<(), OpalisError> {
        let cmd = Command::subscription("unsubscribe", channels)?;
        self.link.append_command(&cmd)?;
        self.count = self.count.saturating_sub(channels.len());
        debug!(count = self.count, "unsubscribed");
        self.reschedule();
        Ok(())
    }

    /// Explicit request to resume polling, subject to the live count.
    pub fn start(&mut self) {
        self.reschedule();
    }

    /// Forces polling off regardless of the live count. Takes effect before
    /// the next poll; already-decoded output is unaffected.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// One poll step: a single non-blocking drain attempt, decoding at most
    /// one reply. Returns `None` when idle or when nothing was available.
    ///
    /// On an I/O error the step is abandoned; whether the scheduler also
    /// stops is the configured policy (the reference behavior keeps polling).
    pub fn poll_once(&mut self) -> Result<Option<Vec<ReplyAtom>>, OpalisError> {
        if !self.running {
            return Ok(None);
        }
        match self.link.drive_once() {
            Ok(Some(frame)) => Ok(Some(flatten(&frame)?)),
            Ok(None) => Ok(None),
            Err(e) => {
                if self.on_poll_error == PollErrorPolicy::Stop {
                    warn!("poll failed, stopping subscription polling: {e}");
                    self.running = false;
                }
                Err(e)
            }
        }
    }

    /// Enforces the hysteresis invariant: running exactly while the live
    /// count is positive and no explicit stop is in force.
    fn reschedule(&mut self) {
        if self.running && self.count < 1 {
            self.running = false;
            debug!("no live subscriptions, polling suspended");
        } else if !self.running && self.count > 0 {
            self.running = true;
            debug!("subscriptions live, polling resumed");
        }
    }
}
