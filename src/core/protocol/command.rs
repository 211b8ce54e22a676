// src/core/protocol/command.rs

//! The command serializer: builds the ordered argument vector sent to the
//! store from caller-supplied tokens.

use crate::core::OpalisError;
use crate::core::protocol::RespFrame;
use bytes::Bytes;

/// An ordered argument vector, one entry per command token.
///
/// Each token is carried as `Bytes`, so element lengths are explicit and
/// values may contain embedded zero bytes; the wire encoding is
/// length-prefixed bulk strings, never NUL-terminated text.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    args: Vec<Bytes>,
}

impl Command {
    /// Builds a command from textual tokens. The first token is the command
    /// verb. An empty token list is an argument error and nothing is sent.
    pub fn from_tokens<I, T>(tokens: I) -> Result<Self, OpalisError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let args: Vec<Bytes> = tokens
            .into_iter()
            .map(|t| Bytes::copy_from_slice(t.as_ref().as_bytes()))
            .collect();
        if args.is_empty() {
            return Err(OpalisError::WrongArgumentCount("command".to_string()));
        }
        Ok(Self { args })
    }

    /// Builds a command from raw byte tokens. Used by the CSV loader, where
    /// field values are byte spans straight out of the tokenizer.
    pub fn from_parts<I>(parts: I) -> Result<Self, OpalisError>
    where
        I: IntoIterator<Item = Bytes>,
    {
        let args: Vec<Bytes> = parts.into_iter().collect();
        if args.is_empty() {
            return Err(OpalisError::WrongArgumentCount("command".to_string()));
        }
        Ok(Self { args })
    }

    /// Builds a `subscribe`/`unsubscribe` command for the given channels.
    /// Zero channels is an argument error.
    pub fn subscription(verb: &str, channels: &[String]) -> Result<Self, OpalisError> {
        if channels.is_empty() {
            return Err(OpalisError::WrongArgumentCount(verb.to_string()));
        }
        let mut args = Vec::with_capacity(channels.len() + 1);
        args.push(Bytes::copy_from_slice(verb.as_bytes()));
        args.extend(
            channels
                .iter()
                .map(|c| Bytes::copy_from_slice(c.as_bytes())),
        );
        Ok(Self { args })
    }

    /// The command verb (first token), lossily decoded for logging.
    pub fn verb(&self) -> String {
        String::from_utf8_lossy(&self.args[0]).into_owned()
    }

    pub fn args(&self) -> &[Bytes] {
        &self.args
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Converts the argument vector into its wire representation: a RESP
    /// array of bulk strings.
    pub fn to_frame(&self) -> RespFrame {
        RespFrame::Array(
            self.args
                .iter()
                .map(|a| RespFrame::BulkString(a.clone()))
                .collect(),
        )
    }
}
