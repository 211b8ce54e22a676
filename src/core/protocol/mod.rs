// src/core/protocol/mod.rs

//! Defines the wire protocol layer: command serialization and RESP framing.

mod command;
mod resp_frame;

pub use command::Command;
pub use resp_frame::{RespCodec, RespFrame};
