// src/core/mod.rs

//! The protocol core shared by all three access modes: errors, RESP framing,
//! command serialization, and reply flattening.

pub mod errors;
pub mod output;
pub mod protocol;

pub use errors::OpalisError;
pub use output::{MAX_REPLY_ATOMS, ReplyAtom, flatten};
pub use protocol::{Command, RespCodec, RespFrame};
