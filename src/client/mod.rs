// src/client/mod.rs

//! The three connection kinds, one per access mode, over a shared buffered
//! link.

mod link;
mod pipeline;
mod subscriber;
mod sync;

pub use link::Link;
pub use pipeline::{DriveOutcome, PipelineConnection};
pub use subscriber::Subscriber;
pub use sync::SyncConnection;
