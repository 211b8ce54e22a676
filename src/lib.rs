// src/lib.rs

pub mod client;
pub mod config;
pub mod core;
pub mod loader;

// Re-export
pub use crate::core::OpalisError;
