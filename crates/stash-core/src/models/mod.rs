//! Data models for the client
//!
//! Server-owned records (files, references, statistics) and the client-side
//! upload types. Each sub-module covers one feature area.

mod file;
mod stats;
mod upload;

// Re-export all models for convenient imports
pub use file::*;
pub use stats::*;
pub use upload::*;
