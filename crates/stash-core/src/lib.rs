//! Stash Core Library
//!
//! This crate provides the domain models, filter snapshots, query identities,
//! error types and configuration shared by every Stash client component.

pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod query;

// Re-export commonly used types
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult, DownloadError, TransportError};
pub use filter::{FilterField, FilterInput, FilterSnapshot, SizePreset};
pub use query::QueryKey;
