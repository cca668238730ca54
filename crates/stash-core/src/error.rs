//! Error types module
//!
//! All client failures are unified under [`ClientError`]. Catalog calls fail with a
//! [`TransportError`] (network, non-2xx status, malformed payload); saving a fetched
//! file to disk fails with a [`DownloadError`]; bad user input is a validation error
//! caught before any request is made.

use std::io;
use std::path::PathBuf;

/// Inline message shown when an upload fails for any reason.
pub const UPLOAD_FAILED_MESSAGE: &str = "Failed to upload file. Please try again.";

/// Inline message shown when an upload is attempted with nothing selected.
pub const NO_FILE_SELECTED_MESSAGE: &str = "Please select a file";

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like a failed request
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Failure talking to the remote catalog.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("API request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Decode(String),
}

impl TransportError {
    /// HTTP status of the failed response, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the server explicitly rejected the request (4xx).
    pub fn is_rejection(&self) -> bool {
        matches!(self.status(), Some(400..=499))
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::Decode(err.to_string())
    }
}

/// Failure materializing a fetched file into a local save.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("Failed to fetch file: {0}")]
    Fetch(#[source] TransportError),

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("An upload is already in progress")]
    UploadInProgress,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        ClientError::Validation(message.into())
    }

    /// Text suitable for an inline error next to the affected control.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Validation(message) => message.clone(),
            ClientError::UploadInProgress => "Upload in progress, please wait".to_string(),
            ClientError::Transport(_) => "Request failed, please retry".to_string(),
            ClientError::Download(_) => "Failed to download file".to_string(),
            ClientError::Config(message) => message.clone(),
        }
    }

    /// Whether repeating the same call later could succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            ClientError::Transport(err) => !err.is_rejection(),
            ClientError::UploadInProgress | ClientError::Download(_) => true,
            ClientError::Validation(_) | ClientError::Config(_) => false,
        }
    }

    pub fn log_level(&self) -> LogLevel {
        match self {
            ClientError::Validation(_) | ClientError::UploadInProgress => LogLevel::Debug,
            ClientError::Transport(_) | ClientError::Download(_) => LogLevel::Warn,
            ClientError::Config(_) => LogLevel::Error,
        }
    }
}
