//! Error types for tplwatch-notify.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while rendering or delivering notifications.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Tera template engine error.
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// Filesystem error while loading user templates.
    #[error("template io error at {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    /// The rendered header leaves no room for entries under the size ceiling.
    #[error("message header is {len} characters, too long for a {limit}-character message")]
    HeaderTooLong { len: usize, limit: usize },

    /// A single entry cannot be shortened enough to fit next to the header.
    #[error("entry '{path}' cannot fit in a {limit}-character message")]
    EntryTooLong { path: String, limit: usize },

    /// The chat API answered with a non-success HTTP status.
    #[error("chat API returned status {status}: {description}")]
    Status { status: u16, description: String },

    /// The chat API answered 200 but flagged the request as failed.
    #[error("chat API rejected the message: {0}")]
    Rejected(String),

    /// Connection, TLS, timeout or response-decoding failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// One part of a multi-message batch failed; earlier parts were delivered.
    #[error("message {index} of {total} failed ({sent} delivered): {source}")]
    Batch {
        index: usize,
        total: usize,
        sent: usize,
        #[source]
        source: Box<NotifyError>,
    },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> NotifyError {
    NotifyError::Io {
        path: path.into(),
        source,
    }
}
