use std::path::PathBuf;

use thiserror::Error;

/// Failures that stop a run before any repository is checked.
///
/// Per-repository failures never surface here; they are recorded in the
/// [`RunSummary`](crate::RunSummary) instead.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("notifier setup failed: {0}")]
    Notify(#[from] tplwatch_notify::NotifyError),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RunnerError {
    RunnerError::Io {
        path: path.into(),
        source,
    }
}
