//! Error types for tplwatch-sync.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Pipeline stage a repository run was in when it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Preparing,
    Scanning,
    Diffing,
    Reporting,
    Skipping,
    Persisting,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Preparing => "preparing",
            Stage::Scanning => "scanning",
            Stage::Diffing => "diffing",
            Stage::Reporting => "reporting",
            Stage::Skipping => "skipping",
            Stage::Persisting => "persisting",
            Stage::Done => "done",
        };
        f.write_str(label)
    }
}

/// All errors that abort a single repository run.
#[derive(Debug, Error)]
pub enum WatchError {
    /// `git` could not be started at all.
    #[error("failed to run {program}: {source}")]
    GitSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// `git` ran but exited unsuccessfully.
    #[error("`{command}` failed ({status}): {stderr}")]
    Git {
        command: String,
        status: String,
        stderr: String,
    },

    /// Directory traversal failed below the checkout root.
    #[error("scan failed under {root}: {source}")]
    Scan {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// Filesystem failure while preparing the checkout location.
    #[error("cannot prepare mirror at {path}: {source}")]
    MirrorIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The checkout root itself could not be inspected.
    #[error("cannot read scan root {path}: {source}")]
    ScanRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The checkout path exists but is not a directory.
    #[error("scan root {0} is not a directory")]
    NotADirectory(PathBuf),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl WatchError {
    /// The stage that raised this error.
    pub fn stage(&self) -> Stage {
        match self {
            WatchError::GitSpawn { .. }
            | WatchError::Git { .. }
            | WatchError::MirrorIo { .. } => Stage::Preparing,
            WatchError::Scan { .. }
            | WatchError::ScanRoot { .. }
            | WatchError::NotADirectory(_) => Stage::Scanning,
            WatchError::Io { .. } => Stage::Persisting,
        }
    }
}

/// Convenience constructor for [`WatchError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> WatchError {
    WatchError::Io {
        path: path.into(),
        source,
    }
}
