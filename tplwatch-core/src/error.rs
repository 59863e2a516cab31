//! Error types for tplwatch-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while resolving the process configuration.
///
/// Every variant is fatal: nothing is checked until the configuration loads.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure reading the config file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load: includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`: cannot locate `~/.tplwatch/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// A required messaging credential is absent or empty.
    #[error("missing required setting {name}; set the {env} environment variable or telegram.{key} in the config file")]
    MissingCredential {
        name: &'static str,
        env: &'static str,
        key: &'static str,
    },

    /// Two repositories share a name, so their state files would collide.
    #[error("duplicate repository name '{0}'")]
    DuplicateRepository(String),

    /// A repository name is empty or cannot be used inside a file name.
    #[error("invalid repository name '{0}': must be non-empty and contain no path separators")]
    InvalidRepositoryName(String),

    /// The configured template suffix list is empty.
    #[error("template_suffixes must contain at least one suffix")]
    NoTemplateSuffixes,

    /// The message ceiling is too small to hold anything useful.
    #[error("message_limit must be at least {min}, got {got}")]
    MessageLimitTooSmall { min: usize, got: usize },

    /// A zero timeout would fail every request immediately.
    #[error("http_timeout_secs must be at least 1")]
    ZeroHttpTimeout,
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
