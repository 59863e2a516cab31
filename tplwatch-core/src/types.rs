//! Domain types for tplwatch.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};

/// Characters escaped inside one URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed name for a tracked repository.
///
/// The name keys the state file, so it must be unique across the config.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepoName(pub String);

impl RepoName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the name can be embedded in a state file name.
    pub fn is_valid(&self) -> bool {
        !self.0.trim().is_empty()
            && !self.0.contains(['/', '\\'])
            && self.0 != "."
            && self.0 != ".."
    }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for RepoName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RepoName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Set of template paths, relative to the repository root with `/` separators.
///
/// Ordered so that scans, diffs and state files are reproducible.
pub type TemplateSet = BTreeSet<String>;

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// A tracked remote repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: RepoName,
    /// Remote location handed to `git clone`.
    pub url: String,
    /// Web view prefix for files, e.g. `https://github.com/org/repo/blob/main`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_base: Option<String>,
    /// Local checkout path. Absolute once the config is resolved.
    pub path: PathBuf,
}

impl Repository {
    /// Web link for a template path, if the repository has a link base.
    pub fn link_for(&self, template: &str) -> Option<String> {
        self.link_base.as_ref().map(|base| {
            let encoded: Vec<String> = template
                .trim_start_matches('/')
                .split('/')
                .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
                .collect();
            format!("{}/{}", base.trim_end_matches('/'), encoded.join("/"))
        })
    }
}

/// Telegram bot credentials and endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct TelegramCredentials {
    pub api_base: String,
    pub bot_token: String,
    pub chat_id: String,
}

// Keep the token out of logs and panics.
impl fmt::Debug for TelegramCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramCredentials")
            .field("api_base", &self.api_base)
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

/// Fully resolved process configuration, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub repositories: Vec<Repository>,
    pub telegram: TelegramCredentials,
    /// Directory holding `known_templates_<name>.txt` files.
    pub state_dir: PathBuf,
    /// File-name suffixes that mark a template file.
    pub template_suffixes: Vec<String>,
    /// Maximum characters per outbound message.
    pub message_limit: usize,
    pub http_timeout: Duration,
    /// Send a one-time acknowledgement when a baseline is first recorded.
    pub announce_baseline: bool,
    /// Directory of `.tera` files overriding the embedded message templates.
    pub templates_dir: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
