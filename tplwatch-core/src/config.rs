//! Configuration loading and resolution.
//!
//! # Storage layout
//!
//! ```text
//! ~/.tplwatch/
//!   config.yaml                        (optional)
//!   state/
//!     known_templates_<name>.txt       (one per repository)
//!   <repository path>/                 (git checkouts, unless absolute)
//! ```
//!
//! # API pattern
//!
//! - `load_at(home, …, env)`: explicit home and environment lookup; used in tests
//! - `load(…)`: derives home from `dirs::home_dir()` and reads the process
//!   environment, delegates to `_at`
//!
//! The environment is read exactly once, here. Everything downstream receives a
//! resolved [`Config`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ConfigError};
use crate::types::{Config, RepoName, Repository, TelegramCredentials};

pub const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_CHAT_ID: &str = "TELEGRAM_CHAT_ID";

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";
/// Telegram rejects `sendMessage` text longer than this.
pub const DEFAULT_MESSAGE_LIMIT: usize = 4096;
pub const MIN_MESSAGE_LIMIT: usize = 256;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TEMPLATE_SUFFIX: &str = ".yaml";

// ---------------------------------------------------------------------------
// 1. On-disk shape
// ---------------------------------------------------------------------------

/// The YAML config file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Root for checkouts and state. Relative values resolve against home.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// Relative values resolve against `data_dir`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_suffixes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_timeout_secs: Option<u64>,
    #[serde(default)]
    pub announce_baseline: bool,
    /// Message template overrides. Relative values resolve against `data_dir`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templates_dir: Option<PathBuf>,
    #[serde(default)]
    pub telegram: TelegramSection,
    /// `None` selects the built-in repository list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repositories: Option<Vec<RepositoryEntry>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
}

/// A repository as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositoryEntry {
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_base: Option<String>,
    /// Checkout directory; defaults to `name`. Relative values resolve against `data_dir`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Repositories tracked when the config file does not list any.
pub fn default_repositories() -> Vec<RepositoryEntry> {
    vec![
        RepositoryEntry {
            name: "nuclei-templates".into(),
            url: "https://github.com/projectdiscovery/nuclei-templates.git".into(),
            link_base: Some(
                "https://github.com/projectdiscovery/nuclei-templates/blob/main".into(),
            ),
            path: None,
        },
        RepositoryEntry {
            name: "nucleihub-templates".into(),
            url: "https://github.com/rix4uni/nucleihub-templates.git".into(),
            link_base: Some("https://github.com/rix4uni/nucleihub-templates/blob/main".into()),
            path: None,
        },
    ]
}

// ---------------------------------------------------------------------------
// 2. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.tplwatch/`
pub fn data_dir_at(home: &Path) -> PathBuf {
    home.join(".tplwatch")
}

/// `<home>/.tplwatch/config.yaml`: pure, no I/O.
pub fn default_config_path_at(home: &Path) -> PathBuf {
    data_dir_at(home).join("config.yaml")
}

fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

// ---------------------------------------------------------------------------
// 3. Load
// ---------------------------------------------------------------------------

/// Parse a config file.
///
/// Returns `ConfigError::Io` if unreadable, `ConfigError::Parse` (with path +
/// line context) if malformed YAML.
pub fn read_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    if contents.trim().is_empty() {
        return Ok(ConfigFile::default());
    }
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load and resolve the configuration.
///
/// An explicit `config_path` must exist. Without one, `~/.tplwatch/config.yaml`
/// is read if present, otherwise built-in defaults apply. `env` looks up
/// environment variables; credentials found there win over the file.
pub fn load_at<F>(home: &Path, config_path: Option<&Path>, env: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let file = match config_path {
        Some(path) => read_config_file(path)?,
        None => {
            let path = default_config_path_at(home);
            if path.exists() {
                read_config_file(&path)?
            } else {
                ConfigFile::default()
            }
        }
    };
    resolve(file, home, env)
}

/// `load_at` convenience wrapper over the real home directory and environment.
pub fn load(config_path: Option<&Path>) -> Result<Config, ConfigError> {
    load_at(&home()?, config_path, |key| std::env::var(key).ok())
}

/// Turn a parsed [`ConfigFile`] into a validated [`Config`].
pub fn resolve<F>(file: ConfigFile, home: &Path, env: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let telegram = resolve_credentials(&file.telegram, &env)?;

    let data_dir = match &file.data_dir {
        Some(dir) => resolve_against(home, dir),
        None => data_dir_at(home),
    };
    let state_dir = match &file.state_dir {
        Some(dir) => resolve_against(&data_dir, dir),
        None => data_dir.join("state"),
    };

    let template_suffixes = file
        .template_suffixes
        .unwrap_or_else(|| vec![DEFAULT_TEMPLATE_SUFFIX.to_string()]);
    if template_suffixes.iter().all(|s| s.is_empty()) {
        return Err(ConfigError::NoTemplateSuffixes);
    }
    let template_suffixes = template_suffixes
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();

    let message_limit = file.message_limit.unwrap_or(DEFAULT_MESSAGE_LIMIT);
    if message_limit < MIN_MESSAGE_LIMIT {
        return Err(ConfigError::MessageLimitTooSmall {
            min: MIN_MESSAGE_LIMIT,
            got: message_limit,
        });
    }

    let http_timeout_secs = file.http_timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
    if http_timeout_secs == 0 {
        return Err(ConfigError::ZeroHttpTimeout);
    }

    let entries = file.repositories.unwrap_or_else(default_repositories);
    let mut seen = HashSet::new();
    let mut repositories = Vec::with_capacity(entries.len());
    for entry in entries {
        let name = RepoName::from(entry.name);
        if !name.is_valid() {
            return Err(ConfigError::InvalidRepositoryName(name.0));
        }
        if !seen.insert(name.clone()) {
            return Err(ConfigError::DuplicateRepository(name.0));
        }
        let path = entry.path.unwrap_or_else(|| PathBuf::from(&name.0));
        repositories.push(Repository {
            path: resolve_against(&data_dir, &path),
            name,
            url: entry.url,
            link_base: entry.link_base.filter(|base| !base.trim().is_empty()),
        });
    }

    Ok(Config {
        repositories,
        telegram,
        state_dir,
        template_suffixes,
        message_limit,
        http_timeout: Duration::from_secs(http_timeout_secs),
        announce_baseline: file.announce_baseline,
        templates_dir: file
            .templates_dir
            .as_deref()
            .map(|dir| resolve_against(&data_dir, dir)),
    })
}

fn resolve_credentials<F>(
    section: &TelegramSection,
    env: &F,
) -> Result<TelegramCredentials, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let pick = |env_key: &str, file_value: &Option<String>| {
        env(env_key)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| file_value.clone().filter(|v| !v.trim().is_empty()))
    };

    let bot_token = pick(ENV_BOT_TOKEN, &section.bot_token).ok_or(
        ConfigError::MissingCredential {
            name: "bot token",
            env: ENV_BOT_TOKEN,
            key: "bot_token",
        },
    )?;
    let chat_id = pick(ENV_CHAT_ID, &section.chat_id).ok_or(ConfigError::MissingCredential {
        name: "chat id",
        env: ENV_CHAT_ID,
        key: "chat_id",
    })?;

    Ok(TelegramCredentials {
        api_base: section
            .api_base
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        bot_token,
        chat_id,
    })
}

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
