//! tplwatch core library: domain types, configuration, errors.
//!
//! - [`types`]: newtypes and domain structs
//! - [`error`]: [`ConfigError`]
//! - [`config`]: load / resolve

pub mod config;
pub mod error;
pub mod types;

pub use error::ConfigError;
pub use types::{Config, RepoName, Repository, TelegramCredentials, TemplateSet};
