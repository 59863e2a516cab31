pub mod run;
pub mod status;

use std::path::Path;

use anyhow::{Context, Result};
use tplwatch_core::Config;

/// Resolve configuration from `--config`, the default file and the environment.
pub(crate) fn load_config(path: Option<&Path>) -> Result<Config> {
    tplwatch_core::config::load(path).context("failed to load configuration")
}
