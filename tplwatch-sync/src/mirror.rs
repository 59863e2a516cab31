//! Local checkouts of tracked repositories, maintained by the `git` CLI.

use std::path::{Path, PathBuf};
use std::process::Command;

use tplwatch_core::Repository;

use crate::error::WatchError;

/// What [`Mirror::ensure`] had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorAction {
    Cloned,
    Updated,
}

/// Keeps `repo.path` present and current with `repo.url`.
pub trait Mirror: Send + Sync {
    fn ensure(&self, repo: &Repository) -> Result<MirrorAction, WatchError>;
}

/// Shallow clone on first sight, `git pull` afterwards.
#[derive(Debug, Clone)]
pub struct GitMirror {
    program: PathBuf,
    clone_depth: Option<u32>,
}

impl Default for GitMirror {
    fn default() -> Self {
        Self {
            program: PathBuf::from("git"),
            clone_depth: Some(1),
        }
    }
}

impl GitMirror {
    /// Use a specific `git` executable.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// `None` clones full history.
    pub fn with_clone_depth(mut self, depth: Option<u32>) -> Self {
        self.clone_depth = depth;
        self
    }

    fn clone_repo(&self, repo: &Repository) -> Result<(), WatchError> {
        if let Some(parent) = repo.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| WatchError::MirrorIo {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let mut args: Vec<String> = vec!["clone".into(), "--quiet".into()];
        if let Some(depth) = self.clone_depth {
            args.push("--depth".into());
            args.push(depth.to_string());
        }
        args.push(repo.url.clone());
        args.push(repo.path.to_string_lossy().into_owned());
        self.run(None, &args)
    }

    fn pull(&self, repo: &Repository) -> Result<(), WatchError> {
        let args = ["pull".to_string(), "--quiet".to_string()];
        self.run(Some(&repo.path), &args)
    }

    fn run(&self, dir: Option<&Path>, args: &[String]) -> Result<(), WatchError> {
        let mut cmd = Command::new(&self.program);
        if let Some(dir) = dir {
            cmd.arg("-C").arg(dir);
        }
        let output = cmd
            .args(args)
            // Inherited GIT_DIR/GIT_WORK_TREE would redirect git away from the checkout.
            .env_remove("GIT_DIR")
            .env_remove("GIT_WORK_TREE")
            // Fail instead of blocking on a credential prompt.
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .map_err(|source| WatchError::GitSpawn {
                program: self.program.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(WatchError::Git {
                command: format!("git {}", args.join(" ")),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

impl Mirror for GitMirror {
    fn ensure(&self, repo: &Repository) -> Result<MirrorAction, WatchError> {
        if repo.path.exists() {
            tracing::debug!("pulling {} in {}", repo.url, repo.path.display());
            self.pull(repo)?;
            Ok(MirrorAction::Updated)
        } else {
            tracing::info!("cloning {} into {}", repo.url, repo.path.display());
            self.clone_repo(repo)?;
            Ok(MirrorAction::Cloned)
        }
    }
}
