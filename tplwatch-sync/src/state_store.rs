//! State store: the last recorded template baseline per repository.
//!
//! Persists one plain-text file per repository at
//! `<state_dir>/known_templates_<name>.txt`, one relative path per line, no
//! header. Writes use the atomic `.tmp` + rename pattern so a crash mid-write
//! leaves the previous baseline intact.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tplwatch_core::{RepoName, TemplateSet};

use crate::error::{io_err, WatchError};

/// What `load` found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateStatus {
    /// No baseline yet: first run.
    Missing,
    Loaded,
    /// A file exists but could not be read; treated as a first run.
    Unreadable(String),
}

/// A baseline as read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedState {
    pub templates: TemplateSet,
    pub status: StateStatus,
}

impl LoadedState {
    /// True unless a readable baseline was found.
    pub fn is_first_run(&self) -> bool {
        self.status != StateStatus::Loaded
    }
}

/// Baselines for every repository, rooted at one directory.
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<state_dir>/known_templates_<name>.txt`: pure, no I/O.
    pub fn path_for(&self, name: &RepoName) -> PathBuf {
        self.dir.join(format!("known_templates_{name}.txt"))
    }

    /// Load the baseline for `name`.
    ///
    /// Never fails: a missing file is a first run, and any other read failure
    /// is reported through [`StateStatus::Unreadable`] for the caller to log.
    pub fn load(&self, name: &RepoName) -> LoadedState {
        let path = self.path_for(name);
        match std::fs::read_to_string(&path) {
            Ok(contents) => LoadedState {
                templates: parse(&contents),
                status: StateStatus::Loaded,
            },
            Err(err) if err.kind() == ErrorKind::NotFound => LoadedState {
                templates: TemplateSet::new(),
                status: StateStatus::Missing,
            },
            Err(err) => LoadedState {
                templates: TemplateSet::new(),
                status: StateStatus::Unreadable(format!("{}: {err}", path.display())),
            },
        }
    }

    /// Replace the baseline for `name` atomically.
    ///
    /// Writes to `<path>.tmp` then renames to `<path>`.
    pub fn save(&self, name: &RepoName, templates: &TemplateSet) -> Result<(), WatchError> {
        let path = self.path_for(name);
        std::fs::create_dir_all(&self.dir).map_err(|e| io_err(&self.dir, e))?;

        let tmp = path.with_extension("txt.tmp");
        if let Err(e) = std::fs::write(&tmp, serialize(templates)) {
            let _ = std::fs::remove_file(&tmp);
            return Err(io_err(&tmp, e));
        }
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(io_err(&path, e));
        }
        tracing::debug!("saved {} template(s) to {}", templates.len(), path.display());
        Ok(())
    }
}

fn parse(contents: &str) -> TemplateSet {
    contents
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

fn serialize(templates: &TemplateSet) -> String {
    let mut out = String::new();
    for path in templates {
        out.push_str(path);
        out.push('\n');
    }
    out
}
