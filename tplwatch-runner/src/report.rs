//! What one pass over the configured repositories produced.

use chrono::{DateTime, Utc};
use serde::Serialize;

use tplwatch_sync::{Outcome, WatchError};

/// Result of one repository's check, flattened for printing and JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RepoResult {
    Baseline {
        templates: usize,
        announced: bool,
    },
    NewTemplates {
        items: Vec<String>,
        delivered: bool,
        messages: usize,
    },
    Unchanged {
        templates: usize,
    },
    DryRun {
        first_run: bool,
        items: Vec<String>,
    },
    Failed {
        /// Stage the check stopped in; `None` when the task panicked.
        stage: Option<String>,
        error: String,
    },
}

impl From<Outcome> for RepoResult {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Baseline {
                templates,
                announced,
            } => RepoResult::Baseline {
                templates,
                announced,
            },
            Outcome::NewTemplates { items, messages } => RepoResult::NewTemplates {
                items,
                delivered: messages.is_some(),
                messages: messages.unwrap_or(0),
            },
            Outcome::Unchanged { templates } => RepoResult::Unchanged { templates },
            Outcome::DryRun { first_run, items } => RepoResult::DryRun { first_run, items },
        }
    }
}

impl From<&WatchError> for RepoResult {
    fn from(err: &WatchError) -> Self {
        RepoResult::Failed {
            stage: Some(err.stage().to_string()),
            error: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RepoReport {
    pub name: String,
    #[serde(flatten)]
    pub result: RepoResult,
    pub duration_ms: u128,
    pub finished_at: DateTime<Utc>,
}

impl RepoReport {
    pub fn is_failure(&self) -> bool {
        matches!(self.result, RepoResult::Failed { .. })
    }
}

/// Reports in configuration order.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub repos: Vec<RepoReport>,
}

impl RunSummary {
    pub fn failures(&self) -> usize {
        self.repos.iter().filter(|r| r.is_failure()).count()
    }

    /// New templates found across all repositories, dry runs included.
    pub fn new_templates(&self) -> usize {
        self.repos
            .iter()
            .map(|r| match &r.result {
                RepoResult::NewTemplates { items, .. } => items.len(),
                RepoResult::DryRun {
                    first_run: false,
                    items,
                } => items.len(),
                _ => 0,
            })
            .sum()
    }
}
