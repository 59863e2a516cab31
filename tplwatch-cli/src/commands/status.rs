//! `tplwatch status`: recorded baselines and mirror checkouts.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use tplwatch_core::Config;
use tplwatch_sync::{StateStatus, StateStore};

use super::load_config;

/// Arguments for `tplwatch status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Configuration file (default: ~/.tplwatch/config.yaml).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let config = load_config(self.config.as_deref())?;
        let rows = build_report(&config);
        if self.json {
            let payload = StatusReportJson {
                state_dir: config.state_dir.display().to_string(),
                repositories: rows,
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
            );
            return Ok(());
        }

        print_table(&config, rows);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum BaselineState {
    Missing,
    Recorded,
    Unreadable,
}

#[derive(Debug, Clone, Serialize)]
struct RepoStatus {
    name: String,
    url: String,
    checkout: String,
    mirror_present: bool,
    state_file: String,
    baseline: BaselineState,
    /// Templates in the recorded baseline; absent unless `recorded`.
    #[serde(skip_serializing_if = "Option::is_none")]
    templates: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

#[derive(Serialize)]
struct StatusReportJson {
    state_dir: String,
    repositories: Vec<RepoStatus>,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "repository")]
    name: String,
    #[tabled(rename = "baseline")]
    baseline: String,
    #[tabled(rename = "templates")]
    templates: String,
    #[tabled(rename = "mirror")]
    mirror: String,
}

fn build_report(config: &Config) -> Vec<RepoStatus> {
    let store = StateStore::new(config.state_dir.clone());
    config
        .repositories
        .iter()
        .map(|repo| {
            let loaded = store.load(&repo.name);
            let (baseline, templates, detail) = match loaded.status {
                StateStatus::Missing => (BaselineState::Missing, None, None),
                StateStatus::Loaded => (
                    BaselineState::Recorded,
                    Some(loaded.templates.len()),
                    None,
                ),
                StateStatus::Unreadable(reason) => {
                    (BaselineState::Unreadable, None, Some(reason))
                }
            };
            RepoStatus {
                name: repo.name.to_string(),
                url: repo.url.clone(),
                checkout: repo.path.display().to_string(),
                mirror_present: repo.path.join(".git").exists(),
                state_file: store.path_for(&repo.name).display().to_string(),
                baseline,
                templates,
                detail,
            }
        })
        .collect()
}

fn print_table(config: &Config, rows: Vec<RepoStatus>) {
    println!(
        "tplwatch v{} | {} repositories | state in {}",
        env!("CARGO_PKG_VERSION"),
        rows.len(),
        config.state_dir.display()
    );
    if rows.is_empty() {
        println!("No repositories configured.");
        return;
    }

    let details: Vec<(String, String)> = rows
        .iter()
        .filter_map(|r| r.detail.clone().map(|d| (r.name.clone(), d)))
        .collect();
    let needs_run = rows.iter().any(|r| r.baseline != BaselineState::Recorded);

    let table_rows: Vec<StatusTableRow> = rows
        .into_iter()
        .map(|row| StatusTableRow {
            baseline: baseline_label(&row.baseline),
            templates: row
                .templates
                .map_or_else(|| "-".to_string(), |n| n.to_string()),
            mirror: if row.mirror_present {
                "present".green().to_string()
            } else {
                "missing".bright_black().to_string()
            },
            name: row.name,
        })
        .collect();
    let mut table = Table::new(table_rows);
    table.with(Style::rounded());
    println!("{table}");

    for (name, detail) in details {
        println!("{} '{name}': {detail}", "!".yellow().bold());
    }
    if needs_run {
        println!("Run 'tplwatch run' to record missing baselines.");
    }
}

fn baseline_label(state: &BaselineState) -> String {
    match state {
        BaselineState::Missing => "NONE".bright_black().bold().to_string(),
        BaselineState::Recorded => "RECORDED".green().bold().to_string(),
        BaselineState::Unreadable => "UNREADABLE".red().bold().to_string(),
    }
}
