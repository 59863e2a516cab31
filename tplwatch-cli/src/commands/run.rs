//! `tplwatch run`: one pass over every configured repository.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use tplwatch_runner::{RepoReport, RepoResult, RunSummary};
use tplwatch_sync::RunOptions;

use super::load_config;

/// Arguments for `tplwatch run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Configuration file (default: ~/.tplwatch/config.yaml).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Send the new-templates message even when no baseline exists yet.
    #[arg(long)]
    pub force_notify: bool,

    /// Report what is new without notifying or recording a baseline.
    #[arg(long, conflicts_with = "force_notify")]
    pub dry_run: bool,

    /// Emit the run summary as JSON.
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    pub fn run(self) -> Result<()> {
        let config = load_config(self.config.as_deref())?;
        let options = RunOptions {
            force_notify: self.force_notify,
            dry_run: self.dry_run,
            announce_baseline: config.announce_baseline,
        };

        let summary = tplwatch_runner::run_blocking(config, options).context("run failed")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&summary).context("failed to serialize run summary")?
            );
        } else {
            print_summary(&summary);
        }
        // Failed repositories are retried by the next trigger; exit 0.
        Ok(())
    }
}

fn print_summary(summary: &RunSummary) {
    if summary.repos.is_empty() {
        println!("No repositories configured.");
        return;
    }
    for report in &summary.repos {
        print_report(report);
    }
    println!(
        "{} repositories | {} new templates | {} failed",
        summary.repos.len(),
        summary.new_templates(),
        summary.failures()
    );
}

fn print_report(report: &RepoReport) {
    let name = &report.name;
    match &report.result {
        RepoResult::Baseline {
            templates,
            announced,
        } => {
            let note = if *announced { ", announced" } else { "" };
            println!(
                "{} '{name}' baseline recorded ({templates} templates{note})",
                "✓".green()
            );
        }
        RepoResult::NewTemplates {
            items,
            delivered: true,
            messages,
        } => {
            println!(
                "{} '{name}' {} new, notified in {messages} message(s)",
                "✓".green(),
                items.len()
            );
            print_items(items);
        }
        RepoResult::NewTemplates {
            items,
            delivered: false,
            ..
        } => {
            println!(
                "{} '{name}' {} new, delivery failed (baseline advanced)",
                "!".yellow().bold(),
                items.len()
            );
            print_items(items);
        }
        RepoResult::Unchanged { templates } => {
            println!(
                "{} '{name}' no new templates ({templates} tracked)",
                "·".bright_black()
            );
        }
        RepoResult::DryRun { first_run: true, items } => {
            println!(
                "[dry-run] '{name}' no baseline yet, would record {} templates",
                items.len()
            );
        }
        RepoResult::DryRun {
            first_run: false,
            items,
        } => {
            println!("[dry-run] '{name}' {} new", items.len());
            print_items(items);
        }
        RepoResult::Failed { stage, error } => {
            let stage = stage.as_deref().unwrap_or("task");
            println!("{} '{name}' failed while {stage}: {error}", "✗".red().bold());
        }
    }
}

fn print_items(items: &[String]) {
    for item in items {
        println!("  +  {item}");
    }
}
