use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::task::{JoinError, JoinHandle};

use tplwatch_core::{Config, Repository};
use tplwatch_notify::{Notifier, TelegramNotifier};
use tplwatch_sync::{GitMirror, Mirror, Pipeline, RunOptions, StateStore};

use crate::error::{io_err, RunnerError};
use crate::report::{RepoReport, RepoResult, RunSummary};

/// Checks every configured repository once, each on its own blocking task.
pub struct Runner {
    config: Arc<Config>,
    mirror: Arc<dyn Mirror>,
    notifier: Arc<dyn Notifier>,
    store: Arc<StateStore>,
}

impl Runner {
    /// `git` mirror, Telegram delivery, state under `config.state_dir`.
    pub fn from_config(config: Config) -> Result<Self, RunnerError> {
        let notifier = TelegramNotifier::from_config(&config)?;
        Ok(Self::with_collaborators(
            config,
            Arc::new(GitMirror::default()),
            Arc::new(notifier),
        ))
    }

    pub fn with_collaborators(
        config: Config,
        mirror: Arc<dyn Mirror>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let store = Arc::new(StateStore::new(config.state_dir.clone()));
        Self {
            config: Arc::new(config),
            mirror,
            notifier,
            store,
        }
    }

    /// Fan out one task per repository and wait for all of them.
    ///
    /// Never fails as a whole: a failing or panicking repository becomes a
    /// [`RepoResult::Failed`] entry and the others carry on.
    pub async fn run(&self, options: RunOptions) -> RunSummary {
        let started_at = Utc::now();
        let options = RunOptions {
            announce_baseline: options.announce_baseline || self.config.announce_baseline,
            ..options
        };

        let handles: Vec<(String, JoinHandle<RepoReport>)> = self
            .config
            .repositories
            .iter()
            .map(|repo| (repo.name.to_string(), self.spawn_check(repo.clone(), options)))
            .collect();

        let mut repos = Vec::with_capacity(handles.len());
        for (name, handle) in handles {
            repos.push(handle_join(name, handle.await));
        }

        let summary = RunSummary { started_at, repos };
        tracing::info!(
            repositories = summary.repos.len(),
            failed = summary.failures(),
            "run finished"
        );
        summary
    }

    fn spawn_check(&self, repo: Repository, options: RunOptions) -> JoinHandle<RepoReport> {
        let config = Arc::clone(&self.config);
        let mirror = Arc::clone(&self.mirror);
        let notifier = Arc::clone(&self.notifier);
        let store = Arc::clone(&self.store);

        tokio::task::spawn_blocking(move || {
            let span = tracing::info_span!("repo", name = %repo.name);
            let _entered = span.enter();
            let started = Instant::now();

            let pipeline = Pipeline {
                mirror: mirror.as_ref(),
                notifier: notifier.as_ref(),
                store: store.as_ref(),
                suffixes: &config.template_suffixes,
                options,
            };
            let result = match pipeline.check(&repo) {
                Ok(outcome) => RepoResult::from(outcome),
                Err(err) => {
                    tracing::error!(stage = %err.stage(), "{err}");
                    RepoResult::from(&err)
                }
            };

            RepoReport {
                name: repo.name.to_string(),
                result,
                duration_ms: started.elapsed().as_millis(),
                finished_at: Utc::now(),
            }
        })
    }
}

/// Build a multi-thread runtime, run one pass, and return its summary.
pub fn run_blocking(config: Config, options: RunOptions) -> Result<RunSummary, RunnerError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    let runner = Runner::from_config(config)?;
    Ok(runtime.block_on(runner.run(options)))
}

/// Install the process-wide `fmt` subscriber; later calls are no-ops.
///
/// `RUST_LOG` overrides the default `info` filter. `json` switches to one
/// JSON object per line for log shippers.
pub fn init_tracing(json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

fn handle_join(name: String, result: Result<RepoReport, JoinError>) -> RepoReport {
    match result {
        Ok(report) => report,
        Err(err) => {
            tracing::error!(repo = %name, "check task join failure: {err}");
            RepoReport {
                name,
                result: RepoResult::Failed {
                    stage: None,
                    error: format!("check task join failure: {err}"),
                },
                duration_ms: 0,
                finished_at: Utc::now(),
            }
        }
    }
}
