//! Per-repository check: mirror → scan → diff → notify → persist.
//!
//! ```text
//! Preparing → Scanning → Diffing → { Reporting | Skipping } → Persisting → Done
//! ```
//!
//! Policy layered over the pure diff:
//! - first run (no readable baseline): record the scan as baseline, no notice
//! - new templates: notify, then record the scan as baseline
//! - nothing new: leave the baseline untouched, even if templates vanished
//!
//! Delivery failures are logged and never block persistence, so the same
//! templates are not announced again on the next run.

use tplwatch_core::{Repository, TemplateSet};
use tplwatch_notify::Notifier;

use crate::diff::diff;
use crate::error::{Stage, WatchError};
use crate::mirror::Mirror;
use crate::scanner;
use crate::state_store::{StateStatus, StateStore};

/// Per-run switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Announce new templates even when no baseline exists yet.
    pub force_notify: bool,
    /// Compute new templates without notifying or persisting.
    pub dry_run: bool,
    /// Send a "now tracking" message when a baseline is first recorded.
    pub announce_baseline: bool,
}

/// How a repository run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// First run: the scan became the baseline.
    Baseline { templates: usize, announced: bool },
    /// New templates were found and the baseline advanced.
    NewTemplates {
        items: Vec<String>,
        /// `None` when delivery failed.
        messages: Option<usize>,
    },
    /// Nothing new; the baseline was left as is.
    Unchanged { templates: usize },
    /// `--dry-run`: what a real run would have reported.
    DryRun { first_run: bool, items: Vec<String> },
}

/// Collaborators shared by every repository in a run.
pub struct Pipeline<'a> {
    pub mirror: &'a dyn Mirror,
    pub notifier: &'a dyn Notifier,
    pub store: &'a StateStore,
    pub suffixes: &'a [String],
    pub options: RunOptions,
}

impl Pipeline<'_> {
    /// Run the whole check for one repository.
    pub fn check(&self, repo: &Repository) -> Result<Outcome, WatchError> {
        tracing::debug!(stage = %Stage::Preparing);
        let action = self.mirror.ensure(repo)?;
        tracing::debug!("mirror {action:?}");

        tracing::debug!(stage = %Stage::Scanning);
        let current = scanner::scan(&repo.path, self.suffixes)?;

        tracing::debug!(stage = %Stage::Diffing);
        let known = self.store.load(&repo.name);
        if let StateStatus::Unreadable(reason) = &known.status {
            tracing::warn!("baseline unreadable, recording a fresh one: {reason}");
        }
        let first_run = known.is_first_run();
        let items = diff(&known.templates, &current);

        if self.options.dry_run {
            return Ok(Outcome::DryRun { first_run, items });
        }

        if !first_run && items.is_empty() {
            tracing::debug!(stage = %Stage::Skipping);
            tracing::info!("no new templates ({} tracked)", current.len());
            return Ok(Outcome::Unchanged {
                templates: current.len(),
            });
        }

        let notify = !items.is_empty() && (!first_run || self.options.force_notify);
        let messages = if notify {
            tracing::debug!(stage = %Stage::Reporting);
            tracing::info!("{} new template(s)", items.len());
            self.deliver(repo, &items)
        } else {
            tracing::debug!(stage = %Stage::Skipping);
            None
        };

        let announced = first_run
            && !notify
            && self.options.announce_baseline
            && self.announce(repo, current.len());

        tracing::debug!(stage = %Stage::Persisting);
        self.persist(repo, &current)?;
        tracing::debug!(stage = %Stage::Done);

        if notify {
            Ok(Outcome::NewTemplates { items, messages })
        } else {
            tracing::info!("baseline recorded ({} templates)", current.len());
            Ok(Outcome::Baseline {
                templates: current.len(),
                announced,
            })
        }
    }

    fn deliver(&self, repo: &Repository, items: &[String]) -> Option<usize> {
        match self.notifier.new_templates(repo, items) {
            Ok(sent) => Some(sent),
            Err(err) => {
                tracing::warn!("notification failed, baseline will still advance: {err}");
                None
            }
        }
    }

    fn announce(&self, repo: &Repository, count: usize) -> bool {
        match self.notifier.baseline_recorded(repo, count) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!("baseline announcement failed: {err}");
                false
            }
        }
    }

    fn persist(&self, repo: &Repository, current: &TemplateSet) -> Result<(), WatchError> {
        self.store.save(&repo.name, current)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;
    use std::sync::Mutex;

    use tempfile::TempDir;
    use tplwatch_core::RepoName;
    use tplwatch_notify::NotifyError;

    use super::*;
    use crate::mirror::MirrorAction;

    /// Treats `repo.path` as already checked out.
    struct LocalMirror;

    impl Mirror for LocalMirror {
        fn ensure(&self, _repo: &Repository) -> Result<MirrorAction, WatchError> {
            Ok(MirrorAction::Updated)
        }
    }

    #[derive(Default)]
    struct Recorder {
        notices: Mutex<Vec<Vec<String>>>,
        baselines: Mutex<Vec<usize>>,
    }

    impl Notifier for Recorder {
        fn new_templates(&self, _repo: &Repository, items: &[String]) -> Result<usize, NotifyError> {
            self.notices.lock().unwrap().push(items.to_vec());
            Ok(1)
        }

        fn baseline_recorded(&self, _repo: &Repository, count: usize) -> Result<(), NotifyError> {
            self.baselines.lock().unwrap().push(count);
            Ok(())
        }
    }

    fn checkout(root: &Path, files: &[&str]) -> Repository {
        let path = root.join("checkout");
        for f in files {
            let p = path.join(f);
            fs::create_dir_all(p.parent().unwrap()).unwrap();
            fs::write(p, "id: t\n").unwrap();
        }
        fs::create_dir_all(&path).unwrap();
        Repository {
            name: RepoName::from("demo"),
            url: "https://example.com/demo.git".into(),
            link_base: None,
            path,
        }
    }

    fn run(repo: &Repository, store: &StateStore, notifier: &Recorder, options: RunOptions) -> Outcome {
        let suffixes = vec![".yaml".to_string()];
        Pipeline {
            mirror: &LocalMirror,
            notifier,
            store,
            suffixes: &suffixes,
            options,
        }
        .check(repo)
        .expect("check")
    }

    fn set(items: &[&str]) -> TemplateSet {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn force_notify_announces_on_first_run() {
        let tmp = TempDir::new().unwrap();
        let repo = checkout(tmp.path(), &["a.yaml"]);
        let store = StateStore::new(tmp.path().join("state"));
        let rec = Recorder::default();

        let outcome = run(
            &repo,
            &store,
            &rec,
            RunOptions {
                force_notify: true,
                ..Default::default()
            },
        );
        assert_eq!(
            outcome,
            Outcome::NewTemplates {
                items: vec!["a.yaml".into()],
                messages: Some(1)
            }
        );
        assert_eq!(rec.notices.lock().unwrap().len(), 1);
        assert_eq!(store.load(&repo.name).templates, set(&["a.yaml"]));
    }

    #[test]
    fn announce_baseline_sends_acknowledgement_once() {
        let tmp = TempDir::new().unwrap();
        let repo = checkout(tmp.path(), &["a.yaml", "b.yaml"]);
        let store = StateStore::new(tmp.path().join("state"));
        let rec = Recorder::default();
        let options = RunOptions {
            announce_baseline: true,
            ..Default::default()
        };

        let first = run(&repo, &store, &rec, options);
        assert_eq!(
            first,
            Outcome::Baseline {
                templates: 2,
                announced: true
            }
        );
        let second = run(&repo, &store, &rec, options);
        assert_eq!(second, Outcome::Unchanged { templates: 2 });
        assert_eq!(*rec.baselines.lock().unwrap(), vec![2]);
        assert!(rec.notices.lock().unwrap().is_empty());
    }

    #[test]
    fn dry_run_touches_nothing() {
        let tmp = TempDir::new().unwrap();
        let repo = checkout(tmp.path(), &["a.yaml", "b.yaml"]);
        let store = StateStore::new(tmp.path().join("state"));
        store.save(&repo.name, &set(&["a.yaml"])).unwrap();
        let rec = Recorder::default();

        let outcome = run(
            &repo,
            &store,
            &rec,
            RunOptions {
                dry_run: true,
                ..Default::default()
            },
        );
        assert_eq!(
            outcome,
            Outcome::DryRun {
                first_run: false,
                items: vec!["b.yaml".into()]
            }
        );
        assert!(rec.notices.lock().unwrap().is_empty());
        assert_eq!(store.load(&repo.name).templates, set(&["a.yaml"]));
    }

    #[test]
    fn unreadable_baseline_is_rebaselined_without_notice() {
        let tmp = TempDir::new().unwrap();
        let repo = checkout(tmp.path(), &["a.yaml"]);
        let state_dir = tmp.path().join("state");
        fs::create_dir_all(&state_dir).unwrap();
        let store = StateStore::new(&state_dir);
        fs::write(store.path_for(&repo.name), [0xff, 0xfe]).unwrap();
        let rec = Recorder::default();

        let outcome = run(&repo, &store, &rec, RunOptions::default());
        assert!(matches!(outcome, Outcome::Baseline { templates: 1, .. }));
        assert!(rec.notices.lock().unwrap().is_empty());
        assert_eq!(store.load(&repo.name).templates, set(&["a.yaml"]));
    }

    #[test]
    fn scan_failure_aborts_before_persisting() {
        let tmp = TempDir::new().unwrap();
        let repo = Repository {
            name: RepoName::from("ghost"),
            url: "u".into(),
            link_base: None,
            path: tmp.path().join("never-cloned"),
        };
        let store = StateStore::new(tmp.path().join("state"));
        let rec = Recorder::default();
        let suffixes = vec![".yaml".to_string()];

        let err = Pipeline {
            mirror: &LocalMirror,
            notifier: &rec,
            store: &store,
            suffixes: &suffixes,
            options: RunOptions::default(),
        }
        .check(&repo)
        .unwrap_err();
        assert_eq!(err.stage(), Stage::Scanning);
        assert!(!store.path_for(&repo.name).exists());
    }
}
