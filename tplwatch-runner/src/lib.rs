//! Runs the per-repository check for every configured repository, one
//! blocking task each, and collects a [`RunSummary`].

mod error;
mod report;
mod runtime;

pub use error::RunnerError;
pub use report::{RepoReport, RepoResult, RunSummary};
pub use runtime::{init_tracing, run_blocking, Runner};
