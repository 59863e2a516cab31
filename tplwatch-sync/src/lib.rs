//! # tplwatch-sync
//!
//! Mirror, scan, diff and persist for a single tracked repository.
//!
//! Build a [`Pipeline`] from a [`Mirror`], a notifier and a [`StateStore`],
//! then call [`Pipeline::check`] once per repository.

pub mod diff;
pub mod error;
pub mod mirror;
pub mod pipeline;
pub mod scanner;
pub mod state_store;

pub use error::{Stage, WatchError};
pub use mirror::{GitMirror, Mirror, MirrorAction};
pub use pipeline::{Outcome, Pipeline, RunOptions};
pub use state_store::{LoadedState, StateStatus, StateStore};
