// src/lib.rs

//! Commit timeline of a git repository with per-file line deltas and a
//! sampled estimate of the project's total lines of code at every commit.

pub mod analyzer;
pub mod classify;
pub mod config;
pub mod error;
pub mod git;
pub mod lanes;
pub mod lines;
pub mod model;
pub mod refresh;
pub mod report;

#[cfg(test)]
mod testutil;

pub use analyzer::build_batch;
pub use config::{TimelineConfig, TlocSettings};
pub use error::{Result, TimelineError};
pub use git::{GitSource, HistorySource, OpenSource};
pub use model::{CommitRecord, Selector, TimelineBatch, TimelineRequest};
pub use refresh::{Applied, TimelineView, TimelineWorker};
