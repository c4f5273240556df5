// src/error.rs

use thiserror::Error;

/// Errors raised while building a commit timeline
#[derive(Error, Debug)]
pub enum TimelineError {
    #[error("repository error: {0}")]
    Repository(#[from] git2::Error),

    #[error("branch '{0}' does not exist")]
    BranchNotFound(String),

    /// Expected for the "before" side of added files and the "after" side of deleted ones
    #[error("'{path}' does not exist at this commit")]
    FileAbsent { path: String },

    #[error("'{path}' is not valid UTF-8")]
    Encoding { path: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not open repository for analysis: {0}")]
    SourceUnavailable(String),

    #[error("refresh {generation} was superseded by a newer request")]
    Superseded { generation: u64 },
}

impl TimelineError {
    /// True for the absent-file signal, which callers treat as an empty file.
    pub fn is_absent(&self) -> bool {
        matches!(self, TimelineError::FileAbsent { .. })
    }
}

pub type Result<T> = std::result::Result<T, TimelineError>;
