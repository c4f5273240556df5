// src/model.rs

use chrono::{DateTime, FixedOffset};
use git2::Oid;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::lanes::LaneAssignment;

/// Which part of the history a refresh walks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    AllBranches,
    CurrentBranch,
    NamedBranch(String),
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::AllBranches => write!(f, "all branches"),
            Selector::CurrentBranch => write!(f, "current branch"),
            Selector::NamedBranch(name) => write!(f, "branch {}", name),
        }
    }
}

/// One refresh: what to walk and how many commits at most
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineRequest {
    pub selector: Selector,
    pub limit: usize,
}

/// Line counts of a file or of the whole project
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LineCounts {
    pub total: usize,
    pub code: usize,
    pub blank: usize,
}

impl LineCounts {
    /// Canonical result for a file that does not exist on the read side
    pub const ABSENT: LineCounts = LineCounts { total: 0, code: 0, blank: 0 };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ChangeKind::Added => "Added",
            ChangeKind::Modified => "Modified",
            ChangeKind::Deleted => "Deleted",
        };
        f.write_str(label)
    }
}

/// A file touched by a commit, relative to its primary parent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileChange {
    pub path: String,
    pub kind: ChangeKind,
}

/// Exact before/after counts of one changed code file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineDelta {
    pub before: LineCounts,
    pub after: LineCounts,
    pub net_code_delta: i64,
}

impl LineDelta {
    pub fn new(before: LineCounts, after: LineCounts) -> Self {
        Self {
            before,
            after,
            net_code_delta: after.code as i64 - before.code as i64,
        }
    }
}

/// Estimated size of the whole tracked code base at a commit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProjectTloc {
    #[serde(flatten)]
    pub lines: LineCounts,
    pub file_count: usize,
}

/// Author and timing data of a commit, as read from the repository
#[derive(Debug, Clone)]
pub struct CommitMeta {
    pub message: String,
    pub author_name: String,
    pub author_email: String,
    pub committed_at: DateTime<FixedOffset>,
}

/// A local branch and the commit it points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchHead {
    pub name: String,
    pub tip: Oid,
}

/// Everything the timeline knows about one commit
#[derive(Debug, Clone, Serialize)]
pub struct CommitRecord {
    #[serde(skip)]
    pub id: Oid,
    pub sha: String,
    pub short_sha: String,
    pub message: String,
    pub author_name: String,
    pub author_email: String,
    pub committed_at: DateTime<FixedOffset>,
    pub parent_shas: Vec<String>,
    pub changed_files: Vec<FileChange>,
    /// Only files classified as code appear here
    pub line_deltas: BTreeMap<String, LineDelta>,
    pub project_tloc: ProjectTloc,
    /// Filled by the membership pass once the whole batch exists
    pub branch_membership: BTreeSet<String>,
}

impl CommitRecord {
    pub fn is_merge(&self) -> bool {
        self.parent_shas.len() > 1
    }

    /// First line of the message
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    pub fn count_changes(&self, kind: ChangeKind) -> usize {
        self.changed_files.iter().filter(|c| c.kind == kind).count()
    }
}

/// The complete result of one refresh
#[derive(Debug, Clone)]
pub struct TimelineBatch {
    pub generation: u64,
    pub request: TimelineRequest,
    /// Most recent commit first
    pub records: Vec<CommitRecord>,
    pub lanes: LaneAssignment,
}

impl TimelineBatch {
    pub fn latest(&self) -> Option<&CommitRecord> {
        self.records.first()
    }

    /// Finds a record by full sha or unambiguous prefix.
    pub fn find(&self, sha_prefix: &str) -> Option<&CommitRecord> {
        let prefix = sha_prefix.to_lowercase();
        if prefix.is_empty() {
            return None;
        }
        let mut matches = self.records.iter().filter(|r| r.sha.starts_with(&prefix));
        let first = matches.next()?;
        match matches.next() {
            Some(_) => None,
            None => Some(first),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn net_delta_is_code_difference() {
        let before = LineCounts { total: 10, code: 8, blank: 2 };
        let after = LineCounts { total: 4, code: 3, blank: 1 };
        assert_eq!(LineDelta::new(before, after).net_code_delta, -5);
        assert_eq!(LineDelta::new(LineCounts::ABSENT, after).net_code_delta, 3);
    }

    #[test]
    fn selector_display() {
        assert_eq!(Selector::AllBranches.to_string(), "all branches");
        assert_eq!(
            Selector::NamedBranch("dev".into()).to_string(),
            "branch dev"
        );
    }
}
