// src/git.rs

use crate::error::{Result, TimelineError};
use crate::model::{BranchHead, ChangeKind, CommitMeta, FileChange, Selector};
use chrono::{DateTime, FixedOffset, Offset, TimeZone, Utc};
use git2::{BranchType, Delta, DiffOptions, ErrorCode, ObjectType, Oid, Repository, Sort, TreeWalkMode, TreeWalkResult};
use std::path::Path;
use tracing::debug;

pub trait HistorySource {
    /// Commits reachable from the selection, most recent first, at most `max_count`.
    fn list_commits(&self, selector: &Selector, max_count: usize) -> Result<Vec<Oid>>;

    /// Parents in order; empty for a root commit.
    fn parents(&self, commit: Oid) -> Result<Vec<Oid>>;

    fn commit_meta(&self, commit: Oid) -> Result<CommitMeta>;

    /// Files changed between `parent` (or the empty tree) and `commit`.
    fn diff_trees(&self, commit: Oid, parent: Option<Oid>) -> Result<Vec<FileChange>>;

    /// Full text of `path` at `commit`. Fails with [`TimelineError::FileAbsent`] if it is not there.
    fn read_file_at(&self, commit: Oid, path: &str) -> Result<String>;

    /// Every blob path in the commit's tree, in tree order.
    fn list_tree_paths(&self, commit: Oid) -> Result<Vec<String>>;

    /// True if `ancestor` is reachable from `descendant`. A commit is its own ancestor.
    fn is_ancestor(&self, ancestor: Oid, descendant: Oid) -> Result<bool>;

    fn list_branch_heads(&self) -> Result<Vec<BranchHead>>;

    /// Checked-out branch, `None` when HEAD is detached or unborn.
    fn current_branch(&self) -> Option<String>;
}

/// Anything that can hand out a fresh [`HistorySource`].
///
/// Analysis workers each open their own source, so the source itself
/// does not have to be shareable between threads.
pub trait OpenSource: Sync {
    type Source: HistorySource;

    fn open(&self) -> Result<Self::Source>;
}

impl<F, S> OpenSource for F
where
    F: Fn() -> Result<S> + Sync,
    S: HistorySource,
{
    type Source = S;

    fn open(&self) -> Result<S> {
        self()
    }
}

pub struct GitSource {
    repo: Repository,
}

impl GitSource {
    /// Opens the repository containing `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let repo = Repository::discover(path)?;
        debug!("Opened git repository at {:?}", repo.path());
        Ok(Self { repo })
    }

    /// Work tree root, `None` for bare repositories.
    pub fn workdir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    fn push_selection(&self, revwalk: &mut git2::Revwalk, selector: &Selector) -> Result<()> {
        match selector {
            Selector::AllBranches => {
                revwalk.push_glob("*")?;
                // detached HEAD may not be on any ref; unborn HEAD has nothing to add
                if let Err(e) = revwalk.push_head() {
                    debug!("HEAD not walked: {}", e);
                }
            }
            Selector::CurrentBranch => revwalk.push_head()?,
            Selector::NamedBranch(name) => {
                let branch = match self.repo.find_branch(name, BranchType::Local) {
                    Ok(branch) => branch,
                    Err(e) if e.code() == ErrorCode::NotFound => self
                        .repo
                        .find_branch(name, BranchType::Remote)
                        .map_err(|_| TimelineError::BranchNotFound(name.clone()))?,
                    Err(e) => return Err(e.into()),
                };
                let tip = branch.get().peel_to_commit()?;
                revwalk.push(tip.id())?;
            }
        }
        Ok(())
    }
}

impl HistorySource for GitSource {
    fn list_commits(&self, selector: &Selector, max_count: usize) -> Result<Vec<Oid>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME)?;
        self.push_selection(&mut revwalk, selector)?;

        let mut commits = Vec::new();
        for oid in revwalk.take(max_count) {
            commits.push(oid?);
        }
        debug!("Walked {} commits for {}", commits.len(), selector);
        Ok(commits)
    }

    fn parents(&self, commit: Oid) -> Result<Vec<Oid>> {
        Ok(self.repo.find_commit(commit)?.parent_ids().collect())
    }

    fn commit_meta(&self, commit: Oid) -> Result<CommitMeta> {
        let commit = self.repo.find_commit(commit)?;
        let author = commit.author();
        Ok(CommitMeta {
            message: String::from_utf8_lossy(commit.message_bytes()).trim().to_string(),
            author_name: author.name().unwrap_or("Unknown").to_string(),
            author_email: author.email().unwrap_or("").to_string(),
            committed_at: git_time(&commit.time()),
        })
    }

    fn diff_trees(&self, commit: Oid, parent: Option<Oid>) -> Result<Vec<FileChange>> {
        let tree = self.repo.find_commit(commit)?.tree()?;
        let parent_tree = match parent {
            Some(id) => Some(self.repo.find_commit(id)?.tree()?),
            None => None,
        };

        // renames show up as a delete plus an add
        let mut diff_opts = DiffOptions::new();
        diff_opts.ignore_filemode(true);

        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut diff_opts))?;

        let mut changes = Vec::new();
        for delta in diff.deltas() {
            let (kind, file) = match delta.status() {
                Delta::Added => (ChangeKind::Added, delta.new_file()),
                Delta::Modified | Delta::Typechange => (ChangeKind::Modified, delta.new_file()),
                Delta::Deleted => (ChangeKind::Deleted, delta.old_file()),
                other => {
                    debug!("Ignoring {:?} delta", other);
                    continue;
                }
            };
            if let Some(path) = file.path() {
                changes.push(FileChange { path: path.to_string_lossy().into_owned(), kind });
            }
        }
        Ok(changes)
    }

    fn read_file_at(&self, commit: Oid, path: &str) -> Result<String> {
        let absent = || TimelineError::FileAbsent { path: path.to_string() };

        let tree = self.repo.find_commit(commit)?.tree()?;
        let entry = match tree.get_path(Path::new(path)) {
            Ok(entry) => entry,
            Err(e) if e.code() == ErrorCode::NotFound => return Err(absent()),
            Err(e) => return Err(e.into()),
        };
        if entry.kind() != Some(ObjectType::Blob) {
            return Err(absent());
        }
        let blob = self.repo.find_blob(entry.id())?;
        match std::str::from_utf8(blob.content()) {
            Ok(text) => Ok(text.to_string()),
            Err(_) => Err(TimelineError::Encoding { path: path.to_string() }),
        }
    }

    fn list_tree_paths(&self, commit: Oid) -> Result<Vec<String>> {
        let tree = self.repo.find_commit(commit)?.tree()?;

        let mut files = Vec::new();
        tree.walk(TreeWalkMode::PreOrder, |dir, entry| {
            if entry.kind() == Some(ObjectType::Blob) {
                let name = String::from_utf8_lossy(entry.name_bytes());
                files.push(format!("{}{}", dir, name));
            }
            TreeWalkResult::Ok
        })?;
        Ok(files)
    }

    fn is_ancestor(&self, ancestor: Oid, descendant: Oid) -> Result<bool> {
        if ancestor == descendant {
            return Ok(true);
        }
        Ok(self.repo.graph_descendant_of(descendant, ancestor)?)
    }

    fn list_branch_heads(&self) -> Result<Vec<BranchHead>> {
        let mut heads = Vec::new();
        for branch in self.repo.branches(Some(BranchType::Local))? {
            let (branch, _) = branch?;
            let Some(name) = branch.name()? else {
                continue;
            };
            let name = name.to_string();
            let tip = branch.get().peel_to_commit()?.id();
            heads.push(BranchHead { name, tip });
        }
        heads.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(heads)
    }

    fn current_branch(&self) -> Option<String> {
        let head = self.repo.head().ok()?;
        if !head.is_branch() {
            return None;
        }
        head.shorthand().map(String::from)
    }
}

/// Commit time in the committer's own offset.
fn git_time(time: &git2::Time) -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(time.offset_minutes() * 60).unwrap_or_else(|| Utc.fix());
    offset
        .timestamp_opt(time.seconds(), 0)
        .single()
        .unwrap_or_else(|| DateTime::<Utc>::default().with_timezone(&offset))
}
