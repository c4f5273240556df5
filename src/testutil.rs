// src/testutil.rs

//! Throwaway repositories for unit tests.

use anyhow::Result;
use git2::build::CheckoutBuilder;
use git2::{Commit, Index, Oid, Repository, RepositoryInitOptions, Signature, Time};
use std::cell::Cell;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub struct TestRepo {
    dir: TempDir,
    pub repo: Repository,
    clock: Cell<i64>,
}

impl TestRepo {
    /// Empty repository whose unborn HEAD points at `main`
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = Repository::init_opts(dir.path(), &opts)?;
        Ok(Self { dir, repo, clock: Cell::new(1_700_000_000) })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes (`Some`) or deletes (`None`) files and commits on the current branch.
    /// Each commit is one minute newer than the previous one.
    pub fn commit(&self, files: &[(&str, Option<&str>)], message: &str) -> Result<Oid> {
        let mut index = self.repo.index()?;
        for (path, content) in files {
            let full = self.dir.path().join(path);
            match content {
                Some(text) => {
                    if let Some(parent) = full.parent() {
                        fs::create_dir_all(parent)?;
                    }
                    fs::write(&full, text)?;
                    index.add_path(Path::new(path))?;
                }
                None => {
                    fs::remove_file(&full)?;
                    index.remove_path(Path::new(path))?;
                }
            }
        }
        self.commit_index(&mut index, message, None)
    }

    pub fn commit_bytes(&self, path: &str, content: &[u8], message: &str) -> Result<Oid> {
        fs::write(self.dir.path().join(path), content)?;
        let mut index = self.repo.index()?;
        index.add_path(Path::new(path))?;
        self.commit_index(&mut index, message, None)
    }

    /// Merge commit that keeps the current tree and adds `branch` as second parent.
    pub fn merge(&self, branch: &str, message: &str) -> Result<Oid> {
        let other = self
            .repo
            .find_branch(branch, git2::BranchType::Local)?
            .get()
            .peel_to_commit()?;
        let mut index = self.repo.index()?;
        self.commit_index(&mut index, message, Some(other))
    }

    pub fn branch(&self, name: &str) -> Result<()> {
        let head = self.repo.head()?.peel_to_commit()?;
        self.repo.branch(name, &head, false)?;
        Ok(())
    }

    pub fn checkout(&self, name: &str) -> Result<()> {
        self.repo.set_head(&format!("refs/heads/{}", name))?;
        self.repo.checkout_head(Some(CheckoutBuilder::new().force()))?;
        Ok(())
    }

    fn commit_index(&self, index: &mut Index, message: &str, extra_parent: Option<Commit>) -> Result<Oid> {
        index.write()?;
        let tree = self.repo.find_tree(index.write_tree()?)?;

        let time = self.clock.get() + 60;
        self.clock.set(time);
        let sig = Signature::new("Test User", "test@example.com", &Time::new(time, 0))?;

        let head = match self.repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(_) => None,
        };
        let parents: Vec<&Commit> = head.iter().chain(extra_parent.iter()).collect();
        Ok(self.repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)?)
    }
}
