// tests/common/mod.rs

use anyhow::Result;
use git2::build::CheckoutBuilder;
use git2::{Oid, Repository, RepositoryInitOptions, Signature, Time};
use std::cell::Cell;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Scratch repository whose commits are one minute apart
pub struct TestRepo {
    dir: TempDir,
    repo: Repository,
    clock: Cell<i64>,
}

impl TestRepo {
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

    pub fn commit(&self, files: &[(&str, &str)], message: &str) -> Result<Oid> {
        let mut index = self.repo.index()?;
        for (path, content) in files {
            let full = self.dir.path().join(path);
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&full, content)?;
            index.add_path(Path::new(path))?;
        }
        index.write()?;
        let tree = self.repo.find_tree(index.write_tree()?)?;

        let time = self.clock.get() + 60;
        self.clock.set(time);
        let sig = Signature::new("Test User", "test@example.com", &Time::new(time, 0))?;
        let head = self.repo.head().ok().map(|h| h.peel_to_commit()).transpose()?;
        let parents: Vec<_> = head.iter().collect();
        Ok(self.repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)?)
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
}

/// `code` non-blank lines followed by `blank` empty ones
pub fn source_lines(code: usize, blank: usize) -> String {
    let mut text: String = (0..code).map(|i| format!("x{} = {}\n", i, i)).collect();
    text.push_str(&"\n".repeat(blank));
    text
}
