// src/analyzer.rs

use crate::classify::is_code_file;
use crate::config::TlocSettings;
use crate::error::{Result, TimelineError};
use crate::git::{HistorySource, OpenSource};
use crate::lanes::{assign_membership, LaneAssignment};
use crate::lines::read_line_counts;
use crate::model::*;
use crate::refresh::CancelToken;
use git2::Oid;
use indicatif::{ParallelProgressIterator, ProgressBar};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// Walks the selection and analyses every commit in it.
///
/// Commits are analysed in parallel, each worker with its own source from
/// `opener`; the batch keeps the walk order. Branch membership and lanes are
/// computed once all records exist.
pub fn build_batch<O: OpenSource>(
    opener: &O,
    request: &TimelineRequest,
    settings: &TlocSettings,
    cancel: &CancelToken,
    progress: &ProgressBar,
) -> Result<TimelineBatch> {
    let source = opener.open()?;

    // 1. Establish the commit list; failure here fails the whole batch
    let commits = source.list_commits(&request.selector, request.limit)?;
    debug!("Analyzing {} commits for {}", commits.len(), request.selector);

    progress.set_length(commits.len() as u64);
    progress.set_message("Analyzing commits");

    // 2. Per-commit changes, line deltas and project estimate
    let mut records: Vec<CommitRecord> = commits
        .par_iter()
        .progress_with(progress.clone())
        .map_init(
            || opener.open(),
            |worker, &id| {
                cancel.check()?;
                let source = worker
                    .as_ref()
                    .map_err(|e| TimelineError::SourceUnavailable(e.to_string()))?;
                analyze_commit(source, id, settings)
            },
        )
        .collect::<Result<_>>()?;
    progress.finish_with_message("Analysis complete");
    cancel.check()?;

    // 3. Membership needs every record and every branch tip
    let heads = source.list_branch_heads().unwrap_or_else(|e| {
        warn!("Could not list branches: {}", e);
        Vec::new()
    });
    assign_membership(&source, &heads, &mut records);
    let lanes = LaneAssignment::from_records(&records);

    info!(
        "Timeline generation {} ready: {} commits, {} branches",
        cancel.generation(),
        records.len(),
        lanes.len()
    );

    Ok(TimelineBatch {
        generation: cancel.generation(),
        request: request.clone(),
        records,
        lanes,
    })
}

/// Builds the record of one commit. Only unreadable commit metadata is an
/// error; diff and estimate failures degrade to empty values.
pub fn analyze_commit<S: HistorySource + ?Sized>(
    source: &S,
    id: Oid,
    settings: &TlocSettings,
) -> Result<CommitRecord> {
    let meta = source.commit_meta(id)?;
    let parents = source.parents(id)?;
    let primary_parent = parents.first().copied();
    let sha = id.to_string();

    let changed_files = source.diff_trees(id, primary_parent).unwrap_or_else(|e| {
        warn!("Could not diff commit {}: {}", &sha[..8], e);
        Vec::new()
    });
    let line_deltas = line_deltas(source, id, primary_parent, &changed_files);

    let project_tloc = project_tloc(source, id, settings).unwrap_or_else(|e| {
        warn!("Could not estimate TLOC at {}: {}", &sha[..8], e);
        ProjectTloc::default()
    });

    Ok(CommitRecord {
        id,
        short_sha: sha[..8].to_string(),
        sha,
        message: meta.message,
        author_name: meta.author_name,
        author_email: meta.author_email,
        committed_at: meta.committed_at,
        parent_shas: parents.iter().map(Oid::to_string).collect(),
        changed_files,
        line_deltas,
        project_tloc,
        branch_membership: BTreeSet::new(),
    })
}

/// Exact before/after counts for every changed code file.
///
/// Added files have nothing before and deleted files nothing after, so those
/// sides are not read at all.
pub fn line_deltas<S: HistorySource + ?Sized>(
    source: &S,
    commit: Oid,
    primary_parent: Option<Oid>,
    changes: &[FileChange],
) -> BTreeMap<String, LineDelta> {
    changes
        .iter()
        .filter(|change| is_code_file(&change.path))
        .map(|change| {
            let after = match change.kind {
                ChangeKind::Deleted => LineCounts::ABSENT,
                _ => read_line_counts(source, commit, &change.path),
            };
            let before = match (change.kind, primary_parent) {
                (ChangeKind::Added, _) | (_, None) => LineCounts::ABSENT,
                (_, Some(parent)) => read_line_counts(source, parent, &change.path),
            };
            (change.path.clone(), LineDelta::new(before, after))
        })
        .collect()
}

/// Estimates the size of the whole code base at `commit`.
///
/// Only the first `sample_size` code files in tree order are read; their
/// average is extrapolated to all code files, and total lines are derived
/// from code lines with `total_lines_factor`.
pub fn project_tloc<S: HistorySource + ?Sized>(
    source: &S,
    commit: Oid,
    settings: &TlocSettings,
) -> Result<ProjectTloc> {
    let code_files: Vec<String> = source
        .list_tree_paths(commit)?
        .into_iter()
        .filter(|path| is_code_file(path))
        .collect();

    let file_count = code_files.len();
    let mut tloc = ProjectTloc { lines: LineCounts::ABSENT, file_count };

    let sample_size = settings.sample_size.min(file_count);
    if sample_size == 0 {
        return Ok(tloc);
    }

    let sampled_code: usize = code_files[..sample_size]
        .iter()
        .map(|path| read_line_counts(source, commit, path).code)
        .sum();
    if sampled_code == 0 {
        return Ok(tloc);
    }

    let avg_lines_per_file = sampled_code as f64 / sample_size as f64;
    let code = (avg_lines_per_file * file_count as f64).round() as usize;
    let total = (code as f64 * settings.total_lines_factor).round() as usize;
    tloc.lines = LineCounts { total, code, blank: total.saturating_sub(code) };
    Ok(tloc)
}
