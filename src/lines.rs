// src/lines.rs

use crate::git::HistorySource;
use crate::model::LineCounts;
use git2::Oid;
use tracing::{trace, warn};

/// Counts lines of a file's full text. Exact: `total == code + blank`.
pub fn count_lines(text: &str) -> LineCounts {
    let mut counts = LineCounts::default();
    for line in split_lines(text) {
        counts.total += 1;
        if line.trim().is_empty() {
            counts.blank += 1;
        }
    }
    counts.code = counts.total - counts.blank;
    counts
}

/// Splits on `\n`, `\r\n` and a lone `\r`; a final terminator adds no empty line.
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        match rest.find(['\n', '\r']) {
            Some(i) => {
                let line = &rest[..i];
                let terminator = if rest[i..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[i + terminator..];
                Some(line)
            }
            None => Some(std::mem::take(&mut rest)),
        }
    })
}

/// Reads `path` as of `commit` and counts its lines.
///
/// Never fails: a path missing at that commit yields [`LineCounts::ABSENT`],
/// and so does any other read problem, which is logged.
pub fn read_line_counts<S: HistorySource + ?Sized>(source: &S, commit: Oid, path: &str) -> LineCounts {
    match source.read_file_at(commit, path) {
        Ok(text) => count_lines(&text),
        Err(e) if e.is_absent() => {
            trace!("{} absent at {}", path, commit);
            LineCounts::ABSENT
        }
        Err(e) => {
            warn!("Could not count lines of {} at {}: {}", path, commit, e);
            LineCounts::ABSENT
        }
    }
}
