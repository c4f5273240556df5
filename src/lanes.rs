// src/lanes.rs

use crate::git::HistorySource;
use crate::model::{BranchHead, CommitRecord};
use git2::Oid;
use palette::Srgb;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::warn;

/// Lanes drawn side by side; branches past this still get a color
pub const MAX_VISIBLE_LANES: usize = 8;

/// Red, green, blue, yellow, magenta, cyan, orange, purple
pub fn lane_palette() -> [Srgb<u8>; 8] {
    [
        Srgb::<u8>::new(255, 100, 100),
        Srgb::<u8>::new(100, 255, 100),
        Srgb::<u8>::new(100, 100, 255),
        Srgb::<u8>::new(255, 255, 100),
        Srgb::<u8>::new(255, 100, 255),
        Srgb::<u8>::new(100, 255, 255),
        Srgb::<u8>::new(255, 150, 100),
        Srgb::<u8>::new(150, 100, 255),
    ]
}

pub fn hex(color: Srgb<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", color.red, color.green, color.blue)
}

/// Marks every record with the branches whose tip reaches it.
///
/// Answers are memoised per (tip, commit) within this call only, so branches
/// sharing a tip are checked once.
pub fn assign_membership<S: HistorySource + ?Sized>(
    source: &S,
    heads: &[BranchHead],
    records: &mut [CommitRecord],
) {
    let mut reachable: HashMap<(Oid, Oid), bool> = HashMap::new();

    for record in records.iter_mut() {
        let commit = record.id;
        record.branch_membership = heads
            .iter()
            .filter(|head| {
                *reachable.entry((head.tip, commit)).or_insert_with(|| {
                    source.is_ancestor(commit, head.tip).unwrap_or_else(|e| {
                        warn!("Ancestry check {} against {} failed: {}", commit, head.name, e);
                        false
                    })
                })
            })
            .map(|head| head.name.clone())
            .collect();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lane {
    pub name: String,
    pub index: usize,
    pub color: Srgb<u8>,
}

/// Branch name to lane and color, derived only from the current set of names
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaneAssignment {
    lanes: Vec<Lane>,
}

impl LaneAssignment {
    /// Sorts and dedups `names`, then cycles through the palette.
    pub fn assign<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let palette = lane_palette();
        let sorted: BTreeSet<&str> = names.into_iter().collect();
        let lanes = sorted
            .into_iter()
            .enumerate()
            .map(|(index, name)| Lane {
                name: name.to_string(),
                index,
                color: palette[index % palette.len()],
            })
            .collect();
        Self { lanes }
    }

    pub fn from_records(records: &[CommitRecord]) -> Self {
        Self::assign(
            records
                .iter()
                .flat_map(|r| r.branch_membership.iter().map(String::as_str)),
        )
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    pub fn lane(&self, name: &str) -> Option<&Lane> {
        self.lanes.iter().find(|lane| lane.name == name)
    }

    pub fn color_of(&self, name: &str) -> Option<Srgb<u8>> {
        self.lane(name).map(|lane| lane.color)
    }
}

/// What one lane shows on one row of the swimlane view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneCell {
    Empty,
    /// The row's commit is on this branch
    Commit { connects_down: bool },
    /// The branch continues further down
    Passing,
}

/// One row per record, one cell per visible lane (first eight by name).
pub fn swimlane_rows(records: &[CommitRecord], lanes: &LaneAssignment) -> Vec<Vec<LaneCell>> {
    let visible: Vec<&str> = lanes
        .lanes()
        .iter()
        .take(MAX_VISIBLE_LANES)
        .map(|lane| lane.name.as_str())
        .collect();

    let mut rows = vec![Vec::new(); records.len()];
    let mut seen_below: HashSet<&str> = HashSet::new();

    for (i, record) in records.iter().enumerate().rev() {
        let next = records.get(i + 1);
        rows[i] = visible
            .iter()
            .map(|&name| {
                if record.branch_membership.contains(name) {
                    LaneCell::Commit {
                        connects_down: next.is_some_and(|n| n.branch_membership.contains(name)),
                    }
                } else if seen_below.contains(name) {
                    LaneCell::Passing
                } else {
                    LaneCell::Empty
                }
            })
            .collect();
        seen_below.extend(record.branch_membership.iter().map(String::as_str));
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::GitSource;
    use crate::model::{LineCounts, ProjectTloc};
    use crate::testutil::TestRepo;
    use chrono::{DateTime, FixedOffset};
    use std::collections::BTreeMap;

    fn record(branches: &[&str]) -> CommitRecord {
        CommitRecord {
            id: Oid::zero(),
            sha: "0".repeat(40),
            short_sha: "0".repeat(8),
            message: String::new(),
            author_name: String::new(),
            author_email: String::new(),
            committed_at: DateTime::<FixedOffset>::default(),
            parent_shas: Vec::new(),
            changed_files: Vec::new(),
            line_deltas: BTreeMap::new(),
            project_tloc: ProjectTloc { lines: LineCounts::ABSENT, file_count: 0 },
            branch_membership: branches.iter().map(|b| b.to_string()).collect(),
        }
    }

    #[test]
    fn lanes_follow_sorted_names() {
        let palette = lane_palette();
        let lanes = LaneAssignment::assign(["main", "dev", "feature-x"]);

        let names: Vec<&str> = lanes.lanes().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["dev", "feature-x", "main"]);
        assert_eq!(lanes.color_of("dev"), Some(palette[0]));
        assert_eq!(lanes.color_of("feature-x"), Some(palette[1]));
        assert_eq!(lanes.color_of("main"), Some(palette[2]));

        assert_eq!(LaneAssignment::assign(["feature-x", "main", "dev", "main"]), lanes);
        assert!(!lanes.is_empty());
        assert!(LaneAssignment::from_records(&[record(&[])]).is_empty());
    }

    #[test]
    fn palette_cycles_after_eight() {
        let names: Vec<String> = (0..10).map(|i| format!("b{}", i)).collect();
        let lanes = LaneAssignment::assign(names.iter().map(String::as_str));
        assert_eq!(lanes.color_of("b8"), lanes.color_of("b0"));
        assert_eq!(lanes.color_of("b9"), lanes.color_of("b1"));
        assert_eq!(lanes.lane("b9").map(|l| l.index), Some(9));
    }

    #[test]
    fn hex_colors() {
        assert_eq!(hex(lane_palette()[0]), "#ff6464");
        assert_eq!(hex(lane_palette()[7]), "#9664ff");
    }

    #[test]
    fn swimlane_cells() {
        use LaneCell::*;
        let records = vec![record(&["main"]), record(&["dev"]), record(&["dev", "main"])];
        let lanes = LaneAssignment::from_records(&records);

        let rows = swimlane_rows(&records, &lanes);
        // lanes: dev, main
        assert_eq!(rows[0], vec![Passing, Commit { connects_down: false }]);
        assert_eq!(rows[1], vec![Commit { connects_down: true }, Passing]);
        assert_eq!(rows[2], vec![Commit { connects_down: false }, Commit { connects_down: false }]);
    }

    #[test]
    fn membership_follows_ancestry() -> anyhow::Result<()> {
        let repo = TestRepo::new()?;
        let base = repo.commit(&[("a.py", Some("1\n"))], "base")?;
        repo.branch("dev")?;
        repo.branch("same-as-dev")?;
        repo.checkout("dev")?;
        let side = repo.commit(&[("b.py", Some("1\n"))], "side")?;
        repo.checkout("main")?;
        let tip = repo.commit(&[("c.py", Some("1\n"))], "main")?;
        let source = GitSource::open(repo.path())?;

        let mut records: Vec<CommitRecord> = [tip, side, base]
            .iter()
            .map(|&id| CommitRecord { id, ..record(&[]) })
            .collect();
        let heads = source.list_branch_heads()?;
        assign_membership(&source, &heads, &mut records);

        let sets: Vec<Vec<&str>> = records
            .iter()
            .map(|r| r.branch_membership.iter().map(String::as_str).collect())
            .collect();
        assert_eq!(sets[0], vec!["main"]);
        assert_eq!(sets[1], vec!["dev"]);
        assert_eq!(sets[2], vec!["dev", "main", "same-as-dev"]);
        Ok(())
    }
}
