// src/report.rs

use crate::lanes::{hex, swimlane_rows, LaneCell};
use crate::model::{ChangeKind, CommitRecord, TimelineBatch};
use serde::Serialize;
use std::io::{self, Write};

pub const CSV_HEADER: [&str; 15] = [
    "SHA",
    "Short SHA",
    "Author",
    "Email",
    "Date",
    "Message",
    "Branches",
    "Files Changed",
    "Files Added",
    "Files Modified",
    "Files Deleted",
    "Total Files",
    "Total Lines",
    "Code Lines",
    "Blank Lines",
];

pub fn csv_row(record: &CommitRecord) -> Vec<String> {
    let tloc = &record.project_tloc;
    vec![
        record.sha.clone(),
        record.short_sha.clone(),
        record.author_name.clone(),
        record.author_email.clone(),
        record.committed_at.format("%Y-%m-%dT%H:%M:%S%:z").to_string(),
        collapse_newlines(&record.message),
        record.branch_membership.iter().cloned().collect::<Vec<_>>().join(", "),
        record.changed_files.len().to_string(),
        record.count_changes(ChangeKind::Added).to_string(),
        record.count_changes(ChangeKind::Modified).to_string(),
        record.count_changes(ChangeKind::Deleted).to_string(),
        tloc.file_count.to_string(),
        tloc.lines.total.to_string(),
        tloc.lines.code.to_string(),
        tloc.lines.blank.to_string(),
    ]
}

/// One header row, then one row per commit in batch order.
pub fn write_csv<W: Write>(batch: &TimelineBatch, mut out: W) -> io::Result<()> {
    write_csv_line(&mut out, CSV_HEADER.iter().copied())?;
    for record in &batch.records {
        let row = csv_row(record);
        write_csv_line(&mut out, row.iter().map(String::as_str))?;
    }
    out.flush()
}

fn write_csv_line<'a, W: Write>(out: &mut W, fields: impl Iterator<Item = &'a str>) -> io::Result<()> {
    let line: Vec<String> = fields.map(csv_field).collect();
    write!(out, "{}\r\n", line.join(","))
}

fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn collapse_newlines(message: &str) -> String {
    message.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

#[derive(Serialize)]
struct LaneReport {
    name: String,
    color: String,
}

#[derive(Serialize)]
struct BatchReport<'a> {
    generation: u64,
    /// project totals come from sampling
    estimated: bool,
    commits: &'a [CommitRecord],
    lanes: Vec<LaneReport>,
}

pub fn to_json(batch: &TimelineBatch) -> serde_json::Result<String> {
    let report = BatchReport {
        generation: batch.generation,
        estimated: true,
        commits: &batch.records,
        lanes: batch
            .lanes
            .lanes()
            .iter()
            .map(|lane| LaneReport { name: lane.name.clone(), color: hex(lane.color) })
            .collect(),
    };
    serde_json::to_string_pretty(&report)
}

/// Project statistics at the newest commit of the batch.
pub fn summary(batch: &TimelineBatch) -> String {
    let Some(latest) = batch.latest() else {
        return "No data loaded".to_string();
    };
    let tloc = &latest.project_tloc;
    format!(
        "Files: {}\nTotal Lines: ~{}\nCode Lines: ~{}\nCommits: {}",
        format_thousands(tloc.file_count),
        format_thousands(tloc.lines.total),
        format_thousands(tloc.lines.code),
        batch.records.len()
    )
}

pub fn commit_details(record: &CommitRecord) -> String {
    let tloc = &record.project_tloc;
    let mut out = String::new();
    out.push_str(&format!("SHA: {}\n", record.sha));
    out.push_str(&format!("Author: {} <{}>\n", record.author_name, record.author_email));
    out.push_str(&format!("Date: {}\n", record.committed_at.format("%Y-%m-%d %H:%M:%S")));
    if record.is_merge() {
        out.push_str(&format!("Merge: {}\n", record.parent_shas.join(" ")));
    }
    if !record.branch_membership.is_empty() {
        let branches: Vec<&str> = record.branch_membership.iter().map(String::as_str).collect();
        out.push_str(&format!("Branches: {}\n", branches.join(", ")));
    }
    out.push_str(&format!("\n{}\n\n", record.message));

    out.push_str("TLOC at this commit (estimated)\n");
    out.push_str(&format!("  Files: {}\n", format_thousands(tloc.file_count)));
    out.push_str(&format!("  Total Lines: {}\n", format_thousands(tloc.lines.total)));
    out.push_str(&format!("  Code Lines: {}\n", format_thousands(tloc.lines.code)));
    out.push_str(&format!("  Blank Lines: {}\n", format_thousands(tloc.lines.blank)));

    if record.changed_files.is_empty() {
        return out;
    }
    out.push_str(&format!(
        "\n{:<40} {:<9} {:>8} {:>8} {:>8}\n",
        "File", "Change", "Before", "After", "Net"
    ));
    for change in &record.changed_files {
        let (before, after, net) = match record.line_deltas.get(&change.path) {
            Some(delta) => (
                delta.before.code.to_string(),
                delta.after.code.to_string(),
                format_net(delta.net_code_delta),
            ),
            None => ("-".to_string(), "-".to_string(), "-".to_string()),
        };
        out.push_str(&format!(
            "{:<40} {:<9} {:>8} {:>8} {:>8}\n",
            change.path,
            change.kind.to_string(),
            before,
            after,
            net
        ));
    }
    out
}

/// Plain-text swimlanes: one column per visible branch, then sha and summary.
pub fn swimlane_text(batch: &TimelineBatch) -> String {
    let rows = swimlane_rows(&batch.records, &batch.lanes);
    let mut out = String::new();
    for (record, cells) in batch.records.iter().zip(rows) {
        let lanes: String = cells
            .iter()
            .map(|cell| match cell {
                LaneCell::Commit { .. } => "● ",
                LaneCell::Passing => "│ ",
                LaneCell::Empty => "  ",
            })
            .collect();
        out.push_str(&format!(
            "{}{}  {}  TLOC ~{} ({} files)\n",
            lanes,
            record.short_sha,
            truncate(record.summary(), 50),
            format_thousands(record.project_tloc.lines.code),
            record.project_tloc.file_count
        ));
    }
    out
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars - 3).collect();
    format!("{}...", kept)
}

fn format_net(net: i64) -> String {
    if net == 0 {
        "0".to_string()
    } else {
        format!("{:+}", net)
    }
}

fn format_thousands(value: usize) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
