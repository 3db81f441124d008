//! Hunk header scanning.
//!
//! Only the post-change (`+`) side of each `@@` line is read: excerpts are
//! sliced from the new file, so the old coordinates never matter here.

use std::sync::LazyLock;

use regex::Regex;

/// Post-change coordinates of a single hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkRange {
    /// First line of the hunk in the new file (1-indexed, 0 for an emptied file).
    pub start: usize,
    /// Number of new-file lines covered by the hunk.
    pub count: usize,
}

/// First `+<start>[,<count>]` occurrence on a hunk line.
static NEW_RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+([0-9]+),?([0-9]*)").unwrap());

/// Scan a unified diff for hunk headers and return their new-file ranges.
///
/// Lines that start with `@@ ` but carry no parseable `+` range are skipped.
pub fn parse_hunk_ranges(diff: &str) -> Vec<HunkRange> {
    diff.lines()
        .filter(|line| line.starts_with("@@ "))
        .filter_map(parse_hunk_line)
        .collect()
}

/// Extract the new-file range from one `@@` line.
fn parse_hunk_line(line: &str) -> Option<HunkRange> {
    let caps = NEW_RANGE_RE.captures(line)?;
    let start = caps.get(1)?.as_str().parse().ok()?;
    let count = match caps.get(2).map(|m| m.as_str()) {
        Some(digits) if !digits.is_empty() => digits.parse().ok()?,
        _ => 1,
    };
    Some(HunkRange { start, count })
}
