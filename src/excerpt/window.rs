//! Context windows around hunks and their coalescing.

use super::hunks::HunkRange;

/// An inclusive, 1-indexed line range of the post-change file.
///
/// `end` may lie past the end of the file; slicing truncates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Window {
    pub start: usize,
    pub end: usize,
}

impl Window {
    /// Expand a hunk by `before` lines above and `after` lines below.
    ///
    /// `start` is clamped to line 1. Returns `None` when the range is empty,
    /// which only happens for a zero-line hunk with no trailing context.
    pub fn around(hunk: HunkRange, before: usize, after: usize) -> Option<Self> {
        let start = hunk.start.saturating_sub(before).max(1);
        let end = hunk
            .start
            .saturating_add(hunk.count)
            .saturating_add(after)
            .checked_sub(1)?;
        (end >= start).then_some(Self { start, end })
    }

    /// Nominal number of lines covered, regardless of file length.
    pub fn line_count(&self) -> usize {
        self.end - self.start + 1
    }
}

/// Derive one window per hunk.
pub fn derive_windows(hunks: &[HunkRange], before: usize, after: usize) -> Vec<Window> {
    hunks
        .iter()
        .filter_map(|hunk| Window::around(*hunk, before, after))
        .collect()
}

/// Sort windows by start line and coalesce neighbours.
///
/// Two windows merge when `next.start - current.end <= gap_tolerance`;
/// overlapping windows always merge.
pub fn merge_windows(mut windows: Vec<Window>, gap_tolerance: usize) -> Vec<Window> {
    windows.sort_by_key(|w| w.start);

    let mut merged: Vec<Window> = Vec::with_capacity(windows.len());
    for window in windows {
        if let Some(last) = merged.last_mut() {
            if window.start <= last.end.saturating_add(gap_tolerance) {
                last.end = last.end.max(window.end);
                continue;
            }
        }
        merged.push(window);
    }
    merged
}
