//! Windowed excerpts of post-change file content.
//!
//! Large files are reviewed through excerpts instead of their full body:
//! every hunk in the diff is widened into a context window, nearby windows
//! are merged, and the merged windows are sliced out of the new content in
//! ascending order until the line budget runs out.
//!
//! The builder is pure. Malformed hunk headers are skipped, windows past the
//! end of the file are truncated, and degenerate inputs produce an empty
//! string rather than an error.

pub mod hunks;
pub mod window;

use std::fmt;

pub use hunks::{HunkRange, parse_hunk_ranges};
pub use window::{Window, derive_windows, merge_windows};

/// Closing marker of every excerpt block.
pub const EXCERPT_END_MARKER: &str = "--- END EXCERPT ---";

/// Window sizing and budget parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowParams {
    /// Context lines above each hunk.
    pub before: usize,
    /// Context lines below each hunk.
    pub after: usize,
    /// Largest gap between two windows that still merges them.
    pub gap_tolerance: usize,
    /// Budget of nominal window lines across all excerpts.
    pub max_total_lines: usize,
}

/// One slice of the post-change file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Excerpt {
    pub window: Window,
    /// Lines of the window that exist in the file, joined with `\n`.
    pub text: String,
}

impl fmt::Display for Excerpt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "--- BEGIN EXCERPT [lines {}-{}] ---",
            self.window.start, self.window.end
        )?;
        writeln!(f, "{}", self.text)?;
        writeln!(f, "{EXCERPT_END_MARKER}")
    }
}

/// Excerpts that fit the budget, in ascending line order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcerptSet {
    pub excerpts: Vec<Excerpt>,
    /// Sum of nominal window lengths charged against the budget.
    ///
    /// Can exceed the number of lines actually sliced when a window runs
    /// past the end of the file.
    pub charged_lines: usize,
}

impl ExcerptSet {
    pub fn is_empty(&self) -> bool {
        self.excerpts.is_empty()
    }

    /// Concatenate all excerpt blocks.
    pub fn render(&self) -> String {
        self.excerpts.iter().map(Excerpt::to_string).collect()
    }
}

/// Select the excerpts for `diff` against the new `content`.
pub fn select_excerpts(diff: &str, content: &str, params: &WindowParams) -> ExcerptSet {
    if diff.is_empty() || content.is_empty() {
        return ExcerptSet::default();
    }

    let hunks = parse_hunk_ranges(diff);
    let windows = derive_windows(&hunks, params.before, params.after);
    let merged = merge_windows(windows, params.gap_tolerance);

    let lines: Vec<&str> = content.split('\n').collect();
    let mut set = ExcerptSet::default();

    for window in merged {
        let len = window.line_count();
        if set.charged_lines + len > params.max_total_lines {
            break;
        }

        let text = lines
            .iter()
            .skip(window.start - 1)
            .take(len)
            .copied()
            .collect::<Vec<_>>()
            .join("\n");

        set.excerpts.push(Excerpt { window, text });
        set.charged_lines += len;
    }

    set
}

/// Build the concatenated excerpt text for `diff` against `content`.
///
/// Returns an empty string when either input is empty, the diff holds no
/// parseable hunks, or the budget does not admit the first window.
pub fn build_excerpts(diff: &str, content: &str, params: &WindowParams) -> String {
    select_excerpts(diff, content, params).render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn numbered(n: usize) -> String {
        (1..=n)
            .map(|i| format!("line {i}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn params(before: usize, after: usize, gap: usize, max: usize) -> WindowParams {
        WindowParams {
            before,
            after,
            gap_tolerance: gap,
            max_total_lines: max,
        }
    }

    #[test]
    fn empty_diff_or_content_yields_nothing() {
        let p = params(2, 2, 0, 100);
        assert_eq!(build_excerpts("", &numbered(10), &p), "");
        assert_eq!(build_excerpts("@@ -1,1 +1,1 @@", "", &p), "");
    }

    #[test]
    fn diff_without_hunks_yields_nothing() {
        let diff = "diff --git a/a.rs b/a.rs\nBinary files differ\n";
        assert_eq!(build_excerpts(diff, &numbered(50), &params(5, 5, 0, 100)), "");
    }

    #[test]
    fn zero_budget_yields_nothing() {
        let diff = "@@ -1,1 +3,1 @@\n";
        assert_eq!(build_excerpts(diff, &numbered(50), &params(1, 1, 0, 0)), "");
    }

    #[test]
    fn distant_hunks_become_separate_blocks() {
        let diff = "@@ -10 +10 @@\n-a\n+b\n@@ -25 +25 @@\n-c\n+d\n";
        let content = numbered(40);
        let out = build_excerpts(diff, &content, &params(2, 2, 3, 100));

        let expected = "--- BEGIN EXCERPT [lines 8-12] ---\n\
                        line 8\nline 9\nline 10\nline 11\nline 12\n\
                        --- END EXCERPT ---\n\
                        --- BEGIN EXCERPT [lines 23-27] ---\n\
                        line 23\nline 24\nline 25\nline 26\nline 27\n\
                        --- END EXCERPT ---\n";
        assert_eq!(out, expected);
    }

    #[test]
    fn documented_labels_for_three_line_hunk() {
        // Hunk at 10 spanning two lines, plus one at 25.
        let diff = "@@ -10,2 +10,2 @@\n@@ -25 +25 @@\n";
        let out = build_excerpts(diff, &numbered(40), &params(2, 2, 3, 100));
        assert!(out.contains("[lines 8-13]"));
        assert!(out.contains("[lines 23-27]"));
        assert_eq!(out.matches("--- BEGIN EXCERPT").count(), 2);
    }

    #[test]
    fn close_hunks_merge_into_one_block() {
        let diff = "@@ -10 +10 @@\n@@ -16 +16 @@\n";
        let set = select_excerpts(diff, &numbered(40), &params(2, 2, 3, 100));
        assert_eq!(set.excerpts.len(), 1);
        assert_eq!(set.excerpts[0].window, Window { start: 8, end: 18 });
    }

    #[test]
    fn budget_stops_at_first_window_that_does_not_fit() {
        // Windows of 50 and 60 lines against a budget of 90.
        let diff = "@@ -1,50 +1,50 @@\n@@ -200,60 +200,60 @@\n";
        let set = select_excerpts(diff, &numbered(400), &params(0, 0, 0, 90));
        assert_eq!(set.excerpts.len(), 1);
        assert_eq!(set.excerpts[0].window, Window { start: 1, end: 50 });
        assert_eq!(set.charged_lines, 50);
    }

    #[test]
    fn budget_is_first_fit_not_best_fit() {
        // The 60-line window does not fit; the later 5-line one is never considered.
        let diff = "@@ -1,20 +1,20 @@\n@@ -100,60 +100,60 @@\n@@ -300,5 +300,5 @@\n";
        let set = select_excerpts(diff, &numbered(400), &params(0, 0, 0, 50));
        let windows: Vec<_> = set.excerpts.iter().map(|e| e.window).collect();
        assert_eq!(windows, vec![Window { start: 1, end: 20 }]);
    }

    #[test]
    fn window_past_end_of_file_is_truncated_but_fully_charged() {
        let content = "a\nb\nc\nd\ne";
        // Window [2, 15] against a 5-line file.
        let diff = "@@ -4,2 +4,2 @@\n";
        let set = select_excerpts(diff, content, &params(2, 10, 0, 14));
        assert_eq!(set.excerpts.len(), 1);
        assert_eq!(set.excerpts[0].window, Window { start: 2, end: 15 });
        assert_eq!(set.excerpts[0].text, "b\nc\nd\ne");
        assert_eq!(set.charged_lines, 14);
    }

    #[test]
    fn window_entirely_past_end_of_file_is_empty_slice() {
        let set = select_excerpts("@@ -1 +90,2 @@", "only\nthree\nlines", &params(0, 0, 0, 10));
        assert_eq!(set.excerpts.len(), 1);
        assert_eq!(set.excerpts[0].text, "");
        assert_eq!(set.charged_lines, 2);
    }

    #[test]
    fn trailing_newline_counts_as_empty_last_line() {
        let set = select_excerpts("@@ -1 +3 @@", "x\ny\nz\n", &params(0, 1, 0, 10));
        assert_eq!(set.excerpts[0].window, Window { start: 3, end: 4 });
        assert_eq!(set.excerpts[0].text, "z\n");
    }

    #[test]
    fn every_window_starts_at_or_after_line_one() {
        let diff = "@@ -1 +1 @@\n@@ -2,3 +2,3 @@\n@@ -0,0 +0,0 @@\n";
        let set = select_excerpts(diff, &numbered(20), &params(50, 1, 0, 1000));
        assert!(!set.is_empty());
        assert!(set.excerpts.iter().all(|e| e.window.start >= 1));
    }

    #[test]
    fn blocks_are_in_ascending_order_regardless_of_diff_order() {
        let diff = "@@ -80 +80 @@\n@@ -5 +5 @@\n@@ -40 +40 @@\n";
        let set = select_excerpts(diff, &numbered(100), &params(1, 1, 0, 1000));
        let starts: Vec<_> = set.excerpts.iter().map(|e| e.window.start).collect();
        assert_eq!(starts, vec![4, 39, 79]);
    }

    #[test]
    fn identical_inputs_give_identical_output() {
        let diff = "@@ -3,4 +3,6 @@\n@@ -70 +72,2 @@\n";
        let content = numbered(120);
        let p = params(5, 5, 4, 30);
        assert_eq!(
            build_excerpts(diff, &content, &p),
            build_excerpts(diff, &content, &p)
        );
    }

    #[test]
    fn rendered_block_format() {
        let excerpt = Excerpt {
            window: Window { start: 3, end: 4 },
            text: "foo\nbar".into(),
        };
        assert_eq!(
            excerpt.to_string(),
            "--- BEGIN EXCERPT [lines 3-4] ---\nfoo\nbar\n--- END EXCERPT ---\n"
        );
    }
}
