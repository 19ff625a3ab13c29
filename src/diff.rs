//! Diff rendering for previews and run summaries.

use similar::{ChangeTag, TextDiff};
use std::fmt::Write;
use std::path::Path;

/// Generates a unified diff between two versions of a file.
pub fn unified_diff(original: &str, modified: &str, path: &Path) -> String {
    let old_header = format!("a/{}", path.display());
    let new_header = format!("b/{}", path.display());
    TextDiff::from_lines(original, modified)
        .unified_diff()
        .context_radius(3)
        .header(&old_header, &new_header)
        .to_string()
}

/// Colorized diff output for terminal display.
pub fn colorized_diff(original: &str, modified: &str, path: &Path) -> String {
    const RED: &str = "\x1b[31m";
    const GREEN: &str = "\x1b[32m";
    const CYAN: &str = "\x1b[36m";
    const RESET: &str = "\x1b[0m";

    let diff = TextDiff::from_lines(original, modified);
    let mut output = String::new();

    let _ = writeln!(output, "{CYAN}--- a/{}{RESET}", path.display());
    let _ = writeln!(output, "{CYAN}+++ b/{}{RESET}", path.display());

    for group in diff.grouped_ops(3) {
        for op in &group {
            for change in diff.iter_changes(op) {
                let line = change.value();
                let newline = if line.ends_with('\n') { "" } else { "\n" };
                let _ = match change.tag() {
                    ChangeTag::Delete => write!(output, "{RED}-{line}{RESET}{newline}"),
                    ChangeTag::Insert => write!(output, "{GREEN}+{line}{RESET}{newline}"),
                    ChangeTag::Equal => write!(output, " {line}{newline}"),
                };
            }
        }
    }

    output
}

/// Line counts of a change.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DiffSummary {
    pub files_changed: usize,
    pub insertions: usize,
    pub deletions: usize,
}

impl DiffSummary {
    /// Creates a summary from original and modified content.
    pub fn from_diff(original: &str, modified: &str) -> Self {
        let diff = TextDiff::from_lines(original, modified);
        let (insertions, deletions) =
            diff.iter_all_changes()
                .fold((0, 0), |(ins, del), change| match change.tag() {
                    ChangeTag::Insert => (ins + 1, del),
                    ChangeTag::Delete => (ins, del + 1),
                    ChangeTag::Equal => (ins, del),
                });

        Self {
            files_changed: usize::from(insertions > 0 || deletions > 0),
            insertions,
            deletions,
        }
    }

    /// Combines two summaries.
    pub fn merge(&mut self, other: &DiffSummary) {
        self.files_changed += other.files_changed;
        self.insertions += other.insertions;
        self.deletions += other.deletions;
    }
}

impl std::fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} file(s) changed, {} insertions(+), {} deletions(-)",
            self.files_changed, self.insertions, self.deletions
        )
    }
}
