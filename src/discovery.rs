//! Enumerates the candidate files of a group directory.

use crate::error::{CodemodError, Result};
use globset::{Glob, GlobMatcher};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Finds files in one directory whose names match a glob.
#[derive(Debug, Clone)]
pub struct FileMatcher {
    pattern: GlobMatcher,
}

impl FileMatcher {
    /// Matches file names against `pattern`, e.g. `*.ts`.
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            pattern: Glob::new(pattern)?.compile_matcher(),
        })
    }

    /// Returns true if the file name matches the pattern.
    pub fn matches_name(&self, name: &str) -> bool {
        self.pattern.is_match(name)
    }

    /// Collects matching files, sorted by path.
    ///
    /// A missing or unreadable directory is an error rather than an empty
    /// list, so a mistyped group path never looks like a clean run.
    pub fn collect(&self, group: &str, dir: &Path) -> Result<Vec<PathBuf>> {
        let enumeration_error = |message: String| CodemodError::GroupEnumeration {
            group: group.to_string(),
            path: dir.to_path_buf(),
            message,
        };

        if !dir.is_dir() {
            return Err(enumeration_error("not a directory".to_string()));
        }

        let mut matched = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| enumeration_error(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if self.matches_name(&name) {
                matched.push(entry.into_path());
            }
        }

        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_files(dir: &Path) {
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("b.ts"), "export const b = 1;").unwrap();
        fs::write(dir.join("a.ts"), "export const a = 1;").unwrap();
        fs::write(dir.join("c.tsx"), "export const c = 1;").unwrap();
        fs::write(dir.join("README.md"), "# docs").unwrap();
        fs::write(dir.join("nested/d.ts"), "export const d = 1;").unwrap();
    }

    #[test]
    fn test_collects_top_level_matches_sorted() {
        let dir = TempDir::new().unwrap();
        create_test_files(dir.path());

        let files = FileMatcher::new("*.ts")
            .unwrap()
            .collect("controllers", dir.path())
            .unwrap();

        let names: Vec<_> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.ts", "b.ts"]);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();

        let err = FileMatcher::new("*.ts")
            .unwrap()
            .collect("services", &dir.path().join("missing"))
            .unwrap_err();

        assert!(matches!(err, CodemodError::GroupEnumeration { ref group, .. } if group == "services"));
    }

    #[test]
    fn test_invalid_glob() {
        assert!(matches!(FileMatcher::new("[a-"), Err(CodemodError::Glob(_))));
    }

    #[test]
    fn test_empty_directory() {
        let dir = TempDir::new().unwrap();

        let files = FileMatcher::new("*.ts")
            .unwrap()
            .collect("controllers", dir.path())
            .unwrap();

        assert!(files.is_empty());
    }
}
