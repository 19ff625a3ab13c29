//! Batch execution of the rewrite engine over groups of files.

use crate::config::{CodemodConfig, GroupConfig};
use crate::diff::DiffSummary;
use crate::discovery::FileMatcher;
use crate::engine::RewriteEngine;
use crate::error::{CodemodError, Result};
use crate::role::Role;
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Reads and persists source text.
pub trait SourceStore {
    fn read(&self, path: &Path) -> Result<String>;

    fn write(&self, path: &Path, contents: &str) -> Result<()>;
}

/// A [`SourceStore`] backed by the local file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsStore;

impl SourceStore for FsStore {
    fn read(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|source| CodemodError::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes a sibling temporary file and renames it over `path`, so a
    /// failed write leaves the original intact.
    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        let write_error = |source: io::Error| CodemodError::Write {
            path: path.to_path_buf(),
            source,
        };
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = NamedTempFile::new_in(dir).map_err(write_error)?;
        temp.write_all(contents.as_bytes()).map_err(write_error)?;
        if let Ok(metadata) = fs::metadata(path) {
            fs::set_permissions(temp.path(), metadata.permissions()).map_err(write_error)?;
        }
        temp.persist(path).map_err(|e| write_error(e.error))?;
        Ok(())
    }
}

/// File names that are already migrated and must not be touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    names: BTreeSet<String>,
}

impl ExclusionSet {
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Exact match on the file name; directories are ignored.
    pub fn contains(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| self.names.contains(name))
    }
}

/// A group resolved against a run root.
#[derive(Debug, Clone)]
pub struct FileGroup {
    pub name: String,
    pub role: Role,
    pub dir: PathBuf,
    pub pattern: String,
    pub exclusions: ExclusionSet,
}

impl FileGroup {
    pub fn new(name: impl Into<String>, role: Role, dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            role,
            dir: dir.into(),
            pattern: "*.ts".to_string(),
            exclusions: ExclusionSet::default(),
        }
    }

    pub fn from_config(root: &Path, config: &GroupConfig) -> Self {
        Self {
            name: config.name.clone(),
            role: config.role,
            dir: root.join(&config.dir),
            pattern: config.pattern.clone(),
            exclusions: ExclusionSet::new(config.exclude.iter().cloned()),
        }
    }

    pub fn exclude(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.exclusions = ExclusionSet::new(names);
        self
    }

    /// Lists the group's candidate files.
    pub fn files(&self) -> Result<Vec<PathBuf>> {
        FileMatcher::new(&self.pattern)?.collect(&self.name, &self.dir)
    }
}

/// Represents a change to be applied to a file.
#[derive(Debug, Clone)]
pub struct FileChange {
    pub path: PathBuf,
    pub original: String,
    pub transformed: String,
}

impl FileChange {
    pub fn summary(&self) -> DiffSummary {
        DiffSummary::from_diff(&self.original, &self.transformed)
    }
}

/// What happened to one file.
#[derive(Debug, Clone)]
pub enum FileOutcome {
    /// Named in the group's exclusion set; never read.
    Skipped,
    /// No call site matched.
    Unchanged,
    /// Rewritten (and persisted unless the run is a dry run).
    Transformed(FileChange),
    /// Reading, rewriting or writing failed; the file is untouched.
    Failed(String),
}

impl FileOutcome {
    pub fn marker(&self) -> &'static str {
        match self {
            FileOutcome::Skipped => "-",
            FileOutcome::Unchanged => "·",
            FileOutcome::Transformed(_) => "✓",
            FileOutcome::Failed(_) => "✗",
        }
    }
}

/// Outcome for a single file.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

impl FileReport {
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

impl fmt::Display for FileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name();
        match &self.outcome {
            FileOutcome::Skipped => write!(f, "{} Skipped {name} (excluded)", self.outcome.marker()),
            FileOutcome::Unchanged => write!(f, "{} Unchanged {name}", self.outcome.marker()),
            FileOutcome::Transformed(_) => write!(f, "{} Fixed {name}", self.outcome.marker()),
            FileOutcome::Failed(message) => {
                write!(f, "{} Error fixing {name}: {message}", self.outcome.marker())
            }
        }
    }
}

/// Outcome counts for a group or a whole run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OutcomeCounts {
    pub transformed: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl OutcomeCounts {
    fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Skipped => self.skipped += 1,
            FileOutcome::Unchanged => self.unchanged += 1,
            FileOutcome::Transformed(_) => self.transformed += 1,
            FileOutcome::Failed(_) => self.failed += 1,
        }
    }

    pub fn merge(&mut self, other: &OutcomeCounts) {
        self.transformed += other.transformed;
        self.unchanged += other.unchanged;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }

    pub fn total(&self) -> usize {
        self.transformed + self.unchanged + self.skipped + self.failed
    }
}

impl fmt::Display for OutcomeCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} transformed, {} unchanged, {} skipped, {} failed",
            self.transformed, self.unchanged, self.skipped, self.failed
        )
    }
}

/// Outcomes for one group, in processing order.
#[derive(Debug, Clone)]
pub struct GroupReport {
    pub name: String,
    pub role: Role,
    pub files: Vec<FileReport>,
}

impl GroupReport {
    pub fn counts(&self) -> OutcomeCounts {
        let mut counts = OutcomeCounts::default();
        for file in &self.files {
            counts.record(&file.outcome);
        }
        counts
    }

    pub fn diff_summary(&self) -> DiffSummary {
        let mut summary = DiffSummary::default();
        for change in self.changes() {
            summary.merge(&change.summary());
        }
        summary
    }

    pub fn changes(&self) -> impl Iterator<Item = &FileChange> {
        self.files.iter().filter_map(|f| match &f.outcome {
            FileOutcome::Transformed(change) => Some(change),
            _ => None,
        })
    }

    pub fn outcome_of(&self, name: &str) -> Option<&FileOutcome> {
        self.files
            .iter()
            .find(|f| f.name() == name)
            .map(|f| &f.outcome)
    }
}

/// Reports for every group a run started.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub groups: Vec<GroupReport>,
    /// Set when a group could not be enumerated and the run stopped.
    pub aborted: Option<String>,
}

impl RunReport {
    pub fn totals(&self) -> OutcomeCounts {
        let mut totals = OutcomeCounts::default();
        for group in &self.groups {
            totals.merge(&group.counts());
        }
        totals
    }

    pub fn group(&self, name: &str) -> Option<&GroupReport> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// True when the run completed without aborting or failed files.
    pub fn is_success(&self) -> bool {
        self.aborted.is_none() && self.totals().failed == 0
    }
}

/// Applies the rewrite engine to batches of files.
///
/// Every file is an independent, all-or-nothing unit: an error while
/// reading, rewriting or writing it becomes a failed outcome and the batch
/// moves on.
pub struct BatchRunner<S: SourceStore = FsStore> {
    engine: RewriteEngine,
    store: S,
    dry_run: bool,
}

impl BatchRunner<FsStore> {
    /// Creates a runner that reads and writes the local file system.
    pub fn new(engine: RewriteEngine) -> Self {
        Self::with_store(engine, FsStore)
    }
}

impl<S: SourceStore> BatchRunner<S> {
    pub fn with_store(engine: RewriteEngine, store: S) -> Self {
        Self {
            engine,
            store,
            dry_run: false,
        }
    }

    /// Computes outcomes without writing anything.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn engine(&self) -> &RewriteEngine {
        &self.engine
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Processes a single file.
    pub fn process_file(&self, path: &Path, role: Role, exclusions: &ExclusionSet) -> FileOutcome {
        if exclusions.contains(path) {
            tracing::debug!(path = %path.display(), "excluded");
            return FileOutcome::Skipped;
        }

        match self.try_process(path, role) {
            Ok(Some(change)) => {
                tracing::info!(path = %path.display(), %role, "transformed");
                FileOutcome::Transformed(change)
            }
            Ok(None) => FileOutcome::Unchanged,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "file failed");
                FileOutcome::Failed(e.to_string())
            }
        }
    }

    fn try_process(&self, path: &Path, role: Role) -> Result<Option<FileChange>> {
        let original = self.store.read(path)?;
        let rewrite = self.engine.rewrite(&original, role)?;
        if !rewrite.changed {
            return Ok(None);
        }

        if !self.dry_run {
            self.store.write(path, &rewrite.text)?;
        }
        Ok(Some(FileChange {
            path: path.to_path_buf(),
            original,
            transformed: rewrite.text,
        }))
    }

    /// Processes a list of files belonging to one group, in order.
    pub fn run_files(
        &self,
        group: &FileGroup,
        files: &[PathBuf],
        progress: &mut dyn FnMut(&FileReport),
    ) -> GroupReport {
        let mut reports = Vec::with_capacity(files.len());
        for path in files {
            let report = FileReport {
                path: path.clone(),
                outcome: self.process_file(path, group.role, &group.exclusions),
            };
            progress(&report);
            reports.push(report);
        }

        GroupReport {
            name: group.name.clone(),
            role: group.role,
            files: reports,
        }
    }

    /// Enumerates and processes one group.
    pub fn run_group(
        &self,
        group: &FileGroup,
        progress: &mut dyn FnMut(&FileReport),
    ) -> Result<GroupReport> {
        let files = group.files()?;
        tracing::debug!(group = %group.name, count = files.len(), "enumerated group");
        Ok(self.run_files(group, &files, progress))
    }

    /// Processes groups in order.
    ///
    /// If a group cannot be enumerated the run stops there; reports for the
    /// groups already processed are kept.
    pub fn run(&self, groups: &[FileGroup], progress: &mut dyn FnMut(RunEvent<'_>)) -> RunReport {
        let mut report = RunReport::default();
        for group in groups {
            progress(RunEvent::GroupStarted(group));
            match self.run_group(group, &mut |file: &FileReport| progress(RunEvent::File(group, file))) {
                Ok(group_report) => {
                    progress(RunEvent::GroupFinished(&group_report));
                    report.groups.push(group_report);
                }
                Err(e) => {
                    tracing::error!(group = %group.name, error = %e, "aborting run");
                    report.aborted = Some(e.to_string());
                    break;
                }
            }
        }
        report
    }
}

/// Progress notifications emitted by [`BatchRunner::run`].
#[derive(Debug, Clone, Copy)]
pub enum RunEvent<'a> {
    GroupStarted(&'a FileGroup),
    File(&'a FileGroup, &'a FileReport),
    GroupFinished(&'a GroupReport),
}

/// Resolves the configured groups against a root directory.
pub fn groups_from_config(root: &Path, config: &CodemodConfig) -> Vec<FileGroup> {
    config
        .groups
        .iter()
        .map(|group| FileGroup::from_config(root, group))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_fs_store_replaces_file_without_leftovers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mealController.ts");
        fs::write(&path, "console.log('old');\n").unwrap();

        FsStore.write(&path, "errorLogger.info('new', req);\n").unwrap();

        assert_eq!(FsStore.read(&path).unwrap(), "errorLogger.info('new', req);\n");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_fs_store_write_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing/mealController.ts");

        let err = FsStore.write(&path, "x").unwrap_err();

        assert!(matches!(err, CodemodError::Write { .. }));
        assert!(!path.exists());
    }

    /// In-memory store that records reads and writes.
    #[derive(Default)]
    struct MemoryStore {
        files: RefCell<HashMap<PathBuf, String>>,
        reads: RefCell<Vec<PathBuf>>,
        fail_read: Option<PathBuf>,
        fail_write: Option<PathBuf>,
    }

    impl MemoryStore {
        fn with(files: &[(&str, &str)]) -> Self {
            Self {
                files: RefCell::new(
                    files
                        .iter()
                        .map(|(p, c)| (PathBuf::from(p), c.to_string()))
                        .collect(),
                ),
                ..Default::default()
            }
        }

        fn content(&self, path: &str) -> String {
            self.files.borrow()[Path::new(path)].clone()
        }
    }

    impl SourceStore for MemoryStore {
        fn read(&self, path: &Path) -> Result<String> {
            self.reads.borrow_mut().push(path.to_path_buf());
            if self.fail_read.as_deref() == Some(path) {
                return Err(CodemodError::Read {
                    path: path.to_path_buf(),
                    source: std::io::Error::new(std::io::ErrorKind::InvalidData, "stream did not contain valid UTF-8"),
                });
            }
            self.files
                .borrow()
                .get(path)
                .cloned()
                .ok_or_else(|| CodemodError::Read {
                    path: path.to_path_buf(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                })
        }

        fn write(&self, path: &Path, contents: &str) -> Result<()> {
            if self.fail_write.as_deref() == Some(path) {
                return Err(CodemodError::Write {
                    path: path.to_path_buf(),
                    source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
                });
            }
            self.files
                .borrow_mut()
                .insert(path.to_path_buf(), contents.to_string());
            Ok(())
        }
    }

    const FAILING: &str = "console.error('Failed', error);\n";

    fn runner(store: MemoryStore) -> BatchRunner<MemoryStore> {
        let engine = RewriteEngine::from_config(&CodemodConfig::default()).unwrap();
        BatchRunner::with_store(engine, store)
    }

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_excluded_file_is_never_read() {
        let store = MemoryStore::with(&[("c/authController.ts", FAILING), ("c/a.ts", FAILING)]);
        let runner = runner(store);
        let group = FileGroup::new("controllers", Role::Controller, "c").exclude(["authController.ts"]);

        let report = runner.run_files(&group, &paths(&["c/authController.ts", "c/a.ts"]), &mut |_| {});

        assert!(matches!(report.outcome_of("authController.ts"), Some(FileOutcome::Skipped)));
        assert!(matches!(report.outcome_of("a.ts"), Some(FileOutcome::Transformed(_))));
        assert_eq!(*runner.store().reads.borrow(), vec![PathBuf::from("c/a.ts")]);
        assert_eq!(runner.store().content("c/authController.ts"), FAILING);
    }

    #[test]
    fn test_failure_is_isolated() {
        let mut store = MemoryStore::with(&[
            ("s/a.ts", FAILING),
            ("s/b.ts", FAILING),
            ("s/c.ts", FAILING),
        ]);
        store.fail_write = Some(PathBuf::from("s/b.ts"));
        let runner = runner(store);
        let group = FileGroup::new("server services", Role::ServerService, "s");

        let report = runner.run_files(&group, &paths(&["s/a.ts", "s/b.ts", "s/c.ts"]), &mut |_| {});

        let counts = report.counts();
        assert_eq!(counts.transformed, 2);
        assert_eq!(counts.failed, 1);
        assert!(matches!(report.outcome_of("b.ts"), Some(FileOutcome::Failed(m)) if m.contains("s/b.ts")));
        assert_eq!(runner.store().content("s/b.ts"), FAILING);
        assert!(runner.store().content("s/a.ts").contains("logServiceError("));
        assert!(runner.store().content("s/c.ts").contains("logServiceError("));
    }

    #[test]
    fn test_read_failure_is_reported() {
        let mut store = MemoryStore::with(&[("p/a.ts", FAILING)]);
        store.fail_read = Some(PathBuf::from("p/a.ts"));
        let runner = runner(store);
        let group = FileGroup::new("panel services", Role::PanelService, "p");

        let report = runner.run_files(&group, &paths(&["p/a.ts"]), &mut |_| {});

        assert!(matches!(report.outcome_of("a.ts"), Some(FileOutcome::Failed(m)) if m.contains("UTF-8")));
    }

    #[test]
    fn test_unchanged_file_is_not_written() {
        let mut store = MemoryStore::with(&[("c/a.ts", "export const a = 1;\n")]);
        store.fail_write = Some(PathBuf::from("c/a.ts"));
        let runner = runner(store);
        let group = FileGroup::new("controllers", Role::Controller, "c");

        let report = runner.run_files(&group, &paths(&["c/a.ts"]), &mut |_| {});

        assert!(matches!(report.outcome_of("a.ts"), Some(FileOutcome::Unchanged)));
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let store = MemoryStore::with(&[("c/a.ts", FAILING)]);
        let runner = runner(store).dry_run(true);
        let group = FileGroup::new("controllers", Role::Controller, "c");

        let report = runner.run_files(&group, &paths(&["c/a.ts"]), &mut |_| {});

        assert_eq!(report.counts().transformed, 1);
        assert_eq!(report.diff_summary().files_changed, 1);
        assert_eq!(runner.store().content("c/a.ts"), FAILING);
    }

    #[test]
    fn test_progress_names_every_file() {
        let mut store = MemoryStore::with(&[("c/a.ts", FAILING), ("c/b.ts", "x();\n"), ("c/d.ts", FAILING)]);
        store.fail_read = Some(PathBuf::from("c/d.ts"));
        let runner = runner(store);
        let group = FileGroup::new("controllers", Role::Controller, "c").exclude(["c.ts"]);
        let mut lines = Vec::new();

        runner.run_files(&group, &paths(&["c/a.ts", "c/b.ts", "c/c.ts", "c/d.ts"]), &mut |r| {
            lines.push(r.to_string())
        });

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "✓ Fixed a.ts");
        assert_eq!(lines[1], "· Unchanged b.ts");
        assert_eq!(lines[2], "- Skipped c.ts (excluded)");
        assert!(lines[3].starts_with("✗ Error fixing d.ts: "));
    }

    #[test]
    fn test_exclusion_matches_file_name_only() {
        let exclusions = ExclusionSet::new(["a.ts"]);

        assert!(exclusions.contains(Path::new("deep/dir/a.ts")));
        assert!(!exclusions.contains(Path::new("a.ts/b.ts")));
        assert!(!exclusions.contains(Path::new("aa.ts")));
    }

    #[test]
    fn test_outcome_counts_display() {
        let counts = OutcomeCounts {
            transformed: 2,
            unchanged: 1,
            skipped: 1,
            failed: 0,
        };

        assert_eq!(counts.total(), 4);
        assert_eq!(counts.to_string(), "2 transformed, 1 unchanged, 1 skipped, 0 failed");
    }
}
