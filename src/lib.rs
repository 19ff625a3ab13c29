//! # Log Codemod
//!
//! Batch migration of ad-hoc `console.*` logging to a structured error
//! logger.
//!
//! The crate is built around a small rewrite engine:
//! - [`rule`]: textual pattern rules that find logging calls and render
//!   their replacements
//! - [`inject`]: idempotent insertion of the logger's import line
//! - [`engine`]: per-file orchestration, keyed by the file's [`Role`]
//! - [`runner`]: batch execution with per-file failure isolation
//!
//! ## Quick Start
//!
//! ```rust
//! use log_codemod::prelude::*;
//!
//! let engine = RewriteEngine::from_config(&CodemodConfig::default())?;
//! let out = engine.rewrite("console.log('Saved successfully');\n", Role::Controller)?;
//!
//! assert!(out.changed);
//! assert!(out.text.contains("errorLogger.info('Saved successfully', req);"));
//! # Ok::<(), log_codemod::error::CodemodError>(())
//! ```
//!
//! ## Running a batch
//!
//! ```rust,no_run
//! use log_codemod::prelude::*;
//! use std::path::Path;
//!
//! let config = CodemodConfig::default();
//! let runner = BatchRunner::new(RewriteEngine::from_config(&config)?).dry_run(true);
//! let groups = groups_from_config(Path::new("."), &config);
//!
//! let report = runner.run(&groups, &mut |event| {
//!     if let RunEvent::File(_, file) = event {
//!         println!("{file}");
//!     }
//! });
//! println!("{}", report.totals());
//! # Ok::<(), log_codemod::error::CodemodError>(())
//! ```
//!
//! Matching is regex based: calls inside comments or string literals are
//! rewritten like any other. [`PatternRule`] is the seam for a syntax-aware
//! matcher.

pub mod config;
pub mod diff;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod inject;
pub mod role;
pub mod rule;
pub mod runner;
pub mod telemetry;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{CodemodConfig, GroupConfig, ProfileConfig, RuleKind, RuleSpec};
    pub use crate::diff::{DiffSummary, colorized_diff, unified_diff};
    pub use crate::discovery::FileMatcher;
    pub use crate::engine::{Rewrite, RewriteEngine};
    pub use crate::error::{CodemodError, Result};
    pub use crate::inject::{ImportInjector, Injection};
    pub use crate::role::{CallSite, ImportDirective, Renderer, Role};
    pub use crate::rule::{CallRule, PatternRule, RuleCategory, RuleMatch, RuleSet};
    pub use crate::runner::{
        BatchRunner, ExclusionSet, FileChange, FileGroup, FileOutcome, FileReport, FsStore,
        GroupReport, OutcomeCounts, RunEvent, RunReport, SourceStore, groups_from_config,
    };
}

pub use prelude::*;
