//! Pattern rules: find call sites in raw text and render their replacements.
//!
//! Rules are purely textual. A [`PatternRule`] reports the byte ranges it
//! matched plus any named captures; a [`RuleSet`] runs its rules in declared
//! order against the same text and splices the rendered replacements in a
//! single pass, so text produced by one rule is never fed back to another.

pub mod call;

pub use call::CallRule;

use crate::error::{CodemodError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of logging call a rule migrates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleCategory {
    /// A failure report carrying an error value.
    LogError,
    /// A plain informational message.
    LogInfo,
    /// An informational message announcing a completed operation.
    LogSuccess,
}

impl RuleCategory {
    /// The structured logger method this category maps to.
    ///
    /// The target facility has no dedicated success level.
    pub fn method(self) -> &'static str {
        match self {
            RuleCategory::LogError => "error",
            RuleCategory::LogInfo | RuleCategory::LogSuccess => "info",
        }
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RuleCategory::LogError => "log-error",
            RuleCategory::LogInfo => "log-info",
            RuleCategory::LogSuccess => "log-success",
        };
        f.write_str(name)
    }
}

/// A single occurrence found by a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub start: usize,
    pub end: usize,
    pub text: String,
    captures: Vec<(String, String)>,
}

impl RuleMatch {
    /// Creates a match covering `start..end` of the scanned text.
    pub fn new(start: usize, end: usize, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            captures: Vec::new(),
        }
    }

    /// Attaches a named capture.
    pub fn with_capture(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.captures.push((name.into(), value.into()));
        self
    }

    /// Returns the value of a named capture, if the rule recorded one.
    pub fn capture(&self, name: &str) -> Option<&str> {
        self.captures
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn overlaps(&self, other: &RuleMatch) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// A rewrite rule over raw source text.
///
/// Implementations must be side-effect free: the same text always yields the
/// same matches. A rule never fails while matching; text it cannot make
/// sense of simply produces no matches.
pub trait PatternRule: Send + Sync {
    /// Short identifier used in logs and errors.
    fn name(&self) -> &str;

    fn category(&self) -> RuleCategory;

    /// Returns all non-overlapping occurrences, in text order.
    fn find_matches(&self, source: &str) -> Vec<RuleMatch>;

    /// Produces the replacement for one of this rule's matches.
    fn render(&self, matched: &RuleMatch) -> Result<String>;

    /// Returns true if the rule matches anywhere in the text.
    fn is_match(&self, source: &str) -> bool {
        !self.find_matches(source).is_empty()
    }
}

/// A rendered replacement ready to be spliced into the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub start: usize,
    pub end: usize,
    pub new_text: String,
    pub rule: String,
}

/// The text produced by applying a rule set.
#[derive(Debug, Clone)]
pub struct Applied {
    pub text: String,
    pub replacements: Vec<Replacement>,
}

/// An ordered collection of rules applied together.
#[derive(Default)]
pub struct RuleSet {
    rules: Vec<Box<dyn PatternRule>>,
}

impl RuleSet {
    /// Creates an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule. Earlier rules win when matches overlap.
    pub fn rule<R: PatternRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Appends an already boxed rule.
    pub fn push(&mut self, rule: Box<dyn PatternRule>) {
        self.rules.push(rule);
    }

    /// Returns true if any rule matches the text.
    pub fn matches_any(&self, source: &str) -> bool {
        self.rules.iter().any(|rule| rule.is_match(source))
    }

    /// Collects the replacements every rule would make, in text order.
    ///
    /// Matches overlapping a region already claimed by an earlier rule are
    /// dropped.
    pub fn plan(&self, source: &str) -> Result<Vec<Replacement>> {
        let mut claimed: Vec<RuleMatch> = Vec::new();
        let mut replacements = Vec::new();

        for rule in &self.rules {
            let matches = rule.find_matches(source);
            tracing::debug!(rule = rule.name(), count = matches.len(), "rule matches");

            for matched in matches {
                if claimed.iter().any(|c| c.overlaps(&matched)) {
                    tracing::debug!(
                        rule = rule.name(),
                        start = matched.start,
                        "match already claimed by an earlier rule"
                    );
                    continue;
                }
                let new_text = rule.render(&matched)?;
                replacements.push(Replacement {
                    start: matched.start,
                    end: matched.end,
                    new_text,
                    rule: rule.name().to_string(),
                });
                claimed.push(matched);
            }
        }

        replacements.sort_by_key(|r| r.start);
        Ok(replacements)
    }

    /// Applies every rule to the text.
    pub fn apply(&self, source: &str) -> Result<Applied> {
        let replacements = self.plan(source)?;
        let text = splice(source, &replacements)?;
        Ok(Applied { text, replacements })
    }

    /// Returns the rule names in declared order.
    pub fn describe(&self) -> Vec<String> {
        self.rules
            .iter()
            .map(|r| format!("{} ({})", r.name(), r.category()))
            .collect()
    }
}

/// Splices sorted, non-overlapping replacements into the text.
fn splice(source: &str, replacements: &[Replacement]) -> Result<String> {
    let mut output = String::with_capacity(source.len());
    let mut cursor = 0;

    for replacement in replacements {
        let valid = replacement.start >= cursor
            && replacement.start <= replacement.end
            && replacement.end <= source.len()
            && source.is_char_boundary(replacement.start)
            && source.is_char_boundary(replacement.end);
        if !valid {
            return Err(CodemodError::RuleApplication {
                rule: replacement.rule.clone(),
                message: format!(
                    "invalid replacement range {}..{}",
                    replacement.start, replacement.end
                ),
            });
        }
        output.push_str(&source[cursor..replacement.start]);
        output.push_str(&replacement.new_text);
        cursor = replacement.end;
    }

    output.push_str(&source[cursor..]);
    Ok(output)
}
