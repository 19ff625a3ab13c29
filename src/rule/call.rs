//! Regex rules for ad-hoc logging calls such as `console.error('msg', error);`.

use super::{PatternRule, RuleCategory, RuleMatch};
use crate::error::Result;
use crate::role::{CallSite, Renderer};
use regex::Regex;

/// A quoted message literal on a single line. Escaped quotes are allowed;
/// an unterminated literal does not match.
const MESSAGE_LITERAL: &str = r#"'(?:[^'\\\n]|\\.)+'|"(?:[^"\\\n]|\\.)+""#;

/// Matches calls to a logging function and rewrites them with a [`Renderer`].
pub struct CallRule {
    name: String,
    category: RuleCategory,
    pattern: Regex,
    renderer: Renderer,
}

impl CallRule {
    /// Recognizes `callee('message', <error_ident>);`.
    pub fn error_call(callee: &str, error_ident: &str, renderer: Renderer) -> Result<Self> {
        let pattern = format!(
            r"{}\((?P<message>{MESSAGE_LITERAL}),\s*(?P<error>{})\);",
            callee_pattern(callee),
            regex::escape(error_ident),
        );
        Ok(Self {
            name: format!("{callee}-error-call"),
            category: RuleCategory::LogError,
            pattern: Regex::new(&pattern)?,
            renderer,
        })
    }

    /// Recognizes `callee('message');`.
    pub fn info_call(callee: &str, renderer: Renderer) -> Result<Self> {
        let pattern = format!(
            r"{}\((?P<message>{MESSAGE_LITERAL})\);",
            callee_pattern(callee)
        );
        Ok(Self {
            name: format!("{callee}-info-call"),
            category: RuleCategory::LogInfo,
            pattern: Regex::new(&pattern)?,
            renderer,
        })
    }

    /// Overrides the category the rule reports and renders with.
    pub fn with_category(mut self, category: RuleCategory) -> Self {
        self.category = category;
        self
    }
}

/// The escaped callee, anchored on a word boundary when it starts with a
/// word character. Before a callee like `$log` a `\b` would require a
/// preceding word character.
fn callee_pattern(callee: &str) -> String {
    let escaped = regex::escape(callee);
    match callee.chars().next() {
        Some(c) if c.is_alphanumeric() || c == '_' => format!(r"\b{escaped}"),
        _ => escaped,
    }
}

impl PatternRule for CallRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> RuleCategory {
        self.category
    }

    fn find_matches(&self, source: &str) -> Vec<RuleMatch> {
        self.pattern
            .captures_iter(source)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let message = caps.name("message")?;
                let mut matched = RuleMatch::new(whole.start(), whole.end(), whole.as_str())
                    .with_capture("message", message.as_str());
                if let Some(error) = caps.name("error") {
                    matched = matched.with_capture("error", error.as_str());
                }
                Some(matched)
            })
            .collect()
    }

    fn render(&self, matched: &RuleMatch) -> Result<String> {
        let site = CallSite {
            message: matched.capture("message").unwrap_or("''"),
            error: matched.capture("error"),
        };
        self.renderer.render(self.category, &site)
    }

    fn is_match(&self, source: &str) -> bool {
        self.pattern.is_match(source)
    }
}
