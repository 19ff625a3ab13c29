//! Idempotent insertion of import directives.

use crate::role::ImportDirective;

/// The result of an injection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Injection {
    pub text: String,
    /// False when the directive was already present.
    pub inserted: bool,
}

/// Ensures a file contains a directive line exactly once.
///
/// New directives go right after the last declaration statement of the
/// file's leading block: the run of declarations, directive prologues
/// (`'use strict';`), blank lines and comments at the top of the file. A file without declarations gets the directive
/// as its first line.
#[derive(Debug, Clone)]
pub struct ImportInjector {
    keyword: String,
}

impl Default for ImportInjector {
    fn default() -> Self {
        Self::new("import ")
    }
}

impl ImportInjector {
    /// Creates an injector recognizing declarations that start with `keyword`.
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
        }
    }

    /// Returns true if any line of the text is the directive.
    pub fn contains(&self, source: &str, directive: &ImportDirective) -> bool {
        source.lines().any(|line| directive.matches_line(line))
    }

    /// Returns the text with the directive present exactly once.
    pub fn inject(&self, source: &str, directive: &ImportDirective) -> Injection {
        if self.contains(source, directive) {
            return Injection {
                text: source.to_string(),
                inserted: false,
            };
        }

        let eol = if source.contains("\r\n") { "\r\n" } else { "\n" };
        let lines: Vec<&str> = source.split_inclusive('\n').collect();
        let at = self.insertion_index(&lines);

        let mut output = String::with_capacity(source.len() + directive.as_str().len() + eol.len());
        for line in &lines[..at] {
            output.push_str(line);
        }
        if at > 0 && !lines[at - 1].ends_with('\n') {
            // The last declaration is also the last, unterminated, line.
            output.push_str(eol);
            output.push_str(directive.as_str());
        } else {
            output.push_str(directive.as_str());
            output.push_str(eol);
        }
        for line in &lines[at..] {
            output.push_str(line);
        }

        Injection {
            text: output,
            inserted: true,
        }
    }

    /// Index of the line the directive is inserted before.
    fn insertion_index(&self, lines: &[&str]) -> usize {
        let mut insert_at = 0;
        // Unclosed braces of the declaration being scanned.
        let mut depth = 0;
        let mut in_comment = false;

        for (idx, raw) in lines.iter().enumerate() {
            let commented = in_comment;
            let code = strip_comments(raw, &mut in_comment);
            let code = code.trim();

            if depth > 0 {
                depth = brace_depth(depth, code);
                if depth == 0 {
                    insert_at = idx + 1;
                }
                continue;
            }

            if !commented && raw.starts_with(&self.keyword) {
                depth = brace_depth(0, code);
                if depth == 0 {
                    insert_at = idx + 1;
                }
                continue;
            }
            if code.is_empty() || is_prologue(code) {
                continue;
            }

            break;
        }

        insert_at
    }
}

/// Returns the line without `//` and `/* */` comments. `in_comment` carries
/// an unclosed block comment over to the next line.
fn strip_comments(line: &str, in_comment: &mut bool) -> String {
    let mut code = String::with_capacity(line.len());
    let mut quote = None;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if *in_comment {
            if c == '*' && chars.peek() == Some(&'/') {
                chars.next();
                *in_comment = false;
            }
            continue;
        }
        if let Some(q) = quote {
            code.push(c);
            if c == '\\' {
                if let Some(escaped) = chars.next() {
                    code.push(escaped);
                }
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' | '`' => {
                quote = Some(c);
                code.push(c);
            }
            '/' if chars.peek() == Some(&'/') => break,
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                *in_comment = true;
            }
            _ => code.push(c),
        }
    }

    code
}

/// Brace depth after a line of code, starting from `depth`.
///
/// Only a `{` left open makes a declaration span lines, as in
/// `import {` ... `} from './x';`.
fn brace_depth(depth: usize, code: &str) -> usize {
    code.chars().fold(depth, |depth, c| match c {
        '{' => depth + 1,
        '}' => depth.saturating_sub(1),
        _ => depth,
    })
}

/// A directive prologue line such as `'use strict';` or `"use client"`.
fn is_prologue(code: &str) -> bool {
    let literal = code.strip_suffix(';').unwrap_or(code).trim_end();
    ['\'', '"'].into_iter().any(|q| {
        literal.len() >= 2
            && literal.starts_with(q)
            && literal.ends_with(q)
            && !literal[1..literal.len() - 1].contains(q)
    })
}
