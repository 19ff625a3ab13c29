//! File roles and the role-specific rendering conventions.

use crate::error::{CodemodError, Result};
use crate::rule::RuleCategory;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The structural category of a source file.
///
/// The role is supplied by the caller (usually from the directory a file
/// lives in) and never inferred from content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Controller,
    ServerService,
    PanelService,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Controller, Role::ServerService, Role::PanelService];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Controller => "controller",
            Role::ServerService => "server-service",
            Role::PanelService => "panel-service",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| {
                format!("unknown role '{s}' (expected controller, server-service or panel-service)")
            })
    }
}

/// A single declaration line giving a file access to the logging facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImportDirective(String);

impl ImportDirective {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if `line` is this directive, ignoring surrounding whitespace.
    pub fn matches_line(&self, line: &str) -> bool {
        line.trim() == self.0.trim()
    }
}

impl fmt::Display for ImportDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The pieces of a matched logging call a renderer can use.
#[derive(Debug, Clone, Copy)]
pub struct CallSite<'a> {
    /// The message literal, quotes included.
    pub message: &'a str,
    /// The error identifier passed alongside the message, if any.
    pub error: Option<&'a str>,
}

/// How a matched call is rewritten for a role.
///
/// Each variant is a different target convention; they are not
/// interchangeable. Service files, for instance, have no request in scope,
/// so the server variant reports placeholder names instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Renderer {
    /// `logger.error(msg, err as Error, req);` with a request value in scope.
    RequestScoped { logger: String, context: String },

    /// `logger.error(msg, err as Error, { component: '..', action: '..' });`
    ComponentContext {
        logger: String,
        component: String,
        action: String,
    },

    /// `logServiceError('Component', 'method', err);`
    ///
    /// The message literal is dropped. Only error calls can be rendered.
    ServiceFunction {
        function: String,
        component: String,
        method: String,
    },
}

impl Renderer {
    /// Renders the replacement call for a matched site.
    pub fn render(&self, category: RuleCategory, site: &CallSite<'_>) -> Result<String> {
        let method = category.method();
        let error_arg = site.error.map(|e| format!(", {e} as Error")).unwrap_or_default();

        match self {
            Renderer::RequestScoped { logger, context } => Ok(format!(
                "{logger}.{method}({}{error_arg}, {context});",
                site.message
            )),
            Renderer::ComponentContext {
                logger,
                component,
                action,
            } => Ok(format!(
                "{logger}.{method}({}{error_arg}, {{ component: '{component}', action: '{action}' }});",
                site.message
            )),
            Renderer::ServiceFunction {
                function,
                component,
                method: service_method,
            } => {
                let error = site.error.ok_or_else(|| CodemodError::RuleApplication {
                    rule: "service-function".to_string(),
                    message: format!("{function} needs an error value, found none"),
                })?;
                Ok(format!("{function}('{component}', '{service_method}', {error});"))
            }
        }
    }

    /// Returns true if the renderer can express calls of this category.
    pub fn supports(&self, category: RuleCategory) -> bool {
        match self {
            Renderer::ServiceFunction { .. } => category == RuleCategory::LogError,
            _ => true,
        }
    }
}
