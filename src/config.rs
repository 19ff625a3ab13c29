//! Serializable configuration for a migration run.

use crate::error::{CodemodError, Result};
use crate::role::{Renderer, Role};
use crate::rule::{CallRule, RuleCategory};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Which built-in call rule to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleKind {
    /// `callee('message', error);`
    ErrorCall,
    /// `callee('message');`
    InfoCall,
}

impl RuleKind {
    fn default_callee(self) -> &'static str {
        match self {
            RuleKind::ErrorCall => "console.error",
            RuleKind::InfoCall => "console.log",
        }
    }

    fn default_category(self) -> RuleCategory {
        match self {
            RuleKind::ErrorCall => RuleCategory::LogError,
            RuleKind::InfoCall => RuleCategory::LogInfo,
        }
    }
}

/// A rule entry in a role profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub kind: RuleKind,

    /// The call to match, e.g. `console.warn`. Defaults per kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callee: Option<String>,

    /// Overrides the category the kind implies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<RuleCategory>,
}

impl RuleSpec {
    pub fn new(kind: RuleKind) -> Self {
        Self {
            kind,
            callee: None,
            category: None,
        }
    }

    pub fn category(&self) -> RuleCategory {
        self.category.unwrap_or_else(|| self.kind.default_category())
    }

    /// Builds the rule with the given renderer.
    pub fn compile(&self, error_identifier: &str, renderer: &Renderer) -> Result<CallRule> {
        let callee = self
            .callee
            .as_deref()
            .unwrap_or_else(|| self.kind.default_callee());
        let rule = match self.kind {
            RuleKind::ErrorCall => CallRule::error_call(callee, error_identifier, renderer.clone())?,
            RuleKind::InfoCall => CallRule::info_call(callee, renderer.clone())?,
        };
        Ok(rule.with_category(self.category()))
    }
}

/// The directive, renderer and rules for one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub directive: String,
    pub renderer: Renderer,
    pub rules: Vec<RuleSpec>,
}

/// A directory of files sharing a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Name shown in progress output, e.g. `controllers`.
    pub name: String,

    pub role: Role,

    /// Directory relative to the run root.
    pub dir: String,

    /// File name glob, matched non-recursively.
    #[serde(default = "default_pattern")]
    pub pattern: String,

    /// File names (not paths) that are already migrated.
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_pattern() -> String {
    "*.ts".to_string()
}

/// A complete run configuration.
///
/// # Example YAML
///
/// ```yaml
/// declaration_keyword: "import "
/// error_identifier: error
/// follow_up: bash check-error-logging.sh
/// groups:
///   - name: controllers
///     role: controller
///     dir: server/src/controllers
///     exclude: [authController.ts]
/// profiles:
///   controller:
///     directive: import errorLogger from '../services/errorLoggerService';
///     renderer:
///       kind: request-scoped
///       logger: errorLogger
///       context: req
///     rules:
///       - kind: error-call
///       - kind: info-call
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodemodConfig {
    /// Prefix identifying declaration lines.
    #[serde(default = "default_keyword")]
    pub declaration_keyword: String,

    /// Identifier the error-call rule expects as second argument.
    #[serde(default = "default_error_identifier")]
    pub error_identifier: String,

    /// Command suggested once the run completes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up: Option<String>,

    /// Groups, processed in order.
    pub groups: Vec<GroupConfig>,

    pub profiles: BTreeMap<Role, ProfileConfig>,
}

fn default_keyword() -> String {
    "import ".to_string()
}

fn default_error_identifier() -> String {
    "error".to_string()
}

impl Default for CodemodConfig {
    fn default() -> Self {
        let groups = vec![
            GroupConfig {
                name: "controllers".to_string(),
                role: Role::Controller,
                dir: "server/src/controllers".to_string(),
                pattern: default_pattern(),
                exclude: vec![
                    "errorLogController.ts".to_string(),
                    "ticketController.ts".to_string(),
                    "authController.ts".to_string(),
                    "userController.ts".to_string(),
                ],
            },
            GroupConfig {
                name: "server services".to_string(),
                role: Role::ServerService,
                dir: "server/src/services".to_string(),
                pattern: default_pattern(),
                exclude: vec!["errorLoggerService.ts".to_string()],
            },
            GroupConfig {
                name: "panel services".to_string(),
                role: Role::PanelService,
                dir: "panel/src/services".to_string(),
                pattern: default_pattern(),
                exclude: vec!["errorLogger.service.ts".to_string()],
            },
        ];

        let mut profiles = BTreeMap::new();
        profiles.insert(
            Role::Controller,
            ProfileConfig {
                directive: "import errorLogger from '../services/errorLoggerService';".to_string(),
                renderer: Renderer::RequestScoped {
                    logger: "errorLogger".to_string(),
                    context: "req".to_string(),
                },
                rules: vec![
                    RuleSpec::new(RuleKind::ErrorCall),
                    RuleSpec::new(RuleKind::InfoCall),
                ],
            },
        );
        profiles.insert(
            Role::ServerService,
            ProfileConfig {
                directive: "import { logServiceError } from '../utils/errorLogger';".to_string(),
                renderer: Renderer::ServiceFunction {
                    function: "logServiceError".to_string(),
                    component: "ServiceName".to_string(),
                    method: "methodName".to_string(),
                },
                rules: vec![RuleSpec::new(RuleKind::ErrorCall)],
            },
        );
        profiles.insert(
            Role::PanelService,
            ProfileConfig {
                directive: "import { errorLogger } from './errorLogger.service';".to_string(),
                renderer: Renderer::ComponentContext {
                    logger: "errorLogger".to_string(),
                    component: "ServiceName".to_string(),
                    action: "methodName".to_string(),
                },
                rules: vec![RuleSpec::new(RuleKind::ErrorCall)],
            },
        );

        Self {
            declaration_keyword: default_keyword(),
            error_identifier: default_error_identifier(),
            follow_up: Some("bash check-error-logging.sh".to_string()),
            groups,
            profiles,
        }
    }
}

impl CodemodConfig {
    /// Checks the configuration for mistakes that would only surface mid-run.
    pub fn validate(&self) -> Result<()> {
        if self.groups.is_empty() {
            return Err(CodemodError::InvalidConfig("no groups configured".into()));
        }
        if self.declaration_keyword.is_empty() {
            return Err(CodemodError::InvalidConfig(
                "declaration_keyword must not be empty".into(),
            ));
        }
        if self.error_identifier.trim().is_empty() {
            return Err(CodemodError::InvalidConfig(
                "error_identifier must not be empty".into(),
            ));
        }

        let mut names = HashSet::new();
        for group in &self.groups {
            if !names.insert(group.name.as_str()) {
                return Err(CodemodError::InvalidConfig(format!(
                    "duplicate group name '{}'",
                    group.name
                )));
            }
            if !self.profiles.contains_key(&group.role) {
                return Err(CodemodError::InvalidConfig(format!(
                    "group '{}' uses role {} which has no profile",
                    group.name, group.role
                )));
            }
        }

        for (role, profile) in &self.profiles {
            if profile.directive.trim().is_empty() {
                return Err(CodemodError::InvalidConfig(format!(
                    "profile {role} has an empty directive"
                )));
            }
            if profile.directive.contains('\n') {
                return Err(CodemodError::InvalidConfig(format!(
                    "profile {role} directive must be a single line"
                )));
            }
            for spec in &profile.rules {
                if !profile.renderer.supports(spec.category()) {
                    return Err(CodemodError::InvalidConfig(format!(
                        "profile {role}: renderer cannot express {} calls",
                        spec.category()
                    )));
                }
            }
        }

        Ok(())
    }

    /// Loads a config, choosing the format from the file extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(path),
            Some("json") => Self::from_json(path),
            _ => Err(CodemodError::InvalidConfig(format!(
                "unsupported config format: {}",
                path.display()
            ))),
        }
    }

    /// Load config from a YAML file.
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        serde_yaml::from_str(&content).map_err(|e| {
            CodemodError::InvalidConfig(format!("Failed to parse YAML config: {}", e))
        })
    }

    /// Load config from a JSON file.
    pub fn from_json(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        serde_json::from_str(&content).map_err(|e| {
            CodemodError::InvalidConfig(format!("Failed to parse JSON config: {}", e))
        })
    }

    /// Serialize to YAML.
    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            CodemodError::InvalidConfig(format!("Failed to serialize config: {}", e))
        })
    }

    /// Serialize to pretty JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| CodemodError::Read {
        path: path.to_path_buf(),
        source: e,
    })
}
