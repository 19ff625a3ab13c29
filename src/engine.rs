//! The per-file rewrite engine.

use crate::config::CodemodConfig;
use crate::error::{CodemodError, Result};
use crate::inject::ImportInjector;
use crate::role::{ImportDirective, Role};
use crate::rule::RuleSet;
use std::collections::HashMap;

/// The directive and rules that apply to one role.
struct RoleProfile {
    directive: ImportDirective,
    rules: RuleSet,
}

/// The result of rewriting one file's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub text: String,
    pub changed: bool,
    /// Number of call sites replaced.
    pub replacements: usize,
    pub directive_inserted: bool,
}

impl Rewrite {
    fn unchanged(source: &str) -> Self {
        Self {
            text: source.to_string(),
            changed: false,
            replacements: 0,
            directive_inserted: false,
        }
    }
}

/// Rewrites a file's text according to its role.
///
/// The engine holds no per-file state; one instance serves a whole run.
pub struct RewriteEngine {
    injector: ImportInjector,
    profiles: HashMap<Role, RoleProfile>,
}

impl RewriteEngine {
    /// Creates an engine with no role profiles.
    pub fn new(injector: ImportInjector) -> Self {
        Self {
            injector,
            profiles: HashMap::new(),
        }
    }

    /// Registers the directive and rules for a role.
    pub fn profile(mut self, role: Role, directive: ImportDirective, rules: RuleSet) -> Self {
        self.profiles.insert(role, RoleProfile { directive, rules });
        self
    }

    /// Compiles an engine from configuration.
    pub fn from_config(config: &CodemodConfig) -> Result<Self> {
        config.validate()?;

        let mut engine = Self::new(ImportInjector::new(config.declaration_keyword.clone()));
        for (role, profile) in &config.profiles {
            let mut rules = RuleSet::new();
            for spec in &profile.rules {
                let rule = spec.compile(&config.error_identifier, &profile.renderer)?;
                rules.push(Box::new(rule));
            }
            tracing::debug!(%role, rules = ?rules.describe(), "compiled role profile");
            engine = engine.profile(*role, ImportDirective::new(profile.directive.clone()), rules);
        }
        Ok(engine)
    }

    /// Returns true if any of the role's rules match the text.
    pub fn is_applicable(&self, source: &str, role: Role) -> Result<bool> {
        Ok(self.profile_for(role)?.rules.matches_any(source))
    }

    /// Rewrites the text for the given role.
    ///
    /// Text without any matching call site comes back unchanged and without
    /// the directive. On error nothing is returned; the caller keeps its
    /// original text.
    pub fn rewrite(&self, source: &str, role: Role) -> Result<Rewrite> {
        let profile = self.profile_for(role)?;

        if !profile.rules.matches_any(source) {
            return Ok(Rewrite::unchanged(source));
        }

        let injection = self.injector.inject(source, &profile.directive);
        let applied = profile.rules.apply(&injection.text)?;

        Ok(Rewrite {
            changed: applied.text != source,
            replacements: applied.replacements.len(),
            directive_inserted: injection.inserted,
            text: applied.text,
        })
    }

    fn profile_for(&self, role: Role) -> Result<&RoleProfile> {
        self.profiles
            .get(&role)
            .ok_or_else(|| CodemodError::InvalidConfig(format!("no profile configured for role {role}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> RewriteEngine {
        RewriteEngine::from_config(&CodemodConfig::default()).unwrap()
    }

    const CONTROLLER: &str = r#"import { Request, Response } from 'express';
import User from '../models/User';

export const save = async (req: Request, res: Response) => {
  try {
    await User.create(req.body);
    console.log('Saved successfully');
    res.json({ ok: true });
  } catch (error) {
    console.error('Failed to save', error);
    res.status(500).json({ error: 'Server error' });
  }
};
"#;

    #[test]
    fn test_controller_rewrite() {
        let engine = engine();

        let out = engine.rewrite(CONTROLLER, Role::Controller).unwrap();

        assert!(out.changed);
        assert!(out.directive_inserted);
        assert_eq!(out.replacements, 2);
        assert!(out.text.contains("errorLogger.info('Saved successfully', req);"));
        assert!(out.text.contains("errorLogger.error('Failed to save', error as Error, req);"));
        let lines: Vec<&str> = out.text.lines().collect();
        assert_eq!(lines[2], "import errorLogger from '../services/errorLoggerService';");
    }

    #[test]
    fn test_scenario_no_existing_imports() {
        let engine = engine();
        let source = "try {\n  run();\n} catch (error) {\n  console.error('Failed to save', error);\n}\n";

        let out = engine.rewrite(source, Role::Controller).unwrap();

        assert_eq!(
            out.text,
            "import errorLogger from '../services/errorLoggerService';\ntry {\n  run();\n} catch (error) {\n  errorLogger.error('Failed to save', error as Error, req);\n}\n"
        );
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let engine = engine();

        for role in Role::ALL {
            let source = "import x from 'x';\nconsole.error('Update failed', error);\nconsole.log('Done');\n";
            let first = engine.rewrite(source, role).unwrap();
            let second = engine.rewrite(&first.text, role).unwrap();

            assert!(first.changed, "{role} should change on first pass");
            assert!(!second.changed, "{role} changed on second pass");
            assert_eq!(first.text, second.text);
        }
    }

    #[test]
    fn test_no_match_skips_injection() {
        let engine = engine();
        let source = "import x from 'x';\nexport const y = 1;\n";

        let out = engine.rewrite(source, Role::Controller).unwrap();

        assert!(!out.changed);
        assert!(!out.directive_inserted);
        assert_eq!(out.text, source);
        assert!(!out.text.contains("errorLogger"));
        assert!(!engine.is_applicable(source, Role::Controller).unwrap());
    }

    #[test]
    fn test_panel_and_server_services_diverge() {
        let engine = engine();
        let source = "import api from './api';\nconsole.error('Update failed', error);\n";

        let panel = engine.rewrite(source, Role::PanelService).unwrap();
        let server = engine.rewrite(source, Role::ServerService).unwrap();

        assert!(panel.text.contains(
            "errorLogger.error('Update failed', error as Error, { component: 'ServiceName', action: 'methodName' });"
        ));
        assert!(panel.text.contains("import { errorLogger } from './errorLogger.service';"));
        assert!(server.text.contains("logServiceError('ServiceName', 'methodName', error);"));
        assert!(server.text.contains("import { logServiceError } from '../utils/errorLogger';"));
    }

    #[test]
    fn test_services_leave_console_log_alone() {
        let engine = engine();
        let source = "console.log('Loaded');\n";

        let out = engine.rewrite(source, Role::ServerService).unwrap();

        assert!(!out.changed);
    }

    #[test]
    fn test_missing_profile_is_an_error() {
        let engine = RewriteEngine::new(ImportInjector::default());

        let err = engine.rewrite("console.log('x');", Role::Controller).unwrap_err();

        assert!(matches!(err, CodemodError::InvalidConfig(_)));
    }

    #[test]
    fn test_directive_already_present_is_not_duplicated() {
        let engine = engine();
        let source = "import errorLogger from '../services/errorLoggerService';\nconsole.log('Saved');\n";

        let out = engine.rewrite(source, Role::Controller).unwrap();

        assert!(out.changed);
        assert!(!out.directive_inserted);
        assert_eq!(out.text.matches("errorLoggerService").count(), 1);
    }
}
