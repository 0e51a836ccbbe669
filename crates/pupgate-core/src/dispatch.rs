//! Extension-based routing of files to checkers.

use std::path::Path;

use crate::checker::{self, Checker};
use crate::config::GateConfig;
use crate::types::CheckResult;

struct Route {
    /// Lowercase suffix including the dot, e.g. `.pp`.
    suffix: String,
    checkers: Vec<Box<dyn Checker>>,
}

/// Maps file suffixes to the ordered checkers that apply to them.
#[derive(Default)]
pub struct Registry {
    routes: Vec<Route>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock routing: manifests get syntax then style, templates and
    /// data files get a syntax check.
    pub fn standard(config: &GateConfig) -> Self {
        let mut registry = Self::new();
        registry.register(".pp", checker::manifest_syntax(config));
        registry.register(".pp", checker::manifest_style(config));
        registry.register(".erb", checker::template_syntax(config));
        registry.register(".yaml", checker::data_syntax(config));
        registry
    }

    /// Append `checker` to the checkers for `suffix`. Checkers registered for
    /// the same suffix run in registration order.
    pub fn register<C>(&mut self, suffix: &str, checker: C)
    where
        C: Checker + 'static,
    {
        let suffix = suffix.to_ascii_lowercase();
        match self.routes.iter_mut().find(|r| r.suffix == suffix) {
            Some(route) => route.checkers.push(Box::new(checker)),
            None => self.routes.push(Route {
                suffix,
                checkers: vec![Box::new(checker)],
            }),
        }
    }

    /// Checkers that apply to `path`, in run order. Empty for unrecognized files.
    pub fn checkers_for(&self, path: &Path) -> Vec<&dyn Checker> {
        let name = path.to_string_lossy().to_ascii_lowercase();
        self.routes
            .iter()
            .filter(|route| name.ends_with(&route.suffix))
            .flat_map(|route| route.checkers.iter().map(|c| c.as_ref()))
            .collect()
    }

    pub fn is_recognized(&self, path: &Path) -> bool {
        !self.checkers_for(path).is_empty()
    }

    /// Run every applicable checker against `path`. Each checker runs
    /// regardless of earlier failures.
    pub fn classify_and_run(&self, root: &Path, path: &Path) -> Vec<CheckResult> {
        self.checkers_for(path)
            .into_iter()
            .map(|checker| checker.check(root, path))
            .collect()
    }
}
