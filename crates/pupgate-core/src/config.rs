//! Hook configuration.
//!
//! Configuration lives in an optional `.pupgate.json` at the repository root.
//! Every field has a default, so a repository without the file runs with the
//! stock tool names. Environment variables override file values, which lets a
//! server-side installation point at tools outside `PATH` without committing
//! anything.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::GateError;

pub const CONFIG_FILE_NAME: &str = ".pupgate.json";

const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Names (or paths) of the external tools the checkers shell out to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolNames {
    pub puppet: String,
    pub puppet_lint: String,
    pub ruby: String,
    pub erb: String,
}

impl Default for ToolNames {
    fn default() -> Self {
        Self {
            puppet: "puppet".to_string(),
            puppet_lint: "puppet-lint".to_string(),
            ruby: "ruby".to_string(),
            erb: "erb".to_string(),
        }
    }
}

impl ToolNames {
    /// All tools in pre-flight order.
    pub fn all(&self) -> [&str; 4] {
        [&self.puppet, &self.puppet_lint, &self.ruby, &self.erb]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorPreference {
    #[default]
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GateConfig {
    pub tools: ToolNames,
    /// Extra flags passed to `puppet-lint` ahead of the file path.
    pub lint_args: Vec<String>,
    /// Per-checker timeout. `0` waits forever.
    pub timeout_secs: u64,
    pub color: ColorPreference,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            tools: ToolNames::default(),
            lint_args: vec!["--fail-on-warnings".to_string()],
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            color: ColorPreference::Auto,
        }
    }
}

impl GateConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Apply `PUPGATE_*` overrides from `lookup`.
    ///
    /// `lookup` is injected so tests do not have to mutate the process
    /// environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), GateError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let tool_vars: [(&str, &mut String); 4] = [
            ("PUPGATE_PUPPET", &mut self.tools.puppet),
            ("PUPGATE_PUPPET_LINT", &mut self.tools.puppet_lint),
            ("PUPGATE_RUBY", &mut self.tools.ruby),
            ("PUPGATE_ERB", &mut self.tools.erb),
        ];
        for (var, slot) in tool_vars {
            if let Some(value) = lookup(var).filter(|v| !v.trim().is_empty()) {
                *slot = value;
            }
        }

        if let Some(value) = lookup("PUPGATE_TIMEOUT") {
            self.timeout_secs = value.trim().parse().map_err(|_| GateError::Config {
                path: PathBuf::from("PUPGATE_TIMEOUT"),
                message: format!("expected a number of seconds, got '{value}'"),
            })?;
        }

        Ok(())
    }
}

/// Walk up from `start_dir` looking for `.pupgate.json`.
///
/// The search stops at the first directory that contains `.git` (a work tree
/// root) or looks like a bare repository (contains `HEAD` and `objects`).
pub fn discover_config(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.canonicalize().ok()?;

    loop {
        let candidate = current.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }

        let is_repo_root = current.join(".git").exists()
            || (current.join("HEAD").is_file() && current.join("objects").is_dir());
        if is_repo_root {
            return None;
        }

        match current.parent() {
            Some(parent) if parent != current => current = parent.to_path_buf(),
            _ => return None,
        }
    }
}

pub fn load_config(path: &Path) -> Result<GateConfig, GateError> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| GateError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Resolve the effective configuration for a hook run.
///
/// An explicit path must exist; a discovered one is optional. Environment
/// overrides are applied last.
pub fn resolve_config(explicit: Option<&Path>, cwd: &Path) -> Result<GateConfig, GateError> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => discover_config(cwd),
    };

    let mut config = match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            load_config(&path)?
        }
        None => GateConfig::default(),
    };

    config.apply_env(|var| std::env::var(var).ok())?;
    Ok(config)
}
