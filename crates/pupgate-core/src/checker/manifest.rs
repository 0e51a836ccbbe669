use crate::config::GateConfig;
use crate::types::Category;

use super::{CommandChecker, FailureSignal, Stage};

/// `puppet parser validate <file>`.
pub fn manifest_syntax(config: &GateConfig) -> CommandChecker {
    CommandChecker::new(
        Category::ManifestSyntax,
        Stage::new(&config.tools.puppet)
            .args(["parser", "validate", "--color=false"])
            .file(),
        FailureSignal::ExitCode,
    )
    .with_timeout(config.timeout())
}

/// `puppet-lint <lint_args...> <file>`.
pub fn manifest_style(config: &GateConfig) -> CommandChecker {
    CommandChecker::new(
        Category::ManifestStyle,
        Stage::new(&config.tools.puppet_lint)
            .args(config.lint_args.iter().cloned())
            .file(),
        FailureSignal::ExitCode,
    )
    .with_timeout(config.timeout())
}
