use crate::config::GateConfig;
use crate::types::Category;

use super::{CommandChecker, FailureSignal, Stage};

/// `erb -P -x -T - <file> | ruby -c`: compile the template to Ruby and let the
/// interpreter syntax-check the result.
pub fn template_syntax(config: &GateConfig) -> CommandChecker {
    CommandChecker::new(
        Category::TemplateSyntax,
        Stage::new(&config.tools.erb).args(["-P", "-x", "-T", "-"]).file(),
        FailureSignal::ExitCode,
    )
    .pipe(Stage::new(&config.tools.ruby).arg("-c"))
    .with_timeout(config.timeout())
}
