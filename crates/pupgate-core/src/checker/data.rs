use crate::config::GateConfig;
use crate::types::Category;

use super::{CommandChecker, FailureSignal, Stage};

// Load errors are rescued and printed to stderr, so the interpreter always
// exits 0 and stderr is the only failure signal.
const LOAD_YAML: &str = "require 'yaml'; \
begin; YAML.load_file(ARGV[0]); \
rescue Exception => e; STDERR.puts \"#{ARGV[0]}: #{e.message}\"; end";

/// Parse a YAML data file with Ruby's loader.
pub fn data_syntax(config: &GateConfig) -> CommandChecker {
    CommandChecker::new(
        Category::DataSyntax,
        Stage::new(&config.tools.ruby).args(["-e", LOAD_YAML]).file(),
        FailureSignal::Stderr,
    )
    .with_timeout(config.timeout())
}
