//! Handler for `pupgate check`: run the checkers over explicit files.

use std::path::{Path, PathBuf};

use pupgate_core::preflight::require_tools;
use pupgate_core::snapshot::Snapshot;
use pupgate_core::{check_files, GateConfig, Registry};

use crate::output::Reporter;

pub fn run_check(
    root: Option<&Path>,
    files: &[PathBuf],
    config: &GateConfig,
    reporter: &mut Reporter,
) -> bool {
    if let Err(e) = require_tools(&config.tools) {
        reporter.fatal(&e);
        return false;
    }

    let root = match root {
        Some(r) => r.to_path_buf(),
        None => match std::env::current_dir() {
            Ok(c) => c,
            Err(e) => {
                reporter.error(&format!("Cannot get current directory: {e}"));
                return false;
            }
        },
    };
    if !root.is_dir() {
        reporter.error(&format!("Root directory not found: {}", root.display()));
        return false;
    }

    let relative = files.iter().map(|f| f.strip_prefix(&root).unwrap_or(f.as_path()));
    let snapshot = Snapshot::new(&root, relative);

    let registry = Registry::standard(config);
    let report = check_files(snapshot.root(), snapshot.paths(), &registry);
    reporter.report_run(&report)
}
