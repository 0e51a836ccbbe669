//! CLI handlers for the two git hook modes.
//!
//! Handles:
//! - `pre-commit` / `pupgate hook pre-commit`
//! - `update <ref> <old> <new>` / `pupgate hook update <ref> <old> <new>`
//!
//! Both verify the external tools first, so a broken installation fails
//! before the repository is touched.

use pupgate_core::git::toplevel;
use pupgate_core::preflight::require_tools;
use pupgate_core::snapshot::{with_pushed_snapshot, with_staged_snapshot, PushUpdate};
use pupgate_core::{check_files, GateConfig, Registry};

use crate::cli::UpdateArgs;
use crate::output::Reporter;

/// Check the staged content of the current repository.
pub fn run_pre_commit(config: &GateConfig, reporter: &mut Reporter) -> bool {
    if let Err(e) = require_tools(&config.tools) {
        reporter.fatal(&e);
        return false;
    }

    let cwd = match std::env::current_dir() {
        Ok(c) => c,
        Err(e) => {
            reporter.error(&format!("Cannot get current directory: {e}"));
            return false;
        }
    };
    let repo = match toplevel(&cwd) {
        Ok(r) => r,
        Err(e) => {
            reporter.fatal(&e);
            return false;
        }
    };

    let registry = Registry::standard(config);
    let result = with_staged_snapshot(&repo, |snapshot| {
        check_files(snapshot.root(), snapshot.paths(), &registry)
    });

    match result {
        Ok(report) => reporter.report_run(&report),
        Err(e) => {
            reporter.fatal(&e);
            false
        }
    }
}

/// Check a pushed revision. The current directory is the (usually bare)
/// repository git runs the hook in.
pub fn run_update(args: &UpdateArgs, config: &GateConfig, reporter: &mut Reporter) -> bool {
    if let Err(e) = require_tools(&config.tools) {
        reporter.fatal(&e);
        return false;
    }

    let update = match PushUpdate::parse(&args.refname, &args.old, &args.new) {
        Ok(u) => u,
        Err(e) => {
            reporter.fatal(&e);
            return false;
        }
    };

    let repo = match std::env::current_dir() {
        Ok(c) => c,
        Err(e) => {
            reporter.error(&format!("Cannot get current directory: {e}"));
            return false;
        }
    };

    let registry = Registry::standard(config);
    let result = with_pushed_snapshot(&repo, &update, |snapshot| {
        check_files(snapshot.root(), snapshot.paths(), &registry)
    });

    match result {
        Ok(Some(report)) => {
            let passed = reporter.report_run(&report);
            if !passed {
                reporter.info(&format!("Push to {} rejected", update.refname));
            }
            passed
        }
        Ok(None) => true,
        Err(e) => {
            reporter.fatal(&e);
            false
        }
    }
}
