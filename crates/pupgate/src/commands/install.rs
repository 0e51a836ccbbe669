//! Handler for `pupgate install`.

use std::path::Path;

use pupgate_core::install::{hooks_dir, install_hook, HookKind, InstallAction};

use crate::output::Reporter;

/// Install the pre-commit (or, with `server`, the update) hook.
pub fn run_install(
    server: bool,
    force: bool,
    git_dir: Option<&Path>,
    reporter: &mut Reporter,
) -> bool {
    let dir = match git_dir {
        Some(d) => d.to_path_buf(),
        None => match std::env::current_dir() {
            Ok(c) => c,
            Err(e) => {
                reporter.error(&format!("Cannot get current directory: {e}"));
                return false;
            }
        },
    };

    let hooks = match hooks_dir(&dir) {
        Ok(h) => h,
        Err(e) => {
            reporter.error(&format!("Not a git repository: {e}"));
            return false;
        }
    };

    let kind = if server {
        HookKind::Update
    } else {
        HookKind::PreCommit
    };

    match install_hook(&hooks, kind, force) {
        Ok(action @ InstallAction::AlreadyInstalled(_)) => {
            reporter.info(&action.to_string());
            true
        }
        Ok(action) => {
            reporter.success(&format!("{action} ({kind} hook)"));
            true
        }
        Err(e) => {
            reporter.error(&format!("Failed to install hook: {e}"));
            false
        }
    }
}
