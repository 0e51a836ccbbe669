//! Native git hook installation.
//!
//! Writes a small shell script into the repository's hooks directory that
//! hands over to `pupgate hook <mode>`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::GateError;
use crate::git::git_path;

/// Which hook to install.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    /// Client-side `pre-commit`.
    PreCommit,
    /// Server-side `update`.
    Update,
}

impl HookKind {
    pub fn name(&self) -> &'static str {
        match self {
            HookKind::PreCommit => "pre-commit",
            HookKind::Update => "update",
        }
    }
}

impl std::fmt::Display for HookKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Marker line used to recognise hooks written by this tool.
const HOOK_MARKER: &str = "# installed by pupgate";

const HOOK_TEMPLATE: &str = "#!/bin/sh\n{marker}\nexec pupgate hook {hook} \"$@\"\n";

/// What [`install_hook`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallAction {
    Created(PathBuf),
    Replaced(PathBuf),
    AlreadyInstalled(PathBuf),
}

impl std::fmt::Display for InstallAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstallAction::Created(p) => write!(f, "Created {}", p.display()),
            InstallAction::Replaced(p) => write!(f, "Replaced {}", p.display()),
            InstallAction::AlreadyInstalled(p) => write!(f, "Already installed: {}", p.display()),
        }
    }
}

/// The hooks directory of the repository containing `dir`, honouring
/// `core.hooksPath`.
pub fn hooks_dir(dir: &Path) -> Result<PathBuf, GateError> {
    git_path(dir, "hooks")
}

pub fn hook_script(kind: HookKind) -> String {
    HOOK_TEMPLATE
        .replace("{marker}", HOOK_MARKER)
        .replace("{hook}", kind.name())
}

/// Write the hook script for `kind` into `hooks_dir`.
///
/// # Errors
///
/// Returns `GateError::Other` if a hook not written by pupgate already exists
/// and `force` is not set, or `GateError::Io` if the file cannot be written.
pub fn install_hook(hooks_dir: &Path, kind: HookKind, force: bool) -> Result<InstallAction, GateError> {
    fs::create_dir_all(hooks_dir)?;
    let hook_path = hooks_dir.join(kind.name());

    let replacing = if hook_path.exists() {
        let existing = fs::read_to_string(&hook_path).unwrap_or_default();
        if existing.contains(HOOK_MARKER) {
            return Ok(InstallAction::AlreadyInstalled(hook_path));
        }
        if !force {
            return Err(GateError::Other(format!(
                "{} already exists and was not written by pupgate (use --force to replace it)",
                hook_path.display()
            )));
        }
        true
    } else {
        false
    };

    fs::write(&hook_path, hook_script(kind))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&hook_path, fs::Permissions::from_mode(0o755))?;
    }

    Ok(if replacing {
        InstallAction::Replaced(hook_path)
    } else {
        InstallAction::Created(hook_path)
    })
}
