//! Verify the external tools are installed before touching the repository.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ToolNames;
use crate::error::GateError;

/// A required tool and where it resolved to, if anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolStatus {
    pub name: String,
    pub path: Option<PathBuf>,
}

/// Resolve every tool on `PATH` (or as given, for names containing a `/`).
pub fn locate_tools(tools: &ToolNames) -> Vec<ToolStatus> {
    let search = std::env::var_os("PATH").unwrap_or_default();
    tools
        .all()
        .iter()
        .map(|name| {
            let path = resolve(name, &search);
            tracing::debug!(tool = name, resolved = ?path, "pre-flight lookup");
            ToolStatus {
                name: name.to_string(),
                path,
            }
        })
        .collect()
}

/// Look `name` up the way a shell would: a name with a path separator is
/// used as is, anything else is searched for in each `search` entry.
pub fn resolve(name: &str, search: &OsStr) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }
    if name.contains(std::path::MAIN_SEPARATOR) {
        let path = PathBuf::from(name);
        return is_executable(&path).then_some(path);
    }
    std::env::split_paths(search)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    let Ok(metadata) = fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

/// # Errors
///
/// Returns `GateError::MissingTools` listing every tool that did not resolve,
/// in pre-flight order.
pub fn require_tools(tools: &ToolNames) -> Result<(), GateError> {
    let missing: Vec<String> = locate_tools(tools)
        .into_iter()
        .filter(|status| status.path.is_none())
        .map(|status| status.name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(GateError::MissingTools(missing))
    }
}
