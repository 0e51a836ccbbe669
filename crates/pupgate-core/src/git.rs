//! Thin wrappers around the `git` command line.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::GateError;

fn describe(args: &[&str]) -> String {
    args.first().copied().unwrap_or_default().to_string()
}

/// Run `git <args>` in `repo` and return raw stdout.
///
/// # Errors
///
/// Returns `GateError::Git` if git cannot be launched or exits non-zero.
pub fn git_bytes(repo: &Path, args: &[&str]) -> Result<Vec<u8>, GateError> {
    tracing::debug!(repo = %repo.display(), ?args, "running git");
    let output = Command::new("git")
        .args(args)
        .current_dir(repo)
        .output()
        .map_err(|e| GateError::Git {
            command: describe(args),
            message: format!("failed to run git: {e}"),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(GateError::Git {
            command: describe(args),
            message: stderr.trim().to_string(),
        });
    }

    Ok(output.stdout)
}

/// Run `git <args>` in `repo` and return stdout as text.
pub fn git(repo: &Path, args: &[&str]) -> Result<String, GateError> {
    git_bytes(repo, args).map(|out| String::from_utf8_lossy(&out).into_owned())
}

/// Run `git <args>` in `repo` with `input` on stdin.
pub fn git_with_input(repo: &Path, args: &[&str], input: &[u8]) -> Result<(), GateError> {
    tracing::debug!(repo = %repo.display(), ?args, bytes = input.len(), "running git with input");
    let output = duct::cmd("git", args.iter().copied())
        .dir(repo)
        .stdin_bytes(input)
        .stdout_null()
        .stderr_capture()
        .unchecked()
        .run()
        .map_err(|e| GateError::Git {
            command: describe(args),
            message: format!("failed to run git: {e}"),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(GateError::Git {
            command: describe(args),
            message: stderr.trim().to_string(),
        });
    }
    Ok(())
}

/// Split `-z` style NUL-separated path output.
///
/// Paths are taken byte for byte, so names with spaces, quotes or bytes that
/// are not valid UTF-8 still name the file git stores.
pub fn split_paths(output: &[u8]) -> Vec<PathBuf> {
    output
        .split(|b| *b == 0)
        .filter(|p| !p.is_empty())
        .map(path_from_bytes)
        .collect()
}

#[cfg(unix)]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(std::ffi::OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}

/// Paths staged in the index relative to `HEAD`.
pub fn staged_paths(repo: &Path) -> Result<Vec<PathBuf>, GateError> {
    git_bytes(repo, &["diff", "--cached", "--name-only", "-z"]).map(|out| split_paths(&out))
}

/// Whether `HEAD` resolves to a commit. False on an unborn branch.
pub fn has_head(repo: &Path) -> Result<bool, GateError> {
    let output = Command::new("git")
        .args(["rev-parse", "-q", "--verify", "HEAD^{commit}"])
        .current_dir(repo)
        .output()
        .map_err(|e| GateError::Git {
            command: "rev-parse".into(),
            message: format!("failed to run git: {e}"),
        })?;
    Ok(output.status.success())
}

/// Location of `name` inside the repository's git directory.
pub fn git_path(repo: &Path, name: &str) -> Result<PathBuf, GateError> {
    let out = git(repo, &["rev-parse", "--git-path", name])?;
    let path = PathBuf::from(out.trim());
    Ok(if path.is_absolute() {
        path
    } else {
        repo.join(path)
    })
}

/// Top of the work tree containing `dir`.
pub fn toplevel(dir: &Path) -> Result<PathBuf, GateError> {
    git(dir, &["rev-parse", "--show-toplevel"]).map(|out| PathBuf::from(out.trim()))
}

/// The id `refs/stash` currently points at, if any.
pub fn stash_top(repo: &Path) -> Result<Option<String>, GateError> {
    let output = Command::new("git")
        .args(["rev-parse", "-q", "--verify", "refs/stash"])
        .current_dir(repo)
        .output()
        .map_err(|e| GateError::Git {
            command: "rev-parse".into(),
            message: format!("failed to run git: {e}"),
        })?;

    // rev-parse --verify exits 1 when the ref does not exist
    if !output.status.success() {
        return Ok(None);
    }
    let id = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Ok((!id.is_empty()).then_some(id))
}
