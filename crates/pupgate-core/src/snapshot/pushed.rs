//! Update-hook snapshot: the pushed revision extracted to a temporary
//! directory.
//!
//! A server-side repository is usually bare, so there is no work tree to
//! check. The new revision is exported with `git archive` and unpacked into a
//! directory owned by [`PushedSnapshot`]. That directory is removed when the
//! snapshot is closed, or dropped on an error path.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::GateError;
use crate::git::{git_bytes, split_paths};
use crate::types::Revision;

use super::Snapshot;

/// The three arguments git passes to an `update` hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushUpdate {
    pub refname: String,
    pub old: Revision,
    pub new: Revision,
}

impl PushUpdate {
    pub fn parse(refname: &str, old: &str, new: &str) -> Result<Self, GateError> {
        Ok(Self {
            refname: refname.to_string(),
            old: old.parse()?,
            new: new.parse()?,
        })
    }

    /// The ref is being deleted; there is nothing to check.
    pub fn is_deletion(&self) -> bool {
        self.new.is_null()
    }

    /// The ref is being created; every file in the new revision is a candidate.
    pub fn is_creation(&self) -> bool {
        self.old.is_null()
    }
}

/// Paths touched by `update`, as git lists them.
///
/// For a new ref every file in the new tree is listed, since there is no
/// previous revision to diff against. [`Snapshot::new`] takes care of
/// ordering and duplicates.
pub fn changed_paths(repo: &Path, update: &PushUpdate) -> Result<Vec<PathBuf>, GateError> {
    let new = update.new.as_str();
    let output = if update.is_creation() {
        git_bytes(repo, &["ls-tree", "-r", "--name-only", "-z", new])?
    } else {
        git_bytes(
            repo,
            &["diff", "--name-only", "--no-renames", "-z", update.old.as_str(), new],
        )?
    };

    Ok(split_paths(&output))
}

/// The tree of a revision unpacked into a private temporary directory.
pub struct PushedSnapshot {
    dir: TempDir,
    snapshot: Snapshot,
}

impl PushedSnapshot {
    /// Export `revision` from `repo` into a fresh temporary directory.
    ///
    /// # Errors
    ///
    /// Returns `GateError::Archive` if the archive cannot be produced or
    /// unpacked. The partially filled directory is removed before returning.
    pub fn materialize(
        repo: &Path,
        revision: &Revision,
        paths: Vec<PathBuf>,
    ) -> Result<Self, GateError> {
        let dir = tempfile::Builder::new().prefix("pupgate-").tempdir()?;
        extract_revision(repo, revision, dir.path())?;

        tracing::debug!(
            revision = %revision,
            dir = %dir.path().display(),
            "extracted pushed revision"
        );

        let snapshot = Snapshot::new(dir.path(), paths);
        Ok(Self { dir, snapshot })
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Delete the temporary directory.
    ///
    /// # Errors
    ///
    /// Returns `GateError::Cleanup` if the directory cannot be removed.
    pub fn close(self) -> Result<(), GateError> {
        let path = self.dir.path().to_path_buf();
        self.dir
            .close()
            .map_err(|source| GateError::Cleanup { path, source })
    }
}

/// Unpack the tree of `revision` into `dest`.
fn extract_revision(repo: &Path, revision: &Revision, dest: &Path) -> Result<(), GateError> {
    let archive_error = |message: String| GateError::Archive {
        revision: revision.to_string(),
        message,
    };

    let output = duct::cmd("git", ["archive", "--format=tar", revision.as_str()])
        .dir(repo)
        .pipe(duct::cmd("tar", ["-x", "-f", "-"]).dir(dest))
        .stdout_null()
        .stderr_capture()
        .unchecked()
        .run()
        .map_err(|e| archive_error(e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(archive_error(stderr.trim().to_string()));
    }
    Ok(())
}

/// Run `check` against the tree of a pushed revision.
///
/// Returns `Ok(None)` without touching the repository when the push deletes
/// the ref. Otherwise the temporary directory is removed before returning,
/// whatever `check` decides.
///
/// # Errors
///
/// Returns an error if the changed file list cannot be computed, the revision
/// cannot be extracted, or the temporary directory cannot be removed.
pub fn with_pushed_snapshot<T, F>(
    repo: &Path,
    update: &PushUpdate,
    check: F,
) -> Result<Option<T>, GateError>
where
    F: FnOnce(&Snapshot) -> T,
{
    if update.is_deletion() {
        tracing::debug!(refname = %update.refname, "ref deleted, nothing to check");
        return Ok(None);
    }

    let paths = changed_paths(repo, update)?;
    if paths.is_empty() {
        return Ok(Some(check(&Snapshot::new(repo, paths))));
    }

    let pushed = PushedSnapshot::materialize(repo, &update.new, paths)?;
    let outcome = check(pushed.snapshot());
    pushed.close()?;
    Ok(Some(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::git;
    use crate::git::tests::{commit_all, init_repo, write};

    const NULL: &str = "0000000000000000000000000000000000000000";

    fn repo_with_history() -> (TempDir, String, String) {
        let tmp = TempDir::new().unwrap();
        init_repo(tmp.path());
        write(tmp.path(), "manifests/site.pp", "node default {}\n");
        write(tmp.path(), "templates/motd.erb", "hello\n");
        write(tmp.path(), "removed.pp", "class gone {}\n");
        let first = commit_all(tmp.path(), "initial");

        write(tmp.path(), "manifests/site.pp", "node default { include ntp }\n");
        write(tmp.path(), "data/common.yaml", "---\nntp::servers: []\n");
        std::fs::remove_file(tmp.path().join("removed.pp")).unwrap();
        let second = commit_all(tmp.path(), "second");

        // Uncommitted noise that must not leak into the snapshot.
        write(tmp.path(), "manifests/site.pp", "work tree only\n");
        (tmp, first, second)
    }

    #[test]
    fn parse_rejects_short_revisions() {
        assert!(PushUpdate::parse("refs/heads/main", "abc", NULL).is_err());
        assert!(PushUpdate::parse("refs/heads/main", NULL, NULL).is_ok());
    }

    #[test]
    fn changed_paths_for_a_range() {
        let (tmp, first, second) = repo_with_history();
        let update = PushUpdate::parse("refs/heads/main", &first, &second).unwrap();

        let paths = changed_paths(tmp.path(), &update).unwrap();
        assert_eq!(
            Snapshot::new(tmp.path(), paths).paths(),
            &[
                PathBuf::from("data/common.yaml"),
                PathBuf::from("manifests/site.pp"),
                PathBuf::from("removed.pp"),
            ]
        );
    }

    #[test]
    fn changed_paths_for_a_new_branch_lists_whole_tree() {
        let (tmp, _first, second) = repo_with_history();
        let update = PushUpdate::parse("refs/heads/feature", NULL, &second).unwrap();
        assert!(update.is_creation());

        let paths = changed_paths(tmp.path(), &update).unwrap();
        assert_eq!(
            Snapshot::new(tmp.path(), paths).paths(),
            &[
                PathBuf::from("data/common.yaml"),
                PathBuf::from("manifests/site.pp"),
                PathBuf::from("templates/motd.erb"),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_names_reach_the_snapshot() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let (tmp, _first, second) = repo_with_history();
        git(tmp.path(), &["checkout", "--", "manifests/site.pp"]).unwrap();
        let name = OsStr::from_bytes(b"manifests/caf\xe9.pp");
        std::fs::write(tmp.path().join(name), "class cafe {}\n").unwrap();
        let third = commit_all(tmp.path(), "third");
        let update = PushUpdate::parse("refs/heads/main", &second, &third).unwrap();

        let present = with_pushed_snapshot(tmp.path(), &update, |snapshot| {
            assert_eq!(snapshot.paths(), &[PathBuf::from(name)]);
            snapshot.root().join(name).is_file()
        })
        .unwrap()
        .unwrap();

        assert!(present);
    }

    #[test]
    fn snapshot_holds_revision_content_not_work_tree() {
        let (tmp, first, second) = repo_with_history();
        let update = PushUpdate::parse("refs/heads/main", &first, &second).unwrap();

        let content = with_pushed_snapshot(tmp.path(), &update, |snapshot| {
            assert_ne!(snapshot.root(), tmp.path());
            assert!(!snapshot.root().join("removed.pp").exists());
            std::fs::read_to_string(snapshot.root().join("manifests/site.pp")).unwrap()
        })
        .unwrap()
        .unwrap();

        assert_eq!(content, "node default { include ntp }\n");
    }

    #[test]
    fn temporary_directory_is_removed_after_the_check() {
        let (tmp, first, second) = repo_with_history();
        let update = PushUpdate::parse("refs/heads/main", &first, &second).unwrap();

        let root: PathBuf = with_pushed_snapshot(tmp.path(), &update, |snapshot| {
            assert!(snapshot.root().is_dir());
            snapshot.root().to_path_buf()
        })
        .unwrap()
        .unwrap();

        assert!(!root.exists());
    }

    #[test]
    fn temporary_directory_is_removed_when_the_check_panics() {
        let (tmp, first, second) = repo_with_history();
        let update = PushUpdate::parse("refs/heads/main", &first, &second).unwrap();
        let seen = std::sync::Mutex::new(None::<PathBuf>);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            with_pushed_snapshot::<(), _>(tmp.path(), &update, |snapshot| {
                *seen.lock().unwrap() = Some(snapshot.root().to_path_buf());
                panic!("checker blew up");
            })
        }));

        assert!(result.is_err());
        let root = seen.into_inner().unwrap_or_else(|e| e.into_inner()).unwrap();
        assert!(!root.exists());
    }

    #[test]
    fn deletion_does_nothing() {
        let (tmp, first, _second) = repo_with_history();
        let update = PushUpdate::parse("refs/heads/main", &first, NULL).unwrap();
        let mut called = false;

        let outcome = with_pushed_snapshot(tmp.path(), &update, |_| called = true).unwrap();

        assert!(outcome.is_none());
        assert!(!called);
    }

    #[test]
    fn unknown_revision_is_an_error() {
        let (tmp, first, _second) = repo_with_history();
        let missing = "1234567890".repeat(4);
        let update = PushUpdate::parse("refs/heads/main", &first, &missing).unwrap();

        let result = with_pushed_snapshot(tmp.path(), &update, |_| ());
        assert!(result.is_err());
        assert!(result.unwrap_err().is_repository_integrity());
    }

    #[test]
    fn materialize_unknown_revision_is_an_archive_error() {
        let (tmp, _first, _second) = repo_with_history();
        let missing: Revision = "1234567890".repeat(4).parse().unwrap();

        let err = PushedSnapshot::materialize(tmp.path(), &missing, vec![])
            .err()
            .unwrap();
        assert!(matches!(err, GateError::Archive { .. }));
        assert!(err.is_repository_integrity());
    }

    #[test]
    fn works_against_a_bare_repository() {
        let (tmp, first, second) = repo_with_history();
        let bare = TempDir::new().unwrap();
        git(
            tmp.path(),
            &["clone", "-q", "--bare", ".", bare.path().to_str().unwrap()],
        )
        .unwrap();
        let update = PushUpdate::parse("refs/heads/main", &first, &second).unwrap();

        let files = with_pushed_snapshot(bare.path(), &update, |snapshot| {
            snapshot
                .paths()
                .iter()
                .filter(|p| snapshot.root().join(p).is_file())
                .count()
        })
        .unwrap()
        .unwrap();

        assert_eq!(files, 2);
    }
}
