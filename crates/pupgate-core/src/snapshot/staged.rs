//! Pre-commit snapshot: the work tree reduced to what is staged.
//!
//! [`StashGuard`] captures the unstaged diff, stashes the work tree with
//! `--keep-index` and, on [`StashGuard::restore`], reapplies the diff before
//! dropping the stash entry. If the guard is dropped without an explicit
//! restore (early return, panic in the check callback) it restores on a
//! best-effort basis.
//!
//! The stash entry is only dropped once the captured diff has been applied
//! successfully. When the apply fails the entry is left in place and the error
//! names it, so unstaged edits can always be recovered with `git stash pop`.
//!
//! `git stash` needs a commit to stash against. Before the first commit the
//! guard reverse-applies the captured diff instead, and on a failed restore
//! writes it to the git directory so it can be applied by hand.

use std::path::{Path, PathBuf};

use crate::error::GateError;
use crate::git::{git, git_bytes, git_path, git_with_input, has_head, stash_top, staged_paths};

use super::Snapshot;

const STASH_MESSAGE: &str = "pupgate: unstaged changes";
const RESCUE_PATCH: &str = "pupgate-unstaged.patch";

/// Where the unstaged changes were put while the check runs.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Parked {
    /// The work tree already matched the index.
    Nothing,
    /// A stash entry created by this guard.
    Stash(String),
    /// Reverse-applied in place (unborn branch).
    Reversed,
}

/// Scoped isolation of the index content in the work tree.
pub struct StashGuard {
    repo: PathBuf,
    /// Diff of the work tree against the index, with fixed `a/` and `b/`
    /// prefixes so `git apply` can read it whatever the user's diff config.
    patch: Vec<u8>,
    parked: Parked,
    restored: bool,
}

impl StashGuard {
    /// Capture unstaged changes and set them aside, keeping the index.
    ///
    /// # Errors
    ///
    /// Returns `GateError::Git` if the diff or stash command fails. Nothing
    /// has been modified when capturing the diff fails.
    pub fn acquire(repo: &Path) -> Result<Self, GateError> {
        let patch = git_bytes(
            repo,
            &[
                "diff",
                "--binary",
                "--no-color",
                "--no-ext-diff",
                "--no-textconv",
                "--src-prefix=a/",
                "--dst-prefix=b/",
            ],
        )?;

        let parked = if has_head(repo)? {
            Self::stash(repo)?
        } else if patch.is_empty() {
            Parked::Nothing
        } else {
            git_with_input(repo, &["apply", "-R", "--whitespace=nowarn"], &patch)?;
            Parked::Reversed
        };

        tracing::debug!(
            repo = %repo.display(),
            patch_bytes = patch.len(),
            parked = ?parked,
            "isolated staged content"
        );

        Ok(Self {
            repo: repo.to_path_buf(),
            patch,
            parked,
            restored: false,
        })
    }

    fn stash(repo: &Path) -> Result<Parked, GateError> {
        let before = stash_top(repo)?;

        git(
            repo,
            &["stash", "push", "--quiet", "--keep-index", "--message", STASH_MESSAGE],
        )?;

        // `git stash` with nothing to save exits 0 without creating an entry;
        // dropping `stash@{0}` later would then discard someone else's stash.
        let after = stash_top(repo)?;
        Ok(match after {
            Some(id) if Some(&id) != before.as_ref() => Parked::Stash(id),
            _ => Parked::Nothing,
        })
    }

    /// Whether git created a stash entry for this guard.
    pub fn has_stash(&self) -> bool {
        matches!(self.parked, Parked::Stash(_))
    }

    /// Put the unstaged changes back and drop the stash entry.
    ///
    /// # Errors
    ///
    /// Returns `GateError::Restore` if the diff does not apply or the stash
    /// entry cannot be dropped. The stash entry is kept when the apply fails.
    pub fn restore(mut self) -> Result<(), GateError> {
        self.restored = true;
        self.reinstate()
    }

    fn apply_patch(&self) -> Result<(), GateError> {
        if self.patch.is_empty() {
            return Ok(());
        }
        git_with_input(&self.repo, &["apply", "--whitespace=nowarn"], &self.patch)
    }

    fn reinstate(&self) -> Result<(), GateError> {
        match &self.parked {
            Parked::Nothing => Ok(()),
            Parked::Reversed => self.apply_patch().map_err(|e| self.rescue(e)),
            Parked::Stash(stash) => {
                self.apply_patch().map_err(|e| {
                    GateError::Restore(format!(
                        "{e}; unstaged changes are kept in stash {stash}, recover them with `git checkout -- . && git stash pop`"
                    ))
                })?;

                if stash_top(&self.repo)?.as_deref() != Some(stash.as_str()) {
                    return Err(GateError::Restore(format!(
                        "stash {stash} is no longer on top of the stash list; drop it manually once you have checked your work tree"
                    )));
                }
                git(&self.repo, &["stash", "drop", "--quiet", "stash@{0}"])
                    .map_err(|e| GateError::Restore(e.to_string()))?;

                tracing::debug!(repo = %self.repo.display(), "restored unstaged changes");
                Ok(())
            }
        }
    }

    /// Save the captured diff into the git directory after a failed apply.
    fn rescue(&self, error: GateError) -> GateError {
        let saved = git_path(&self.repo, RESCUE_PATCH).and_then(|path| {
            std::fs::write(&path, &self.patch)?;
            Ok(path)
        });
        match saved {
            Ok(path) => GateError::Restore(format!(
                "{error}; unstaged changes are saved in {}, recover them with `git apply`",
                path.display()
            )),
            Err(save_error) => GateError::Restore(format!(
                "{error}; saving the unstaged changes also failed: {save_error}"
            )),
        }
    }
}

impl Drop for StashGuard {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        if let Err(e) = self.reinstate() {
            tracing::warn!(error = %e, "failed to restore unstaged changes");
        }
    }
}

/// Run `check` against the staged content of the work tree at `repo`.
///
/// The work tree is restored before this returns, whatever `check` decides.
///
/// # Errors
///
/// Returns an error if the isolation cannot be set up, the staged file list
/// cannot be read, or the work tree cannot be restored. A restore failure
/// takes precedence over a file-list failure.
pub fn with_staged_snapshot<T, F>(repo: &Path, check: F) -> Result<T, GateError>
where
    F: FnOnce(&Snapshot) -> T,
{
    let guard = StashGuard::acquire(repo)?;

    let outcome = staged_paths(repo).map(|paths| check(&Snapshot::new(repo, paths)));

    guard.restore()?;
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::tests::{commit_all, init_repo, write};
    use tempfile::TempDir;

    fn read(dir: &Path, rel: &str) -> Vec<u8> {
        std::fs::read(dir.join(rel)).unwrap()
    }

    fn status(dir: &Path) -> String {
        git(dir, &["status", "--porcelain"]).unwrap()
    }

    /// Repo with `site.pp` committed, then a staged edit plus a further
    /// unstaged edit on top of it.
    fn repo_with_split_changes() -> TempDir {
        let tmp = TempDir::new().unwrap();
        init_repo(tmp.path());
        write(tmp.path(), "site.pp", "node default {}\n");
        write(tmp.path(), "other.pp", "class other {}\n");
        commit_all(tmp.path(), "initial");

        write(tmp.path(), "site.pp", "node default { include ntp }\n");
        git(tmp.path(), &["add", "site.pp"]).unwrap();
        write(tmp.path(), "site.pp", "node default { include ntp ; BROKEN\n");
        write(tmp.path(), "other.pp", "class other { unstaged }\n");
        tmp
    }

    #[test]
    fn check_sees_only_staged_content() {
        let tmp = repo_with_split_changes();

        let seen = with_staged_snapshot(tmp.path(), |snapshot| {
            assert_eq!(snapshot.paths(), &[PathBuf::from("site.pp")]);
            (
                read(snapshot.root(), "site.pp"),
                read(snapshot.root(), "other.pp"),
            )
        })
        .unwrap();

        assert_eq!(seen.0, b"node default { include ntp }\n");
        assert_eq!(seen.1, b"class other {}\n");
    }

    #[test]
    fn unstaged_changes_are_restored_bit_for_bit() {
        let tmp = repo_with_split_changes();
        let before_site = read(tmp.path(), "site.pp");
        let before_other = read(tmp.path(), "other.pp");
        let before_status = status(tmp.path());

        with_staged_snapshot(tmp.path(), |_| ()).unwrap();

        assert_eq!(read(tmp.path(), "site.pp"), before_site);
        assert_eq!(read(tmp.path(), "other.pp"), before_other);
        assert_eq!(status(tmp.path()), before_status);
        assert_eq!(stash_top(tmp.path()).unwrap(), None, "stash entry is dropped");
    }

    #[test]
    fn binary_unstaged_changes_survive() {
        let tmp = TempDir::new().unwrap();
        init_repo(tmp.path());
        std::fs::write(tmp.path().join("blob.bin"), [0u8, 1, 2, 3, 255]).unwrap();
        write(tmp.path(), "site.pp", "node default {}\n");
        commit_all(tmp.path(), "initial");

        write(tmp.path(), "site.pp", "node web {}\n");
        git(tmp.path(), &["add", "site.pp"]).unwrap();
        let binary = [9u8, 0, 0, 7, 128, 64];
        std::fs::write(tmp.path().join("blob.bin"), binary).unwrap();

        with_staged_snapshot(tmp.path(), |snapshot| {
            assert_eq!(read(snapshot.root(), "blob.bin"), vec![0u8, 1, 2, 3, 255]);
        })
        .unwrap();

        assert_eq!(read(tmp.path(), "blob.bin"), binary.to_vec());
    }

    #[test]
    fn restore_runs_after_a_failing_check() {
        let tmp = repo_with_split_changes();
        let before = read(tmp.path(), "site.pp");

        let verdict: i32 = with_staged_snapshot(tmp.path(), |_| 1).unwrap();

        assert_eq!(verdict, 1);
        assert_eq!(read(tmp.path(), "site.pp"), before);
    }

    #[test]
    fn restore_runs_when_check_panics() {
        let tmp = repo_with_split_changes();
        let before = read(tmp.path(), "other.pp");
        let repo = tmp.path().to_path_buf();

        let result = std::panic::catch_unwind(move || {
            with_staged_snapshot::<(), _>(&repo, |_| panic!("checker blew up"))
        });

        assert!(result.is_err());
        assert_eq!(read(tmp.path(), "other.pp"), before);
        assert_eq!(stash_top(tmp.path()).unwrap(), None);
    }

    #[test]
    fn staged_only_changes_leave_no_stash() {
        let tmp = TempDir::new().unwrap();
        init_repo(tmp.path());
        write(tmp.path(), "site.pp", "node default {}\n");
        commit_all(tmp.path(), "initial");
        write(tmp.path(), "new.pp", "class new {}\n");
        git(tmp.path(), &["add", "new.pp"]).unwrap();

        let paths = with_staged_snapshot(tmp.path(), |s| s.paths().to_vec()).unwrap();

        assert_eq!(paths, vec![PathBuf::from("new.pp")]);
        assert_eq!(stash_top(tmp.path()).unwrap(), None);
        assert!(status(tmp.path()).contains("A  new.pp"));
    }

    #[test]
    fn clean_tree_does_not_drop_existing_stash() {
        let tmp = TempDir::new().unwrap();
        init_repo(tmp.path());
        write(tmp.path(), "site.pp", "node default {}\n");
        commit_all(tmp.path(), "initial");

        // Somebody's older stash.
        write(tmp.path(), "site.pp", "node saved {}\n");
        git(tmp.path(), &["stash", "push", "--quiet"]).unwrap();
        let existing = stash_top(tmp.path()).unwrap();
        assert!(existing.is_some());

        let guard = StashGuard::acquire(tmp.path()).unwrap();
        assert!(!guard.has_stash());
        guard.restore().unwrap();

        assert_eq!(stash_top(tmp.path()).unwrap(), existing);
    }

    #[test]
    fn failed_apply_keeps_the_stash() {
        let tmp = repo_with_split_changes();
        let guard = StashGuard::acquire(tmp.path()).unwrap();
        assert!(guard.has_stash());

        // Make the captured diff unappliable.
        write(tmp.path(), "site.pp", "something else entirely\n");

        let err = guard.restore().unwrap_err();
        assert!(matches!(err, GateError::Restore(_)));
        assert!(err.is_repository_integrity());
        assert!(stash_top(tmp.path()).unwrap().is_some(), "stash must survive");
    }

    #[test]
    fn first_commit_checks_the_staged_file() {
        let tmp = TempDir::new().unwrap();
        init_repo(tmp.path());
        write(tmp.path(), "site.pp", "node default {}\n");
        git(tmp.path(), &["add", "site.pp"]).unwrap();

        let paths = with_staged_snapshot(tmp.path(), |s| s.paths().to_vec()).unwrap();

        assert_eq!(paths, vec![PathBuf::from("site.pp")]);
        assert!(status(tmp.path()).contains("A  site.pp"));
    }

    #[test]
    fn first_commit_isolates_and_restores_unstaged_edits() {
        let tmp = TempDir::new().unwrap();
        init_repo(tmp.path());
        write(tmp.path(), "site.pp", "node default {}\n");
        git(tmp.path(), &["add", "site.pp"]).unwrap();
        write(tmp.path(), "site.pp", "node default { BROKEN\n");
        let before = status(tmp.path());

        let seen = with_staged_snapshot(tmp.path(), |s| read(s.root(), "site.pp")).unwrap();

        assert_eq!(seen, b"node default {}\n");
        assert_eq!(read(tmp.path(), "site.pp"), b"node default { BROKEN\n");
        assert_eq!(status(tmp.path()), before);
        assert_eq!(stash_top(tmp.path()).unwrap(), None);
    }

    #[test]
    fn first_commit_failed_restore_saves_the_patch() {
        let tmp = TempDir::new().unwrap();
        init_repo(tmp.path());
        write(tmp.path(), "site.pp", "node default {}\n");
        git(tmp.path(), &["add", "site.pp"]).unwrap();
        write(tmp.path(), "site.pp", "node web {}\n");

        let guard = StashGuard::acquire(tmp.path()).unwrap();
        assert!(!guard.has_stash());
        write(tmp.path(), "site.pp", "something else entirely\n");

        let err = guard.restore().unwrap_err();
        assert!(matches!(err, GateError::Restore(_)));
        let saved = std::fs::read_to_string(tmp.path().join(".git/pupgate-unstaged.patch"))
            .unwrap();
        assert!(saved.contains("+node web {}"));
    }

    #[test]
    fn restores_with_noprefix_diff_config() {
        let tmp = repo_with_split_changes();
        git(tmp.path(), &["config", "diff.noprefix", "true"]).unwrap();
        git(tmp.path(), &["config", "diff.mnemonicPrefix", "true"]).unwrap();
        let before_site = read(tmp.path(), "site.pp");
        let before_other = read(tmp.path(), "other.pp");

        with_staged_snapshot(tmp.path(), |_| ()).unwrap();

        assert_eq!(read(tmp.path(), "site.pp"), before_site);
        assert_eq!(read(tmp.path(), "other.pp"), before_other);
        assert_eq!(stash_top(tmp.path()).unwrap(), None);
    }

    #[test]
    fn not_a_repository_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let result = with_staged_snapshot(tmp.path(), |_| ());
        assert!(matches!(result, Err(GateError::Git { .. })));
    }
}
