//! Snapshot providers: the directory a run checks, and which files in it.
//!
//! - [`staged`]: the live work tree of a local commit, with unstaged edits
//!   set aside so only what is in the index gets checked.
//! - [`pushed`]: the tree of a pushed revision, extracted into a temporary
//!   directory for a server-side `update` hook.

pub mod pushed;
pub mod staged;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub use pushed::{changed_paths, with_pushed_snapshot, PushUpdate, PushedSnapshot};
pub use staged::{with_staged_snapshot, StashGuard};

/// A root directory plus the candidate paths (relative to it) to check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    root: PathBuf,
    paths: Vec<PathBuf>,
}

impl Snapshot {
    /// Build a snapshot, dropping duplicate paths. The result is sorted.
    pub fn new<I, P>(root: impl Into<PathBuf>, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let unique: BTreeSet<PathBuf> = paths.into_iter().map(Into::into).collect();
        Self {
            root: root.into(),
            paths: unique.into_iter().collect(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}
