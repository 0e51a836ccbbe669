use regex::Regex;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::error::GateError;

static OBJECT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[0-9a-fA-F]{40}|[0-9a-fA-F]{64})$").unwrap());

/// A full git object id as passed to the `update` hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision(String);

impl Revision {
    /// The all-zero id git uses for "no commit" (branch creation or deletion).
    pub fn is_null(&self) -> bool {
        self.0.bytes().all(|b| b == b'0')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Revision {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if OBJECT_ID_RE.is_match(s) {
            Ok(Revision(s.to_ascii_lowercase()))
        } else {
            Err(GateError::InvalidRevision(s.to_string()))
        }
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
