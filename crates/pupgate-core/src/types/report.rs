use std::collections::BTreeMap;
use std::path::PathBuf;

use super::category::Category;

/// Outcome of one checker run against one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub category: Category,
    pub failed: bool,
    pub diagnostics: Vec<String>,
}

impl CheckResult {
    pub fn pass(category: Category, diagnostics: Vec<String>) -> Self {
        Self {
            category,
            failed: false,
            diagnostics,
        }
    }

    pub fn fail(category: Category, diagnostics: Vec<String>) -> Self {
        Self {
            category,
            failed: true,
            diagnostics,
        }
    }
}

/// The failing results for a single file, in dispatch order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub failures: Vec<CheckResult>,
}

/// Per-category failure flags accumulated across a run.
///
/// A category is marked failed as soon as any file fails it; later passes
/// never clear the flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateOutcome {
    categories: BTreeMap<Category, bool>,
}

impl AggregateOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: &CheckResult) {
        let entry = self.categories.entry(result.category).or_insert(false);
        *entry |= result.failed;
    }

    pub fn category_failed(&self, category: Category) -> bool {
        self.categories.get(&category).copied().unwrap_or(false)
    }

    /// Categories that failed, in report order.
    pub fn failed_categories(&self) -> Vec<Category> {
        self.categories
            .iter()
            .filter(|(_, failed)| **failed)
            .map(|(category, _)| *category)
            .collect()
    }

    /// Categories that ran at least once, in report order.
    pub fn checked_categories(&self) -> Vec<Category> {
        self.categories.keys().copied().collect()
    }

    pub fn any_failed(&self) -> bool {
        self.categories.values().any(|failed| *failed)
    }
}

/// Everything a caller needs to render and judge a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Number of candidate paths handed to the run, before any skipping.
    pub candidates: usize,
    /// Paths that existed in the snapshot and were dispatched.
    pub checked: Vec<PathBuf>,
    /// Paths absent from the snapshot (renamed or deleted).
    pub skipped: Vec<PathBuf>,
    /// Files with at least one failing check, in candidate order.
    pub files: Vec<FileReport>,
    pub outcome: AggregateOutcome,
}

impl RunReport {
    /// An empty run makes no pass/fail statement and prints nothing.
    pub fn is_empty(&self) -> bool {
        self.candidates == 0
    }

    pub fn passed(&self) -> bool {
        !self.outcome.any_failed()
    }

    pub fn exit_code(&self) -> i32 {
        if self.passed() {
            0
        } else {
            1
        }
    }
}
