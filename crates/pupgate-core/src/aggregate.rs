//! Run the dispatcher over a candidate list and fold the results.

use std::path::{Path, PathBuf};

use crate::dispatch::Registry;
use crate::types::{AggregateOutcome, FileReport, RunReport};

/// Check every candidate under `root`.
///
/// Candidates that are not regular files under `root` (renamed or deleted in
/// the change being checked) are skipped without touching any counter. Only
/// failing results are kept in the per-file report; passing categories leave
/// no trace beyond the outcome flags.
pub fn check_files<P>(root: &Path, paths: &[P], registry: &Registry) -> RunReport
where
    P: AsRef<Path>,
{
    let mut report = RunReport {
        candidates: paths.len(),
        ..RunReport::default()
    };
    let mut outcome = AggregateOutcome::new();

    for path in paths {
        let path = path.as_ref();
        if !root.join(path).is_file() {
            tracing::debug!(path = %path.display(), "skipping file absent from snapshot");
            report.skipped.push(path.to_path_buf());
            continue;
        }
        report.checked.push(path.to_path_buf());

        let results = registry.classify_and_run(root, path);
        for result in &results {
            outcome.record(result);
        }

        let failures: Vec<_> = results.into_iter().filter(|r| r.failed).collect();
        if !failures.is_empty() {
            report.files.push(FileReport {
                path: PathBuf::from(path),
                failures,
            });
        }
    }

    report.outcome = outcome;
    report
}
