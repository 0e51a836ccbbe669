//! Adapters around the external validation tools.
//!
//! Every checker turns one external command (or a short pipeline) into a
//! [`CheckResult`]. Checkers never return errors: a tool that cannot be
//! launched, or that runs past its timeout, is reported as a failed check with
//! a single synthetic diagnostic so the rest of the run carries on.

pub mod data;
pub mod manifest;
pub mod output;
pub mod template;

use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::Output;
use std::thread;
use std::time::{Duration, Instant};

use crate::types::{Category, CheckResult};

pub use data::data_syntax;
pub use manifest::{manifest_style, manifest_syntax};
pub use template::template_syntax;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// A validation capability for one category of file.
pub trait Checker {
    fn category(&self) -> Category;

    /// Check `path` (relative to `root`) with `root` as the working directory.
    fn check(&self, root: &Path, path: &Path) -> CheckResult;
}

/// How a tool reports that the checked file is bad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureSignal {
    /// Non-zero exit status.
    ExitCode,
    /// Anything written to stderr; the exit status is ignored.
    Stderr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Literal(String),
    /// Replaced by the path of the file under check.
    File,
}

/// One process in a checker pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub program: String,
    pub args: Vec<Arg>,
}

impl Stage {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(Arg::Literal(arg.into()));
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args
            .extend(args.into_iter().map(|a| Arg::Literal(a.into())));
        self
    }

    pub fn file(mut self) -> Self {
        self.args.push(Arg::File);
        self
    }

    fn render_args(&self, path: &Path) -> Vec<OsString> {
        self.args
            .iter()
            .map(|arg| match arg {
                Arg::Literal(s) => OsString::from(s),
                Arg::File => path.as_os_str().to_os_string(),
            })
            .collect()
    }

    fn expression(&self, path: &Path) -> duct::Expression {
        duct::cmd(self.program.as_str(), self.render_args(path))
    }
}

/// A checker backed by external commands.
#[derive(Debug, Clone)]
pub struct CommandChecker {
    category: Category,
    stages: Vec<Stage>,
    signal: FailureSignal,
    timeout: Option<Duration>,
}

impl CommandChecker {
    pub fn new(category: Category, stage: Stage, signal: FailureSignal) -> Self {
        Self {
            category,
            stages: vec![stage],
            signal,
            timeout: None,
        }
    }

    /// Feed the previous stage's stdout into `stage`.
    pub fn pipe(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn signal(&self) -> FailureSignal {
        self.signal
    }

    fn label(&self) -> String {
        self.stages
            .iter()
            .map(|s| s.program.as_str())
            .collect::<Vec<_>>()
            .join(" | ")
    }

    fn interpret(&self, output: &Output) -> CheckResult {
        let stdout = output::diagnostic_lines(&output.stdout);
        let stderr = output::diagnostic_lines(&output.stderr);

        let failed = match self.signal {
            FailureSignal::ExitCode => !output.status.success(),
            FailureSignal::Stderr => !stderr.is_empty(),
        };

        let diagnostics: Vec<String> = stdout.into_iter().chain(stderr).collect();
        if failed {
            CheckResult::fail(self.category, diagnostics)
        } else {
            CheckResult::pass(self.category, diagnostics)
        }
    }
}

impl Checker for CommandChecker {
    fn category(&self) -> Category {
        self.category
    }

    fn check(&self, root: &Path, path: &Path) -> CheckResult {
        let mut stages = self.stages.iter().map(|stage| stage.expression(path));
        let Some(first) = stages.next() else {
            return CheckResult::fail(
                self.category,
                vec![format!("no command configured for {} check", self.category)],
            );
        };
        let expression = stages
            .fold(first, |acc, next| acc.pipe(next))
            .dir(root)
            .stdin_null()
            .stdout_capture()
            .stderr_capture()
            .unchecked();

        tracing::debug!(
            category = %self.category,
            command = %self.label(),
            path = %path.display(),
            "running checker"
        );

        let handle = match expression.start() {
            Ok(handle) => handle,
            Err(e) => {
                return CheckResult::fail(
                    self.category,
                    vec![format!("failed to run {}: {e}", self.label())],
                );
            }
        };

        let waited = match self.timeout {
            Some(limit) => wait_with_timeout(&handle, limit),
            None => handle.wait().map(|output| Some(output.clone())),
        };

        match waited {
            Ok(Some(output)) => self.interpret(&output),
            Ok(None) => {
                let secs = self.timeout.map(|t| t.as_secs()).unwrap_or_default();
                tracing::warn!(command = %self.label(), path = %path.display(), "checker timed out");
                CheckResult::fail(
                    self.category,
                    vec![format!("{} timed out after {secs} seconds", self.label())],
                )
            }
            Err(e) => CheckResult::fail(
                self.category,
                vec![format!("failed to run {}: {e}", self.label())],
            ),
        }
    }
}

/// Poll `handle` until it exits or `limit` elapses. `Ok(None)` means the
/// processes were killed.
fn wait_with_timeout(handle: &duct::Handle, limit: Duration) -> io::Result<Option<Output>> {
    let deadline = Instant::now() + limit;
    loop {
        if let Some(output) = handle.try_wait()? {
            return Ok(Some(output.clone()));
        }
        if Instant::now() >= deadline {
            handle.kill()?;
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}
