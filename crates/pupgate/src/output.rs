use colored::*;
use pupgate_core::{GateError, RunReport};
use serde::Serialize;

/// Output mode for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
    Quiet,
}

/// Accumulated JSON result entry.
#[derive(Debug, Serialize, Clone)]
pub struct JsonResultEntry {
    #[serde(rename = "type")]
    pub result_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl JsonResultEntry {
    fn new(result_type: &str, message: &str) -> Self {
        Self {
            result_type: result_type.to_string(),
            message: message.to_string(),
            path: None,
            category: None,
        }
    }
}

/// Accumulated JSON output.
#[derive(Debug, Serialize)]
pub struct JsonOutput {
    pub passed: bool,
    pub results: Vec<JsonResultEntry>,
}

/// Reporter handles all output formatting.
pub struct Reporter {
    mode: OutputMode,
    json_results: Vec<JsonResultEntry>,
    failed: bool,
}

impl Reporter {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            json_results: Vec::new(),
            failed: false,
        }
    }

    pub fn error(&mut self, message: &str) {
        self.failed = true;
        match self.mode {
            OutputMode::Human | OutputMode::Quiet => {
                eprintln!("{} {}", "ERROR:".red(), message);
            }
            OutputMode::Json => {
                self.json_results.push(JsonResultEntry::new("error", message));
            }
        }
    }

    /// Report an error that ends the run.
    pub fn fatal(&mut self, error: &GateError) {
        match error {
            GateError::MissingTools(tools) => {
                for tool in tools {
                    self.error(&format!("Required tool not found: {tool}"));
                }
            }
            e if e.is_repository_integrity() => {
                self.error(&format!("Repository operation failed: {e}"));
            }
            e => self.error(&e.to_string()),
        }
    }

    pub fn success(&mut self, message: &str) {
        match self.mode {
            OutputMode::Human => {
                println!("{} {}", "✓".green(), message);
            }
            OutputMode::Json => {
                self.json_results.push(JsonResultEntry::new("success", message));
            }
            OutputMode::Quiet => {}
        }
    }

    pub fn info(&mut self, message: &str) {
        match self.mode {
            OutputMode::Human => {
                println!("{} {}", "INFO:".blue(), message);
            }
            OutputMode::Json => {
                self.json_results.push(JsonResultEntry::new("info", message));
            }
            OutputMode::Quiet => {}
        }
    }

    /// A failed check summary. Printed in every mode.
    fn failure(&mut self, message: &str, category: &str) {
        self.failed = true;
        match self.mode {
            OutputMode::Human | OutputMode::Quiet => {
                println!("{} {}", "✗".red(), message);
            }
            OutputMode::Json => {
                let mut entry = JsonResultEntry::new("failure", message);
                entry.category = Some(category.to_string());
                self.json_results.push(entry);
            }
        }
    }

    fn file_header(&mut self, path: &str) {
        match self.mode {
            OutputMode::Human | OutputMode::Quiet => {
                println!("{}", format!("=== {path} ===").cyan());
            }
            OutputMode::Json => {}
        }
    }

    fn diagnostics(&mut self, path: &str, category: &str, lines: &[String]) {
        match self.mode {
            OutputMode::Human | OutputMode::Quiet => {
                println!("  {}", format!("{category}:").yellow());
                for line in lines {
                    println!("    {line}");
                }
            }
            OutputMode::Json => {
                for line in lines {
                    let mut entry = JsonResultEntry::new("diagnostic", line);
                    entry.path = Some(path.to_string());
                    entry.category = Some(category.to_string());
                    self.json_results.push(entry);
                }
            }
        }
    }

    /// Render a run and return whether it passed.
    ///
    /// A run with no candidate files prints nothing and passes.
    pub fn report_run(&mut self, report: &RunReport) -> bool {
        if report.is_empty() {
            return true;
        }

        for file in &report.files {
            let path = file.path.display().to_string();
            self.file_header(&path);
            for failure in &file.failures {
                self.diagnostics(&path, failure.category.name(), &failure.diagnostics);
            }
        }

        if report.passed() {
            self.success(&format!(
                "All checks passed ({} file(s) checked)",
                report.checked.len()
            ));
            return true;
        }

        for category in report.outcome.failed_categories() {
            self.failure(
                &format!("{} check failed", category.description()),
                category.name(),
            );
        }
        false
    }

    pub fn finish(&self) {
        if self.mode == OutputMode::Json {
            let output = JsonOutput {
                passed: !self.failed,
                results: self.json_results.clone(),
            };
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                println!("{json}");
            }
        }
    }
}
