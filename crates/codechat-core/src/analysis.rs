//! Static analysis of canvas code via an external linter.
//!
//! The linter runs as a subprocess against a temp file holding a single
//! canvas. Its line-oriented output is classified into one of three
//! outcomes: the code was unparseable, the code is clean, or there are
//! substantive findings. Findings are normalized so the temp-file path
//! never reaches a downstream prompt.

use std::io::Write;
use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::canvas;

/// Markers the linter emits when it could not parse the input at all.
static FATAL_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)invalid syntax|parsing error|E0001|syntax-error").unwrap());

#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The linter could not be started (not installed, bad path).
    #[error("Failed to launch linter '{program}': {source}")]
    Launch {
        program: String,
        source: std::io::Error,
    },

    /// Writing the code to its temp file failed.
    #[error("Failed to stage code for analysis: {0}")]
    Staging(#[from] std::io::Error),
}

/// What the linter had to say about one canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutcome {
    /// The canvas holds no code; analysis was skipped.
    NoContent,

    /// The linter could not parse the code.
    SyntaxFailure,

    /// The linter ran and produced no substantive findings.
    Clean,

    /// Normalized finding lines, free of filesystem paths.
    Findings(Vec<String>),
}

/// How to invoke the external linter. The temp-file path is appended as the
/// final argument.
#[derive(Debug, Clone)]
pub struct LintCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for LintCommand {
    fn default() -> Self {
        Self {
            program: "python3".to_string(),
            args: vec!["-m".to_string(), "pylint".to_string()],
        }
    }
}

/// Runs the linter against one code buffer at a time.
#[derive(Debug, Clone, Default)]
pub struct LintRunner {
    command: LintCommand,
}

impl LintRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_command(command: LintCommand) -> Self {
        Self { command }
    }

    /// Lint one code buffer in isolation.
    ///
    /// The code is written CRLF-normalized to a fresh temp file which is
    /// removed when this call returns, whatever the linter did. A non-zero
    /// linter exit is not an error here: pylint-style tools exit non-zero
    /// whenever they have findings.
    pub fn analyze(&self, code: &str) -> Result<AnalysisOutcome, AnalysisError> {
        if canvas::is_blank(code) {
            return Ok(AnalysisOutcome::NoContent);
        }

        let mut staged = tempfile::Builder::new()
            .prefix("codechat-lint-")
            .suffix(".py")
            .tempfile()?;
        staged.write_all(code.replace("\r\n", "\n").as_bytes())?;
        staged.flush()?;
        let staged_path = staged.path().to_string_lossy().into_owned();

        let output = Command::new(&self.command.program)
            .args(&self.command.args)
            .arg(&staged_path)
            .output()
            .map_err(|source| AnalysisError::Launch {
                program: self.command.program.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        log::debug!(
            "linter exit {:?}, {} stdout bytes, {} stderr bytes",
            output.status.code(),
            stdout.len(),
            stderr.len()
        );

        Ok(classify_output(&stdout, &stderr, &staged_path))
    }
}

/// Sort the linter's raw output into an outcome.
fn classify_output(stdout: &str, stderr: &str, staged_path: &str) -> AnalysisOutcome {
    let combined = format!("{stderr}{stdout}");
    if FATAL_MARKER_RE.is_match(&combined) {
        return AnalysisOutcome::SyntaxFailure;
    }

    let findings: Vec<String> = stdout
        .lines()
        .filter(|line| is_substantive(line))
        .map(|line| normalize_finding(line, staged_path))
        .collect();

    if findings.is_empty() {
        AnalysisOutcome::Clean
    } else {
        AnalysisOutcome::Findings(findings)
    }
}

/// Drop banner, separator and score-summary lines.
fn is_substantive(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty()
        && !trimmed.starts_with('*')
        && !trimmed.starts_with('-')
        && !trimmed.contains("Your code has been rated")
}

/// Rewrite `{staged_path}:` to `Line ` so no local path leaks downstream.
fn normalize_finding(line: &str, staged_path: &str) -> String {
    line.replace(&format!("{staged_path}:"), "Line ")
}
