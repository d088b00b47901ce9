//! External analyzers and the fallback combinator.
//!
//! The inference service itself lives outside this crate. It reaches us either
//! as a report file written by an earlier workflow step or as a command we
//! spawn, feed the submission on stdin, and read a report from on stdout.
//! Either may fail; [`WithFallback`] substitutes the local scanner's report
//! exactly once when that happens.

use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::time::Duration;

use super::SecurityAnalyzer;
use super::normalize::{parse_ai_report, parse_static_report};
use super::report::{AnalyzerReport, AnalyzerSource};
use crate::config::{AnalyzerConfig, ScannerConfig};
use crate::error::{GateError, Result};
use crate::parse::ParsedSubmission;

/// AI safety review read from a file produced by the inference step.
pub struct ReportFileAnalyzer {
    path: PathBuf,
}

impl ReportFileAnalyzer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SecurityAnalyzer for ReportFileAnalyzer {
    fn name(&self) -> &str {
        "ai-report-file"
    }

    fn source(&self) -> AnalyzerSource {
        AnalyzerSource::Ai
    }

    fn analyze(&self, _submission: &ParsedSubmission) -> Result<AnalyzerReport> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            GateError::AnalyzerUnavailable(format!("{}: {e}", self.path.display()))
        })?;
        parse_ai_report(&text)
    }
}

/// Static rule-engine findings read from a file.
pub struct StaticReportAnalyzer {
    path: PathBuf,
    scanner: ScannerConfig,
    analyzer: AnalyzerConfig,
}

impl StaticReportAnalyzer {
    pub fn new(path: impl Into<PathBuf>, scanner: &ScannerConfig, analyzer: &AnalyzerConfig) -> Self {
        Self {
            path: path.into(),
            scanner: scanner.clone(),
            analyzer: analyzer.clone(),
        }
    }
}

impl SecurityAnalyzer for StaticReportAnalyzer {
    fn name(&self) -> &str {
        "static-report-file"
    }

    fn source(&self) -> AnalyzerSource {
        AnalyzerSource::Static
    }

    fn analyze(&self, _submission: &ParsedSubmission) -> Result<AnalyzerReport> {
        let text = std::fs::read_to_string(&self.path)?;
        parse_static_report(&text, &self.scanner, &self.analyzer)
    }
}

/// AI safety review obtained by running an external command.
///
/// The submission is written to the child's stdin as JSON; stdout must hold
/// one AI safety report. The child is killed when the timeout elapses.
pub struct CommandAnalyzer {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandAnalyzer {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    /// Split a command line into program and arguments using shlex (POSIX
    /// word splitting), so quoted arguments survive intact.
    pub fn from_command_line(line: &str, timeout: Duration) -> Result<Self> {
        let words = shlex::split(line).ok_or_else(|| {
            GateError::InvalidInput(format!("unbalanced quoting in analyzer command: {line}"))
        })?;
        let mut words = words.into_iter();
        let program = words
            .next()
            .ok_or_else(|| GateError::InvalidInput("empty analyzer command".into()))?;
        Ok(Self::new(program, words.collect(), timeout))
    }
}

impl SecurityAnalyzer for CommandAnalyzer {
    fn name(&self) -> &str {
        &self.program
    }

    fn source(&self) -> AnalyzerSource {
        AnalyzerSource::Ai
    }

    fn analyze(&self, submission: &ParsedSubmission) -> Result<AnalyzerReport> {
        let payload = serde_json::to_vec(submission)?;
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| GateError::AnalyzerUnavailable(format!("{}: {e}", self.program)))?;

        if let Some(mut stdin) = child.stdin.take() {
            std::thread::spawn(move || {
                let _ = stdin.write_all(&payload);
            });
        }

        let (tx, rx) = mpsc::channel();
        if let Some(mut stdout) = child.stdout.take() {
            std::thread::spawn(move || {
                let mut out = String::new();
                let res = stdout.read_to_string(&mut out).map(|_| out);
                let _ = tx.send(res);
            });
        }

        let output = match rx.recv_timeout(self.timeout) {
            Ok(res) => res?,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(GateError::AnalyzerTimeout(self.timeout.as_secs()));
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(GateError::AnalyzerUnavailable(format!(
                    "{}: no output stream",
                    self.program
                )));
            }
        };

        let status = child.wait()?;
        if !status.success() {
            return Err(GateError::AnalyzerUnavailable(format!(
                "{} exited with {status}",
                self.program
            )));
        }
        parse_ai_report(&output)
    }
}

/// Run `primary` once; on any error run `fallback` once and present its
/// report in the primary's slot, marked as substituted.
pub struct WithFallback<P, F> {
    primary: P,
    fallback: F,
}

impl<P: SecurityAnalyzer, F: SecurityAnalyzer> WithFallback<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P: SecurityAnalyzer, F: SecurityAnalyzer> SecurityAnalyzer for WithFallback<P, F> {
    fn name(&self) -> &str {
        self.primary.name()
    }

    fn source(&self) -> AnalyzerSource {
        self.primary.source()
    }

    fn analyze(&self, submission: &ParsedSubmission) -> Result<AnalyzerReport> {
        match self.primary.analyze(submission) {
            Ok(report) => Ok(report),
            Err(e) => {
                log::warn!(
                    "analyzer {} unavailable ({e}); substituting {}",
                    self.primary.name(),
                    self.fallback.name()
                );
                let mut report = self.fallback.analyze(submission)?;
                report.source = self.primary.source();
                report.fallback = true;
                report.summary = format!(
                    "{} (substituted for {}: {e})",
                    report.summary,
                    self.primary.name()
                );
                Ok(report)
            }
        }
    }
}
