//! End-to-end run for one submission: extract, analyze, decide, and, when
//! approved, materialize.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::Config;
use crate::error::Result;
use crate::eval::{ApprovalDecision, DecisionEngine, Recommendation};
use crate::parse::{ParsedSubmission, Submission, parse_submission};
use crate::scan::{
    AnalyzerReport, CommandAnalyzer, PatternScanner, ReportFileAnalyzer, SecurityAnalyzer,
    StaticReportAnalyzer, WithFallback,
};
use crate::store::{Approval, MaterializeReport, Store, materialize};

/// Where analyzer evidence comes from.
#[derive(Debug, Clone, Default)]
pub struct AnalyzerOptions {
    /// Static rule-engine findings file. Falls back to the pattern scanner.
    pub static_report: Option<PathBuf>,
    /// AI safety report file.
    pub ai_report: Option<PathBuf>,
    /// Command producing an AI safety report on stdout. Used when no report
    /// file is given.
    pub ai_command: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOutcome {
    pub submission: ParsedSubmission,
    pub reports: Vec<AnalyzerReport>,
    pub decision: ApprovalDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub materialized: Option<MaterializeReport>,
    /// Set when the submission was approved but could not be written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub materialize_error: Option<String>,
}

pub struct Pipeline {
    config: Config,
    analyzers: Vec<Box<dyn SecurityAnalyzer>>,
    engine: DecisionEngine,
}

impl Pipeline {
    /// Pipeline with only the local pattern scanner.
    pub fn new(config: Config) -> Self {
        let scanner = PatternScanner::new(&config.scanner);
        Self {
            engine: DecisionEngine::from_config(&config),
            analyzers: vec![Box::new(scanner)],
            config,
        }
    }

    /// One analyzer per slot. The static slot is the findings file when given,
    /// else the pattern scanner. The AI slot exists when a report file or
    /// command is configured, with the pattern scanner as its substitute.
    pub fn from_options(config: Config, options: &AnalyzerOptions) -> Result<Self> {
        let scanner = || PatternScanner::new(&config.scanner);
        let mut analyzers: Vec<Box<dyn SecurityAnalyzer>> = Vec::new();

        match &options.static_report {
            Some(path) => analyzers.push(Box::new(WithFallback::new(
                StaticReportAnalyzer::new(path, &config.scanner, &config.analyzer),
                scanner(),
            ))),
            None => analyzers.push(Box::new(scanner())),
        }

        let ai: Option<Box<dyn SecurityAnalyzer>> = match (&options.ai_report, &options.ai_command)
        {
            (Some(path), _) => Some(Box::new(ReportFileAnalyzer::new(path))),
            (None, Some(line)) => Some(Box::new(CommandAnalyzer::from_command_line(
                line,
                Duration::from_secs(config.analyzer.timeout_secs),
            )?)),
            (None, None) => None,
        };
        if let Some(primary) = ai {
            analyzers.push(Box::new(WithFallback::new(primary, scanner())));
        }

        Ok(Self {
            engine: DecisionEngine::from_config(&config),
            analyzers,
            config,
        })
    }

    /// Add an analyzer slot.
    pub fn with_analyzer(mut self, analyzer: Box<dyn SecurityAnalyzer>) -> Self {
        self.analyzers.push(analyzer);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn extract(&self, submission: &Submission) -> ParsedSubmission {
        parse_submission(submission, &self.config)
    }

    /// Run every analyzer once. An analyzer that still fails after its own
    /// fallback leaves its slot empty.
    pub fn analyze(&self, parsed: &ParsedSubmission) -> Vec<AnalyzerReport> {
        self.analyzers
            .iter()
            .filter_map(|a| match a.analyze(parsed) {
                Ok(report) => Some(report),
                Err(e) => {
                    log::warn!("analyzer {} failed: {e}", a.name());
                    None
                }
            })
            .collect()
    }

    pub fn decide(&self, parsed: &ParsedSubmission, reports: &[AnalyzerReport]) -> ApprovalDecision {
        self.engine.evaluate(&parsed.validation, reports)
    }

    /// Extract, analyze, and decide.
    pub fn run(&self, submission: &Submission) -> PipelineOutcome {
        let parsed = self.extract(submission);
        let reports = self.analyze(&parsed);
        let decision = self.decide(&parsed, &reports);
        log::info!(
            "issue #{} '{}': {} ({:.1})",
            parsed.metadata.issue_number,
            parsed.metadata.name,
            decision.recommendation.as_str(),
            decision.overall_score
        );
        PipelineOutcome {
            submission: parsed,
            reports,
            decision,
            materialized: None,
            materialize_error: None,
        }
    }

    /// [`run`](Self::run), then materialize into `store` when the decision is
    /// AUTO_APPROVE or a maintainer override is given. A failed write is
    /// recorded in the outcome; the decision is never lost.
    pub fn run_and_materialize(
        &self,
        submission: &Submission,
        store: &Store,
        approver: Option<&str>,
    ) -> PipelineOutcome {
        let mut outcome = self.run(submission);
        let approval = match approver {
            Some(a) => Approval::Override {
                approver: a.to_string(),
            },
            None if outcome.decision.recommendation == Recommendation::AutoApprove => {
                Approval::Auto(outcome.decision.clone())
            }
            None => return outcome,
        };
        match materialize(store, &outcome.submission, &approval, &self.config) {
            Ok(report) => outcome.materialized = Some(report),
            Err(e) => {
                log::error!(
                    "issue #{}: materialization failed: {e}",
                    outcome.submission.metadata.issue_number
                );
                outcome.materialize_error = Some(e.to_string());
            }
        }
        outcome
    }
}
