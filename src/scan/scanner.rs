//! Local pattern-based risk scanner.
//!
//! Each command is scanned on its own. Every match of every rule produces one
//! finding; repeated matches are not collapsed. A command scores
//! `100 - Σ severity weight + defensive bonuses`, clamped to 0..=100, and the
//! collection scores the mean of its commands.

use regex::Regex;

use super::patterns::{DANGEROUS, DEFENSIVE, PatternRule, SUSPICIOUS, long_literal};
use super::report::{AnalyzerReport, AnalyzerSource, RiskFinding, Severity, risk_level};
use super::SecurityAnalyzer;
use crate::config::ScannerConfig;
use crate::error::Result;
use crate::parse::{ParsedSubmission, SubmittedCommand};

pub const PRODUCER: &str = "pattern-scanner";

/// Per-command scan outcome.
#[derive(Debug, Clone)]
pub struct CommandScan {
    pub score: f64,
    pub findings: Vec<RiskFinding>,
}

pub struct PatternScanner {
    config: ScannerConfig,
    long_literal: Regex,
}

fn line_of(code: &str, offset: usize) -> usize {
    code[..offset].matches('\n').count() + 1
}

fn location(index: usize, cmd: &SubmittedCommand, code: &str, offset: usize) -> String {
    let name = if cmd.name.trim().is_empty() {
        String::new()
    } else {
        format!(" '{}'", cmd.name.trim())
    };
    format!("commands[{index}]{name} line {}", line_of(code, offset))
}

impl PatternScanner {
    pub fn new(config: &ScannerConfig) -> Self {
        Self {
            config: config.clone(),
            long_literal: long_literal(config.long_literal_threshold),
        }
    }

    fn apply_rules(
        rules: &[PatternRule],
        index: usize,
        cmd: &SubmittedCommand,
        findings: &mut Vec<RiskFinding>,
    ) {
        for rule in rules {
            for m in rule.regex.find_iter(&cmd.code) {
                findings.push(RiskFinding {
                    severity: rule.severity,
                    category: rule.category.to_string(),
                    description: format!("{} [{}]", rule.description, rule.id),
                    recommendation: rule.recommendation.to_string(),
                    location: Some(location(index, cmd, &cmd.code, m.start())),
                });
            }
        }
    }

    /// Scan one command.
    pub fn scan_command(&self, index: usize, cmd: &SubmittedCommand) -> CommandScan {
        let mut findings = Vec::new();
        Self::apply_rules(&DANGEROUS, index, cmd, &mut findings);
        Self::apply_rules(&SUSPICIOUS, index, cmd, &mut findings);

        for m in self.long_literal.find_iter(&cmd.code) {
            findings.push(RiskFinding {
                severity: Severity::Medium,
                category: "obfuscation".into(),
                description: format!(
                    "String literal of {} characters may hide an encoded payload",
                    m.as_str().chars().count().saturating_sub(2)
                ),
                recommendation: "Keep command source readable; split or explain long strings"
                    .into(),
                location: Some(location(index, cmd, &cmd.code, m.start())),
            });
        }

        let penalty: f64 = findings.iter().map(|f| f.severity.weight(&self.config)).sum();
        let mut bonus = 0.0;
        if DEFENSIVE.try_catch.is_match(&cmd.code) {
            bonus += self.config.try_catch_bonus;
        }
        if DEFENSIVE.user_feedback.is_match(&cmd.code) {
            bonus += self.config.feedback_bonus;
        }
        if DEFENSIVE.strict_mode.is_match(&cmd.code) {
            bonus += self.config.strict_mode_bonus;
        }

        CommandScan {
            score: (100.0 - penalty + bonus).clamp(0.0, 100.0),
            findings,
        }
    }

    /// Scan every command and aggregate into a report.
    pub fn scan(&self, commands: &[SubmittedCommand]) -> AnalyzerReport {
        if commands.is_empty() {
            return AnalyzerReport {
                source: AnalyzerSource::Static,
                producer: PRODUCER.into(),
                score: 100.0,
                risk_level: Severity::Low,
                findings: Vec::new(),
                auto_approve_hint: false,
                confidence: 0.0,
                fallback: false,
                summary: "no commands to scan".into(),
            };
        }

        let scans: Vec<CommandScan> = commands
            .iter()
            .enumerate()
            .map(|(i, c)| self.scan_command(i, c))
            .collect();
        let score = scans.iter().map(|s| s.score).sum::<f64>() / scans.len() as f64;
        let findings: Vec<RiskFinding> = scans.into_iter().flat_map(|s| s.findings).collect();
        let has_critical = findings.iter().any(|f| f.severity == Severity::Critical);

        AnalyzerReport {
            source: AnalyzerSource::Static,
            producer: PRODUCER.into(),
            score,
            risk_level: risk_level(score),
            auto_approve_hint: score >= self.config.auto_approve_min_score && !has_critical,
            confidence: self.config.confidence,
            fallback: false,
            summary: format!(
                "{} finding(s) across {} command(s); score {score:.1}",
                findings.len(),
                commands.len()
            ),
            findings,
        }
    }
}

impl SecurityAnalyzer for PatternScanner {
    fn name(&self) -> &str {
        PRODUCER
    }

    fn source(&self) -> AnalyzerSource {
        AnalyzerSource::Static
    }

    fn analyze(&self, submission: &ParsedSubmission) -> Result<AnalyzerReport> {
        Ok(self.scan(&submission.commands))
    }
}
