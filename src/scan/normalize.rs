//! Normalize external analyzer payloads into [`AnalyzerReport`].
//!
//! Two producers feed the engine: a static rule engine (findings with rule
//! ids, severities, tags, and locations) and an AI safety review
//! (`safetyScore`, `riskLevel`, `issues`, `autoApprove`, `summary`). Both are
//! converted here, once, so the engine never looks at the raw shapes.

use serde::Deserialize;

use super::report::{AnalyzerReport, AnalyzerSource, RiskFinding, Severity, risk_level};
use crate::config::{AnalyzerConfig, ScannerConfig};
use crate::error::{GateError, Result};

// ── AI safety report ──

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiSafetyReport {
    #[serde(alias = "score")]
    pub safety_score: f64,
    #[serde(default)]
    pub risk_level: Option<String>,
    #[serde(default)]
    pub issues: Vec<AiIssue>,
    #[serde(default)]
    pub auto_approve: bool,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AiIssue {
    #[serde(default)]
    pub severity: String,
    #[serde(default, alias = "type")]
    pub category: String,
    #[serde(default, alias = "message")]
    pub description: String,
    #[serde(default, alias = "suggestion")]
    pub recommendation: String,
    #[serde(default)]
    pub location: Option<String>,
}

/// Convert an AI safety review. Out-of-range scores or an unknown risk level
/// make the payload malformed.
pub fn normalize_ai(report: AiSafetyReport) -> Result<AnalyzerReport> {
    if !(0.0..=100.0).contains(&report.safety_score) {
        return Err(GateError::InvalidInput(format!(
            "safetyScore {} outside 0..=100",
            report.safety_score
        )));
    }
    let level = match report.risk_level.as_deref() {
        Some(raw) => Severity::parse(raw)
            .ok_or_else(|| GateError::InvalidInput(format!("unknown riskLevel {raw:?}")))?,
        None => risk_level(report.safety_score),
    };
    let findings = report
        .issues
        .into_iter()
        .map(|issue| RiskFinding {
            severity: Severity::parse(&issue.severity).unwrap_or(Severity::Medium),
            category: if issue.category.is_empty() {
                "ai-review".into()
            } else {
                issue.category
            },
            description: issue.description,
            recommendation: issue.recommendation,
            location: issue.location,
        })
        .collect();
    let confidence = report
        .confidence
        .unwrap_or(report.safety_score / 100.0)
        .clamp(0.0, 1.0);

    Ok(AnalyzerReport {
        source: AnalyzerSource::Ai,
        producer: report.model.unwrap_or_else(|| "ai-review".into()),
        score: report.safety_score,
        risk_level: level,
        findings,
        auto_approve_hint: report.auto_approve,
        confidence,
        fallback: false,
        summary: report.summary,
    })
}

/// Parse and convert an AI safety review from JSON text.
pub fn parse_ai_report(json: &str) -> Result<AnalyzerReport> {
    let raw: AiSafetyReport = serde_json::from_str(json)?;
    normalize_ai(raw)
}

// ── Static findings report ──

#[derive(Debug, Deserialize)]
pub struct StaticFindingsReport {
    #[serde(default)]
    pub tool: Option<String>,
    #[serde(default)]
    pub results: Vec<StaticFinding>,
}

#[derive(Debug, Deserialize)]
pub struct StaticFinding {
    #[serde(default, alias = "ruleId", alias = "check_id")]
    pub rule_id: String,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub line: Option<u64>,
    #[serde(default)]
    pub start: Option<Position>,
    /// Nested detail block some rule engines emit instead of flat fields.
    #[serde(default)]
    pub extra: Option<StaticExtra>,
}

#[derive(Debug, Deserialize)]
pub struct Position {
    pub line: u64,
}

#[derive(Debug, Deserialize)]
pub struct StaticExtra {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub metadata: Option<StaticMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct StaticMetadata {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub confidence: Option<String>,
}

impl StaticFinding {
    fn severity(&self) -> Severity {
        let raw = self
            .severity
            .as_deref()
            .or_else(|| self.extra.as_ref().and_then(|e| e.severity.as_deref()));
        let base = raw.and_then(Severity::parse).unwrap_or(Severity::Medium);
        if self.tags.iter().any(|t| t.eq_ignore_ascii_case("critical")) {
            Severity::Critical
        } else {
            base
        }
    }

    fn category(&self) -> String {
        self.extra
            .as_ref()
            .and_then(|e| e.metadata.as_ref())
            .and_then(|m| m.category.clone())
            .or_else(|| self.tags.iter().find(|t| !t.eq_ignore_ascii_case("critical")).cloned())
            .unwrap_or_else(|| "static-analysis".into())
    }

    fn location(&self) -> Option<String> {
        let line = self.line.or_else(|| self.start.as_ref().map(|p| p.line));
        match (self.path.is_empty(), line) {
            (true, None) => None,
            (true, Some(l)) => Some(format!("line {l}")),
            (false, None) => Some(self.path.clone()),
            (false, Some(l)) => Some(format!("{}:{l}", self.path)),
        }
    }
}

/// Convert a static rule-engine report, scoring it with the scanner's
/// severity weights.
pub fn normalize_static(
    report: StaticFindingsReport,
    scanner: &ScannerConfig,
    analyzer: &AnalyzerConfig,
) -> AnalyzerReport {
    let findings: Vec<RiskFinding> = report
        .results
        .iter()
        .map(|f| {
            let message = f
                .message
                .clone()
                .or_else(|| f.extra.as_ref().and_then(|e| e.message.clone()))
                .unwrap_or_default();
            RiskFinding {
                severity: f.severity(),
                category: f.category(),
                description: if f.rule_id.is_empty() {
                    message
                } else {
                    format!("{message} [{}]", f.rule_id)
                },
                recommendation: format!("Review rule {} and fix the flagged code", f.rule_id),
                location: f.location(),
            }
        })
        .collect();

    let penalty: f64 = findings.iter().map(|f| f.severity.weight(scanner)).sum();
    let score = (100.0 - penalty).clamp(0.0, 100.0);
    let has_critical = findings.iter().any(|f| f.severity == Severity::Critical);

    AnalyzerReport {
        source: AnalyzerSource::Static,
        producer: report.tool.unwrap_or_else(|| "static-analysis".into()),
        score,
        risk_level: risk_level(score),
        auto_approve_hint: score >= scanner.auto_approve_min_score && !has_critical,
        confidence: analyzer.static_confidence,
        fallback: false,
        summary: format!("{} static finding(s); score {score:.1}", findings.len()),
        findings,
    }
}

/// Parse and convert a static findings report from JSON text.
pub fn parse_static_report(
    json: &str,
    scanner: &ScannerConfig,
    analyzer: &AnalyzerConfig,
) -> Result<AnalyzerReport> {
    let raw: StaticFindingsReport = serde_json::from_str(json)?;
    Ok(normalize_static(raw, scanner, analyzer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn ai_report_normalized() {
        let r = parse_ai_report(
            r#"{"safetyScore": 90, "riskLevel": "low", "autoApprove": true,
                "summary": "fine", "issues": [{"severity": "low", "type": "style",
                "message": "minor"}]}"#,
        )
        .unwrap();
        assert_eq!(r.source, AnalyzerSource::Ai);
        assert_eq!(r.score, 90.0);
        assert_eq!(r.risk_level, Severity::Low);
        assert!(r.auto_approve_hint);
        assert_eq!(r.confidence, 0.9);
        assert_eq!(r.findings[0].category, "style");
        assert_eq!(r.findings[0].description, "minor");
    }

    #[test]
    fn ai_report_derives_risk_level() {
        let r = parse_ai_report(r#"{"safetyScore": 40}"#).unwrap();
        assert_eq!(r.risk_level, Severity::Critical);
        assert!(!r.auto_approve_hint);
    }

    #[test]
    fn ai_report_malformed() {
        assert!(parse_ai_report("not json").is_err());
        assert!(parse_ai_report(r#"{"summary": "no score"}"#).is_err());
        assert!(parse_ai_report(r#"{"safetyScore": 140}"#).is_err());
        assert!(parse_ai_report(r#"{"safetyScore": 80, "riskLevel": "spicy"}"#).is_err());
    }

    #[test]
    fn static_report_flat_and_nested() {
        let config = Config::default_config();
        let r = parse_static_report(
            r#"{"tool": "rules", "results": [
                {"ruleId": "js.eval", "severity": "ERROR", "message": "eval used",
                 "tags": ["security"], "path": "commands/0.js", "line": 3},
                {"check_id": "js.cookie", "path": "c.js", "start": {"line": 1},
                 "extra": {"message": "cookie", "severity": "WARNING",
                           "metadata": {"category": "privacy"}}}
            ]}"#,
            &config.scanner,
            &config.analyzer,
        )
        .unwrap();
        assert_eq!(r.producer, "rules");
        assert_eq!(r.findings.len(), 2);
        assert_eq!(r.findings[0].severity, Severity::High);
        assert_eq!(r.findings[0].location.as_deref(), Some("commands/0.js:3"));
        assert_eq!(r.findings[1].category, "privacy");
        assert_eq!(r.findings[1].severity, Severity::Medium);
        assert_eq!(r.score, 60.0);
        assert_eq!(r.confidence, 0.8);
    }

    #[test]
    fn static_critical_tag_escalates() {
        let config = Config::default_config();
        let r = parse_static_report(
            r#"{"results": [{"ruleId": "x", "severity": "INFO", "tags": ["critical"]}]}"#,
            &config.scanner,
            &config.analyzer,
        )
        .unwrap();
        assert_eq!(r.findings[0].severity, Severity::Critical);
        assert!(!r.auto_approve_hint);
    }

    #[test]
    fn empty_static_report_is_clean() {
        let config = Config::default_config();
        let r = parse_static_report(r#"{"results": []}"#, &config.scanner, &config.analyzer)
            .unwrap();
        assert_eq!(r.score, 100.0);
        assert!(r.auto_approve_hint);
    }
}
