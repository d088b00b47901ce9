//! The normalized analyzer report shared by every analysis producer.

use serde::{Deserialize, Serialize};

use crate::config::ScannerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const DESCENDING: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }

    /// Lenient parse covering both severity ladders producers use
    /// (`low..critical` and `info/warning/error`).
    pub fn parse(raw: &str) -> Option<Severity> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" | "info" | "note" => Some(Severity::Low),
            "medium" | "moderate" | "warning" | "warn" => Some(Severity::Medium),
            "high" | "error" => Some(Severity::High),
            "critical" | "blocker" => Some(Severity::Critical),
            _ => None,
        }
    }

    /// Score deduction for one finding of this severity.
    pub fn weight(self, config: &ScannerConfig) -> f64 {
        match self {
            Severity::Low => config.low_weight,
            Severity::Medium => config.medium_weight,
            Severity::High => config.high_weight,
            Severity::Critical => config.critical_weight,
        }
    }
}

/// Overall risk of a report. Same ladder as [`Severity`].
pub type RiskLevel = Severity;

/// Risk ladder: ≥90 LOW, ≥70 MEDIUM, ≥50 HIGH, otherwise CRITICAL.
pub fn risk_level(score: f64) -> RiskLevel {
    if score >= 90.0 {
        Severity::Low
    } else if score >= 70.0 {
        Severity::Medium
    } else if score >= 50.0 {
        Severity::High
    } else {
        Severity::Critical
    }
}

/// Which weighted slot of the decision engine a report fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzerSource {
    Static,
    Ai,
}

impl AnalyzerSource {
    pub fn as_str(self) -> &'static str {
        match self {
            AnalyzerSource::Static => "static",
            AnalyzerSource::Ai => "ai",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskFinding {
    pub severity: Severity,
    pub category: String,
    pub description: String,
    pub recommendation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzerReport {
    pub source: AnalyzerSource,
    /// Name of whatever produced the report (`pattern-scanner`, a rule engine, a model).
    pub producer: String,
    /// 0..=100, higher is safer.
    pub score: f64,
    pub risk_level: RiskLevel,
    pub findings: Vec<RiskFinding>,
    pub auto_approve_hint: bool,
    /// 0..=1.
    pub confidence: f64,
    /// Set when this report was substituted for an unavailable analyzer.
    #[serde(default)]
    pub fallback: bool,
    #[serde(default)]
    pub summary: String,
}

impl AnalyzerReport {
    pub fn has_severity(&self, severity: Severity) -> bool {
        self.findings.iter().any(|f| f.severity == severity)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.findings.iter().filter(|f| f.severity == severity).count()
    }
}
