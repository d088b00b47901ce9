use std::collections::BTreeMap;

use crate::parse::ValidationResult;
use crate::scan::{AnalyzerReport, AnalyzerSource, RiskFinding, Severity};

/// Everything one evaluation looks at.
#[derive(Debug)]
pub struct EvaluationContext<'a> {
    pub validation: &'a ValidationResult,
    pub reports: &'a [AnalyzerReport],
}

impl<'a> EvaluationContext<'a> {
    pub fn new(validation: &'a ValidationResult, reports: &'a [AnalyzerReport]) -> Self {
        Self {
            validation,
            reports,
        }
    }

    /// Mean report score per present source, in source order.
    pub fn source_scores(&self) -> BTreeMap<AnalyzerSource, f64> {
        let mut sums: BTreeMap<AnalyzerSource, (f64, usize)> = BTreeMap::new();
        for r in self.reports {
            let entry = sums.entry(r.source).or_insert((0.0, 0));
            entry.0 += r.score;
            entry.1 += 1;
        }
        sums.into_iter()
            .map(|(source, (sum, n))| (source, sum / n as f64))
            .collect()
    }

    /// All findings across reports, paired with the producing report.
    pub fn findings(&self) -> impl Iterator<Item = (&'a AnalyzerReport, &'a RiskFinding)> {
        self.reports
            .iter()
            .flat_map(|r| r.findings.iter().map(move |f| (r, f)))
    }

    /// First finding of the given severity, if any.
    pub fn first_with(&self, severity: Severity) -> Option<(&'a AnalyzerReport, &'a RiskFinding)> {
        self.findings().find(|(_, f)| f.severity == severity)
    }

    pub fn has_severity_at_least(&self, severity: Severity) -> bool {
        self.findings().any(|(_, f)| f.severity >= severity)
    }
}
