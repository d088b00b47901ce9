//! Approval decision engine.
//!
//! A pure function of the validation result and the analyzer reports:
//!
//! 1. Weighted score over whichever inputs are present.
//! 2. Blocking predicates in declared order; the first match rejects and is
//!    the recorded reason.
//! 3. Otherwise thresholds pick AUTO_APPROVE, MANUAL_REVIEW, or REJECT.
//!
//! Re-running with identical inputs reproduces the identical decision.

pub mod context;
pub mod decision;
pub mod feedback;

pub use context::EvaluationContext;
pub use decision::{
    ApprovalDecision, BlockingPredicate, BlockingReason, Recommendation, WeightedInput,
};

use crate::config::{Config, EngineConfig};
use crate::parse::ValidationResult;
use crate::scan::{AnalyzerReport, AnalyzerSource, Severity};

pub struct DecisionEngine {
    config: EngineConfig,
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

impl DecisionEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.engine)
    }

    fn weight(&self, source: AnalyzerSource) -> f64 {
        match source {
            AnalyzerSource::Static => self.config.static_weight,
            AnalyzerSource::Ai => self.config.ai_weight,
        }
    }

    fn confidence_threshold(&self, source: AnalyzerSource) -> f64 {
        match source {
            AnalyzerSource::Static => self.config.static_confidence_threshold,
            AnalyzerSource::Ai => self.config.ai_confidence_threshold,
        }
    }

    /// Weighted terms for the present inputs.
    pub fn weighted_inputs(&self, ctx: &EvaluationContext) -> Vec<WeightedInput> {
        let mut inputs = vec![WeightedInput {
            name: "validation".into(),
            score: f64::from(ctx.validation.score),
            weight: self.config.validation_weight,
        }];
        for (source, score) in ctx.source_scores() {
            inputs.push(WeightedInput {
                name: source.as_str().into(),
                score,
                weight: self.weight(source),
            });
        }
        inputs
    }

    /// Weighted score, rounded to one decimal.
    ///
    /// A missing analyzer drops its term. With `renormalize_missing` the sum is
    /// divided by the weights actually present; otherwise the missing weight
    /// deflates the score.
    pub fn weighted_score(&self, inputs: &[WeightedInput]) -> f64 {
        let total: f64 = inputs.iter().map(|i| i.weight * i.score).sum();
        let present: f64 = inputs.iter().map(|i| i.weight).sum();
        let score = if self.config.renormalize_missing && present > 0.0 {
            total / present
        } else {
            total
        };
        round1(score.clamp(0.0, 100.0))
    }

    /// First matching blocking predicate, in declared order.
    fn blocking(&self, ctx: &EvaluationContext, score: f64) -> Option<BlockingReason> {
        if !ctx.validation.errors.is_empty() {
            return Some(BlockingReason {
                predicate: BlockingPredicate::ValidationErrors,
                message: format!(
                    "validation failed with {} error(s): {}",
                    ctx.validation.errors.len(),
                    ctx.validation.errors[0]
                ),
            });
        }
        if let Some((report, finding)) = ctx.first_with(Severity::Critical) {
            return Some(BlockingReason {
                predicate: BlockingPredicate::CriticalFinding,
                message: format!(
                    "{} reported a CRITICAL finding: {}",
                    report.producer, finding.description
                ),
            });
        }
        if let Some(report) = ctx
            .reports
            .iter()
            .find(|r| r.risk_level == Severity::Critical)
        {
            return Some(BlockingReason {
                predicate: BlockingPredicate::CriticalRiskLevel,
                message: format!("{} rated overall risk CRITICAL", report.producer),
            });
        }
        if score < self.config.reject_threshold {
            return Some(BlockingReason {
                predicate: BlockingPredicate::ScoreBelowReject,
                message: format!(
                    "overall score {score:.1} is below the reject threshold {:.0}",
                    self.config.reject_threshold
                ),
            });
        }
        None
    }

    /// True when some analyzer clears its own confidence threshold and hints
    /// that auto-approval is safe.
    fn analyzer_clears(&self, ctx: &EvaluationContext) -> bool {
        ctx.reports.iter().any(|r| {
            r.auto_approve_hint && r.confidence >= self.confidence_threshold(r.source)
        })
    }

    /// Evaluate one submission.
    pub fn evaluate(
        &self,
        validation: &ValidationResult,
        reports: &[AnalyzerReport],
    ) -> ApprovalDecision {
        let ctx = EvaluationContext::new(validation, reports);
        let inputs = self.weighted_inputs(&ctx);
        let score = self.weighted_score(&inputs);

        let blocking = self.blocking(&ctx, score);
        let recommendation = if blocking.is_some() {
            Recommendation::Reject
        } else if score >= self.config.auto_approve_threshold {
            if self.analyzer_clears(&ctx) && !ctx.has_severity_at_least(Severity::High) {
                Recommendation::AutoApprove
            } else {
                Recommendation::ManualReview
            }
        } else if score >= self.config.manual_review_threshold {
            Recommendation::ManualReview
        } else {
            Recommendation::Reject
        };

        ApprovalDecision {
            overall_score: score,
            recommendation,
            feedback: feedback::render(&ctx, score, recommendation, blocking.as_ref()),
            recommendations: feedback::recommendations(&ctx),
            blocking_reason: blocking,
            inputs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{RiskFinding, risk_level};

    fn engine() -> DecisionEngine {
        DecisionEngine::from_config(&Config::default_config())
    }

    fn validation(score: u32, errors: usize) -> ValidationResult {
        let errors: Vec<String> = (0..errors).map(|i| format!("error {i}")).collect();
        ValidationResult {
            valid: errors.is_empty(),
            errors,
            warnings: vec![],
            score,
        }
    }

    fn report(source: AnalyzerSource, score: f64, findings: Vec<Severity>) -> AnalyzerReport {
        AnalyzerReport {
            source,
            producer: format!("{}-test", source.as_str()),
            score,
            risk_level: risk_level(score),
            findings: findings
                .into_iter()
                .map(|severity| RiskFinding {
                    severity,
                    category: "test".into(),
                    description: format!("{} issue", severity.label()),
                    recommendation: format!("fix {}", severity.label()),
                    location: None,
                })
                .collect(),
            auto_approve_hint: score >= 75.0,
            confidence: 0.9,
            fallback: false,
            summary: String::new(),
        }
    }

    #[test]
    fn clean_inputs_auto_approve() {
        let d = engine().evaluate(
            &validation(100, 0),
            &[report(AnalyzerSource::Ai, 90.0, vec![])],
        );
        assert_eq!(d.recommendation, Recommendation::AutoApprove);
        assert!(d.overall_score >= 80.0);
        assert!(d.blocking_reason.is_none());
    }

    #[test]
    fn high_finding_prevents_auto_approve() {
        let d = engine().evaluate(
            &validation(100, 0),
            &[report(AnalyzerSource::Ai, 95.0, vec![Severity::High])],
        );
        assert_eq!(d.recommendation, Recommendation::ManualReview);
    }

    #[test]
    fn low_confidence_prevents_auto_approve() {
        let mut r = report(AnalyzerSource::Ai, 95.0, vec![]);
        r.confidence = 0.5;
        let d = engine().evaluate(&validation(100, 0), &[r]);
        assert_eq!(d.recommendation, Recommendation::ManualReview);
    }

    #[test]
    fn no_analyzers_never_auto_approves() {
        let d = engine().evaluate(&validation(100, 0), &[]);
        assert_eq!(d.overall_score, 100.0);
        assert_eq!(d.recommendation, Recommendation::ManualReview);
    }

    #[test]
    fn first_predicate_is_reported() {
        // Every predicate matches; validation errors come first.
        let d = engine().evaluate(
            &validation(0, 4),
            &[report(AnalyzerSource::Ai, 0.0, vec![Severity::Critical])],
        );
        assert_eq!(d.recommendation, Recommendation::Reject);
        assert_eq!(
            d.blocking_reason.unwrap().predicate,
            BlockingPredicate::ValidationErrors
        );

        let d = engine().evaluate(
            &validation(100, 0),
            &[report(AnalyzerSource::Ai, 0.0, vec![Severity::Critical])],
        );
        assert_eq!(
            d.blocking_reason.unwrap().predicate,
            BlockingPredicate::CriticalFinding
        );

        let d = engine().evaluate(
            &validation(100, 0),
            &[report(AnalyzerSource::Ai, 10.0, vec![])],
        );
        assert_eq!(
            d.blocking_reason.unwrap().predicate,
            BlockingPredicate::CriticalRiskLevel
        );
    }

    #[test]
    fn score_below_reject_threshold() {
        let mut r = report(AnalyzerSource::Ai, 60.0, vec![]);
        r.risk_level = Severity::High;
        let d = engine().evaluate(&validation(0, 0), &[r]);
        // (0.3*0 + 0.4*60) / 0.7 = 34.3 -> not below 30
        assert_eq!(d.overall_score, 34.3);
        assert_eq!(d.recommendation, Recommendation::Reject);
        assert!(d.blocking_reason.is_none());

        let mut r = report(AnalyzerSource::Ai, 50.0, vec![]);
        r.risk_level = Severity::High;
        let d = engine().evaluate(&validation(0, 0), &[r]);
        assert_eq!(
            d.blocking_reason.unwrap().predicate,
            BlockingPredicate::ScoreBelowReject
        );
    }

    #[test]
    fn manual_review_band() {
        let d = engine().evaluate(
            &validation(70, 0),
            &[report(AnalyzerSource::Ai, 70.0, vec![Severity::Medium])],
        );
        assert_eq!(d.overall_score, 70.0);
        assert_eq!(d.recommendation, Recommendation::ManualReview);
    }

    #[test]
    fn deflation_without_renormalization() {
        let mut config = Config::default_config();
        config.engine.renormalize_missing = false;
        let engine = DecisionEngine::from_config(&config);
        let d = engine.evaluate(
            &validation(100, 0),
            &[report(AnalyzerSource::Ai, 90.0, vec![])],
        );
        assert_eq!(d.overall_score, 66.0);
        assert_eq!(d.recommendation, Recommendation::ManualReview);
    }

    #[test]
    fn weighted_score_is_monotonic() {
        let e = engine();
        for base in [0.0, 25.0, 50.0, 75.0] {
            for bump in [0.0, 1.0, 10.0, 25.0] {
                let lo = e.evaluate(
                    &validation(60, 0),
                    &[
                        report(AnalyzerSource::Static, base, vec![]),
                        report(AnalyzerSource::Ai, 70.0, vec![]),
                    ],
                );
                let hi = e.evaluate(
                    &validation(60, 0),
                    &[
                        report(AnalyzerSource::Static, base + bump, vec![]),
                        report(AnalyzerSource::Ai, 70.0, vec![]),
                    ],
                );
                assert!(hi.overall_score >= lo.overall_score);
            }
        }
    }

    #[test]
    fn deterministic_rerun() {
        let v = validation(90, 0);
        let reports = [
            report(AnalyzerSource::Static, 85.0, vec![Severity::Low, Severity::Medium]),
            report(AnalyzerSource::Ai, 80.0, vec![Severity::Medium]),
        ];
        assert_eq!(engine().evaluate(&v, &reports), engine().evaluate(&v, &reports));
    }

    #[test]
    fn feedback_groups_by_severity() {
        let mut v = validation(90, 0);
        v.warnings.push("minor thing".into());
        let d = engine().evaluate(
            &v,
            &[report(
                AnalyzerSource::Static,
                80.0,
                vec![Severity::Low, Severity::High, Severity::Medium],
            )],
        );
        let high = d.feedback.find("### HIGH findings").unwrap();
        let medium = d.feedback.find("### MEDIUM findings").unwrap();
        let low = d.feedback.find("### LOW findings").unwrap();
        let warn = d.feedback.find("### Warnings").unwrap();
        assert!(high < medium && medium < low && low < warn);
        assert_eq!(
            d.recommendations,
            vec!["fix HIGH", "fix MEDIUM", "fix LOW", "Consider: minor thing"]
        );
    }
}
