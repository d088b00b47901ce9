//! Deterministic reviewer-facing feedback.
//!
//! Errors come first, then findings grouped by severity (most severe first,
//! report order within a group), then warnings. The same inputs always render
//! the same text.

use std::fmt::Write;

use super::context::EvaluationContext;
use super::decision::{BlockingReason, Recommendation};
use crate::scan::{RiskFinding, Severity};

fn finding_line(producer: &str, f: &RiskFinding) -> String {
    let mut line = format!("- [{}] {}", f.category, f.description);
    if let Some(loc) = &f.location {
        let _ = write!(line, " ({loc})");
    }
    let _ = write!(line, " _via {producer}_");
    line
}

fn closing(recommendation: Recommendation) -> &'static str {
    match recommendation {
        Recommendation::AutoApprove => {
            "All checks passed. This collection will be published automatically."
        }
        Recommendation::ManualReview => {
            "A maintainer will review this submission before it is published."
        }
        Recommendation::Reject => {
            "This submission cannot be published as-is. Address the items above and edit the issue to re-run the checks."
        }
    }
}

/// Render the feedback text.
pub fn render(
    ctx: &EvaluationContext,
    score: f64,
    recommendation: Recommendation,
    blocking: Option<&BlockingReason>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "## Submission review: {}", recommendation.label());
    let _ = writeln!(out);
    let _ = writeln!(out, "Overall score: {score:.1}/100");
    if let Some(b) = blocking {
        let _ = writeln!(out);
        let _ = writeln!(out, "**Blocked:** {}", b.message);
    }

    if !ctx.validation.errors.is_empty() {
        let _ = writeln!(out, "\n### Validation errors");
        for e in &ctx.validation.errors {
            let _ = writeln!(out, "- {e}");
        }
    }

    for severity in Severity::DESCENDING {
        let lines: Vec<String> = ctx
            .findings()
            .filter(|(_, f)| f.severity == severity)
            .map(|(r, f)| finding_line(&r.producer, f))
            .collect();
        if lines.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n### {} findings", severity.label());
        for line in lines {
            let _ = writeln!(out, "{line}");
        }
    }

    if !ctx.validation.warnings.is_empty() {
        let _ = writeln!(out, "\n### Warnings");
        for w in &ctx.validation.warnings {
            let _ = writeln!(out, "- {w}");
        }
    }

    let substituted: Vec<&str> = ctx
        .reports
        .iter()
        .filter(|r| r.fallback)
        .map(|r| r.producer.as_str())
        .collect();
    if !substituted.is_empty() {
        let _ = writeln!(
            out,
            "\n_Note: an analyzer was unavailable; results from {} were used instead._",
            substituted.join(", ")
        );
    }

    let _ = writeln!(out, "\n{}", closing(recommendation));
    out
}

/// Actionable items: errors, then finding recommendations by severity, then
/// warnings. Duplicates keep their first position.
pub fn recommendations(ctx: &EvaluationContext) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    let mut push = |item: String| {
        if !item.trim().is_empty() && !items.contains(&item) {
            items.push(item);
        }
    };
    for e in &ctx.validation.errors {
        push(format!("Fix: {e}"));
    }
    for severity in Severity::DESCENDING {
        for (_, f) in ctx.findings().filter(|(_, f)| f.severity == severity) {
            push(f.recommendation.clone());
        }
    }
    for w in &ctx.validation.warnings {
        push(format!("Consider: {w}"));
    }
    items
}
