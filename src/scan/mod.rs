//! Security analysis: the local pattern scanner, external analyzers, and the
//! normalized report they all produce.
//!
//! Every analyzer implements [`SecurityAnalyzer`] and returns an
//! [`AnalyzerReport`]; the decision engine never needs to know which one ran.

/// Normalization of AI and static-rule payloads into [`AnalyzerReport`].
pub mod normalize;
/// Fixed dangerous/suspicious/defensive pattern tables.
pub mod patterns;
/// External analyzers (report file, spawned command) and the fallback combinator.
pub mod remote;
/// Severity, risk level, findings, and the shared report shape.
pub mod report;
/// Local per-command pattern scanner.
pub mod scanner;

pub use normalize::{parse_ai_report, parse_static_report};
pub use remote::{CommandAnalyzer, ReportFileAnalyzer, StaticReportAnalyzer, WithFallback};
pub use report::{AnalyzerReport, AnalyzerSource, RiskFinding, RiskLevel, Severity, risk_level};
pub use scanner::PatternScanner;

use crate::error::Result;
use crate::parse::ParsedSubmission;

/// A producer of [`AnalyzerReport`]s.
///
/// Implementations must be safe to share; a single analyzer may serve many
/// submissions.
pub trait SecurityAnalyzer: Send + Sync {
    /// Short name for logs and substitution notes.
    fn name(&self) -> &str;
    /// Engine slot this analyzer's reports fill.
    fn source(&self) -> AnalyzerSource;
    /// Analyze one parsed submission.
    fn analyze(&self, submission: &ParsedSubmission) -> Result<AnalyzerReport>;
}

impl<T: SecurityAnalyzer + ?Sized> SecurityAnalyzer for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn source(&self) -> AnalyzerSource {
        (**self).source()
    }

    fn analyze(&self, submission: &ParsedSubmission) -> Result<AnalyzerReport> {
        (**self).analyze(submission)
    }
}
