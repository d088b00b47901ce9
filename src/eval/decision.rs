use serde::{Deserialize, Serialize};

/// Terminal outcome of one evaluation. Ordered from least to most restrictive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    AutoApprove,
    ManualReview,
    Reject,
}

impl Recommendation {
    pub fn as_str(self) -> &'static str {
        match self {
            Recommendation::AutoApprove => "auto_approve",
            Recommendation::ManualReview => "manual_review",
            Recommendation::Reject => "reject",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Recommendation::AutoApprove => "AUTO_APPROVE",
            Recommendation::ManualReview => "MANUAL_REVIEW",
            Recommendation::Reject => "REJECT",
        }
    }
}

/// Blocking predicates in the order they are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockingPredicate {
    ValidationErrors,
    CriticalFinding,
    CriticalRiskLevel,
    ScoreBelowReject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockingReason {
    pub predicate: BlockingPredicate,
    pub message: String,
}

/// One term of the weighted score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedInput {
    pub name: String,
    pub score: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalDecision {
    pub overall_score: f64,
    pub recommendation: Recommendation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocking_reason: Option<BlockingReason>,
    pub feedback: String,
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub inputs: Vec<WeightedInput>,
}

impl ApprovalDecision {
    /// Single-line reason for logs.
    pub fn reason(&self) -> String {
        match &self.blocking_reason {
            Some(b) => b.message.clone(),
            None => format!("overall score {:.1}", self.overall_score),
        }
    }
}
