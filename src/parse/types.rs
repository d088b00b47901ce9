//! Types produced by the extractor and consumed by the scanner, engine, and store.

use serde::{Deserialize, Deserializer, Serialize};

/// Raw submission as it arrives from the issue tracker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub issue_number: u64,
    /// Login of the account that opened the issue.
    #[serde(default)]
    pub submitter: String,
    /// RFC 3339 timestamp of the issue.
    #[serde(default)]
    pub submitted_at: String,
}

/// One command object from the commands payload, as submitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedCommand {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, deserialize_with = "string_or_list")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub icon: String,
}

/// Accept `"a, b"` as well as `["a", "b"]` for tag lists.
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Tags {
        One(String),
        Many(Vec<String>),
        Nothing(()),
    }
    Ok(match Tags::deserialize(deserializer)? {
        Tags::One(s) => s
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        Tags::Many(v) => v,
        Tags::Nothing(()) => Vec::new(),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub name: String,
    pub description: String,
    pub category: String,
    pub tags: Vec<String>,
    /// Canonical author handle; also the store namespace key.
    pub author: String,
    pub submitter: String,
    pub submitted_at: String,
    pub issue_number: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Documentation {
    pub usage: String,
    pub prerequisites: String,
    pub limitations: String,
}

/// A markdown task-list item from the checklist section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub label: String,
    pub checked: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// True exactly when `errors` is empty.
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Always within 0..=100.
    pub score: u32,
}

/// Structured record extracted from one submission.
///
/// Regenerated on every run; a pure function of the [`Submission`] and config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedSubmission {
    pub metadata: Metadata,
    pub commands: Vec<SubmittedCommand>,
    pub documentation: Documentation,
    pub contact: String,
    #[serde(default)]
    pub checklist: Vec<ChecklistItem>,
    pub validation: ValidationResult,
}
