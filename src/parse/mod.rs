pub mod extract;
pub mod tokenize;
pub mod types;
pub mod validate;

pub use extract::{
    extract_commands, extract_contact, extract_tags, normalize_category, parse_commands_payload,
    parse_submission,
};
pub use tokenize::{Field, Section, extract_field, sections};
pub use types::{
    ChecklistItem, Documentation, Metadata, ParsedSubmission, Submission, SubmittedCommand,
    ValidationResult,
};
pub use validate::validate;

use serde::Deserialize;

/// Subset of an issue webhook payload.
#[derive(Deserialize)]
struct IssueEvent {
    issue: IssuePayload,
}

#[derive(Deserialize)]
struct IssuePayload {
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    number: u64,
    #[serde(default)]
    user: Option<IssueUser>,
    #[serde(default)]
    created_at: String,
}

#[derive(Deserialize)]
struct IssueUser {
    login: String,
}

/// Interpret raw tool input as a submission.
///
/// Accepts, in order: a [`Submission`] JSON object, an issue webhook payload
/// (`{"issue": {...}}`), or plain body text.
pub fn read_submission(input: &str) -> Submission {
    let trimmed = input.trim_start();
    if trimmed.starts_with('{') {
        if let Ok(event) = serde_json::from_str::<IssueEvent>(trimmed) {
            let issue = event.issue;
            return Submission {
                title: issue.title,
                body: issue.body.unwrap_or_default(),
                issue_number: issue.number,
                submitter: issue.user.map(|u| u.login).unwrap_or_default(),
                submitted_at: issue.created_at,
            };
        }
        if let Ok(sub) = serde_json::from_str::<Submission>(trimmed)
            && !sub.body.is_empty()
        {
            return sub;
        }
    }
    Submission {
        body: input.to_string(),
        ..Default::default()
    }
}
