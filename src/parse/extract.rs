//! Evidence extraction: turn a submission body into a [`ParsedSubmission`].
//!
//! Nothing here fails. Absent or malformed fields come back empty and the
//! validation pass records the problem.

use serde_json::Value;

use super::tokenize::{Field, extract_field, sections};
use super::types::{
    ChecklistItem, Documentation, Metadata, ParsedSubmission, Submission, SubmittedCommand,
};
use super::validate::validate;
use crate::config::Config;

const DEFAULT_CATEGORY: &str = "Other";

/// Remove a surrounding ``` fence (with optional info string) from a payload.
fn strip_code_fence(raw: &str) -> &str {
    let mut text = raw.trim();
    if text.starts_with("```") {
        text = match text.find('\n') {
            Some(nl) => &text[nl + 1..],
            None => text.trim_start_matches('`'),
        };
    }
    let trimmed = text.trim_end();
    if let Some(stripped) = trimmed.strip_suffix("```") {
        text = stripped;
    }
    text.trim()
}

/// Parse a commands payload: `{"commands": [...]}` or a bare array.
///
/// Elements that are not command objects are skipped; an unparsable payload
/// yields an empty list.
pub fn parse_commands_payload(raw: &str) -> Vec<SubmittedCommand> {
    let payload = strip_code_fence(raw);
    if payload.is_empty() {
        return Vec::new();
    }
    let value: Value = match serde_json::from_str(payload) {
        Ok(v) => v,
        Err(e) => {
            log::debug!("commands payload is not JSON: {e}");
            return Vec::new();
        }
    };
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("commands") {
            Some(Value::Array(items)) => items,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };
    items
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect()
}

/// Locate the commands field in a body and parse it.
pub fn extract_commands(body: &str) -> Vec<SubmittedCommand> {
    parse_commands_payload(&extract_field(body, "commands"))
}

/// Exact, case-insensitive match against the closed taxonomy; `"Other"` otherwise.
pub fn normalize_category(raw: &str, categories: &[String]) -> String {
    let wanted = raw.trim();
    categories
        .iter()
        .find(|c| c.eq_ignore_ascii_case(wanted))
        .cloned()
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
}

/// Canonical directory key for a contact handle: no `@`, no whitespace, lowercase.
///
/// The handle is not checked for existence here.
pub fn extract_contact(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != '@' && !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

/// Split a tag field on commas and newlines. Tags are lowercased, stripped of
/// a leading `#`, and deduplicated keeping the first occurrence.
pub fn extract_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for part in raw.split([',', '\n']) {
        let tag = part.trim().trim_start_matches('#').trim().to_lowercase();
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

/// Markdown task-list items (`- [x] label`) from the checklist section.
pub fn extract_checklist(raw: &str) -> Vec<ChecklistItem> {
    raw.lines()
        .filter_map(|line| {
            let rest = line.trim().strip_prefix(['-', '*'])?.trim_start();
            let (checked, label) = if let Some(l) = rest.strip_prefix("[ ]") {
                (false, l)
            } else if let Some(l) = rest
                .strip_prefix("[x]")
                .or_else(|| rest.strip_prefix("[X]"))
            {
                (true, l)
            } else {
                return None;
            };
            Some(ChecklistItem {
                label: label.trim().to_string(),
                checked,
            })
        })
        .collect()
}

/// Collection name: the name field, else the issue title without a leading
/// `[Tag]` prefix.
fn collection_name(field: &str, title: &str) -> String {
    let field = field.lines().next().unwrap_or("").trim();
    if !field.is_empty() {
        return field.to_string();
    }
    let title = title.trim();
    match title.strip_prefix('[').and_then(|rest| rest.split_once(']')) {
        Some((_, rest)) => rest.trim_start_matches(':').trim().to_string(),
        None => title.to_string(),
    }
}

/// Extract and validate one submission.
pub fn parse_submission(submission: &Submission, config: &Config) -> ParsedSubmission {
    let body = &submission.body;
    let field = |f: Field| -> String {
        let canonical = f.aliases()[0];
        extract_field(body, canonical)
    };

    let contact = extract_contact(&field(Field::Contact));
    let submitter = if submission.submitter.trim().is_empty() {
        contact.clone()
    } else {
        extract_contact(&submission.submitter)
    };

    let metadata = Metadata {
        name: collection_name(&field(Field::Name), &submission.title),
        description: field(Field::Description),
        category: normalize_category(&field(Field::Category), &config.taxonomy.categories),
        tags: extract_tags(&field(Field::Tags)),
        author: contact.clone(),
        submitter,
        submitted_at: submission.submitted_at.clone(),
        issue_number: submission.issue_number,
    };

    let documentation = Documentation {
        usage: field(Field::Usage),
        prerequisites: field(Field::Prerequisites),
        limitations: field(Field::Limitations),
    };

    let mut parsed = ParsedSubmission {
        metadata,
        commands: extract_commands(body),
        documentation,
        contact,
        checklist: extract_checklist(&field(Field::Checklist)),
        validation: Default::default(),
    };
    parsed.validation = validate(&parsed, &config.validation);

    log::debug!(
        "extracted {} section(s), {} command(s) from issue #{}",
        sections(body).len(),
        parsed.commands.len(),
        submission.issue_number
    );
    parsed
}
