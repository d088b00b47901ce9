//! Local validation pass over a parsed submission snapshot.
//!
//! Score starts at 100, loses `error_penalty` per error and `warning_penalty`
//! per warning, gains `command_bonus` when the collection has at least
//! `bonus_min_commands` commands, and is clamped to 0..=100.

use regex::Regex;
use std::sync::LazyLock;

use super::types::{ParsedSubmission, ValidationResult};
use crate::config::ValidationConfig;

/// Dynamic code execution idioms rejected outright.
static DYNAMIC_EXECUTION: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"\beval\s*\(", "eval"),
        (r"\bnew\s+Function\s*\(", "new Function"),
        (r#"\bset(?:Timeout|Interval)\s*\(\s*["'`]"#, "string timer callback"),
    ]
    .into_iter()
    .map(|(p, label)| (Regex::new(p).expect("static pattern must compile"), label))
    .collect()
});

static HARDCODED_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s"'`)]+"#).expect("static pattern must compile"));

fn label(index: usize, name: &str) -> String {
    if name.trim().is_empty() {
        format!("Command #{}", index + 1)
    } else {
        format!("Command '{}'", name.trim())
    }
}

/// Validate the snapshot. Pure; does not touch `parsed.validation`.
pub fn validate(parsed: &ParsedSubmission, config: &ValidationConfig) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if parsed.metadata.name.trim().is_empty() {
        errors.push("Collection name is required".to_string());
    }
    if parsed.metadata.description.trim().is_empty() {
        errors.push("Collection description is required".to_string());
    }
    if parsed.contact.is_empty() {
        errors.push("Contact handle is required".to_string());
    }
    if parsed.commands.is_empty() {
        errors.push(
            "No valid commands found; provide a JSON commands payload with at least one command"
                .to_string(),
        );
    }

    for (i, cmd) in parsed.commands.iter().enumerate() {
        let who = label(i, &cmd.name);
        if cmd.name.trim().is_empty() {
            errors.push(format!("{who} is missing a name"));
        }
        if cmd.code.trim().is_empty() {
            errors.push(format!("{who} is missing code"));
            continue;
        }
        for (re, construct) in DYNAMIC_EXECUTION.iter() {
            if re.is_match(&cmd.code) {
                errors.push(format!("{who} uses dynamic code execution ({construct})"));
            }
        }
        if let Some(url) = HARDCODED_URL.find(&cmd.code) {
            warnings.push(format!("{who} contains a hardcoded URL ({})", url.as_str()));
        }
    }

    let unchecked = parsed.checklist.iter().filter(|c| !c.checked).count();
    if unchecked > 0 {
        warnings.push(format!(
            "Submission checklist is incomplete ({} of {} items confirmed)",
            parsed.checklist.len() - unchecked,
            parsed.checklist.len()
        ));
    }

    let mut score = 100i64
        - errors.len() as i64 * i64::from(config.error_penalty)
        - warnings.len() as i64 * i64::from(config.warning_penalty);
    if parsed.commands.len() >= config.bonus_min_commands {
        score += i64::from(config.command_bonus);
    }

    ValidationResult {
        valid: errors.is_empty(),
        errors,
        warnings,
        score: score.clamp(0, 100) as u32,
    }
}
