use chrono::{SecondsFormat, Utc};
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};
use std::io::Write;

use crate::eval::ApprovalDecision;
use crate::parse::ParsedSubmission;

/// Install the stderr logger. `verbosity` counts `-v` flags.
/// Calling it twice is harmless; the second call is ignored.
pub fn init(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .build();
    let _ = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto);
}

/// Append a decision record to ~/.local/share/collection-gate/decisions.log.
/// Best-effort: failures are silently ignored (logging must never fail a run).
pub fn log_decision(submission: &ParsedSubmission, decision: &ApprovalDecision) {
    let Some(home) = std::env::var_os("HOME") else {
        return;
    };
    let log_dir = std::path::Path::new(&home).join(".local/share/collection-gate");
    let _ = std::fs::create_dir_all(&log_dir);

    let log_path = log_dir.join("decisions.log");
    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
    else {
        return;
    };

    let _ = writeln!(file, "{}", decision_line(submission, decision));
}

/// One tab-separated record: time, decision, score, issue, author, name, reason.
fn decision_line(submission: &ParsedSubmission, decision: &ApprovalDecision) -> String {
    let ts = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let name: String = submission
        .metadata
        .name
        .replace(['\t', '\n'], " ")
        .chars()
        .take(120)
        .collect();
    let reason = decision
        .blocking_reason
        .as_ref()
        .map(|b| b.message.replace(['\t', '\n'], "; "))
        .unwrap_or_default();
    format!(
        "{ts}\t{decision}\t{score:.1}\t#{issue}\t{author}\t{name}\t{reason}",
        decision = decision.recommendation.as_str(),
        score = decision.overall_score,
        issue = submission.metadata.issue_number,
        author = submission.metadata.author,
    )
}
