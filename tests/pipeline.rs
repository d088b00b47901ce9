use collection_gate::config::Config;
use collection_gate::eval::{BlockingPredicate, Recommendation};
use collection_gate::parse::{Submission, parse_submission, read_submission};
use collection_gate::pipeline::{AnalyzerOptions, Pipeline};
use collection_gate::scan::{AnalyzerSource, Severity};

fn body(name: &str, commands_json: &str) -> String {
    format!(
        "### Collection Name\n{name}\n\n\
         ### Description\nSmall helpers for reading long pages.\n\n\
         ### Category\nproductivity\n\n\
         ### Tags\nreading, #Focus, reading\n\n\
         ### GitHub Username\n@Reader-One\n\n\
         ### Commands JSON\n```json\n{commands_json}\n```\n\n\
         ### Checklist\n- [x] I tested these commands\n- [x] No tracking or data collection\n"
    )
}

const CLEAN_COMMANDS: &str = r#"{"commands": [
  {"name": "Scroll To Top", "description": "Jump up", "code": "window.scrollTo({ top: 0, behavior: 'smooth' });"},
  {"name": "Zoom In", "description": "Bigger text", "code": "document.body.style.zoom = '120%';"},
  {"name": "Copy Title", "description": "Copy page title", "code": "navigator.clipboard.writeText(document.title);"}
]}"#;

fn submission(body: String) -> Submission {
    Submission {
        title: "[Collection] Reading Helpers".into(),
        body,
        issue_number: 101,
        submitter: "reader-one".into(),
        submitted_at: "2026-06-01T09:30:00Z".into(),
    }
}

fn ai_report(dir: &std::path::Path, json: &str) -> std::path::PathBuf {
    let path = dir.join("ai-report.json");
    std::fs::write(&path, json).unwrap();
    path
}

macro_rules! decision_test {
    ($name:ident, $code:expr, $decision:ident) => {
        #[test]
        fn $name() {
            let commands = format!(
                r#"[{{"name": "Only", "description": "d", "code": {}}}]"#,
                serde_json::to_string($code).unwrap()
            );
            let text = body("Single", &commands);
            assert_eq!(
                collection_gate::evaluate(&text).recommendation,
                Recommendation::$decision,
                "code: {}",
                $code,
            );
        }
    };
}

// ── Dangerous constructs always reject ──

decision_test!(reject_eval, "eval(location.hash.slice(1))", Reject);
decision_test!(reject_function_constructor, "new Function('return 1')()", Reject);

// ── Single clean command: pattern scanner alone can clear it ──

decision_test!(approve_clean_single, "window.print();", AutoApprove);

// ── HIGH findings hold for review ──

decision_test!(review_cookie_access, "console.log(document.cookie.length);", ManualReview);

#[test]
fn example_a_clean_submission_auto_approves() {
    let dir = tempfile::tempdir().unwrap();
    let options = AnalyzerOptions {
        ai_report: Some(ai_report(
            dir.path(),
            r#"{"safetyScore": 90, "riskLevel": "LOW", "issues": [], "autoApprove": true, "summary": "Looks safe"}"#,
        )),
        ..Default::default()
    };
    let pipeline = Pipeline::from_options(Config::default_config(), &options).unwrap();
    let outcome = pipeline.run(&submission(body("Reading Helpers", CLEAN_COMMANDS)));

    assert_eq!(outcome.submission.commands.len(), 3);
    assert_eq!(outcome.submission.validation.score, 100);
    assert!(outcome.submission.validation.valid);
    assert_eq!(outcome.reports.len(), 2);
    assert!(outcome.reports.iter().all(|r| !r.fallback));
    assert!(outcome.decision.overall_score >= 80.0);
    assert!(outcome.decision.blocking_reason.is_none());
    assert_eq!(outcome.decision.recommendation, Recommendation::AutoApprove);
}

#[test]
fn example_b_dynamic_execution_rejects() {
    let commands = r#"[
      {"name": "Run Hash", "code": "eval(location.hash.slice(1));"},
      {"name": "Scroll", "code": "window.scrollTo(0, 0);"},
      {"name": "Print", "code": "window.print();"}
    ]"#;
    let dir = tempfile::tempdir().unwrap();
    // A glowing AI review does not rescue it.
    let options = AnalyzerOptions {
        ai_report: Some(ai_report(
            dir.path(),
            r#"{"safetyScore": 99, "riskLevel": "LOW", "issues": [], "autoApprove": true, "summary": ""}"#,
        )),
        ..Default::default()
    };
    let pipeline = Pipeline::from_options(Config::default_config(), &options).unwrap();
    let outcome = pipeline.run(&submission(body("Risky", commands)));

    let static_report = outcome
        .reports
        .iter()
        .find(|r| r.source == AnalyzerSource::Static)
        .unwrap();
    assert!(static_report.count(Severity::Critical) >= 1);
    assert_eq!(outcome.decision.recommendation, Recommendation::Reject);
    let reason = outcome.decision.blocking_reason.unwrap();
    // The validator flags eval too, and validation errors are checked first.
    assert_eq!(reason.predicate, BlockingPredicate::ValidationErrors);
}

#[test]
fn example_c_missing_commands_not_auto_approved() {
    let text = "### Collection Name\nEmpty\n\n### Description\nNothing here\n\n### GitHub Username\nsomeone\n";
    let parsed = parse_submission(&read_submission(text), &Config::default_config());
    assert!(parsed.commands.is_empty());
    assert!(!parsed.validation.valid);
    assert!(parsed.validation.score <= 75);

    let decision = collection_gate::evaluate(text);
    assert_ne!(decision.recommendation, Recommendation::AutoApprove);
    assert_eq!(
        decision.blocking_reason.unwrap().predicate,
        BlockingPredicate::ValidationErrors
    );
}

#[test]
fn example_d_same_issue_same_id() {
    let dir = tempfile::tempdir().unwrap();
    let store = collection_gate::store::Store::open(dir.path()).unwrap();
    let pipeline = Pipeline::new(Config::default_config());
    let sub = submission(body("Reading Helpers", CLEAN_COMMANDS));

    let first = pipeline
        .run_and_materialize(&sub, &store, Some("maintainer"))
        .materialized
        .unwrap();
    let second = pipeline
        .run_and_materialize(&sub, &store, Some("maintainer"))
        .materialized
        .unwrap();
    assert_eq!(first.collection_id, second.collection_id);
    assert_eq!(first.command_ids, second.command_ids);
    assert_eq!(second.index_totals.collections, 1);
}

#[test]
fn unavailable_ai_analyzer_is_substituted() {
    let dir = tempfile::tempdir().unwrap();
    let options = AnalyzerOptions {
        ai_report: Some(ai_report(dir.path(), "{\"safetyScore\": \"high\"}")),
        ..Default::default()
    };
    let pipeline = Pipeline::from_options(Config::default_config(), &options).unwrap();
    let outcome = pipeline.run(&submission(body("Reading Helpers", CLEAN_COMMANDS)));

    let ai: Vec<_> = outcome
        .reports
        .iter()
        .filter(|r| r.source == AnalyzerSource::Ai)
        .collect();
    assert_eq!(ai.len(), 1);
    assert!(ai[0].fallback);
    assert!(outcome.decision.feedback.contains("analyzer was unavailable"));
}

#[test]
fn extraction_normalizes_fields() {
    let parsed = parse_submission(
        &submission(body("Reading Helpers", CLEAN_COMMANDS)),
        &Config::default_config(),
    );
    assert_eq!(parsed.metadata.category, "Productivity");
    assert_eq!(parsed.metadata.tags, vec!["reading", "focus"]);
    assert_eq!(parsed.contact, "reader-one");
    assert_eq!(parsed.metadata.author, "reader-one");
}

#[test]
fn validation_score_stays_in_bounds() {
    let many_errors: String = (0..10)
        .map(|i| format!(r#"{{"name": "", "code": "eval({i})"}}"#))
        .collect::<Vec<_>>()
        .join(",");
    let cases = [
        String::new(),
        "random text with no sections".to_string(),
        body("", &format!("[{many_errors}]")),
        body("Reading Helpers", CLEAN_COMMANDS),
    ];
    for text in cases {
        let parsed = parse_submission(&read_submission(&text), &Config::default_config());
        assert!(parsed.validation.score <= 100);
        assert_eq!(parsed.validation.valid, parsed.validation.errors.is_empty());
    }
}

#[test]
fn decision_is_reproducible() {
    let text = body("Reading Helpers", CLEAN_COMMANDS);
    assert_eq!(collection_gate::evaluate(&text), collection_gate::evaluate(&text));
}
