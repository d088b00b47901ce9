//! collection-gate: run the whole pipeline on one submission.
//!
//! Reads the submission (issue body, issue webhook JSON, or submission JSON)
//! from a file or stdin, prints the outcome as JSON, and materializes the
//! collection into `--store` when it is approved.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use collection_gate::cli::{self, AnalyzerArgs, CommonArgs};
use collection_gate::logging;
use collection_gate::parse::read_submission;
use collection_gate::pipeline::Pipeline;
use collection_gate::store::Store;

#[derive(Parser, Debug)]
#[clap(
    name = "collection-gate",
    version = env!("CARGO_PKG_VERSION"),
    about = "Validate, score, and publish a command collection submission"
)]
struct Args {
    /// Submission file (stdin when omitted).
    input: Option<PathBuf>,
    /// Store root. Without it the decision is reported but nothing is written.
    #[clap(long, value_name = "DIR")]
    store: Option<PathBuf>,
    /// Maintainer override: materialize regardless of the decision.
    #[clap(long, value_name = "LOGIN", requires = "store")]
    approver: Option<String>,
    #[clap(flatten)]
    analyzers: AnalyzerArgs,
    #[clap(flatten)]
    common: CommonArgs,
}

fn run(args: &Args) -> collection_gate::Result<ExitCode> {
    let config = args.common.init()?;
    let log_decisions = config.settings.log_decisions;
    let input = cli::read_input(args.input.as_deref())?;
    let submission = read_submission(&input);
    let pipeline = Pipeline::from_options(config, &args.analyzers.options())?;

    let outcome = match &args.store {
        Some(root) => {
            let store = Store::open(root)?;
            pipeline.run_and_materialize(&submission, &store, args.approver.as_deref())
        }
        None => pipeline.run(&submission),
    };

    if log_decisions {
        logging::log_decision(&outcome.submission, &outcome.decision);
    }
    args.common.emit(&outcome, "outcome.json")?;

    let d = &outcome.decision;
    match &outcome.materialized {
        Some(m) => eprintln!(
            "{} ({:.1}): published {} to {}/",
            d.recommendation.label(),
            d.overall_score,
            m.slug,
            m.author
        ),
        None => eprintln!(
            "{} ({:.1}){}",
            d.recommendation.label(),
            d.overall_score,
            d.blocking_reason
                .as_ref()
                .map(|b| format!(": {}", b.message))
                .unwrap_or_default()
        ),
    }
    // Decision already reported; the failed write is still a precondition failure.
    if let Some(err) = &outcome.materialize_error {
        eprintln!("error: {err}");
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(code) => code,
        Err(e) => cli::precondition_failed(&e),
    }
}
