//! gate-decide: combine validation and analyzer reports into a decision.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use collection_gate::cli::{self, CommonArgs};
use collection_gate::eval::DecisionEngine;
use collection_gate::logging;
use collection_gate::scan::AnalyzerReport;

#[derive(Parser, Debug)]
#[clap(
    name = "gate-decide",
    version = env!("CARGO_PKG_VERSION"),
    about = "Decide AUTO_APPROVE, MANUAL_REVIEW, or REJECT for a submission"
)]
struct Args {
    /// Raw submission or gate-extract output.
    input: PathBuf,
    /// gate-scan output. Without it only validation is scored.
    #[clap(long, value_name = "PATH")]
    reports: Option<PathBuf>,
    #[clap(flatten)]
    common: CommonArgs,
}

fn run(args: &Args) -> collection_gate::Result<()> {
    let config = args.common.init()?;
    let text = cli::read_input(Some(&args.input))?;
    let parsed = cli::load_parsed(&text, &config)?;
    let reports: Vec<AnalyzerReport> = match &args.reports {
        Some(path) => cli::read_json_file(path)?,
        None => Vec::new(),
    };

    let decision = DecisionEngine::from_config(&config).evaluate(&parsed.validation, &reports);
    if config.settings.log_decisions {
        logging::log_decision(&parsed, &decision);
    }
    args.common.emit(&decision, "decision.json")?;
    eprintln!("{}: {}", decision.recommendation.label(), decision.reason());
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => cli::precondition_failed(&e),
    }
}
