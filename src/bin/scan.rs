//! gate-scan: run the configured analyzers and print their reports.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use collection_gate::cli::{self, AnalyzerArgs, CommonArgs};
use collection_gate::pipeline::Pipeline;

#[derive(Parser, Debug)]
#[clap(
    name = "gate-scan",
    version = env!("CARGO_PKG_VERSION"),
    about = "Produce normalized analyzer reports for a submission"
)]
struct Args {
    /// Raw submission or gate-extract output.
    input: PathBuf,
    #[clap(flatten)]
    analyzers: AnalyzerArgs,
    #[clap(flatten)]
    common: CommonArgs,
}

fn run(args: &Args) -> collection_gate::Result<()> {
    let config = args.common.init()?;
    let text = cli::read_input(Some(&args.input))?;
    let parsed = cli::load_parsed(&text, &config)?;
    let pipeline = Pipeline::from_options(config, &args.analyzers.options())?;
    let reports = pipeline.analyze(&parsed);
    args.common.emit(&reports, "analyzer-reports.json")?;

    for r in &reports {
        eprintln!(
            "{}{} [{}]: score {:.1}, risk {}, {} finding(s)",
            r.producer,
            if r.fallback { " (substituted)" } else { "" },
            r.source.as_str(),
            r.score,
            r.risk_level.label(),
            r.findings.len()
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => cli::precondition_failed(&e),
    }
}
