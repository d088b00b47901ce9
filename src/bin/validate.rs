//! gate-validate: validate a submission; exits 1 when it fails validation.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use collection_gate::cli::{self, CommonArgs};

#[derive(Parser, Debug)]
#[clap(
    name = "gate-validate",
    version = env!("CARGO_PKG_VERSION"),
    about = "Validate a raw or extracted submission"
)]
struct Args {
    /// Raw submission or gate-extract output.
    input: PathBuf,
    #[clap(flatten)]
    common: CommonArgs,
}

fn run(args: &Args) -> collection_gate::Result<bool> {
    let config = args.common.init()?;
    let text = cli::read_input(Some(&args.input))?;
    let parsed = cli::load_parsed(&text, &config)?;
    let result = &parsed.validation;
    args.common.emit(result, "validation.json")?;

    if result.valid {
        eprintln!("valid (score {}, {} warning(s))", result.score, result.warnings.len());
    } else {
        eprintln!("invalid (score {}):", result.score);
        for e in &result.errors {
            eprintln!("  - {e}");
        }
    }
    Ok(result.valid)
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => cli::precondition_failed(&e),
    }
}
