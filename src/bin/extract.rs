//! gate-extract: turn a raw submission into a parsed submission.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use collection_gate::cli::{self, CommonArgs};
use collection_gate::parse::{parse_submission, read_submission};

#[derive(Parser, Debug)]
#[clap(
    name = "gate-extract",
    version = env!("CARGO_PKG_VERSION"),
    about = "Extract metadata, commands, and validation from a submission"
)]
struct Args {
    /// Submission file (stdin when omitted).
    input: Option<PathBuf>,
    #[clap(flatten)]
    common: CommonArgs,
}

fn run(args: &Args) -> collection_gate::Result<()> {
    let config = args.common.init()?;
    let input = cli::read_input(args.input.as_deref())?;
    let parsed = parse_submission(&read_submission(&input), &config);
    args.common.emit(&parsed, "parsed-submission.json")?;
    eprintln!(
        "extracted '{}' by {}: {} command(s), {} error(s), {} warning(s), score {}",
        parsed.metadata.name,
        if parsed.contact.is_empty() { "<unknown>" } else { parsed.contact.as_str() },
        parsed.commands.len(),
        parsed.validation.errors.len(),
        parsed.validation.warnings.len(),
        parsed.validation.score
    );
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => cli::precondition_failed(&e),
    }
}
