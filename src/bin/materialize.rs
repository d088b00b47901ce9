//! gate-materialize: write an approved submission into the store.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use collection_gate::cli::{self, CommonArgs};
use collection_gate::GateError;
use collection_gate::eval::ApprovalDecision;
use collection_gate::store::{self, Approval, Store};

#[derive(Parser, Debug)]
#[clap(
    name = "gate-materialize",
    version = env!("CARGO_PKG_VERSION"),
    about = "Materialize an approved collection into the store"
)]
struct Args {
    /// Raw submission or gate-extract output.
    input: PathBuf,
    /// Store root.
    #[clap(long, value_name = "DIR")]
    store: PathBuf,
    /// gate-decide output; must be AUTO_APPROVE.
    #[clap(long, value_name = "PATH", required_unless_present = "approver")]
    decision: Option<PathBuf>,
    /// Maintainer override.
    #[clap(long, value_name = "LOGIN", conflicts_with = "decision")]
    approver: Option<String>,
    #[clap(flatten)]
    common: CommonArgs,
}

fn run(args: &Args) -> collection_gate::Result<()> {
    let config = args.common.init()?;
    let text = cli::read_input(Some(&args.input))?;
    let parsed = cli::load_parsed(&text, &config)?;
    let approval = match (&args.approver, &args.decision) {
        (Some(approver), _) => Approval::Override {
            approver: approver.clone(),
        },
        (None, Some(path)) => Approval::Auto(cli::read_json_file::<ApprovalDecision>(path)?),
        (None, None) => {
            return Err(GateError::InvalidInput(
                "either --decision or --approver is required".into(),
            ));
        }
    };

    let store = Store::open(&args.store)?;
    let report = store::materialize(&store, &parsed, &approval, &config)?;
    args.common.emit(&report, "materialized.json")?;
    eprintln!(
        "published {}/{} ({} command(s)); {} collection(s) indexed",
        report.author,
        report.slug,
        report.command_ids.len(),
        report.index_totals.collections
    );
    if !report.new_badges.is_empty() {
        eprintln!("new badges: {}", report.new_badges.join(", "));
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
