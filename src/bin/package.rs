//! gate-package: export a stored collection as a package, or verify one.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use collection_gate::cli::{self, CommonArgs};
use collection_gate::store::{Collection, now_rfc3339, package};

#[derive(Parser, Debug)]
#[clap(
    name = "gate-package",
    version = env!("CARGO_PKG_VERSION"),
    about = "Export or import checksummed collection packages"
)]
struct Args {
    #[clap(subcommand)]
    command: Command,
    #[clap(flatten)]
    common: CommonArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Package a stored collection record (collections/<slug>.json).
    Export {
        collection: PathBuf,
    },
    /// Verify a package's checksum and print its contents.
    Import {
        package: PathBuf,
    },
}

fn run(args: &Args) -> collection_gate::Result<()> {
    args.common.init()?;
    match &args.command {
        Command::Export { collection } => {
            let collection: Collection = cli::read_json_file(collection)?;
            let pkg = package::export(&collection, &now_rfc3339())?;
            args.common.emit(&pkg, "package.json")?;
            eprintln!(
                "exported {} ({} command(s)), checksum {}",
                pkg.metadata.name,
                pkg.commands.len(),
                pkg.checksum
            );
        }
        Command::Import { package: path } => {
            let text = cli::read_input(Some(path))?;
            let pkg = package::import(&text)?;
            args.common.emit(&pkg, "imported.json")?;
            eprintln!(
                "verified {} ({} command(s))",
                pkg.metadata.name,
                pkg.commands.len()
            );
        }
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
