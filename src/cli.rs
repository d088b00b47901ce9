//! Argument types and I/O helpers shared by the stage binaries.
//!
//! Every tool prints its JSON result on stdout (and into `--out-dir` when
//! given) and a one-line summary on stderr. Exit code 2 means a precondition
//! failed: a missing or unreadable input, bad configuration, or an input the
//! stage cannot accept.

use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::Config;
use crate::error::{GateError, Result};
use crate::logging;
use crate::parse::{ParsedSubmission, parse_submission, read_submission};
use crate::pipeline::AnalyzerOptions;

#[derive(clap::Args, Debug, Clone)]
pub struct CommonArgs {
    /// Config overlay (default: ~/.config/collection-gate/config.toml).
    #[clap(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// Also write the JSON result into this directory.
    #[clap(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug).
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl CommonArgs {
    /// Install logging and load the merged configuration.
    pub fn init(&self) -> Result<Config> {
        logging::init(self.verbose);
        Config::load(self.config.as_deref())
    }

    /// Print `value` and write it to `<out-dir>/<file_name>` if requested.
    pub fn emit<T: Serialize>(&self, value: &T, file_name: &str) -> Result<()> {
        emit(value, self.out_dir.as_deref(), file_name)
    }
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct AnalyzerArgs {
    /// Static rule-engine findings (JSON).
    #[clap(long, value_name = "PATH")]
    pub static_report: Option<PathBuf>,
    /// AI safety report (JSON) written by the inference step.
    #[clap(long, value_name = "PATH")]
    pub ai_report: Option<PathBuf>,
    /// Command that reads the submission on stdin and prints an AI safety report.
    #[clap(long, value_name = "CMD", conflicts_with = "ai_report")]
    pub ai_command: Option<String>,
}

impl AnalyzerArgs {
    pub fn options(&self) -> AnalyzerOptions {
        AnalyzerOptions {
            static_report: self.static_report.clone(),
            ai_report: self.ai_report.clone(),
            ai_command: self.ai_command.clone(),
        }
    }
}

/// Read a file, or stdin when no path is given.
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) => std::fs::read_to_string(p).map_err(|e| {
            GateError::InvalidInput(format!("cannot read {}: {e}", p.display()))
        }),
        None => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            Ok(input)
        }
    }
}

/// Accept either an extractor result or a raw submission.
///
/// A JSON object with a `metadata` key is taken as an extractor result; its
/// validation is recomputed so stale results cannot slip through. Anything
/// else goes through the extractor.
pub fn load_parsed(text: &str, config: &Config) -> Result<ParsedSubmission> {
    let value: Option<serde_json::Value> = serde_json::from_str(text).ok();
    if let Some(v) = value
        && v.get("metadata").is_some()
    {
        let mut parsed: ParsedSubmission = serde_json::from_value(v)?;
        parsed.validation = crate::parse::validate(&parsed, &config.validation);
        return Ok(parsed);
    }
    Ok(parse_submission(&read_submission(text), config))
}

/// Read a JSON file into `T`, mapping failures to precondition errors.
pub fn read_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = read_input(Some(path))?;
    serde_json::from_str(&text)
        .map_err(|e| GateError::InvalidInput(format!("{}: {e}", path.display())))
}

pub fn emit<T: Serialize>(value: &T, out_dir: Option<&Path>, file_name: &str) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    if let Some(dir) = out_dir {
        std::fs::create_dir_all(dir)?;
        std::fs::write(dir.join(file_name), format!("{json}\n"))?;
    }
    println!("{json}");
    Ok(())
}

/// Report a precondition failure and produce exit code 2.
pub fn precondition_failed(err: &GateError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(2)
}
