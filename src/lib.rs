//! collection-gate: validation and approval pipeline for community command
//! collections.
//!
//! A submission arrives as free text with `### Field` sections and a JSON
//! commands payload. The crate turns it into one of three decisions:
//! [`eval::Recommendation::AutoApprove`], [`eval::Recommendation::ManualReview`],
//! or [`eval::Recommendation::Reject`], and on approval writes the collection
//! into a per-author store.
//!
//! # Architecture
//!
//! - **[`parse`]**: Evidence extraction: section tokenizer, field extractors, validation pass.
//! - **[`scan`]**: Risk analysis: pattern scanner, external analyzers, report normalization.
//! - **[`eval`]**: Decision engine: weighted score, blocking predicates, feedback.
//! - **[`store`]**: Materialization: repository, profiles, global index, packages.
//! - **[`pipeline`]**: End-to-end run wiring the stages together.
//! - **[`config`]**: Configuration loading: embedded defaults + user overlay merge.
//! - **[`logging`]**: stderr logger and the decision log at `~/.local/share/collection-gate/decisions.log`.

/// Argument types and I/O helpers for the binaries.
pub mod cli;
/// Configuration types, loading, and overlay merge logic.
pub mod config;
/// Crate error type.
pub mod error;
/// Approval decision engine.
pub mod eval;
/// Logger setup and file-based decision logging.
pub mod logging;
/// Submission parsing: tokenizer, extractors, validation.
pub mod parse;
/// Extract, analyze, decide, materialize.
pub mod pipeline;
/// Security analyzers and the shared report shape.
pub mod scan;
/// Collection materializer and on-disk repository.
pub mod store;

pub use error::{GateError, Result};

use eval::ApprovalDecision;
use parse::Submission;

/// Run the default pipeline (pattern scanner only) on raw submission text.
///
/// This is the main entry point for tests and simple usage.
/// For external analyzers or a user config, build a [`pipeline::Pipeline`] directly.
pub fn evaluate(input: &str) -> ApprovalDecision {
    let submission: Submission = parse::read_submission(input);
    pipeline::Pipeline::new(config::Config::default_config())
        .run(&submission)
        .decision
}
