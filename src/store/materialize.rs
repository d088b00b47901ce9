use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::path::Path;

use super::collection::{Collection, command_artifact};
use super::index::{GlobalIndex, Totals};
use super::package;
use super::profile::{CollectionRef, ProfileStats, UserProfile};
use super::Store;
use crate::config::Config;
use crate::error::{GateError, Result};
use crate::eval::{ApprovalDecision, Recommendation};
use crate::parse::ParsedSubmission;

/// Authorization to materialize. Both variants are treated identically once
/// accepted.
#[derive(Debug, Clone)]
pub enum Approval {
    /// Engine decision; only AUTO_APPROVE is accepted.
    Auto(ApprovalDecision),
    /// A maintainer's manual approval.
    Override { approver: String },
}

impl Approval {
    fn check(&self) -> Result<()> {
        match self {
            Approval::Auto(d) if d.recommendation == Recommendation::AutoApprove => Ok(()),
            Approval::Auto(d) => Err(GateError::NotApproved(format!(
                "decision is {} ({:.1})",
                d.recommendation.label(),
                d.overall_score
            ))),
            Approval::Override { approver } if approver.trim().is_empty() => Err(
                GateError::NotApproved("manual override without an approver".into()),
            ),
            Approval::Override { approver } => {
                log::info!("manual override by {approver}");
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterializeReport {
    pub collection_id: String,
    pub slug: String,
    pub author: String,
    pub command_ids: Vec<String>,
    /// Written paths, relative to the store root.
    pub artifacts: Vec<String>,
    pub new_badges: Vec<String>,
    pub profile_stats: ProfileStats,
    pub index_totals: Totals,
}

/// Current time in the store's timestamp format.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn materialize(
    store: &Store,
    parsed: &ParsedSubmission,
    approval: &Approval,
    config: &Config,
) -> Result<MaterializeReport> {
    materialize_at(store, parsed, approval, config, &now_rfc3339())
}

/// Materialize with an explicit timestamp.
pub fn materialize_at(
    store: &Store,
    parsed: &ParsedSubmission,
    approval: &Approval,
    config: &Config,
    now: &str,
) -> Result<MaterializeReport> {
    approval.check()?;
    let author = parsed.metadata.author.trim();
    if author.is_empty() {
        return Err(GateError::MissingContact);
    }

    let mut artifacts = Vec::new();
    let mut record = |path: &Path| {
        let rel = path.strip_prefix(store.root()).unwrap_or(path);
        artifacts.push(rel.to_string_lossy().into_owned());
    };

    let (collection, profile, new_badges) = {
        let _guard = store.lock_namespace(author)?;
        store.ensure_namespace(author)?;

        let mut collection = Collection::from_submission(parsed, config.store.code_prefix_len, now);
        if let Some(previous) = store.load_collection(author, &collection.slug)? {
            log::info!("reprocessing collection {}", collection.id);
            collection.inherit(&previous);
        }

        let path = store.collection_path(author, &collection.slug)?;
        store.write_json(&path, &collection)?;
        record(&path);

        let path = store.import_path(author, &collection.slug)?;
        store.write_json(&path, &package::export(&collection, now)?)?;
        record(&path);

        let dir = store.commands_dir(author, &collection.slug)?;
        std::fs::create_dir_all(&dir)?;
        let files = collection.command_files();
        for (name, cmd) in &files {
            let path = dir.join(name);
            store.write_atomic(&path, command_artifact(&collection, cmd).as_bytes())?;
            record(&path);
        }
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            let keep = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| files.iter().any(|(f, _)| f == n));
            if !keep && path.is_file() {
                log::debug!("removing stale {}", path.display());
                std::fs::remove_file(&path)?;
            }
        }

        let mut profile = store
            .load_profile(author)?
            .unwrap_or_else(|| UserProfile::new(author, now));
        profile.upsert(CollectionRef::of(&collection));
        profile.recompute_stats();
        let new_badges = profile.award_badges(&config.badges, now);
        profile.updated_at = now.to_string();
        let path = store.profile_path(author)?;
        store.write_json(&path, &profile)?;
        record(&path);

        (collection, profile, new_badges)
    };

    let index = rebuild_index(store, config, now)?;
    record(&store.index_path());

    for badge in &new_badges {
        log::info!("{author} earned badge {badge}");
    }

    Ok(MaterializeReport {
        command_ids: collection.commands.iter().map(|c| c.id.clone()).collect(),
        collection_id: collection.id,
        slug: collection.slug,
        author: author.to_string(),
        artifacts,
        new_badges,
        profile_stats: profile.stats,
        index_totals: index.totals,
    })
}

/// Rebuild `index.json` from every namespace.
pub fn rebuild_index(store: &Store, config: &Config, now: &str) -> Result<GlobalIndex> {
    let _guard = store.lock_index();
    let collections = store.load_all_collections()?;
    let index = GlobalIndex::build(&collections, config.store.recent_limit, now);
    store.write_json(&store.index_path(), &index)?;
    log::debug!(
        "index rebuilt: {} collections from {} authors",
        index.totals.collections,
        index.totals.authors
    );
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::DecisionEngine;
    use crate::parse::{SubmittedCommand, ValidationResult};

    fn parsed(author: &str) -> ParsedSubmission {
        let mut p = ParsedSubmission::default();
        p.metadata.name = "Focus Kit".into();
        p.metadata.description = "Reading helpers".into();
        p.metadata.category = "Productivity".into();
        p.metadata.author = author.into();
        p.metadata.submitter = author.into();
        p.metadata.issue_number = 7;
        p.metadata.submitted_at = "2026-03-01T12:00:00Z".into();
        p.contact = author.into();
        p.commands = vec![SubmittedCommand {
            name: "Hide Images".into(),
            code: "document.querySelectorAll('img').forEach(i => i.hidden = true);".into(),
            ..Default::default()
        }];
        p
    }

    fn override_approval() -> Approval {
        Approval::Override {
            approver: "maintainer".into(),
        }
    }

    #[test]
    fn rejects_non_approved_decision() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let config = Config::default_config();
        let decision = DecisionEngine::from_config(&config).evaluate(
            &ValidationResult {
                valid: false,
                errors: vec!["bad".into()],
                warnings: vec![],
                score: 75,
            },
            &[],
        );
        let err = materialize(&store, &parsed("dana"), &Approval::Auto(decision), &config);
        assert!(matches!(err, Err(GateError::NotApproved(_))));
        assert!(!dir.path().join("dana").exists());
    }

    #[test]
    fn rejects_missing_contact() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let err = materialize(
            &store,
            &parsed(""),
            &override_approval(),
            &Config::default_config(),
        );
        assert!(matches!(err, Err(GateError::MissingContact)));
    }

    #[test]
    fn empty_approver_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let err = materialize(
            &store,
            &parsed("dana"),
            &Approval::Override {
                approver: " ".into(),
            },
            &Config::default_config(),
        );
        assert!(matches!(err, Err(GateError::NotApproved(_))));
    }

    #[test]
    fn writes_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let report = materialize_at(
            &store,
            &parsed("dana"),
            &override_approval(),
            &Config::default_config(),
            "2026-03-02T00:00:00Z",
        )
        .unwrap();
        let ns = dir.path().join("dana");
        assert!(ns.join("profile.json").is_file());
        assert!(ns.join(format!("collections/{}.json", report.slug)).is_file());
        assert!(ns.join(format!("collections/{}-import.json", report.slug)).is_file());
        assert!(ns.join(format!("commands/{}/hide-images.js", report.slug)).is_file());
        assert!(dir.path().join("index.json").is_file());
        assert_eq!(report.new_badges, vec!["first-collection"]);
        assert_eq!(report.index_totals.collections, 1);
    }

    #[test]
    fn removes_stale_command_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let config = Config::default_config();
        let mut p = parsed("dana");
        p.commands.push(SubmittedCommand {
            name: "Extra".into(),
            code: "extra()".into(),
            ..Default::default()
        });
        let report = materialize_at(&store, &p, &override_approval(), &config, "t1").unwrap();
        let extra = dir
            .path()
            .join(format!("dana/commands/{}/extra.js", report.slug));
        assert!(extra.is_file());

        p.commands.pop();
        materialize_at(&store, &p, &override_approval(), &config, "t2").unwrap();
        assert!(!extra.exists());
    }
}
