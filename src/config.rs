use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{GateError, Result};

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

// ── Final (merged) config types ──

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub taxonomy: Taxonomy,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub badges: Vec<BadgeRule>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub log_decisions: bool,
}

/// Closed category taxonomy. Matching is exact and case-insensitive.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Taxonomy {
    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ValidationConfig {
    #[serde(default)]
    pub error_penalty: u32,
    #[serde(default)]
    pub warning_penalty: u32,
    #[serde(default)]
    pub bonus_min_commands: usize,
    #[serde(default)]
    pub command_bonus: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ScannerConfig {
    #[serde(default)]
    pub critical_weight: f64,
    #[serde(default)]
    pub high_weight: f64,
    #[serde(default)]
    pub medium_weight: f64,
    #[serde(default)]
    pub low_weight: f64,
    /// String literals longer than this are flagged as possible obfuscation.
    #[serde(default)]
    pub long_literal_threshold: usize,
    #[serde(default)]
    pub try_catch_bonus: f64,
    #[serde(default)]
    pub feedback_bonus: f64,
    #[serde(default)]
    pub strict_mode_bonus: f64,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub auto_approve_min_score: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub validation_weight: f64,
    #[serde(default)]
    pub static_weight: f64,
    #[serde(default)]
    pub ai_weight: f64,
    #[serde(default)]
    pub auto_approve_threshold: f64,
    #[serde(default)]
    pub manual_review_threshold: f64,
    #[serde(default)]
    pub reject_threshold: f64,
    #[serde(default)]
    pub static_confidence_threshold: f64,
    #[serde(default)]
    pub ai_confidence_threshold: f64,
    /// Divide by the sum of the weights that are present instead of letting a
    /// missing analyzer deflate the score.
    #[serde(default)]
    pub renormalize_missing: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AnalyzerConfig {
    #[serde(default)]
    pub timeout_secs: u64,
    /// Confidence assigned to normalized static-findings reports.
    #[serde(default)]
    pub static_confidence: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct StoreConfig {
    #[serde(default)]
    pub recent_limit: usize,
    /// Number of leading code characters that feed a command id.
    #[serde(default)]
    pub code_prefix_len: usize,
}

/// Which recomputed profile stat a badge threshold is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeMetric {
    Collections,
    Commands,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BadgeRule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub metric: BadgeMetric,
    pub threshold: usize,
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    settings: SettingsOverlay,
    #[serde(default)]
    taxonomy: TaxonomyOverlay,
    #[serde(default)]
    validation: ValidationOverlay,
    #[serde(default)]
    scanner: ScannerOverlay,
    #[serde(default)]
    engine: EngineOverlay,
    #[serde(default)]
    analyzer: AnalyzerOverlay,
    #[serde(default)]
    store: StoreOverlay,
    #[serde(default)]
    badges: Vec<BadgeRule>,
    #[serde(default)]
    remove_badges: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct SettingsOverlay {
    log_decisions: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct TaxonomyOverlay {
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    remove_categories: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ValidationOverlay {
    error_penalty: Option<u32>,
    warning_penalty: Option<u32>,
    bonus_min_commands: Option<usize>,
    command_bonus: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct ScannerOverlay {
    critical_weight: Option<f64>,
    high_weight: Option<f64>,
    medium_weight: Option<f64>,
    low_weight: Option<f64>,
    long_literal_threshold: Option<usize>,
    try_catch_bonus: Option<f64>,
    feedback_bonus: Option<f64>,
    strict_mode_bonus: Option<f64>,
    confidence: Option<f64>,
    auto_approve_min_score: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct EngineOverlay {
    validation_weight: Option<f64>,
    static_weight: Option<f64>,
    ai_weight: Option<f64>,
    auto_approve_threshold: Option<f64>,
    manual_review_threshold: Option<f64>,
    reject_threshold: Option<f64>,
    static_confidence_threshold: Option<f64>,
    ai_confidence_threshold: Option<f64>,
    renormalize_missing: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct AnalyzerOverlay {
    timeout_secs: Option<u64>,
    static_confidence: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct StoreOverlay {
    recent_limit: Option<usize>,
    code_prefix_len: Option<usize>,
}

// ── Merge logic ──

/// Merge a user list into a default list.
/// In replace mode: user list replaces default entirely.
/// In merge mode: remove items first, then extend with additions (deduped).
fn merge_list(base: &mut Vec<String>, add: Vec<String>, remove: &[String], replace: bool) {
    if replace {
        *base = add;
    } else {
        base.retain(|item| !remove.contains(item));
        for item in add {
            if !base.contains(&item) {
                base.push(item);
            }
        }
    }
}

fn set<T>(target: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *target = v;
    }
}

impl Config {
    /// Load the default embedded configuration.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Load configuration with resolution order:
    /// 1. Start with embedded defaults
    /// 2. Merge the overlay at `path` if given (errors are fatal), otherwise
    ///    ~/.config/collection-gate/config.toml if it exists (errors are logged)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default_config();
        match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)?;
                let overlay: ConfigOverlay = toml::from_str(&content)
                    .map_err(|e| GateError::Config(format!("{}: {e}", p.display())))?;
                config.apply_overlay(overlay);
            }
            None => {
                if let Some(overlay) = Self::load_home_overlay() {
                    config.apply_overlay(overlay);
                }
            }
        }
        Ok(config)
    }

    fn load_home_overlay() -> Option<ConfigOverlay> {
        let home = std::env::var_os("HOME")?;
        let path = Path::new(&home).join(".config/collection-gate/config.toml");
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(overlay) => Some(overlay),
            Err(e) => {
                log::warn!("config parse error, using defaults: {e}");
                None
            }
        }
    }

    /// Apply an overlay on top of this config (merge semantics).
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        set(&mut self.settings.log_decisions, overlay.settings.log_decisions);

        let t = overlay.taxonomy;
        merge_list(
            &mut self.taxonomy.categories,
            t.categories,
            &t.remove_categories,
            t.replace,
        );

        let v = overlay.validation;
        set(&mut self.validation.error_penalty, v.error_penalty);
        set(&mut self.validation.warning_penalty, v.warning_penalty);
        set(&mut self.validation.bonus_min_commands, v.bonus_min_commands);
        set(&mut self.validation.command_bonus, v.command_bonus);

        let s = overlay.scanner;
        set(&mut self.scanner.critical_weight, s.critical_weight);
        set(&mut self.scanner.high_weight, s.high_weight);
        set(&mut self.scanner.medium_weight, s.medium_weight);
        set(&mut self.scanner.low_weight, s.low_weight);
        set(&mut self.scanner.long_literal_threshold, s.long_literal_threshold);
        set(&mut self.scanner.try_catch_bonus, s.try_catch_bonus);
        set(&mut self.scanner.feedback_bonus, s.feedback_bonus);
        set(&mut self.scanner.strict_mode_bonus, s.strict_mode_bonus);
        set(&mut self.scanner.confidence, s.confidence);
        set(&mut self.scanner.auto_approve_min_score, s.auto_approve_min_score);

        let e = overlay.engine;
        set(&mut self.engine.validation_weight, e.validation_weight);
        set(&mut self.engine.static_weight, e.static_weight);
        set(&mut self.engine.ai_weight, e.ai_weight);
        set(&mut self.engine.auto_approve_threshold, e.auto_approve_threshold);
        set(&mut self.engine.manual_review_threshold, e.manual_review_threshold);
        set(&mut self.engine.reject_threshold, e.reject_threshold);
        set(
            &mut self.engine.static_confidence_threshold,
            e.static_confidence_threshold,
        );
        set(&mut self.engine.ai_confidence_threshold, e.ai_confidence_threshold);
        set(&mut self.engine.renormalize_missing, e.renormalize_missing);

        set(&mut self.analyzer.timeout_secs, overlay.analyzer.timeout_secs);
        set(
            &mut self.analyzer.static_confidence,
            overlay.analyzer.static_confidence,
        );

        set(&mut self.store.recent_limit, overlay.store.recent_limit);
        set(&mut self.store.code_prefix_len, overlay.store.code_prefix_len);

        // Badges: remove by id, then upsert by id
        self.badges
            .retain(|b| !overlay.remove_badges.contains(&b.id));
        for badge in overlay.badges {
            match self.badges.iter_mut().find(|b| b.id == badge.id) {
                Some(existing) => *existing = badge,
                None => self.badges.push(badge),
            }
        }
    }

    /// Apply an overlay from a TOML string. Used for testing.
    #[cfg(test)]
    pub(crate) fn apply_overlay_str(&mut self, toml_str: &str) {
        let overlay: ConfigOverlay = toml::from_str(toml_str).unwrap();
        self.apply_overlay(overlay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_parses() {
        let config = Config::default_config();
        assert!(!config.taxonomy.categories.is_empty());
        assert!(!config.badges.is_empty());
        assert_eq!(config.validation.error_penalty, 25);
        assert_eq!(config.validation.warning_penalty, 10);
        assert_eq!(config.analyzer.timeout_secs, 30);
        assert_eq!(config.store.recent_limit, 20);
    }

    #[test]
    fn default_thresholds() {
        let config = Config::default_config();
        assert_eq!(config.engine.auto_approve_threshold, 80.0);
        assert_eq!(config.engine.manual_review_threshold, 60.0);
        assert_eq!(config.engine.reject_threshold, 30.0);
        assert!(config.engine.renormalize_missing);
    }

    #[test]
    fn default_taxonomy_has_other() {
        let config = Config::default_config();
        assert!(config.taxonomy.categories.contains(&"Other".to_string()));
    }

    // ── Merge semantics ──

    #[test]
    fn overlay_overrides_scalar() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [engine]
            auto_approve_threshold = 90
            renormalize_missing = false
        "#,
        );
        assert_eq!(config.engine.auto_approve_threshold, 90.0);
        assert!(!config.engine.renormalize_missing);
        // Untouched scalars keep defaults
        assert_eq!(config.engine.reject_threshold, 30.0);
    }

    #[test]
    fn overlay_extends_categories() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [taxonomy]
            categories = ["Research"]
        "#,
        );
        assert!(config.taxonomy.categories.contains(&"Research".to_string()));
        assert!(config.taxonomy.categories.contains(&"Other".to_string()));
    }

    #[test]
    fn overlay_replace_categories() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [taxonomy]
            replace = true
            categories = ["Tools", "Other"]
        "#,
        );
        assert_eq!(config.taxonomy.categories, vec!["Tools", "Other"]);
    }

    #[test]
    fn overlay_removes_category() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [taxonomy]
            remove_categories = ["Shopping"]
        "#,
        );
        assert!(!config.taxonomy.categories.contains(&"Shopping".to_string()));
    }

    #[test]
    fn overlay_upserts_badge() {
        let mut config = Config::default_config();
        let before = config.badges.len();
        config.apply_overlay_str(
            r#"
            remove_badges = ["curator"]

            [[badges]]
            id = "collector"
            name = "Collector"
            metric = "collections"
            threshold = 3

            [[badges]]
            id = "legend"
            name = "Legend"
            metric = "commands"
            threshold = 500
        "#,
        );
        assert_eq!(config.badges.len(), before);
        let collector = config.badges.iter().find(|b| b.id == "collector").unwrap();
        assert_eq!(collector.threshold, 3);
        assert!(config.badges.iter().any(|b| b.id == "legend"));
        assert!(!config.badges.iter().any(|b| b.id == "curator"));
    }

    #[test]
    fn empty_overlay_changes_nothing() {
        let original = Config::default_config();
        let mut config = Config::default_config();
        config.apply_overlay_str("");
        assert_eq!(config.taxonomy.categories, original.taxonomy.categories);
        assert_eq!(config.badges, original.badges);
    }

    #[test]
    fn load_explicit_path_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[engine\nnope").unwrap();
        assert!(matches!(
            Config::load(Some(&path)),
            Err(GateError::Config(_))
        ));
    }
}
