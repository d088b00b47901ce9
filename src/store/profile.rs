//! Author profiles.
//!
//! Stats are always recomputed from the full collection list, never
//! incremented. Badges are append-only: once earned they stay, even if the
//! stats that earned them later drop.

use serde::{Deserialize, Serialize};

use super::collection::Collection;
use crate::config::{BadgeMetric, BadgeRule};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRef {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub category: String,
    pub command_count: usize,
    pub submitted_at: String,
}

impl CollectionRef {
    pub fn of(collection: &Collection) -> Self {
        Self {
            id: collection.id.clone(),
            name: collection.metadata.name.clone(),
            slug: collection.slug.clone(),
            category: collection.metadata.category.clone(),
            command_count: collection.commands.len(),
            submitted_at: collection.metadata.submitted_at.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStats {
    pub total_collections: usize,
    pub total_commands: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub earned_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub username: String,
    pub collections: Vec<CollectionRef>,
    pub stats: ProfileStats,
    pub badges: Vec<Badge>,
    pub created_at: String,
    pub updated_at: String,
}

impl UserProfile {
    pub fn new(username: &str, now: &str) -> Self {
        Self {
            username: username.to_string(),
            collections: Vec::new(),
            stats: ProfileStats::default(),
            badges: Vec::new(),
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }

    /// Replace the reference with the same id, else append.
    pub fn upsert(&mut self, reference: CollectionRef) {
        match self.collections.iter_mut().find(|c| c.id == reference.id) {
            Some(existing) => *existing = reference,
            None => self.collections.push(reference),
        }
    }

    /// Recompute stats from the complete collection list.
    pub fn recompute_stats(&mut self) {
        self.stats = ProfileStats {
            total_collections: self.collections.len(),
            total_commands: self.collections.iter().map(|c| c.command_count).sum(),
        };
    }

    /// Append badges whose thresholds the current stats meet. Returns the ids
    /// of badges earned by this call.
    pub fn award_badges(&mut self, rules: &[BadgeRule], now: &str) -> Vec<String> {
        let mut earned = Vec::new();
        for rule in rules {
            if self.badges.iter().any(|b| b.id == rule.id) {
                continue;
            }
            let value = match rule.metric {
                BadgeMetric::Collections => self.stats.total_collections,
                BadgeMetric::Commands => self.stats.total_commands,
            };
            if value >= rule.threshold {
                self.badges.push(Badge {
                    id: rule.id.clone(),
                    name: rule.name.clone(),
                    description: rule.description.clone(),
                    earned_at: now.to_string(),
                });
                earned.push(rule.id.clone());
            }
        }
        earned
    }
}
