//! Global index, rebuilt from every author namespace on each approval.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::collection::Collection;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub authors: usize,
    pub collections: usize,
    pub commands: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub collections: usize,
    pub commands: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentCollection {
    pub id: String,
    pub name: String,
    pub author: String,
    pub slug: String,
    pub category: String,
    pub command_count: usize,
    pub submitted_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalIndex {
    pub generated_at: String,
    pub totals: Totals,
    pub authors: BTreeMap<String, AuthorSummary>,
    pub categories: BTreeMap<String, usize>,
    pub tags: BTreeMap<String, usize>,
    pub recent_collections: Vec<RecentCollection>,
}

fn submitted(c: &Collection) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(&c.metadata.submitted_at).ok()
}

/// Newest first; unparsable timestamps last; equal timestamps by id ascending.
fn recency(a: &Collection, b: &Collection) -> Ordering {
    match (submitted(a), submitted(b)) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.id.cmp(&b.id))
}

impl GlobalIndex {
    /// Build from the complete set of stored collections.
    pub fn build(collections: &[Collection], recent_limit: usize, now: &str) -> Self {
        let mut authors: BTreeMap<String, AuthorSummary> = BTreeMap::new();
        let mut categories: BTreeMap<String, usize> = BTreeMap::new();
        let mut tags: BTreeMap<String, usize> = BTreeMap::new();
        let mut commands = 0;

        for c in collections {
            let a = authors.entry(c.metadata.author.clone()).or_default();
            a.collections += 1;
            a.commands += c.commands.len();
            commands += c.commands.len();
            *categories.entry(c.metadata.category.clone()).or_default() += 1;
            for t in &c.metadata.tags {
                *tags.entry(t.clone()).or_default() += 1;
            }
        }

        let mut ordered: Vec<&Collection> = collections.iter().collect();
        ordered.sort_by(|a, b| recency(a, b));
        let recent_collections = ordered
            .into_iter()
            .take(recent_limit)
            .map(|c| RecentCollection {
                id: c.id.clone(),
                name: c.metadata.name.clone(),
                author: c.metadata.author.clone(),
                slug: c.slug.clone(),
                category: c.metadata.category.clone(),
                command_count: c.commands.len(),
                submitted_at: c.metadata.submitted_at.clone(),
            })
            .collect();

        Self {
            generated_at: now.to_string(),
            totals: Totals {
                authors: authors.len(),
                collections: collections.len(),
                commands,
            },
            authors,
            categories,
            tags,
            recent_collections,
        }
    }
}
