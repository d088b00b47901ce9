//! Approved collection records and their stable identities.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::parse::{Documentation, Metadata, ParsedSubmission, SubmittedCommand};

fn hash_parts(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update(b"\0");
    }
    format!("{:x}", hasher.finalize())
}

/// `hash(name, submitter, issue number)`. Resubmitting the same issue keeps
/// the id, so reprocessing overwrites instead of duplicating.
pub fn collection_id(name: &str, submitter: &str, issue_number: u64) -> String {
    hash_parts(&[name.trim(), submitter, &issue_number.to_string()])[..16].to_string()
}

/// `hash(name, code prefix)`. Stable unless the start of the code changes.
pub fn command_id(name: &str, code: &str, prefix_len: usize) -> String {
    let prefix: String = code.chars().take(prefix_len).collect();
    hash_parts(&[name.trim(), &prefix])[..12].to_string()
}

/// Lowercase ASCII alphanumerics separated by single hyphens.
pub fn slugify(text: &str) -> String {
    let mut slug = String::new();
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandEntry {
    pub id: String,
    pub name: String,
    pub description: String,
    pub code: String,
    pub category: String,
    pub tags: Vec<String>,
    pub author: String,
    pub icon: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionStats {
    pub downloads: u64,
    pub rating: f64,
    pub votes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    /// File stem for this collection's artifacts.
    pub slug: String,
    pub metadata: Metadata,
    pub documentation: Documentation,
    pub commands: Vec<CommandEntry>,
    pub stats: CollectionStats,
    pub created_at: String,
    pub updated_at: String,
}

fn entry(cmd: &SubmittedCommand, metadata: &Metadata, prefix_len: usize) -> CommandEntry {
    CommandEntry {
        id: command_id(&cmd.name, &cmd.code, prefix_len),
        name: cmd.name.trim().to_string(),
        description: cmd.description.trim().to_string(),
        code: cmd.code.clone(),
        category: if cmd.category.trim().is_empty() {
            metadata.category.clone()
        } else {
            cmd.category.trim().to_string()
        },
        tags: cmd.tags.clone(),
        author: if cmd.author.trim().is_empty() {
            metadata.author.clone()
        } else {
            cmd.author.trim().to_string()
        },
        icon: cmd.icon.clone(),
    }
}

impl Collection {
    /// Build the canonical record for an approved submission.
    pub fn from_submission(parsed: &ParsedSubmission, code_prefix_len: usize, now: &str) -> Self {
        let meta = &parsed.metadata;
        let id = collection_id(&meta.name, &meta.submitter, meta.issue_number);
        let name_slug = slugify(&meta.name);
        let slug = if name_slug.is_empty() {
            format!("collection-{}", &id[..8])
        } else {
            format!("{name_slug}-{}", &id[..8])
        };
        Self {
            slug,
            metadata: meta.clone(),
            documentation: parsed.documentation.clone(),
            commands: parsed
                .commands
                .iter()
                .map(|c| entry(c, meta, code_prefix_len))
                .collect(),
            stats: CollectionStats::default(),
            created_at: now.to_string(),
            updated_at: now.to_string(),
            id,
        }
    }

    /// Carry over what must survive reprocessing: stats and creation time.
    pub fn inherit(&mut self, previous: &Collection) {
        self.stats = previous.stats.clone();
        self.created_at = previous.created_at.clone();
    }

    /// File names for the per-command artifacts, unique within the collection.
    pub fn command_files(&self) -> Vec<(String, &CommandEntry)> {
        let mut used: Vec<String> = Vec::new();
        self.commands
            .iter()
            .map(|cmd| {
                let base = match slugify(&cmd.name) {
                    s if s.is_empty() => format!("command-{}", cmd.id),
                    s => s,
                };
                let mut name = format!("{base}.js");
                let mut n = 2;
                while used.contains(&name) {
                    name = format!("{base}-{n}.js");
                    n += 1;
                }
                used.push(name.clone());
                (name, cmd)
            })
            .collect()
    }
}

fn comment_safe(text: &str) -> String {
    text.replace("*/", "* /")
}

/// Documentation header followed by the original code.
pub fn command_artifact(collection: &Collection, cmd: &CommandEntry) -> String {
    let mut out = String::from("/**\n");
    out.push_str(&format!(" * {}\n", comment_safe(&cmd.name)));
    if !cmd.description.is_empty() {
        out.push_str(" *\n");
        for line in cmd.description.lines() {
            if line.trim().is_empty() {
                out.push_str(" *\n");
            } else {
                out.push_str(&format!(" * {}\n", comment_safe(line)));
            }
        }
    }
    out.push_str(" *\n");
    out.push_str(&format!(
        " * Collection: {} ({})\n",
        comment_safe(&collection.metadata.name),
        collection.id
    ));
    out.push_str(&format!(" * Command ID: {}\n", cmd.id));
    out.push_str(&format!(" * Author: @{}\n", comment_safe(&cmd.author)));
    out.push_str(&format!(" * Category: {}\n", comment_safe(&cmd.category)));
    if !cmd.tags.is_empty() {
        out.push_str(&format!(" * Tags: {}\n", comment_safe(&cmd.tags.join(", "))));
    }
    out.push_str(" */\n\n");
    out.push_str(&cmd.code);
    if !cmd.code.ends_with('\n') {
        out.push('\n');
    }
    out
}
