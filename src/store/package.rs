//! Portable collection packages.
//!
//! A package is the client-import subset of a collection plus a SHA-256
//! checksum over its metadata and commands. Import recomputes the checksum
//! and refuses a package whose content no longer matches.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::collection::{Collection, CommandEntry};
use crate::error::{GateError, Result};
use crate::parse::Metadata;

pub const FORMAT_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub format_version: String,
    pub exported_at: String,
    pub collection_id: String,
    pub metadata: Metadata,
    pub commands: Vec<CommandEntry>,
    pub checksum: String,
}

/// Checksum over the canonical JSON of `(metadata, commands)`.
pub fn checksum(metadata: &Metadata, commands: &[CommandEntry]) -> Result<String> {
    let canonical = serde_json::to_vec(&(metadata, commands))?;
    Ok(format!("{:x}", Sha256::digest(&canonical)))
}

impl Package {
    /// Recompute the checksum and compare it with the recorded one.
    pub fn verify(&self) -> Result<()> {
        let actual = checksum(&self.metadata, &self.commands)?;
        if actual != self.checksum {
            return Err(GateError::PackageIntegrity {
                expected: self.checksum.clone(),
                actual,
            });
        }
        Ok(())
    }
}

pub fn export(collection: &Collection, now: &str) -> Result<Package> {
    Ok(Package {
        format_version: FORMAT_VERSION.to_string(),
        exported_at: now.to_string(),
        collection_id: collection.id.clone(),
        checksum: checksum(&collection.metadata, &collection.commands)?,
        metadata: collection.metadata.clone(),
        commands: collection.commands.clone(),
    })
}

/// Parse and verify a package.
pub fn import(json: &str) -> Result<Package> {
    let package: Package = serde_json::from_str(json)?;
    if package.format_version != FORMAT_VERSION {
        log::warn!(
            "package format {} differs from {FORMAT_VERSION}",
            package.format_version
        );
    }
    package.verify()?;
    Ok(package)
}
