//! Collection Materializer and the on-disk repository behind it.
//!
//! Layout under the store root:
//!
//! ```text
//! index.json
//! <author>/profile.json
//! <author>/collections/<slug>.json
//! <author>/collections/<slug>-import.json
//! <author>/commands/<slug>/<command>.js
//! ```
//!
//! Every artifact is written to a temp file in its target directory and then
//! renamed into place, so readers never observe a partial file. Profile and
//! index updates are read-modify-write cycles; writers to one author
//! namespace are serialized by [`Store::lock_namespace`].

pub mod collection;
pub mod index;
pub mod materialize;
pub mod package;
pub mod profile;

pub use collection::{Collection, CollectionStats, CommandEntry};
pub use index::GlobalIndex;
pub use materialize::{
    Approval, MaterializeReport, materialize, materialize_at, now_rfc3339, rebuild_index,
};
pub use package::Package;
pub use profile::{Badge, CollectionRef, UserProfile};

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Condvar, LazyLock, Mutex};

use crate::error::{GateError, Result};

/// Keys currently held, process-wide. Different keys never wait on each other.
static HELD: LazyLock<(Mutex<HashSet<String>>, Condvar)> =
    LazyLock::new(|| (Mutex::new(HashSet::new()), Condvar::new()));

/// Exclusive hold on one lock key; released on drop.
#[derive(Debug)]
pub struct NamespaceGuard {
    key: String,
}

impl NamespaceGuard {
    fn acquire(key: String) -> Self {
        let (lock, cvar) = &*HELD;
        let mut held = lock.lock().unwrap_or_else(|e| e.into_inner());
        while held.contains(&key) {
            held = cvar.wait(held).unwrap_or_else(|e| e.into_inner());
        }
        held.insert(key.clone());
        log::debug!("acquired {key}");
        Self { key }
    }
}

impl Drop for NamespaceGuard {
    fn drop(&mut self) {
        let (lock, cvar) = &*HELD;
        let mut held = lock.lock().unwrap_or_else(|e| e.into_inner());
        held.remove(&self.key);
        cvar.notify_all();
    }
}

/// Author directory names are used verbatim as path components.
fn check_author(author: &str) -> Result<()> {
    let ok = !author.is_empty()
        && !author.starts_with('.')
        && author
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if ok {
        Ok(())
    } else {
        Err(GateError::InvalidInput(format!(
            "author handle {author:?} is not a valid namespace name"
        )))
    }
}

#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    /// Open (and create if absent) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn namespace_dir(&self, author: &str) -> Result<PathBuf> {
        check_author(author)?;
        Ok(self.root.join(author))
    }

    pub fn profile_path(&self, author: &str) -> Result<PathBuf> {
        Ok(self.namespace_dir(author)?.join("profile.json"))
    }

    pub fn collection_path(&self, author: &str, slug: &str) -> Result<PathBuf> {
        Ok(self
            .namespace_dir(author)?
            .join("collections")
            .join(format!("{slug}.json")))
    }

    pub fn import_path(&self, author: &str, slug: &str) -> Result<PathBuf> {
        Ok(self
            .namespace_dir(author)?
            .join("collections")
            .join(format!("{slug}-import.json")))
    }

    pub fn commands_dir(&self, author: &str, slug: &str) -> Result<PathBuf> {
        Ok(self.namespace_dir(author)?.join("commands").join(slug))
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join("index.json")
    }

    /// Serialize writers to one author namespace. Blocks while another
    /// holder exists in this process.
    pub fn lock_namespace(&self, author: &str) -> Result<NamespaceGuard> {
        let dir = self.namespace_dir(author)?;
        Ok(NamespaceGuard::acquire(dir.to_string_lossy().into_owned()))
    }

    /// Serialize index rebuilds for this store.
    pub fn lock_index(&self) -> NamespaceGuard {
        NamespaceGuard::acquire(self.index_path().to_string_lossy().into_owned())
    }

    /// Create the namespace directories. Existing directories are fine.
    pub fn ensure_namespace(&self, author: &str) -> Result<PathBuf> {
        let dir = self.namespace_dir(author)?;
        std::fs::create_dir_all(dir.join("collections"))?;
        std::fs::create_dir_all(dir.join("commands"))?;
        Ok(dir)
    }

    /// Write `contents` to a temp file beside `path`, then rename over it.
    pub fn write_atomic(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let parent = path.parent().unwrap_or(&self.root);
        std::fs::create_dir_all(parent)?;
        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        tmp.write_all(contents)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| GateError::Io(e.error))?;
        Ok(())
    }

    /// Pretty JSON with a trailing newline.
    pub fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let mut bytes = serde_json::to_vec_pretty(value)?;
        bytes.push(b'\n');
        self.write_atomic(path, &bytes)
    }

    /// `Ok(None)` when the file does not exist.
    pub fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        match std::fs::read_to_string(path) {
            Ok(s) => Ok(Some(serde_json::from_str(&s)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn load_profile(&self, author: &str) -> Result<Option<UserProfile>> {
        self.read_json(&self.profile_path(author)?)
    }

    pub fn load_collection(&self, author: &str, slug: &str) -> Result<Option<Collection>> {
        self.read_json(&self.collection_path(author, slug)?)
    }

    /// Every stored collection across all namespaces, in path order.
    /// Unreadable records are logged and skipped.
    pub fn load_all_collections(&self) -> Result<Vec<Collection>> {
        let mut paths = Vec::new();
        for ns in sorted_entries(&self.root)? {
            let dir = ns.join("collections");
            if !dir.is_dir() {
                continue;
            }
            for path in sorted_entries(&dir)? {
                let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                if name.ends_with(".json") && !name.ends_with("-import.json") {
                    paths.push(path);
                }
            }
        }

        let mut collections = Vec::new();
        for path in paths {
            match self.read_json::<Collection>(&path) {
                Ok(Some(c)) => collections.push(c),
                Ok(None) => {}
                Err(e) => log::warn!("skipping {}: {e}", path.display()),
            }
        }
        Ok(collections)
    }
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        entries.push(entry?.path());
    }
    entries.sort();
    Ok(entries)
}
