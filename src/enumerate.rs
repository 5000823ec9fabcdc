//! Asset enumeration.
//!
//! Walks the assets root once per route build and returns every regular file
//! that no ignore rule excludes. Directories are never returned.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Result, StaticError};
use crate::ignore::{is_ignored, IgnoreRule};

/// Result of walking an assets root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetTree {
    /// Canonical, absolute assets root
    pub root: PathBuf,
    /// Absolute file paths under `root`, sorted
    pub files: Vec<PathBuf>,
}

impl AssetTree {
    /// Number of servable files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// True if nothing under the root is servable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Canonicalize `root` and check that it is a directory.
///
/// # Errors
///
/// [`StaticError::AssetsNotFound`] if the root is missing or inaccessible,
/// [`StaticError::NotADirectory`] if it is a file.
pub async fn canonical_root(root: &Path) -> Result<PathBuf> {
    let canonical = tokio::fs::canonicalize(root)
        .await
        .map_err(|source| StaticError::AssetsNotFound {
            path: root.to_path_buf(),
            source,
        })?;
    let meta = tokio::fs::metadata(&canonical)
        .await
        .map_err(|source| StaticError::AssetsNotFound {
            path: root.to_path_buf(),
            source,
        })?;
    if !meta.is_dir() {
        return Err(StaticError::NotADirectory {
            path: root.to_path_buf(),
        });
    }
    Ok(canonical)
}

/// Recursively list the servable files under `root`.
///
/// Symlinks are followed. Entries that cannot be read are skipped with a
/// warning; only a bad root is fatal.
///
/// # Errors
///
/// See [`canonical_root`]. [`StaticError::Enumerate`] if the blocking walk
/// task itself fails.
pub async fn enumerate_assets(root: &Path, rules: &[IgnoreRule]) -> Result<AssetTree> {
    let root = canonical_root(root).await?;
    let walk_root = root.clone();
    let rules = rules.to_vec();
    let files = tokio::task::spawn_blocking(move || walk(&walk_root, &rules))
        .await
        .map_err(|e| StaticError::Enumerate {
            path: root.clone(),
            message: e.to_string(),
        })?;
    debug!(root = %root.display(), files = files.len(), "Enumerated assets");
    Ok(AssetTree { root, files })
}

fn walk(root: &Path, rules: &[IgnoreRule]) -> Vec<PathBuf> {
    WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(root = %root.display(), error = %err, "Skipping unreadable asset entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| !is_ignored(rules, path))
        .collect()
}
