//! Output library scanning.
//!
//! The library is whatever the output directory contains; nothing is indexed
//! or cached, every listing walks the directory tree.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// A single file in the output library.
#[derive(Debug, Clone, Serialize)]
pub struct LibraryFile {
    /// File name without directories.
    pub name: String,

    /// Path relative to the library root, usable with the play/fetch
    /// endpoints.
    pub path: String,

    /// Size in bytes.
    pub size: u64,

    /// Last modification time.
    pub modified: DateTime<Utc>,
}

/// Recursively scan `root` for files with the given extension, newest first.
///
/// A missing root yields an empty listing rather than an error; the output
/// directory is created lazily by the first completed download.
pub async fn scan_library(root: &Path, extension: &str) -> std::io::Result<Vec<LibraryFile>> {
    let mut files = Vec::new();

    if !root.exists() {
        return Ok(files);
    }

    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let file_type = entry.file_type().await?;

            if file_type.is_dir() {
                pending.push(path);
                continue;
            }

            if path.extension().and_then(|e| e.to_str()) != Some(extension) {
                continue;
            }

            let metadata = entry.metadata().await?;
            let modified = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());

            let relative = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .to_string_lossy()
                .to_string();
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| relative.clone());

            files.push(LibraryFile {
                name,
                path: relative,
                size: metadata.len(),
                modified,
            });
        }
    }

    files.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.path.cmp(&b.path)));
    Ok(files)
}

/// Resolve a client-supplied relative path against the library root.
///
/// Returns `None` for anything that could escape the root: absolute paths,
/// `..` components, or drive prefixes.
pub fn resolve_library_path(root: &Path, relative: &str) -> Option<PathBuf> {
    let relative = Path::new(relative);
    let mut resolved = root.to_path_buf();

    for component in relative.components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }

    if resolved == root {
        return None;
    }

    Some(resolved)
}
