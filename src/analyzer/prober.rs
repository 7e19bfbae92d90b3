//! Directory prober
//!
//! Read-only inspection of a directory's immediate children. Every function
//! here is fail-soft: a listing that cannot be read is logged and treated as
//! empty, never returned as an error.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::warn;

use crate::types::{DirectoryStats, ProjectIndicatorSet, log_filter_error};

/// Child names that mark a directory as a project (lower-case)
const PROJECT_MARKERS: &[&str] = &[
    "package.json",
    "deno.json",
    "deno.jsonc",
    "index.html",
    ".git",
    "src",
    "public",
];

fn is_project_marker(name: &str) -> bool {
    let lower = name.to_lowercase();
    PROJECT_MARKERS.contains(&lower.as_str()) || lower == "readme" || lower.starts_with("readme.")
}

/// One immediate child of a listed directory
#[derive(Debug, Clone)]
pub struct ListedEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
    pub is_file: bool,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

/// Single-pass listing of a directory's immediate children
#[derive(Debug, Clone, Default)]
pub struct DirectoryListing {
    pub entries: Vec<ListedEntry>,
}

impl DirectoryListing {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn has_file(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.is_file && e.name == name)
    }

    pub fn has_dir(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.is_dir && e.name == name)
    }

    pub fn indicators(&self) -> ProjectIndicatorSet {
        ProjectIndicatorSet::from_names(self.names())
    }

    /// Shallow stats: immediate files only, subdirectories are not descended
    pub fn stats(&self) -> DirectoryStats {
        let files = self.entries.iter().filter(|e| e.is_file);
        let mut stats = DirectoryStats {
            entry_count: self.entries.len(),
            ..Default::default()
        };
        let mut latest: Option<SystemTime> = None;
        for entry in files {
            stats.file_count += 1;
            stats.size_bytes += entry.size;
            if let Some(modified) = entry.modified
                && latest.is_none_or(|l| modified > l)
            {
                latest = Some(modified);
            }
        }
        stats.last_modified = latest.map(DateTime::<Utc>::from);
        stats
    }
}

/// List immediate children with their type, size and mtime.
///
/// Errors only when the directory itself cannot be opened. A child whose
/// metadata cannot be read is kept by name with neither type flag set.
pub async fn list_directory(path: &Path) -> std::io::Result<DirectoryListing> {
    let mut read_dir = fs::read_dir(path).await?;
    let mut entries = Vec::new();

    loop {
        let entry = match read_dir.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read entry in {}: {}", path.display(), e);
                break;
            }
        };

        let name = entry.file_name().to_string_lossy().to_string();
        let entry_path = entry.path();
        // Follow symlinks so linked project folders count as directories
        let metadata = log_filter_error(
            fs::metadata(&entry_path).await,
            &format!("Cannot stat {}", entry_path.display()),
        );

        entries.push(ListedEntry {
            name,
            path: entry_path,
            is_dir: metadata.as_ref().is_some_and(|m| m.is_dir()),
            is_file: metadata.as_ref().is_some_and(|m| m.is_file()),
            size: metadata.as_ref().map(|m| m.len()).unwrap_or(0),
            modified: metadata.as_ref().and_then(|m| m.modified().ok()),
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(DirectoryListing { entries })
}

/// Fail-soft listing: unreadable directories are logged and treated as empty
pub async fn list_or_empty(path: &Path) -> DirectoryListing {
    match list_directory(path).await {
        Ok(listing) => listing,
        Err(e) => {
            warn!("Cannot list {}: {}", path.display(), e);
            DirectoryListing::default()
        }
    }
}

/// True as soon as any immediate child is a project marker
/// (manifest, runtime config, entry HTML, `.git`, README, `src`, `public`).
pub async fn is_project_directory(path: &Path) -> bool {
    let mut read_dir = match fs::read_dir(path).await {
        Ok(rd) => rd,
        Err(e) => {
            warn!("Cannot list {}: {}", path.display(), e);
            return false;
        }
    };

    loop {
        match read_dir.next_entry().await {
            Ok(Some(entry)) => {
                if is_project_marker(&entry.file_name().to_string_lossy()) {
                    return true;
                }
            }
            Ok(None) => return false,
            Err(e) => {
                warn!("Failed to read entry in {}: {}", path.display(), e);
                return false;
            }
        }
    }
}

/// Indicator flags from one listing pass
pub async fn gather_indicators(path: &Path) -> ProjectIndicatorSet {
    list_or_empty(path).await.indicators()
}
