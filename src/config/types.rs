//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (`<config dir>/projdash/`) and local (`.projdash/`) configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{store, sync, watch};
use crate::types::{DashError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Scan settings
    pub scan: ScanConfig,

    /// Metadata store settings
    pub store: StoreConfig,

    /// Filesystem watch settings
    pub watch: WatchConfig,

    /// Extra name-classifier table entries
    pub classifier: ClassifierConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            scan: ScanConfig::default(),
            store: StoreConfig::default(),
            watch: WatchConfig::default(),
            classifier: ClassifierConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `DashError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if self.scan.root.as_os_str().is_empty() {
            return Err(DashError::Config("scan.root must not be empty".to_string()));
        }

        if self.scan.concurrency == 0 {
            return Err(DashError::Config(
                "scan.concurrency must be greater than 0".to_string(),
            ));
        }

        if self.watch.channel_capacity == 0 {
            return Err(DashError::Config(
                "watch.channel_capacity must be greater than 0".to_string(),
            ));
        }

        if self.store.path.as_os_str().is_empty() {
            return Err(DashError::Config("store.path must not be empty".to_string()));
        }

        Ok(())
    }
}

// =============================================================================
// Scan Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Directory holding the `personal/` and `professional/` folders
    pub root: PathBuf,

    /// Maximum concurrent detections during a sync
    pub concurrency: usize,

    /// Drop store records whose path no longer exists after a sync
    pub prune_missing: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root: default_scan_root(),
            concurrency: sync::DEFAULT_CONCURRENCY,
            prune_missing: false,
        }
    }
}

fn default_scan_root() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join("projects"))
        .unwrap_or_else(|| PathBuf::from("projects"))
}

// =============================================================================
// Store Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON file holding project records
    pub path: PathBuf,

    /// Directory for timestamped backups (defaults to `<store dir>/backups`)
    pub backup_dir: Option<PathBuf>,

    /// Backups kept before the oldest is removed
    pub max_backups: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: super::ConfigLoader::data_dir()
                .map(|dir| dir.join(store::FILE_NAME))
                .unwrap_or_else(|| PathBuf::from(".projdash").join(store::FILE_NAME)),
            backup_dir: None,
            max_backups: store::DEFAULT_MAX_BACKUPS,
        }
    }
}

impl StoreConfig {
    /// Effective backup directory
    pub fn resolved_backup_dir(&self) -> PathBuf {
        match &self.backup_dir {
            Some(dir) => dir.clone(),
            None => self
                .path
                .parent()
                .map(|p| p.join("backups"))
                .unwrap_or_else(|| PathBuf::from("backups")),
        }
    }
}

// =============================================================================
// Watch Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Broadcast capacity; slow subscribers lag past this
    pub channel_capacity: usize,

    /// How often the loop re-checks its stop flag (ms)
    pub poll_interval_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            channel_capacity: watch::CHANNEL_CAPACITY,
            poll_interval_ms: watch::POLL_INTERVAL_MS,
        }
    }
}

// =============================================================================
// Classifier Configuration
// =============================================================================

/// Entries appended to the built-in name-classifier tables
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClassifierConfig {
    pub extra_tlds: Vec<String>,
    pub extra_subdomain_patterns: Vec<String>,
    pub extra_excluded_folders: Vec<String>,
    pub extra_project_patterns: Vec<String>,
}

impl ClassifierConfig {
    pub fn is_empty(&self) -> bool {
        self.extra_tlds.is_empty()
            && self.extra_subdomain_patterns.is_empty()
            && self.extra_excluded_folders.is_empty()
            && self.extra_project_patterns.is_empty()
    }
}
