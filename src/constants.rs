//! Global Constants
//!
//! Centralized constants for scoring and tuning.
//! All magic numbers should be defined here with documentation.

/// Detector scoring constants
pub mod scoring {
    /// Points per file indicator present in the directory
    pub const FILE_INDICATOR_POINTS: f32 = 20.0;

    /// Points per folder indicator present in the directory
    pub const FOLDER_INDICATOR_POINTS: f32 = 15.0;

    /// Points per declared dependency found in the manifest
    pub const DEPENDENCY_POINTS: f32 = 25.0;

    /// Points per declared dev-dependency found in the manifest
    pub const DEV_DEPENDENCY_POINTS: f32 = 15.0;

    /// Points per declared script name found in the manifest
    pub const SCRIPT_POINTS: f32 = 10.0;

    /// Final score divisor used to report confidence (capped at 1.0)
    pub const CONFIDENCE_NORMALIZER: f32 = 100.0;
}

/// Well-known file names
pub mod files {
    /// Package manifest
    pub const MANIFEST: &str = "package.json";

    /// Alternate runtime configs, in lookup order
    pub const DENO_CONFIGS: &[&str] = &["deno.json", "deno.jsonc"];

    /// Entry HTML
    pub const INDEX_HTML: &str = "index.html";
}

/// Filesystem watch constants
pub mod watch {
    /// Broadcast channel capacity for watch events
    pub const CHANNEL_CAPACITY: usize = 256;

    /// Interval at which the watch loop re-checks its cancellation flag (ms)
    pub const POLL_INTERVAL_MS: u64 = 100;
}

/// Sync pipeline constants
pub mod sync {
    /// Default number of concurrent detections
    pub const DEFAULT_CONCURRENCY: usize = 8;
}

/// Metadata store constants
pub mod store {
    /// Store file name inside the data directory
    pub const FILE_NAME: &str = "projects.json";

    /// Current on-disk format version
    pub const FORMAT_VERSION: u32 = 1;

    /// Default number of backups kept
    pub const DEFAULT_MAX_BACKUPS: usize = 10;
}
