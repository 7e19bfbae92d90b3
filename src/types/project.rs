//! Project-level type definitions
//!
//! Contains the value objects produced by discovery and classification, and
//! the durable record kept by the metadata store.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{DetectionError, ScanErrorRecord};
use crate::constants::files;

// =============================================================================
// Category
// =============================================================================

/// Top-level folder under the scan root
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Personal,
    Professional,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Personal, Category::Professional];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Personal => "personal",
            Category::Professional => "professional",
        }
    }

    /// Case-insensitive match of a folder name against the known categories
    pub fn from_folder_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_folder_name(s).ok_or_else(|| {
            format!(
                "Unknown category: {}. Valid values: personal, professional",
                s
            )
        })
    }
}

// =============================================================================
// Project Type & Status
// =============================================================================

/// Framework/tooling tag assigned by the detector
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    React,
    Vue,
    Svelte,
    Angular,
    Next,
    Nuxt,
    Deno,
    Node,
    Static,
    Wordpress,
    #[default]
    Unknown,
}

impl ProjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::React => "react",
            ProjectType::Vue => "vue",
            ProjectType::Svelte => "svelte",
            ProjectType::Angular => "angular",
            ProjectType::Next => "next",
            ProjectType::Nuxt => "nuxt",
            ProjectType::Deno => "deno",
            ProjectType::Node => "node",
            ProjectType::Static => "static",
            ProjectType::Wordpress => "wordpress",
            ProjectType::Unknown => "unknown",
        }
    }

    fn all_variants() -> &'static [ProjectType] {
        &[
            ProjectType::React,
            ProjectType::Vue,
            ProjectType::Svelte,
            ProjectType::Angular,
            ProjectType::Next,
            ProjectType::Nuxt,
            ProjectType::Deno,
            ProjectType::Node,
            ProjectType::Static,
            ProjectType::Wordpress,
            ProjectType::Unknown,
        ]
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ProjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Self::all_variants()
            .iter()
            .copied()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| format!("Unknown project type: {}", s))
    }
}

/// Coarse lifecycle status derived from directory contents
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    /// Empty folder, or content without any runnable marker
    #[default]
    Proposed,
    /// Has a manifest, runtime config or entry HTML
    Development,
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectStatus::Proposed => write!(f, "proposed"),
            ProjectStatus::Development => write!(f, "development"),
        }
    }
}

// =============================================================================
// Discovery
// =============================================================================

/// A project location found by the scanner
///
/// `subdomain` is only ever set together with `domain`; use the constructors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DiscoveredLocation {
    pub path: PathBuf,
    pub category: Category,
    pub domain: Option<String>,
    pub subdomain: Option<String>,
}

impl DiscoveredLocation {
    /// Location of a domain-level project
    pub fn domain(path: impl Into<PathBuf>, category: Category, domain: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            category,
            domain: Some(domain.into()),
            subdomain: None,
        }
    }

    /// Location nested one level below a domain (or container) folder
    pub fn subdomain(
        path: impl Into<PathBuf>,
        category: Category,
        domain: impl Into<String>,
        subdomain: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            category,
            domain: Some(domain.into()),
            subdomain: Some(subdomain.into()),
        }
    }
}

/// Boolean flags for the closed set of marker files/folders
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectIndicatorSet {
    /// package.json
    pub has_manifest: bool,
    /// deno.json / deno.jsonc
    pub has_deno_config: bool,
    /// index.html
    pub has_index_html: bool,
    /// README, README.md, ...
    pub has_readme: bool,
    /// .git
    pub has_git: bool,
    /// node_modules
    pub has_node_modules: bool,
    /// src
    pub has_src: bool,
    /// public
    pub has_public: bool,
    /// dist / build
    pub has_build_output: bool,
}

impl ProjectIndicatorSet {
    /// Build the flag set from immediate child names (case-insensitive)
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for name in names {
            set.observe(name.as_ref());
        }
        set
    }

    fn observe(&mut self, name: &str) {
        let lower = name.to_lowercase();
        match lower.as_str() {
            files::MANIFEST => self.has_manifest = true,
            "deno.json" | "deno.jsonc" => self.has_deno_config = true,
            files::INDEX_HTML => self.has_index_html = true,
            ".git" => self.has_git = true,
            "node_modules" => self.has_node_modules = true,
            "src" => self.has_src = true,
            "public" => self.has_public = true,
            "dist" | "build" => self.has_build_output = true,
            other if other == "readme" || other.starts_with("readme.") => self.has_readme = true,
            _ => {}
        }
    }

    /// A runnable marker is present (manifest, runtime config or entry HTML)
    pub fn has_runnable_marker(&self) -> bool {
        self.has_manifest || self.has_deno_config || self.has_index_html
    }

    /// Number of flags that are set
    pub fn count(&self) -> usize {
        [
            self.has_manifest,
            self.has_deno_config,
            self.has_index_html,
            self.has_readme,
            self.has_git,
            self.has_node_modules,
            self.has_src,
            self.has_public,
            self.has_build_output,
        ]
        .iter()
        .filter(|b| **b)
        .count()
    }
}

// =============================================================================
// Classification
// =============================================================================

/// Outcome of scoring one directory against the signature table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassificationResult {
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    /// Normalized score in [0, 1]
    pub confidence: f32,
    /// Evidence in discovery order
    pub matched_indicators: Vec<String>,
    pub version: Option<String>,
}

impl ClassificationResult {
    pub fn unknown() -> Self {
        Self {
            project_type: ProjectType::Unknown,
            confidence: 0.0,
            matched_indicators: Vec::new(),
            version: None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.project_type == ProjectType::Unknown
    }
}

impl Default for ClassificationResult {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Shallow statistics over a directory's immediate files
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirectoryStats {
    /// All immediate entries (files and folders)
    pub entry_count: usize,
    /// Immediate regular files only
    pub file_count: usize,
    pub size_bytes: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Everything the detector knows about one path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionReport {
    pub path: PathBuf,
    pub name: String,
    pub category: Option<Category>,
    pub domain: Option<String>,
    pub subdomain: Option<String>,
    pub classification: ClassificationResult,
    pub status: ProjectStatus,
    pub indicators: ProjectIndicatorSet,
    pub stats: DirectoryStats,
    pub error: Option<DetectionError>,
    pub detected_at: DateTime<Utc>,
}

impl DetectionReport {
    /// Partial result for a path whose detection failed
    pub fn failed(path: &Path, error: DetectionError) -> Self {
        Self {
            path: path.to_path_buf(),
            name: folder_name(path),
            category: None,
            domain: None,
            subdomain: None,
            classification: ClassificationResult::unknown(),
            status: ProjectStatus::Proposed,
            indicators: ProjectIndicatorSet::default(),
            stats: DirectoryStats::default(),
            error: Some(error),
            detected_at: Utc::now(),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Last path component as an owned string, or the full path if there is none
pub fn folder_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(String::from)
        .unwrap_or_else(|| path.display().to_string())
}

// =============================================================================
// Scan Result
// =============================================================================

/// Outcome of one scan pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub scan_id: String,
    /// Whether the root itself was scannable
    pub success: bool,
    pub projects_found: usize,
    pub locations: Vec<DiscoveredLocation>,
    pub errors: Vec<ScanErrorRecord>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

// =============================================================================
// Durable Record
// =============================================================================

/// Persisted metadata for one project, keyed by `id`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectRecord {
    pub id: String,
    pub name: String,
    pub path: PathBuf,
    pub category: Option<Category>,
    pub domain: Option<String>,
    pub subdomain: Option<String>,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    pub confidence: f32,
    #[serde(default)]
    pub matched_indicators: Vec<String>,
    pub version: Option<String>,
    pub status: ProjectStatus,
    #[serde(default)]
    pub file_count: usize,
    #[serde(default)]
    pub size_bytes: u64,
    pub last_modified: Option<DateTime<Utc>>,

    // User-owned fields, preserved across rescans
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub detection_error: Option<DetectionError>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectRecord {
    /// Resolve the record id: subdomain > domain > `category-name`
    ///
    /// A bare subdomain label is qualified with its domain so that `api`
    /// under two different domains yields two records.
    pub fn resolve_id(
        category: Option<Category>,
        domain: Option<&str>,
        subdomain: Option<&str>,
        name: &str,
    ) -> String {
        let raw = match (subdomain, domain) {
            (Some(sub), Some(domain)) if !sub.contains('.') => format!("{}.{}", sub, domain),
            (Some(sub), _) => sub.to_string(),
            (None, Some(domain)) => domain.to_string(),
            (None, None) => match category {
                Some(category) => format!("{}-{}", category, name),
                None => name.to_string(),
            },
        };
        slugify(&raw)
    }

    /// Build a fresh record from a detection report
    pub fn from_report(report: &DetectionReport) -> Self {
        let now = Utc::now();
        Self {
            id: Self::resolve_id(
                report.category,
                report.domain.as_deref(),
                report.subdomain.as_deref(),
                &report.name,
            ),
            name: report.name.clone(),
            path: report.path.clone(),
            category: report.category,
            domain: report.domain.clone(),
            subdomain: report.subdomain.clone(),
            project_type: report.classification.project_type,
            confidence: report.classification.confidence,
            matched_indicators: report.classification.matched_indicators.clone(),
            version: report.classification.version.clone(),
            status: report.status,
            file_count: report.stats.file_count,
            size_bytes: report.stats.size_bytes,
            last_modified: report.stats.last_modified,
            description: None,
            tags: Vec::new(),
            detection_error: report.error.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite detected fields from `detected`, keeping user-owned ones
    pub fn merge_detected(&mut self, detected: ProjectRecord) {
        let description = self.description.take();
        let tags = std::mem::take(&mut self.tags);
        let created_at = self.created_at;

        *self = detected;
        self.description = description;
        self.tags = tags;
        self.created_at = created_at;
        self.updated_at = Utc::now();
    }
}

fn slugify(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_folder_name() {
        assert_eq!(Category::from_folder_name("Personal"), Some(Category::Personal));
        assert_eq!(
            Category::from_folder_name("PROFESSIONAL"),
            Some(Category::Professional)
        );
        assert_eq!(Category::from_folder_name("archive"), None);
    }

    #[test]
    fn test_project_type_round_trip_names() {
        assert_eq!("Next".parse::<ProjectType>().unwrap(), ProjectType::Next);
        assert_eq!(ProjectType::Wordpress.to_string(), "wordpress");
        assert!("rails".parse::<ProjectType>().is_err());
    }

    #[test]
    fn test_indicator_set_from_names() {
        let set = ProjectIndicatorSet::from_names(["Package.json", "README.md", "src", "dist"]);
        assert!(set.has_manifest);
        assert!(set.has_readme);
        assert!(set.has_src);
        assert!(set.has_build_output);
        assert!(!set.has_git);
        assert!(set.has_runnable_marker());
        assert_eq!(set.count(), 4);
    }

    #[test]
    fn test_indicator_set_readme_prefix_only() {
        let set = ProjectIndicatorSet::from_names(["readme-assets"]);
        assert!(!set.has_readme);
        let set = ProjectIndicatorSet::from_names(["README"]);
        assert!(set.has_readme);
        assert!(!set.has_runnable_marker());
    }

    #[test]
    fn test_discovered_location_invariant() {
        let loc = DiscoveredLocation::subdomain("/r/personal/x.com/api", Category::Personal, "x.com", "api");
        assert!(loc.domain.is_some());
        assert_eq!(loc.subdomain.as_deref(), Some("api"));

        let loc = DiscoveredLocation::domain("/r/personal/x.com", Category::Personal, "x.com");
        assert!(loc.subdomain.is_none());
    }

    #[test]
    fn test_resolve_id_precedence() {
        assert_eq!(
            ProjectRecord::resolve_id(Some(Category::Personal), Some("example.com"), Some("api"), "api"),
            "api.example.com"
        );
        assert_eq!(
            ProjectRecord::resolve_id(
                Some(Category::Personal),
                Some("example.com"),
                Some("blog.example.com"),
                "blog.example.com"
            ),
            "blog.example.com"
        );
        assert_eq!(
            ProjectRecord::resolve_id(Some(Category::Professional), Some("Example.com"), None, "Example.com"),
            "example.com"
        );
        assert_eq!(
            ProjectRecord::resolve_id(Some(Category::Personal), None, None, "My Tool"),
            "personal-my-tool"
        );
        assert_eq!(ProjectRecord::resolve_id(None, None, None, "loose"), "loose");
    }

    #[test]
    fn test_merge_detected_keeps_user_fields() {
        let report = DetectionReport::failed(
            Path::new("/r/personal/site.dev"),
            DetectionError::new(super::super::error::ErrorKind::Detection, "x"),
        );
        let mut existing = ProjectRecord::from_report(&report);
        existing.description = Some("my site".to_string());
        existing.tags = vec!["web".to_string()];
        let created = existing.created_at;

        let mut detected = ProjectRecord::from_report(&report);
        detected.project_type = ProjectType::Static;
        detected.detection_error = None;
        existing.merge_detected(detected);

        assert_eq!(existing.project_type, ProjectType::Static);
        assert_eq!(existing.description.as_deref(), Some("my site"));
        assert_eq!(existing.tags, vec!["web".to_string()]);
        assert_eq!(existing.created_at, created);
        assert!(existing.detection_error.is_none());
    }

    #[test]
    fn test_classification_unknown() {
        let result = ClassificationResult::unknown();
        assert!(result.is_unknown());
        assert_eq!(result.confidence, 0.0);
        assert!(result.matched_indicators.is_empty());
    }
}
