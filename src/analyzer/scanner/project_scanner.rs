use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use std::time::Instant;

use chrono::Utc;
use tokio::fs;
use tracing::{Instrument, debug, info, info_span, warn};

use super::watcher::{ListenerId, ProjectWatcher, WatchEvent};
use crate::analyzer::classifier::NameClassifier;
use crate::analyzer::prober::{self, ListedEntry};
use crate::config::WatchConfig;
use crate::types::{
    Category, DashError, DiscoveredLocation, ErrorKind, Result, ScanErrorRecord, ScanId,
    ScanResult, folder_name,
};

/// Clears the in-progress flag when the scan ends, however it ends
pub(crate) struct ScanGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Accumulator threaded through one traversal
#[derive(Default)]
struct Traversal {
    locations: Vec<DiscoveredLocation>,
    errors: Vec<ScanErrorRecord>,
}

impl Traversal {
    fn record(&mut self, path: &Path, error: impl std::fmt::Display) {
        warn!("Cannot read {}: {}", path.display(), error);
        self.errors
            .push(ScanErrorRecord::new(path, ErrorKind::EntryRead, error.to_string()));
    }
}

/// Walks `root/{personal,professional}/<domain>/<subdomain>` and reports
/// project locations.
///
/// At most one scan runs at a time per instance; the discovered list is
/// replaced wholesale when a scan completes.
pub struct ProjectScanner {
    root: PathBuf,
    classifier: NameClassifier,
    in_progress: AtomicBool,
    last_discovered: RwLock<Vec<DiscoveredLocation>>,
    watcher: ProjectWatcher,
}

impl ProjectScanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            watcher: ProjectWatcher::new(&root, &WatchConfig::default()),
            root,
            classifier: NameClassifier::default(),
            in_progress: AtomicBool::new(false),
            last_discovered: RwLock::new(Vec::new()),
        }
    }

    pub fn with_classifier(mut self, classifier: NameClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_watch_config(mut self, config: &WatchConfig) -> Self {
        self.watcher = ProjectWatcher::new(&self.root, config);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_scanning(&self) -> bool {
        self.in_progress.load(Ordering::SeqCst)
    }

    /// Atomically claim the scan slot
    pub(crate) fn begin_scan(&self) -> Result<ScanGuard<'_>> {
        self.in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| DashError::ScanInProgress)?;
        Ok(ScanGuard {
            flag: &self.in_progress,
        })
    }

    /// Locations from the last completed scan (empty before the first)
    pub fn get_discovered_projects(&self) -> Vec<DiscoveredLocation> {
        self.last_discovered
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Run one scan pass.
    ///
    /// Fails only with [`DashError::ScanInProgress`]. A missing root and
    /// per-directory read failures are reported inside the result.
    pub async fn scan_projects(&self) -> Result<ScanResult> {
        let _guard = self.begin_scan()?;
        let scan_id = ScanId::generate();
        let span = info_span!("scan", id = %scan_id, root = %self.root.display());
        Ok(self.run_scan(scan_id).instrument(span).await)
    }

    async fn run_scan(&self, scan_id: ScanId) -> ScanResult {
        let started_at = Utc::now();
        let start = Instant::now();

        let root_ok = fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !root_ok {
            let err = DashError::RootNotFound {
                path: self.root.clone(),
            };
            warn!("{}", err);
            return ScanResult {
                scan_id: scan_id.into_inner(),
                success: false,
                projects_found: 0,
                locations: Vec::new(),
                errors: vec![ScanErrorRecord::new(
                    &self.root,
                    ErrorKind::RootNotFound,
                    err.to_string(),
                )],
                started_at,
                duration_ms: start.elapsed().as_millis() as u64,
            };
        }

        let mut traversal = Traversal::default();
        let success = self.walk_root(&mut traversal).await;

        if success {
            *self
                .last_discovered
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner()) = traversal.locations.clone();
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Scan finished: {} projects, {} errors in {}ms",
            traversal.locations.len(),
            traversal.errors.len(),
            duration_ms
        );

        ScanResult {
            scan_id: scan_id.into_inner(),
            success,
            projects_found: traversal.locations.len(),
            locations: traversal.locations,
            errors: traversal.errors,
            started_at,
            duration_ms,
        }
    }

    /// Level 1: category folders. Returns false if the root cannot be listed.
    async fn walk_root(&self, traversal: &mut Traversal) -> bool {
        let children = match subdirectories(&self.root).await {
            Ok(children) => children,
            Err(e) => {
                traversal.record(&self.root, e);
                return false;
            }
        };

        for child in children {
            match Category::from_folder_name(&child.name) {
                Some(category) => self.walk_category(&child.path, category, traversal).await,
                None => warn!(
                    "Skipping {}: not a personal/professional folder",
                    child.path.display()
                ),
            }
        }
        true
    }

    /// Level 2: domains, project roots and containers
    async fn walk_category(&self, path: &Path, category: Category, traversal: &mut Traversal) {
        let children = match subdirectories(path).await {
            Ok(children) => children,
            Err(e) => return traversal.record(path, e),
        };

        for child in children.into_iter().filter(|c| !is_hidden(&c.name)) {
            if self.classifier.is_domain_like(&child.name) {
                debug!("Domain folder: {}", child.path.display());
                traversal.locations.push(DiscoveredLocation::domain(
                    &child.path,
                    category,
                    &child.name,
                ));
                self.walk_domain(&child, category, traversal).await;
            } else if self.classifier.looks_like_project_folder(&child.name) {
                debug!("Project folder, not descending: {}", child.path.display());
            } else {
                self.walk_container(&child, category, traversal).await;
            }
        }
    }

    /// Level 3 under a domain: only subdomain-like children are projects
    async fn walk_domain(&self, domain: &ListedEntry, category: Category, traversal: &mut Traversal) {
        let children = match subdirectories(&domain.path).await {
            Ok(children) => children,
            Err(e) => return traversal.record(&domain.path, e),
        };

        for child in children.into_iter().filter(|c| !is_hidden(&c.name)) {
            if self.classifier.is_subdomain_like(&child.name) {
                debug!("Subdomain folder: {}", child.path.display());
                traversal.locations.push(DiscoveredLocation::subdomain(
                    &child.path,
                    category,
                    &domain.name,
                    &child.name,
                ));
            }
        }
    }

    /// Level 3 under an ambiguous folder: children that look like projects
    async fn walk_container(
        &self,
        container: &ListedEntry,
        category: Category,
        traversal: &mut Traversal,
    ) {
        let children = match subdirectories(&container.path).await {
            Ok(children) => children,
            Err(e) => return traversal.record(&container.path, e),
        };

        for child in children.into_iter().filter(|c| !is_hidden(&c.name)) {
            if prober::is_project_directory(&child.path).await {
                debug!("Project in container: {}", child.path.display());
                traversal.locations.push(DiscoveredLocation::subdomain(
                    &child.path,
                    category,
                    folder_name(&container.path),
                    &child.name,
                ));
            }
        }
    }

    // =========================================================================
    // Filesystem watch
    // =========================================================================

    pub fn watcher(&self) -> &ProjectWatcher {
        &self.watcher
    }

    pub fn on_event<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(&WatchEvent) + Send + Sync + 'static,
    {
        self.watcher.on_event(callback)
    }

    pub fn remove_event_callback(&self, id: ListenerId) -> bool {
        self.watcher.remove_event_callback(id)
    }

    pub fn start_watching(&self) -> Result<()> {
        self.watcher.start_watching()
    }

    pub async fn stop_watching(&self) {
        self.watcher.stop_watching().await
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Immediate child directories, sorted by name
async fn subdirectories(path: &Path) -> std::io::Result<Vec<ListedEntry>> {
    let listing = prober::list_directory(path).await?;
    Ok(listing.entries.into_iter().filter(|e| e.is_dir).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn mkdir(root: &Path, rel: &str) -> PathBuf {
        let path = root.join(rel);
        std::fs::create_dir_all(&path).unwrap();
        path
    }

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, "{}").unwrap();
    }

    fn paths(result: &ScanResult) -> BTreeSet<PathBuf> {
        result.locations.iter().map(|l| l.path.clone()).collect()
    }

    /// personal/
    ///   example.com/        domain (+ api subdomain, src skipped)
    ///   empty.dev/          empty domain, still a project
    ///   my-portfolio/       project root, not descended
    ///   sandbox/            container
    ///     tool-a/           has package.json
    ///     scratch/          nothing
    /// professional/
    ///   Acme.IO/www
    /// archive/              not a category
    fn fixture() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        mkdir(root, "personal/example.com/api");
        mkdir(root, "personal/example.com/src");
        mkdir(root, "personal/example.com/.git");
        mkdir(root, "personal/empty.dev");
        mkdir(root, "personal/my-portfolio/api");
        touch(root, "personal/sandbox/tool-a/package.json");
        mkdir(root, "personal/sandbox/scratch");
        mkdir(root, "personal/.cache/api");
        mkdir(root, "professional/Acme.IO/www");
        mkdir(root, "archive/old.com");
        touch(root, "personal/notes.txt");
        temp
    }

    #[tokio::test]
    async fn test_scan_discovers_expected_locations() {
        let temp = fixture();
        let scanner = ProjectScanner::new(temp.path());
        let result = scanner.scan_projects().await.unwrap();

        assert!(result.success);
        assert!(result.errors.is_empty());
        assert_eq!(result.projects_found, 6);

        let root = temp.path();
        let expected: BTreeSet<PathBuf> = [
            "personal/example.com",
            "personal/example.com/api",
            "personal/empty.dev",
            "personal/sandbox/tool-a",
            "professional/Acme.IO",
            "professional/Acme.IO/www",
        ]
        .iter()
        .map(|p| root.join(p))
        .collect();
        assert_eq!(paths(&result), expected);

        let tool = result
            .locations
            .iter()
            .find(|l| l.path.ends_with("tool-a"))
            .unwrap();
        assert_eq!(tool.category, Category::Personal);
        assert_eq!(tool.domain.as_deref(), Some("sandbox"));
        assert_eq!(tool.subdomain.as_deref(), Some("tool-a"));
    }

    #[tokio::test]
    async fn test_domain_with_api_yields_two_locations() {
        let temp = TempDir::new().unwrap();
        mkdir(temp.path(), "personal/example.com/api");

        let result = ProjectScanner::new(temp.path()).scan_projects().await.unwrap();
        assert_eq!(result.projects_found, 2);
        assert_eq!(
            result.locations,
            vec![
                DiscoveredLocation::domain(
                    temp.path().join("personal/example.com"),
                    Category::Personal,
                    "example.com"
                ),
                DiscoveredLocation::subdomain(
                    temp.path().join("personal/example.com/api"),
                    Category::Personal,
                    "example.com",
                    "api"
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_scan_is_idempotent() {
        let temp = fixture();
        let scanner = ProjectScanner::new(temp.path());

        let first = scanner.scan_projects().await.unwrap();
        let second = scanner.scan_projects().await.unwrap();
        assert_eq!(first.projects_found, second.projects_found);
        assert_eq!(paths(&first), paths(&second));
        assert_ne!(first.scan_id, second.scan_id);
        assert_eq!(scanner.get_discovered_projects(), second.locations);
    }

    #[tokio::test]
    async fn test_concurrent_scan_is_rejected() {
        let temp = fixture();
        let scanner = ProjectScanner::new(temp.path());
        let first = scanner.scan_projects().await.unwrap();

        let guard = scanner.begin_scan().unwrap();
        assert!(scanner.is_scanning());
        let err = scanner.scan_projects().await.unwrap_err();
        assert!(matches!(err, DashError::ScanInProgress));
        assert_eq!(err.kind(), ErrorKind::ConcurrencyConflict);
        assert_eq!(scanner.get_discovered_projects(), first.locations);

        drop(guard);
        assert!(!scanner.is_scanning());
        assert!(scanner.scan_projects().await.is_ok());
    }

    #[tokio::test]
    async fn test_parallel_scans_one_wins_or_both_serialize() {
        let temp = fixture();
        let scanner = ProjectScanner::new(temp.path());

        let (a, b) = tokio::join!(scanner.scan_projects(), scanner.scan_projects());
        let ok: Vec<_> = [&a, &b].into_iter().filter_map(|r| r.as_ref().ok()).collect();
        assert!(!ok.is_empty());
        for r in [&a, &b] {
            if let Err(e) = r {
                assert!(matches!(e, DashError::ScanInProgress));
            }
        }
        // No duplicates whichever way it went
        let discovered = scanner.get_discovered_projects();
        let unique: BTreeSet<_> = discovered.iter().map(|l| l.path.clone()).collect();
        assert_eq!(unique.len(), discovered.len());
        assert_eq!(discovered.len(), 6);
    }

    #[tokio::test]
    async fn test_missing_root_reports_failure() {
        let temp = TempDir::new().unwrap();
        let scanner = ProjectScanner::new(temp.path().join("nope"));

        let result = scanner.scan_projects().await.unwrap();
        assert!(!result.success);
        assert_eq!(result.projects_found, 0);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, ErrorKind::RootNotFound);
        assert!(result.errors[0].error.contains("not found"));
        assert!(!scanner.is_scanning());
        assert!(scanner.get_discovered_projects().is_empty());
    }

    #[tokio::test]
    async fn test_root_is_a_file() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "root.txt");
        let result = ProjectScanner::new(temp.path().join("root.txt"))
            .scan_projects()
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.errors[0].kind, ErrorKind::RootNotFound);
    }

    #[tokio::test]
    async fn test_empty_root_discovers_nothing() {
        let temp = TempDir::new().unwrap();
        let scanner = ProjectScanner::new(temp.path());
        assert!(scanner.get_discovered_projects().is_empty());

        let result = scanner.scan_projects().await.unwrap();
        assert!(result.success);
        assert_eq!(result.projects_found, 0);
    }

    #[tokio::test]
    async fn test_category_match_is_case_insensitive() {
        let temp = TempDir::new().unwrap();
        mkdir(temp.path(), "PERSONAL/site.dev");
        let result = ProjectScanner::new(temp.path()).scan_projects().await.unwrap();
        assert_eq!(result.projects_found, 1);
        assert_eq!(result.locations[0].category, Category::Personal);
    }

    #[tokio::test]
    async fn test_custom_classifier_tables() {
        let temp = TempDir::new().unwrap();
        mkdir(temp.path(), "personal/home.lan/intranet");

        let extra = crate::config::ClassifierConfig {
            extra_tlds: vec!["lan".to_string()],
            extra_subdomain_patterns: vec!["intranet".to_string()],
            ..Default::default()
        };
        let scanner =
            ProjectScanner::new(temp.path()).with_classifier(NameClassifier::with_overrides(&extra));
        let result = scanner.scan_projects().await.unwrap();
        assert_eq!(result.projects_found, 2);
    }

    #[tokio::test]
    async fn test_unlistable_levels_are_recorded() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("file.txt"), "plain").unwrap();
        let broken = temp.path().join("file.txt").join("child");
        let scanner = ProjectScanner::new(temp.path());

        let mut traversal = Traversal::default();
        scanner
            .walk_category(&broken, Category::Professional, &mut traversal)
            .await;
        let entry = ListedEntry {
            name: "child".to_string(),
            path: broken.clone(),
            is_dir: true,
            is_file: false,
            size: 0,
            modified: None,
        };
        scanner
            .walk_domain(&entry, Category::Professional, &mut traversal)
            .await;
        scanner
            .walk_container(&entry, Category::Professional, &mut traversal)
            .await;

        assert!(traversal.locations.is_empty());
        assert_eq!(traversal.errors.len(), 3);
        assert!(traversal.errors.iter().all(|e| e.kind == ErrorKind::EntryRead));
        assert!(traversal.errors.iter().all(|e| e.path == broken));
    }

    #[tokio::test]
    async fn test_root_through_file_fails_without_panicking() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("file.txt"), "plain").unwrap();
        let root = temp.path().join("file.txt").join("child");

        let result = ProjectScanner::new(&root).scan_projects().await.unwrap();
        assert!(!result.success);
        assert_eq!(result.projects_found, 0);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].path, root);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_category_is_recorded_and_scan_continues() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        mkdir(temp.path(), "personal/ok.com");
        let locked = mkdir(temp.path(), "professional");
        mkdir(temp.path(), "professional/hidden.com");
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

        if std::fs::read_dir(&locked).is_ok() {
            std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = ProjectScanner::new(temp.path()).scan_projects().await.unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        assert!(result.success);
        assert_eq!(result.projects_found, 1);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, ErrorKind::EntryRead);
        assert_eq!(result.errors[0].path, locked);
    }
}
