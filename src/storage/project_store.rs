//! JSON-backed project metadata store
//!
//! One file, `{ version, updated_at, projects: { id -> record } }`, rewritten
//! atomically (temp file + rename) on every mutation. Mutations are serialised
//! by an async mutex, so a single store can be shared across tasks.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::constants::store;
use crate::types::{DashError, ProjectRecord, Result, ResultExt};

/// What `upsert` did with a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    Added,
    Updated,
}

/// Record counts, grouped a few ways
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub total: usize,
    pub by_type: BTreeMap<String, usize>,
    pub by_status: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
}

/// Persistence operations the sync pipeline depends on
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Insert, or refresh detected fields of an existing record
    async fn upsert(&self, record: ProjectRecord) -> Result<UpsertOutcome>;

    async fn get(&self, id: &str) -> Option<ProjectRecord>;

    async fn get_by_path(&self, path: &Path) -> Option<ProjectRecord>;

    /// Returns whether a record was removed
    async fn remove(&self, id: &str) -> Result<bool>;

    /// All records, ordered by id
    async fn list_all(&self) -> Vec<ProjectRecord>;
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    projects: BTreeMap<String, ProjectRecord>,
}

pub struct JsonProjectStore {
    path: PathBuf,
    backup_dir: PathBuf,
    max_backups: usize,
    projects: Mutex<BTreeMap<String, ProjectRecord>>,
}

impl JsonProjectStore {
    /// Open the store at `path`, starting empty if the file does not exist
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let config = StoreConfig {
            path: path.clone(),
            backup_dir: None,
            max_backups: store::DEFAULT_MAX_BACKUPS,
        };
        Self::open_with(&config).await
    }

    pub async fn open_with(config: &StoreConfig) -> Result<Self> {
        let projects = match fs::read_to_string(&config.path).await {
            Ok(content) => {
                let file: StoreFile = serde_json::from_str(&content).map_err(|e| {
                    DashError::Store(format!(
                        "Failed to parse store {}: {}",
                        config.path.display(),
                        e
                    ))
                })?;
                debug!(
                    "Loaded {} project records from {}",
                    file.projects.len(),
                    config.path.display()
                );
                file.projects
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No store at {}, starting empty", config.path.display());
                BTreeMap::new()
            }
            Err(e) => {
                return Err(e).with_context_fn(|| format!("reading {}", config.path.display()));
            }
        };

        Ok(Self {
            path: config.path.clone(),
            backup_dir: config.resolved_backup_dir(),
            max_backups: config.max_backups,
            projects: Mutex::new(projects),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert or merge `record`. The in-memory map only changes once the
    /// new contents are on disk.
    pub async fn upsert(&self, record: ProjectRecord) -> Result<UpsertOutcome> {
        let mut projects = self.projects.lock().await;
        let mut next = projects.clone();
        let outcome = match next.get_mut(&record.id) {
            Some(existing) => {
                existing.merge_detected(record);
                UpsertOutcome::Updated
            }
            None => {
                next.insert(record.id.clone(), record);
                UpsertOutcome::Added
            }
        };
        self.persist(&next).await?;
        *projects = next;
        Ok(outcome)
    }

    pub async fn get(&self, id: &str) -> Option<ProjectRecord> {
        self.projects.lock().await.get(id).cloned()
    }

    pub async fn get_by_path(&self, path: &Path) -> Option<ProjectRecord> {
        self.projects
            .lock()
            .await
            .values()
            .find(|r| r.path == path)
            .cloned()
    }

    pub async fn remove(&self, id: &str) -> Result<bool> {
        let mut projects = self.projects.lock().await;
        if !projects.contains_key(id) {
            return Ok(false);
        }
        let mut next = projects.clone();
        next.remove(id);
        self.persist(&next).await?;
        *projects = next;
        info!("Removed project {}", id);
        Ok(true)
    }

    pub async fn list_all(&self) -> Vec<ProjectRecord> {
        self.projects.lock().await.values().cloned().collect()
    }

    pub async fn stats(&self) -> StoreStats {
        let projects = self.projects.lock().await;
        let mut stats = StoreStats {
            total: projects.len(),
            ..Default::default()
        };
        for record in projects.values() {
            *stats
                .by_type
                .entry(record.project_type.to_string())
                .or_default() += 1;
            *stats.by_status.entry(record.status.to_string()).or_default() += 1;
            let category = record
                .category
                .map(|c| c.to_string())
                .unwrap_or_else(|| "uncategorized".to_string());
            *stats.by_category.entry(category).or_default() += 1;
        }
        stats
    }

    /// Copy the current store into the backup directory, keeping at most
    /// `max_backups` copies.
    pub async fn backup(&self) -> Result<PathBuf> {
        let projects = self.projects.lock().await;
        if fs::metadata(&self.path).await.is_err() {
            self.persist(&projects).await?;
        }

        fs::create_dir_all(&self.backup_dir)
            .await
            .with_context_fn(|| format!("creating {}", self.backup_dir.display()))?;

        let stamp = Utc::now().format("%Y%m%d-%H%M%S%.3f");
        let target = self.backup_dir.join(format!("projects-{}.json", stamp));
        fs::copy(&self.path, &target)
            .await
            .with_context_fn(|| format!("copying store to {}", target.display()))?;
        info!("Backed up store to {}", target.display());

        self.prune_backups().await?;
        Ok(target)
    }

    async fn prune_backups(&self) -> Result<()> {
        let mut backups = Vec::new();
        let mut entries = fs::read_dir(&self.backup_dir)
            .await
            .with_context("listing backups")?;
        while let Some(entry) = entries.next_entry().await.with_context("listing backups")? {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with("projects-") && name.ends_with(".json") {
                backups.push(entry.path());
            }
        }

        // Timestamped names sort chronologically
        backups.sort();
        let excess = backups.len().saturating_sub(self.max_backups.max(1));
        for old in backups.into_iter().take(excess) {
            debug!("Removing old backup {}", old.display());
            fs::remove_file(&old)
                .await
                .with_context_fn(|| format!("removing {}", old.display()))?;
        }
        Ok(())
    }

    async fn persist(&self, projects: &BTreeMap<String, ProjectRecord>) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .await
                .with_context_fn(|| format!("creating {}", parent.display()))?;
        }

        let file = StoreFile {
            version: store::FORMAT_VERSION,
            updated_at: Utc::now(),
            projects: projects.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .await
            .with_context_fn(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .await
            .with_context_fn(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl ProjectRepository for JsonProjectStore {
    async fn upsert(&self, record: ProjectRecord) -> Result<UpsertOutcome> {
        JsonProjectStore::upsert(self, record).await
    }

    async fn get(&self, id: &str) -> Option<ProjectRecord> {
        JsonProjectStore::get(self, id).await
    }

    async fn get_by_path(&self, path: &Path) -> Option<ProjectRecord> {
        JsonProjectStore::get_by_path(self, path).await
    }

    async fn remove(&self, id: &str) -> Result<bool> {
        JsonProjectStore::remove(self, id).await
    }

    async fn list_all(&self) -> Vec<ProjectRecord> {
        JsonProjectStore::list_all(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        Category, ClassificationResult, DetectionReport, DirectoryStats, ProjectIndicatorSet,
        ProjectStatus, ProjectType,
    };
    use tempfile::TempDir;

    fn record(path: &str, category: Category, domain: Option<&str>, project_type: ProjectType) -> ProjectRecord {
        let path = PathBuf::from(path);
        let report = DetectionReport {
            name: crate::types::folder_name(&path),
            path,
            category: Some(category),
            domain: domain.map(String::from),
            subdomain: None,
            classification: ClassificationResult {
                project_type,
                confidence: 0.5,
                matched_indicators: vec!["src".to_string()],
                version: None,
            },
            status: ProjectStatus::Development,
            indicators: ProjectIndicatorSet::default(),
            stats: DirectoryStats::default(),
            error: None,
            detected_at: Utc::now(),
        };
        ProjectRecord::from_report(&report)
    }

    #[tokio::test]
    async fn test_upsert_add_then_update_keeps_user_fields() {
        let temp = TempDir::new().unwrap();
        let store = JsonProjectStore::open(temp.path().join("projects.json")).await.unwrap();

        let first = record("/r/personal/site.dev", Category::Personal, Some("site.dev"), ProjectType::Static);
        assert_eq!(store.upsert(first).await.unwrap(), UpsertOutcome::Added);

        // user annotates the record out of band
        {
            let mut projects = store.projects.lock().await;
            let existing = projects.get_mut("site.dev").unwrap();
            existing.description = Some("landing page".to_string());
            existing.tags = vec!["web".to_string()];
        }

        let second = record("/r/personal/site.dev", Category::Personal, Some("site.dev"), ProjectType::React);
        assert_eq!(store.upsert(second).await.unwrap(), UpsertOutcome::Updated);

        let stored = store.get("site.dev").await.unwrap();
        assert_eq!(stored.project_type, ProjectType::React);
        assert_eq!(stored.description.as_deref(), Some("landing page"));
        assert_eq!(stored.tags, vec!["web".to_string()]);
        assert!(stored.updated_at >= stored.created_at);
    }

    #[tokio::test]
    async fn test_persist_and_reopen() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("projects.json");
        {
            let store = JsonProjectStore::open(&path).await.unwrap();
            store
                .upsert(record("/r/professional/acme.io", Category::Professional, Some("acme.io"), ProjectType::Next))
                .await
                .unwrap();
            store
                .upsert(record("/r/personal/blog.me", Category::Personal, Some("blog.me"), ProjectType::Static))
                .await
                .unwrap();
        }
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());

        let reopened = JsonProjectStore::open(&path).await.unwrap();
        let ids: Vec<String> = reopened.list_all().await.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["acme.io".to_string(), "blog.me".to_string()]);

        let by_path = reopened
            .get_by_path(Path::new("/r/personal/blog.me"))
            .await
            .unwrap();
        assert_eq!(by_path.id, "blog.me");
    }

    #[tokio::test]
    async fn test_remove() {
        let temp = TempDir::new().unwrap();
        let store = JsonProjectStore::open(temp.path().join("projects.json")).await.unwrap();
        store
            .upsert(record("/r/personal/x.com", Category::Personal, Some("x.com"), ProjectType::Vue))
            .await
            .unwrap();

        assert!(store.remove("x.com").await.unwrap());
        assert!(!store.remove("x.com").await.unwrap());
        assert!(store.list_all().await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_store_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("projects.json");
        std::fs::write(&path, "not json").unwrap();

        let err = JsonProjectStore::open(&path).await.err().unwrap();
        assert!(matches!(err, DashError::Store(_)));
        assert_eq!(err.kind(), crate::types::ErrorKind::Storage);
    }

    #[tokio::test]
    async fn test_stats() {
        let temp = TempDir::new().unwrap();
        let store = JsonProjectStore::open(temp.path().join("projects.json")).await.unwrap();
        store
            .upsert(record("/r/personal/a.com", Category::Personal, Some("a.com"), ProjectType::React))
            .await
            .unwrap();
        store
            .upsert(record("/r/personal/b.com", Category::Personal, Some("b.com"), ProjectType::React))
            .await
            .unwrap();
        store
            .upsert(record("/r/professional/c.com", Category::Professional, Some("c.com"), ProjectType::Node))
            .await
            .unwrap();

        let stats = store.stats().await;
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_type.get("react"), Some(&2));
        assert_eq!(stats.by_type.get("node"), Some(&1));
        assert_eq!(stats.by_category.get("personal"), Some(&2));
        assert_eq!(stats.by_status.get("development"), Some(&3));
    }

    #[tokio::test]
    async fn test_backup_rotation() {
        let temp = TempDir::new().unwrap();
        let config = StoreConfig {
            path: temp.path().join("projects.json"),
            backup_dir: Some(temp.path().join("backups")),
            max_backups: 2,
        };
        let store = JsonProjectStore::open_with(&config).await.unwrap();

        let mut made = Vec::new();
        for _ in 0..4 {
            made.push(store.backup().await.unwrap());
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let remaining: Vec<_> = std::fs::read_dir(temp.path().join("backups"))
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(remaining.len(), 2);
        assert!(remaining.contains(&made[3]));
        assert!(remaining.contains(&made[2]));

        let content = std::fs::read_to_string(&made[3]).unwrap();
        assert!(content.contains("\"projects\""));
    }

    #[tokio::test]
    async fn test_repository_trait_object() {
        let temp = TempDir::new().unwrap();
        let store = JsonProjectStore::open(temp.path().join("projects.json")).await.unwrap();
        let repo: &dyn ProjectRepository = &store;

        let outcome = repo
            .upsert(record("/r/personal/z.io", Category::Personal, Some("z.io"), ProjectType::Deno))
            .await
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Added);
        assert_eq!(repo.list_all().await.len(), 1);
        assert!(repo.get_by_path(Path::new("/r/personal/z.io")).await.is_some());
        assert!(repo.get("z.io").await.is_some());
        assert!(repo.remove("z.io").await.unwrap());
    }

    /// Turns the store's parent directory into a regular file so the next
    /// write fails, returning the directory to restore afterwards.
    fn block_store_dir(path: &Path) -> PathBuf {
        let dir = path.parent().unwrap().to_path_buf();
        std::fs::remove_dir_all(&dir).unwrap();
        std::fs::write(&dir, "not a directory").unwrap();
        dir
    }

    fn unblock_store_dir(dir: &Path) {
        std::fs::remove_file(dir).unwrap();
        std::fs::create_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_failed_upsert_leaves_memory_unchanged() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("dir").join("projects.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let store = JsonProjectStore::open(&path).await.unwrap();

        let dir = block_store_dir(&path);
        let site = record("/r/personal/w.dev", Category::Personal, Some("w.dev"), ProjectType::Static);
        assert!(store.upsert(site.clone()).await.is_err());
        assert!(store.list_all().await.is_empty());
        assert!(store.get("w.dev").await.is_none());

        unblock_store_dir(&dir);
        assert_eq!(store.upsert(site).await.unwrap(), UpsertOutcome::Added);
        let reopened = JsonProjectStore::open(&path).await.unwrap();
        assert!(reopened.get("w.dev").await.is_some());
    }

    #[tokio::test]
    async fn test_failed_remove_keeps_record() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("dir").join("projects.json");
        let store = JsonProjectStore::open(&path).await.unwrap();
        store
            .upsert(record("/r/personal/k.dev", Category::Personal, Some("k.dev"), ProjectType::Vue))
            .await
            .unwrap();

        let dir = block_store_dir(&path);
        assert!(store.remove("k.dev").await.is_err());
        assert!(store.get("k.dev").await.is_some());

        unblock_store_dir(&dir);
        assert!(store.remove("k.dev").await.unwrap());
        assert!(store.get("k.dev").await.is_none());
    }
}
