//! CLI Common Utilities
//!
//! Shared initialization for command handlers: configuration, store and
//! scanner wiring.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::analyzer::{NameClassifier, ProjectScanner};
use crate::config::{Config, ConfigLoader};
use crate::storage::JsonProjectStore;
use crate::sync::ProjectSync;
use crate::types::{DashError, Result};

/// Command execution context
///
/// Built once per invocation from the merged configuration plus the global
/// `--config` / `--root` flags.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub config: Config,
}

impl CommandContext {
    pub fn load(config_path: Option<&Path>, root: Option<PathBuf>) -> Result<Self> {
        let mut config = ConfigLoader::load_with(config_path)?;
        if let Some(root) = root {
            config.scan.root = root;
            config.validate()?;
        }
        Ok(Self { config })
    }

    pub fn root(&self) -> &Path {
        &self.config.scan.root
    }

    pub async fn open_store(&self) -> Result<Arc<JsonProjectStore>> {
        Ok(Arc::new(JsonProjectStore::open_with(&self.config.store).await?))
    }

    pub fn scanner(&self) -> ProjectScanner {
        ProjectScanner::new(self.root())
            .with_classifier(NameClassifier::with_overrides(&self.config.classifier))
            .with_watch_config(&self.config.watch)
    }

    pub async fn sync(&self) -> Result<ProjectSync> {
        let store = self.open_store().await?;
        Ok(ProjectSync::new(Arc::new(self.scanner()), store)
            .with_concurrency(self.config.scan.concurrency)
            .with_prune_missing(self.config.scan.prune_missing))
    }
}

/// Look up a record or fail with `ProjectNotFound`
pub async fn require_project(
    store: &JsonProjectStore,
    id: &str,
) -> Result<crate::types::ProjectRecord> {
    store
        .get(id)
        .await
        .ok_or_else(|| DashError::ProjectNotFound { id: id.to_string() })
}

/// Render a value as pretty JSON on stdout
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(temp: &TempDir) -> PathBuf {
        let path = temp.path().join("config.toml");
        let content = format!(
            "[scan]\nroot = '{}'\nconcurrency = 3\n\n[store]\npath = '{}'\n",
            temp.path().join("projects").display(),
            temp.path().join("data").join("projects.json").display()
        );
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_load_reads_explicit_config() {
        let temp = TempDir::new().unwrap();
        let config_path = write_config(&temp);

        let ctx = CommandContext::load(Some(&config_path), None).unwrap();
        assert_eq!(ctx.root(), temp.path().join("projects"));
        assert_eq!(ctx.config.scan.concurrency, 3);

        let store = ctx.open_store().await.unwrap();
        assert_eq!(store.path(), temp.path().join("data").join("projects.json"));
    }

    #[test]
    fn test_root_flag_overrides_config() {
        let temp = TempDir::new().unwrap();
        let config_path = write_config(&temp);
        let elsewhere = temp.path().join("elsewhere");

        let ctx = CommandContext::load(Some(&config_path), Some(elsewhere.clone())).unwrap();
        assert_eq!(ctx.root(), elsewhere);
        assert_eq!(ctx.scanner().root(), elsewhere);
        assert_eq!(ctx.config.scan.concurrency, 3);
    }

    #[test]
    fn test_empty_root_flag_is_rejected() {
        let temp = TempDir::new().unwrap();
        let config_path = write_config(&temp);

        let err = CommandContext::load(Some(&config_path), Some(PathBuf::new())).unwrap_err();
        assert!(matches!(err, DashError::Config(_)));
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("absent.toml");
        assert!(CommandContext::load(Some(&missing), None).is_err());
    }

    #[tokio::test]
    async fn test_require_project_not_found() {
        let temp = TempDir::new().unwrap();
        let store = JsonProjectStore::open(temp.path().join("projects.json")).await.unwrap();
        let err = require_project(&store, "nope.dev").await.unwrap_err();
        assert!(matches!(err, DashError::ProjectNotFound { ref id } if id == "nope.dev"));
    }
}
