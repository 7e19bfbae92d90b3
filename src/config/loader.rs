//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (`<config dir>/projdash/config.toml`)
//! 3. Local config (`.projdash/config.toml`)
//! 4. Environment variables (`PROJDASH_*`, nested keys joined by `__`)
//!
//! Command-line overrides are applied by the caller on the extracted value.

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::types::{DashError, Result};

const ENV_PREFIX: &str = "PROJDASH_";

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain:
    /// defaults → global → local → env vars
    pub fn load() -> Result<Config> {
        Self::load_with(None)
    }

    /// Same chain, with `explicit` merged after the local file when given
    pub fn load_with(explicit: Option<&Path>) -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let local_path = Self::local_config_path();
        if local_path.exists() {
            debug!("Loading local config from: {}", local_path.display());
            figment = figment.merge(Toml::file(&local_path));
        }

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(DashError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            debug!("Loading config from: {}", path.display());
            figment = figment.merge(Toml::file(path));
        }

        // e.g. PROJDASH_SCAN__ROOT -> scan.root
        let config = Self::extract(figment.merge(Self::env_provider(ENV_PREFIX)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        Self::extract(
            Figment::new()
                .merge(Serialized::defaults(Config::default()))
                .merge(Toml::file(path)),
        )
    }

    fn env_provider(prefix: &str) -> Env {
        Env::prefixed(prefix).split("__").lowercase(true)
    }

    fn extract(figment: Figment) -> Result<Config> {
        Ok(figment.extract()?)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "projdash")
    }

    /// Global config directory
    pub fn global_dir() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Default location of the metadata store
    pub fn data_dir() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
    }

    /// Local (working directory) config file
    pub fn local_config_path() -> PathBuf {
        Self::local_dir().join("config.toml")
    }

    pub fn local_dir() -> PathBuf {
        PathBuf::from(".projdash")
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Show config file paths
    pub fn show_path() {
        println!("Configuration paths:");
        println!();

        if let Some(global) = Self::global_config_path() {
            let exists = if global.exists() { "✓" } else { "✗" };
            println!("  Global: {} {}", exists, global.display());
        } else {
            println!("  Global: (not available)");
        }

        let local = Self::local_config_path();
        let exists = if local.exists() { "✓" } else { "✗" };
        println!("  Local:  {} {}", exists, local.display());

        if let Some(data) = Self::data_dir() {
            let exists = if data.exists() { "✓" } else { "✗" };
            println!("  Data:   {} {}", exists, data.display());
        }
    }

    /// Render an effective configuration as JSON or TOML
    pub fn render(config: &Config, as_json: bool) -> Result<String> {
        if as_json {
            Ok(serde_json::to_string_pretty(config)?)
        } else {
            Ok(toml::to_string_pretty(config)?)
        }
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Write the default global config file
    pub fn init_global(force: bool) -> Result<PathBuf> {
        let global_dir = Self::global_dir().ok_or_else(|| {
            DashError::Config("Cannot determine global config directory".to_string())
        })?;
        Self::write_default(&global_dir, force)
    }

    /// Write the default local config file under `.projdash/`
    pub fn init_local(force: bool) -> Result<PathBuf> {
        Self::write_default(&Self::local_dir(), force)
    }

    fn write_default(dir: &Path, force: bool) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;

        let config_path = dir.join("config.toml");
        if !config_path.exists() || force {
            fs::write(&config_path, Self::default_config_content())?;
            info!("Created config: {}", config_path.display());
        } else {
            info!("Config exists: {}", config_path.display());
        }

        Ok(config_path)
    }

    /// Default config content (TOML)
    fn default_config_content() -> String {
        r#"# projdash configuration
# Local settings in .projdash/config.toml override the global file.

version = "1.0"

[scan]
# Folder containing personal/ and professional/
# root = "~/projects"
concurrency = 8
prune_missing = false

[store]
max_backups = 10

[watch]
channel_capacity = 256
poll_interval_ms = 100

# Extend the built-in folder-name tables
[classifier]
extra_tlds = []
extra_subdomain_patterns = []
extra_excluded_folders = []
extra_project_patterns = []
"#
        .to_string()
    }
}
