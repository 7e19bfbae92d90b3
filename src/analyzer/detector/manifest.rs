//! Package manifest and runtime config readers
//!
//! Both readers are fail-soft: a missing file is silently `None`, a malformed
//! one is logged and also `None`, so manifest-dependent scoring simply
//! contributes nothing.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tokio::fs;
use tracing::{debug, warn};

use crate::constants::files;
use crate::types::{DashError, json_string, strip_json_comments};

static VERSION_NOISE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^0-9.]").unwrap());

/// The parts of `package.json` the detector reads
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub dev_dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub scripts: BTreeMap<String, String>,
}

impl PackageManifest {
    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Declared under `dependencies`, by exact name or as a name prefix
    pub fn has_dependency(&self, indicator: &str) -> bool {
        matches_any(&self.dependencies, indicator)
    }

    pub fn has_dev_dependency(&self, indicator: &str) -> bool {
        matches_any(&self.dev_dependencies, indicator)
    }

    /// Exact name in dependencies or dev-dependencies, no prefix matching
    pub fn declares(&self, name: &str) -> bool {
        self.dependencies.contains_key(name) || self.dev_dependencies.contains_key(name)
    }

    pub fn has_script(&self, name: &str) -> bool {
        self.scripts.contains_key(name)
    }

    /// Cleaned version of `name` from dependencies, then dev-dependencies
    pub fn dependency_version(&self, name: &str) -> Option<String> {
        self.dependencies
            .get(name)
            .or_else(|| self.dev_dependencies.get(name))
            .and_then(|raw| clean_version(raw))
    }
}

fn matches_any(deps: &BTreeMap<String, String>, indicator: &str) -> bool {
    deps.contains_key(indicator) || deps.keys().any(|dep| dep.starts_with(indicator))
}

/// Strip everything except digits and dots (`^18.2.0` -> `18.2.0`)
pub fn clean_version(raw: &str) -> Option<String> {
    let cleaned = VERSION_NOISE.replace_all(raw, "");
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.into_owned())
    }
}

/// Read and parse `package.json` in `dir`
pub async fn load_manifest(dir: &Path) -> Option<PackageManifest> {
    let path = dir.join(files::MANIFEST);
    let content = match fs::read_to_string(&path).await {
        Ok(c) => c,
        Err(e) => {
            debug!("No readable manifest at {}: {}", path.display(), e);
            return None;
        }
    };

    match PackageManifest::parse(&content) {
        Ok(manifest) => Some(manifest),
        Err(e) => {
            let err = DashError::Manifest {
                path: path.clone(),
                message: e.to_string(),
            };
            warn!("{}", err);
            None
        }
    }
}

/// Read the first deno config found (`deno.json`, then `deno.jsonc`)
pub async fn load_deno_config(dir: &Path) -> Option<serde_json::Value> {
    for name in files::DENO_CONFIGS {
        let path = dir.join(name);
        let Ok(content) = fs::read_to_string(&path).await else {
            continue;
        };
        match serde_json::from_str(&strip_json_comments(&content)) {
            Ok(value) => return Some(value),
            Err(e) => {
                warn!(
                    "{}",
                    DashError::Manifest {
                        path: path.clone(),
                        message: e.to_string(),
                    }
                );
            }
        }
    }
    None
}

/// `version` field of a deno config
pub fn deno_version(config: &serde_json::Value) -> Option<String> {
    json_string(config, "version")
}
