use std::cmp::Ordering;
use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use tokio::fs;
use tracing::{debug, warn};

use super::manifest::{PackageManifest, deno_version, load_deno_config, load_manifest};
use super::signatures::{FrameworkSignature, SIGNATURES};
use crate::analyzer::prober::{self, DirectoryListing};
use crate::constants::scoring;
use crate::types::{
    Category, ClassificationResult, DashError, DetectionError, DetectionReport, ProjectStatus,
    ProjectType, Result, folder_name,
};

/// Score of one signature against one directory
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureScore {
    pub project_type: ProjectType,
    pub rank: u16,
    /// `raw * base_confidence + priority`
    pub score: f32,
    pub evidence: Vec<String>,
}

/// Classifies directories against the signature table.
///
/// Stateless apart from configuration, so one instance can serve many
/// concurrent detections.
#[derive(Debug, Clone)]
pub struct ProjectDetector {
    root: Option<PathBuf>,
    signatures: Vec<FrameworkSignature>,
}

impl Default for ProjectDetector {
    fn default() -> Self {
        Self {
            root: None,
            signatures: SIGNATURES.to_vec(),
        }
    }
}

impl ProjectDetector {
    /// Detector that derives category/domain/subdomain relative to `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            ..Default::default()
        }
    }

    pub fn with_signatures(mut self, signatures: Vec<FrameworkSignature>) -> Self {
        self.signatures = signatures;
        self
    }

    /// Classify `path`, folding any failure into an `unknown` report with
    /// an attached error so batch callers can carry on.
    pub async fn detect_project(&self, path: &Path) -> DetectionReport {
        match self.try_detect(path).await {
            Ok(report) => report,
            Err(e) => {
                warn!("Detection failed for {}: {}", path.display(), e);
                let mut report = DetectionReport::failed(path, DetectionError::from(&e));
                self.apply_location(&mut report);
                report
            }
        }
    }

    /// Classify `path`, returning an error if it is not a readable directory
    pub async fn try_detect(&self, path: &Path) -> Result<DetectionReport> {
        let metadata = fs::metadata(path)
            .await
            .map_err(|e| DashError::detection(path, e.to_string()))?;
        if !metadata.is_dir() {
            return Err(DashError::detection(path, "not a directory"));
        }

        let listing = prober::list_or_empty(path).await;
        let indicators = listing.indicators();

        let manifest = if indicators.has_manifest {
            load_manifest(path).await
        } else {
            None
        };
        let deno_config = if indicators.has_deno_config {
            load_deno_config(path).await
        } else {
            None
        };

        let mut classification = self.classify(&listing, manifest.as_ref());
        classification.version = match classification.project_type {
            ProjectType::Deno => deno_config.as_ref().and_then(deno_version),
            ProjectType::Unknown => None,
            other => self
                .signature_for(other)
                .and_then(FrameworkSignature::primary_dependency)
                .and_then(|dep| manifest.as_ref()?.dependency_version(dep)),
        };

        debug!(
            "Classified {} as {} ({:.2})",
            path.display(),
            classification.project_type,
            classification.confidence
        );

        let mut report = DetectionReport {
            path: path.to_path_buf(),
            name: folder_name(path),
            category: None,
            domain: None,
            subdomain: None,
            status: derive_status(&listing),
            indicators,
            stats: listing.stats(),
            classification,
            error: None,
            detected_at: Utc::now(),
        };
        self.apply_location(&mut report);
        Ok(report)
    }

    /// Pick the best signature for a listing. Pure, no I/O.
    pub fn classify(
        &self,
        listing: &DirectoryListing,
        manifest: Option<&PackageManifest>,
    ) -> ClassificationResult {
        let best = self
            .score_all(listing, manifest)
            .into_iter()
            .min_by(compare_scores);

        match best {
            Some(best) => ClassificationResult {
                project_type: best.project_type,
                confidence: (best.score / scoring::CONFIDENCE_NORMALIZER).min(1.0),
                matched_indicators: best.evidence,
                version: None,
            },
            None => ClassificationResult::unknown(),
        }
    }

    /// Every signature with positive evidence, in table order
    pub fn score_all(
        &self,
        listing: &DirectoryListing,
        manifest: Option<&PackageManifest>,
    ) -> Vec<SignatureScore> {
        self.signatures
            .iter()
            .filter_map(|sig| score_signature(sig, listing, manifest))
            .collect()
    }

    fn signature_for(&self, project_type: ProjectType) -> Option<&FrameworkSignature> {
        self.signatures
            .iter()
            .find(|s| s.project_type == project_type)
    }

    fn apply_location(&self, report: &mut DetectionReport) {
        let (category, domain, subdomain) = derive_location(self.root.as_deref(), &report.path);
        report.category = category;
        report.domain = domain;
        report.subdomain = subdomain;
    }
}

/// Higher score first, then lower rank
fn compare_scores(a: &SignatureScore, b: &SignatureScore) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.rank.cmp(&b.rank))
}

/// Score one signature. `None` when no indicator matched at all.
pub fn score_signature(
    sig: &FrameworkSignature,
    listing: &DirectoryListing,
    manifest: Option<&PackageManifest>,
) -> Option<SignatureScore> {
    if !sig.anchors.is_empty()
        && !sig.anchors.iter().any(|anchor| {
            listing.has_file(anchor) || manifest.is_some_and(|m| m.declares(anchor))
        })
    {
        return None;
    }

    let mut raw = 0.0_f32;
    let mut evidence = Vec::new();

    for file in sig.file_indicators {
        if listing.has_file(file) {
            raw += scoring::FILE_INDICATOR_POINTS;
            evidence.push((*file).to_string());
        }
    }

    for folder in sig.folder_indicators {
        if listing.has_dir(folder) {
            raw += scoring::FOLDER_INDICATOR_POINTS;
            evidence.push((*folder).to_string());
        }
    }

    if let Some(manifest) = manifest
        && sig.uses_manifest()
    {
        for dep in sig.dependencies {
            if manifest.has_dependency(dep) {
                raw += scoring::DEPENDENCY_POINTS;
                evidence.push(format!("dependency: {}", dep));
            }
        }
        for dep in sig.dev_dependencies {
            if manifest.has_dev_dependency(dep) {
                raw += scoring::DEV_DEPENDENCY_POINTS;
                evidence.push(format!("devDependency: {}", dep));
            }
        }
        for script in sig.scripts {
            if manifest.has_script(script) {
                raw += scoring::SCRIPT_POINTS;
                evidence.push(format!("script: {}", script));
            }
        }
    }

    if raw <= 0.0 {
        return None;
    }

    Some(SignatureScore {
        project_type: sig.project_type,
        rank: sig.rank,
        score: raw * sig.base_confidence + sig.priority,
        evidence,
    })
}

/// Empty → proposed; manifest, runtime config or entry HTML → development
pub fn derive_status(listing: &DirectoryListing) -> ProjectStatus {
    if listing.is_empty() {
        ProjectStatus::Proposed
    } else if listing.indicators().has_runnable_marker() {
        ProjectStatus::Development
    } else {
        ProjectStatus::Proposed
    }
}

/// Category, domain and subdomain taken positionally after the first
/// `personal`/`professional` segment (relative to `root` when possible).
pub fn derive_location(
    root: Option<&Path>,
    path: &Path,
) -> (Option<Category>, Option<String>, Option<String>) {
    let relative = root
        .and_then(|r| path.strip_prefix(r).ok())
        .unwrap_or(path);

    let mut segments = relative.components().filter_map(|c| match c {
        Component::Normal(s) => s.to_str(),
        _ => None,
    });

    let Some(category) = segments.by_ref().find_map(Category::from_folder_name) else {
        return (None, None, None);
    };
    let domain = segments.next().map(String::from);
    let subdomain = segments.next().map(String::from);
    (Some(category), domain, subdomain)
}
