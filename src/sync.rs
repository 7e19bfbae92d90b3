//! Scan → detect → store pipeline
//!
//! Discovers locations with the scanner, classifies them with bounded
//! parallelism and upserts one record per location.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio::fs;
use tracing::{debug, info};

use crate::analyzer::{ProjectDetector, ProjectScanner};
use crate::constants::sync::DEFAULT_CONCURRENCY;
use crate::storage::{ProjectRepository, UpsertOutcome};
use crate::types::{DetectionReport, ProjectRecord, Result, ScanResult, log_filter_warn};

/// Summary of one sync pass
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub scan: ScanResult,
    pub added: usize,
    pub updated: usize,
    /// Locations stored as `unknown` because detection failed
    pub failures: usize,
    /// Ids removed because their folder disappeared
    pub pruned: Vec<String>,
    pub duration_ms: u64,
}

impl SyncReport {
    pub fn stored(&self) -> usize {
        self.added + self.updated
    }
}

pub struct ProjectSync {
    scanner: Arc<ProjectScanner>,
    detector: ProjectDetector,
    store: Arc<dyn ProjectRepository>,
    concurrency: usize,
    prune_missing: bool,
}

impl ProjectSync {
    pub fn new(scanner: Arc<ProjectScanner>, store: Arc<dyn ProjectRepository>) -> Self {
        let detector = ProjectDetector::new(scanner.root());
        Self {
            scanner,
            detector,
            store,
            concurrency: DEFAULT_CONCURRENCY,
            prune_missing: false,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_prune_missing(mut self, prune: bool) -> Self {
        self.prune_missing = prune;
        self
    }

    pub fn scanner(&self) -> &Arc<ProjectScanner> {
        &self.scanner
    }

    /// Run one full pass. Fails with `ScanInProgress` if the scanner is busy,
    /// or with a storage error if a record cannot be written.
    pub async fn run(&self) -> Result<SyncReport> {
        let start = Instant::now();
        let scan = self.scanner.scan_projects().await?;

        let mut reports: Vec<DetectionReport> = stream::iter(
            scan.locations
                .iter()
                .map(|location| self.detector.detect_project(&location.path)),
        )
        .buffer_unordered(self.concurrency)
        .collect()
        .await;
        // Completion order varies; id assignment must not
        reports.sort_by(|a, b| a.path.cmp(&b.path));

        let mut report = SyncReport {
            scan,
            added: 0,
            updated: 0,
            failures: 0,
            pruned: Vec::new(),
            duration_ms: 0,
        };

        for detection in reports {
            if detection.is_failed() {
                report.failures += 1;
            }
            let record = self.assign_id(ProjectRecord::from_report(&detection)).await;
            match self.store.upsert(record).await? {
                UpsertOutcome::Added => report.added += 1,
                UpsertOutcome::Updated => report.updated += 1,
            }
        }

        if self.prune_missing && report.scan.success {
            report.pruned = self.prune().await?;
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Sync complete: {} added, {} updated, {} failed, {} pruned in {}ms",
            report.added,
            report.updated,
            report.failures,
            report.pruned.len(),
            report.duration_ms
        );
        Ok(report)
    }

    /// Classify one path, optionally persisting the result
    pub async fn detect_path(
        &self,
        path: &Path,
        persist: bool,
    ) -> Result<(DetectionReport, Option<UpsertOutcome>)> {
        let detection = self.detector.detect_project(path).await;
        if !persist {
            return Ok((detection, None));
        }
        let record = self.assign_id(ProjectRecord::from_report(&detection)).await;
        let outcome = self.store.upsert(record).await?;
        Ok((detection, Some(outcome)))
    }

    /// Give `record` the id of the stored record at the same path, or a free
    /// id when its derived one already belongs to another folder (the same
    /// domain under both categories, say).
    async fn assign_id(&self, mut record: ProjectRecord) -> ProjectRecord {
        if let Some(existing) = self.store.get_by_path(&record.path).await {
            record.id = existing.id;
            return record;
        }
        if self.store.get(&record.id).await.is_none() {
            return record;
        }

        let base = match record.category {
            Some(category) => format!("{}-{}", category, record.id),
            None => record.id.clone(),
        };
        let mut candidate = base.clone();
        let mut n = 2;
        while self.store.get(&candidate).await.is_some() {
            candidate = format!("{}-{}", base, n);
            n += 1;
        }
        debug!(
            "Id {} is taken, storing {} as {}",
            record.id,
            record.path.display(),
            candidate
        );
        record.id = candidate;
        record
    }

    /// Remove records under the scan root whose folder no longer exists
    async fn prune(&self) -> Result<Vec<String>> {
        let mut pruned = Vec::new();
        for record in self.store.list_all().await {
            if !record.path.starts_with(self.scanner.root()) {
                continue;
            }
            let exists = log_filter_warn(
                fs::try_exists(&record.path).await,
                &format!("Cannot check {}", record.path.display()),
            );
            if exists != Some(false) {
                continue;
            }
            debug!("Pruning {} ({})", record.id, record.path.display());
            if self.store.remove(&record.id).await? {
                pruned.push(record.id);
            }
        }
        Ok(pruned)
    }
}
