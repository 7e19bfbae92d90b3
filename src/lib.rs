//! projdash - Local Developer Project Dashboard
//!
//! Discovers project folders under a root organised as
//! `{personal,professional}/<domain>/<subdomain>`, classifies each one by
//! framework and keeps a JSON catalogue of the results.
//!
//! ## Core Features
//!
//! - **Discovery**: two-level, heuristic walk of the scan root
//! - **Classification**: weighted framework signatures with confidence scores
//! - **Catalogue**: atomic JSON store with backups, user fields kept on rescan
//! - **Watch**: filesystem change events with optional auto-resync
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use projdash::{JsonProjectStore, ProjectScanner, ProjectSync};
//!
//! let store = Arc::new(JsonProjectStore::open("projects.json").await?);
//! let scanner = Arc::new(ProjectScanner::new("/home/me/projects"));
//! let report = ProjectSync::new(scanner, store).run().await?;
//! println!("{} added, {} updated", report.added, report.updated);
//! ```
//!
//! ## Modules
//!
//! - [`analyzer`]: name heuristics, directory probing, scanning, detection
//! - [`storage`]: JSON-backed project metadata store
//! - [`sync`]: scan → detect → store orchestration
//! - [`config`]: layered configuration

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod constants;
pub mod storage;
pub mod sync;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader};

// Error Types
pub use types::error::{DashError, ErrorKind, Result, ResultExt};

// Storage
pub use storage::{JsonProjectStore, ProjectRepository, StoreStats, UpsertOutcome};

// Pipeline
pub use sync::{ProjectSync, SyncReport};

// =============================================================================
// Analyzer Re-exports
// =============================================================================

pub use analyzer::{
    NameClassifier, ProjectDetector, ProjectScanner, ProjectWatcher, WatchEvent, WatchEventKind,
    is_domain_like, is_subdomain_like, looks_like_project_folder,
};
