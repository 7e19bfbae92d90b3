//! Unified Error Type System
//!
//! Centralized error types for the whole crate, plus the diagnostic records
//! that scans and detections attach to their results instead of failing.
//!
//! ## Error Kinds
//!
//! - **ConcurrencyConflict**: a scan was requested while another is running
//! - **RootNotFound**: the configured scan root is missing or not a directory
//! - **EntryRead**: a single file/folder could not be read (degrades to "absent")
//! - **Detection**: classifying one path failed (degrades to `unknown`)
//! - **ManifestParse**: malformed manifest (degrades to "no manifest data")
//! - **Storage**, **Config**, **Watch**: collaborator failures
//!
//! Only `ConcurrencyConflict` and `RootNotFound` are request-level failures.
//! Everything else is folded into a less confident or empty result.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Error Kinds
// =============================================================================

/// Error taxonomy used for routing and for serialised error records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Scan requested while one is in flight
    ConcurrencyConflict,
    /// Scan root does not exist or is not a directory
    RootNotFound,
    /// Single stat/listing failed
    EntryRead,
    /// Unexpected failure while classifying one path
    Detection,
    /// Malformed or unreadable manifest
    ManifestParse,
    /// Metadata store failure
    Storage,
    /// Configuration failure
    Config,
    /// Filesystem watch failure
    Watch,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConcurrencyConflict => write!(f, "CONCURRENCY_CONFLICT"),
            Self::RootNotFound => write!(f, "ROOT_NOT_FOUND"),
            Self::EntryRead => write!(f, "ENTRY_READ"),
            Self::Detection => write!(f, "DETECTION"),
            Self::ManifestParse => write!(f, "MANIFEST_PARSE"),
            Self::Storage => write!(f, "STORAGE"),
            Self::Config => write!(f, "CONFIG"),
            Self::Watch => write!(f, "WATCH"),
        }
    }
}

impl ErrorKind {
    /// Whether this kind is surfaced to the caller as a request-level failure
    pub fn is_request_level(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict | Self::RootNotFound)
    }
}

// =============================================================================
// Diagnostic Records
// =============================================================================

/// One traversal failure captured into a scan result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanErrorRecord {
    pub path: PathBuf,
    pub error: String,
    pub kind: ErrorKind,
    pub timestamp: DateTime<Utc>,
}

impl ScanErrorRecord {
    pub fn new(path: impl Into<PathBuf>, kind: ErrorKind, error: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            error: error.into(),
            kind,
            timestamp: Utc::now(),
        }
    }
}

/// Error descriptor attached to a detection report that fell back to `unknown`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectionError {
    pub kind: ErrorKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl DetectionError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

impl From<&DashError> for DetectionError {
    fn from(err: &DashError) -> Self {
        let kind = match err.kind() {
            // Anything that reaches a detection report is a detection failure,
            // except the few kinds that already carry a more precise meaning.
            ErrorKind::ManifestParse => ErrorKind::ManifestParse,
            _ => ErrorKind::Detection,
        };
        Self::new(kind, err.to_string())
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum DashError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),

    // -------------------------------------------------------------------------
    // Scan Errors
    // -------------------------------------------------------------------------
    #[error("A scan is already in progress")]
    ScanInProgress,

    #[error("Scan root not found or not a directory: {}", path.display())]
    RootNotFound { path: PathBuf },

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("Detection failed for {}: {message}", path.display())]
    Detection { path: PathBuf, message: String },

    #[error("Manifest error in {}: {message}", path.display())]
    Manifest { path: PathBuf, message: String },

    #[error("Project not found: {id}")]
    ProjectNotFound { id: String },

    #[error("Storage error: {0}")]
    Store(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Watch error: {0}")]
    Watch(String),
}

impl From<notify::Error> for DashError {
    fn from(err: notify::Error) -> Self {
        DashError::Watch(err.to_string())
    }
}

impl From<figment::Error> for DashError {
    fn from(err: figment::Error) -> Self {
        DashError::Config(format!("Configuration error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, DashError>;

impl DashError {
    /// Create a detection error for a path
    pub fn detection(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Detection {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Map this error onto the taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ScanInProgress => ErrorKind::ConcurrencyConflict,
            Self::RootNotFound { .. } => ErrorKind::RootNotFound,
            Self::Io(_) => ErrorKind::EntryRead,
            Self::Detection { .. } => ErrorKind::Detection,
            Self::Manifest { .. } => ErrorKind::ManifestParse,
            Self::Json(_) | Self::Store(_) | Self::ProjectNotFound { .. } => ErrorKind::Storage,
            Self::Config(_) | Self::Toml(_) => ErrorKind::Config,
            Self::Watch(_) => ErrorKind::Watch,
        }
    }
}

/// Context extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn with_context<C: Into<String>>(self, context: C) -> Result<T>;

    /// Add context using a closure (lazy evaluation)
    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<C: Into<String>>(self, context: C) -> Result<T> {
        self.map_err(|e| DashError::Store(format!("{}: {}", context.into(), e)))
    }

    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| DashError::Store(format!("{}: {}", f().into(), e)))
    }
}

// =============================================================================
// Tests
// =============================================================================
