//! Project Discovery & Classification
//!
//! - `classifier`: folder-name heuristics (domain / subdomain / project folder)
//! - `prober`: single-pass inspection of a directory's immediate children
//! - `scanner`: two-level walk of the scan root, plus filesystem watch
//! - `detector`: weighted framework signatures and project type scoring

pub mod classifier;
pub mod detector;
pub mod prober;
pub mod scanner;

pub use classifier::{NameClassifier, is_domain_like, is_subdomain_like, looks_like_project_folder};
pub use detector::{FrameworkSignature, PackageManifest, ProjectDetector};
pub use scanner::{ListenerId, ProjectScanner, ProjectWatcher, WatchEvent, WatchEventKind};
