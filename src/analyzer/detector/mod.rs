//! Project type detection
//!
//! Scores a directory against a weighted signature table (files, folders,
//! manifest dependencies and scripts) and reports the best match with its
//! confidence and evidence.

mod engine;
pub mod manifest;
pub mod signatures;

pub use engine::{
    ProjectDetector, SignatureScore, derive_location, derive_status, score_signature,
};
pub use manifest::PackageManifest;
pub use signatures::{FrameworkSignature, SIGNATURES};
