pub mod error;
pub mod project;
pub mod utils;

pub use error::{DashError, DetectionError, ErrorKind, Result, ResultExt, ScanErrorRecord};
pub use project::*;
pub use utils::{json_string, log_filter_error, log_filter_warn, strip_json_comments};

// =============================================================================
// Domain Newtypes
// =============================================================================

use std::fmt;

/// Type-safe wrapper for scan ids
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScanId(String);

impl ScanId {
    /// Fresh random id for a new scan pass
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod newtype_tests {
    use super::*;

    #[test]
    fn test_scan_id_unique() {
        let a = ScanId::generate();
        let b = ScanId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }
}
