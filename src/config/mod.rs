//! Configuration Management
//!
//! Unified configuration system with hierarchical resolution:
//! 1. Built-in defaults
//! 2. Global config (`<config dir>/projdash/config.toml`)
//! 3. Local config (`.projdash/config.toml`)
//! 4. Environment variables (`PROJDASH_*`)
//! 5. CLI arguments (highest priority)

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::*;
