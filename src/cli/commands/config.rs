//! Config Command
//!
//! Manage projdash configuration.
//!
//! Usage:
//!   projdash config show [-f json|toml]
//!   projdash config path
//!   projdash config init [-g] [--force]

use crate::cli::util::CommandContext;
use crate::config::ConfigLoader;
use crate::types::Result;

/// Show the merged effective configuration
pub fn show(ctx: &CommandContext, format: &str) -> Result<()> {
    println!("{}", ConfigLoader::render(&ctx.config, format == "json")?);
    Ok(())
}

/// Show configuration paths
pub fn path() -> Result<()> {
    ConfigLoader::show_path();
    Ok(())
}

/// Write a default config file, globally or under `.projdash/`
pub fn init(global: bool, force: bool) -> Result<()> {
    let path = if global {
        ConfigLoader::init_global(force)?
    } else {
        ConfigLoader::init_local(force)?
    };
    let scope = if global { "global" } else { "local" };
    println!("✓ Initialized {} configuration", scope);
    println!("  Config: {}", path.display());
    Ok(())
}
