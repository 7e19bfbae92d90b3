//! Detect Command
//!
//! Classify a single directory, optionally saving it to the store.

use std::path::Path;

use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, print_json};
use crate::storage::UpsertOutcome;
use crate::types::Result;

pub async fn run(ctx: &CommandContext, path: &Path, save: bool, format: &str) -> Result<()> {
    let path = std::path::absolute(path)?;
    let (report, outcome) = ctx.sync().await?.detect_path(&path, save).await?;

    if format == "json" {
        return print_json(&report);
    }

    let out = Output::new();
    out.header(&report.name);
    out.field("Path", report.path.display());
    out.field("Type", report.classification.project_type);
    out.field(
        "Confidence",
        format!("{:.0}%", report.classification.confidence * 100.0),
    );
    if let Some(version) = &report.classification.version {
        out.field("Version", version);
    }
    out.field("Status", report.status);
    if let Some(category) = report.category {
        out.field("Category", category);
    }
    if let Some(domain) = &report.domain {
        out.field("Domain", domain);
    }
    if let Some(subdomain) = &report.subdomain {
        out.field("Subdomain", subdomain);
    }
    if !report.classification.matched_indicators.is_empty() {
        out.field("Evidence", report.classification.matched_indicators.join(", "));
    }
    out.field(
        "Files",
        format!("{} ({} bytes)", report.stats.file_count, report.stats.size_bytes),
    );

    if let Some(err) = &report.error {
        out.warning(&format!("{}: {}", err.kind, err.message));
    }
    match outcome {
        Some(UpsertOutcome::Added) => out.success("Added to store"),
        Some(UpsertOutcome::Updated) => out.success("Updated in store"),
        None => {}
    }
    Ok(())
}
