//! Scan Command
//!
//! Discover projects under the scan root and sync them into the store.
//!
//! Usage:
//!   projdash scan [--dry-run] [-f json]

use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, print_json};
use crate::types::Result;

pub async fn run(ctx: &CommandContext, dry_run: bool, format: &str) -> Result<()> {
    let json_output = format == "json";
    let out = Output::new();

    if dry_run {
        let result = ctx.scanner().scan_projects().await?;
        if json_output {
            return print_json(&result);
        }

        out.header(&format!("Scan of {}", ctx.root().display()));
        for location in &result.locations {
            let label = match (&location.domain, &location.subdomain) {
                (Some(domain), Some(sub)) => format!("{} / {}", domain, sub),
                (Some(domain), None) => domain.clone(),
                _ => location.path.display().to_string(),
            };
            println!("  {:<13} {}", location.category, label);
        }
        out.scan_errors(&result.errors);

        if result.success {
            out.success(&format!(
                "{} locations found in {}ms (dry run, store untouched)",
                result.projects_found, result.duration_ms
            ));
        } else {
            out.error("Scan root is missing or not a directory");
        }
        return Ok(());
    }

    let report = ctx.sync().await?.run().await?;
    if json_output {
        return print_json(&report);
    }

    out.header(&format!("Sync of {}", ctx.root().display()));
    out.field("Found", report.scan.projects_found);
    out.field("Added", report.added);
    out.field("Updated", report.updated);
    if report.failures > 0 {
        out.field("Failed", report.failures);
    }
    if !report.pruned.is_empty() {
        out.field("Pruned", report.pruned.join(", "));
    }
    out.scan_errors(&report.scan.errors);

    if report.scan.success {
        out.success(&format!("Synced in {}ms", report.duration_ms));
    } else {
        out.error("Scan root is missing or not a directory");
    }
    Ok(())
}
