//! Show Command

use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, print_json, require_project};
use crate::types::Result;

pub async fn run(ctx: &CommandContext, id: &str, format: &str) -> Result<()> {
    let store = ctx.open_store().await?;
    let record = require_project(&store, id).await?;

    if format == "json" {
        return print_json(&record);
    }

    let out = Output::new();
    out.header(&record.name);
    out.field("Id", &record.id);
    out.field("Path", record.path.display());
    out.field("Type", record.project_type);
    out.field("Confidence", format!("{:.0}%", record.confidence * 100.0));
    if let Some(version) = &record.version {
        out.field("Version", version);
    }
    out.field("Status", record.status);
    if let Some(category) = record.category {
        out.field("Category", category);
    }
    if let Some(domain) = &record.domain {
        out.field("Domain", domain);
    }
    if let Some(subdomain) = &record.subdomain {
        out.field("Subdomain", subdomain);
    }
    if let Some(description) = &record.description {
        out.field("Description", description);
    }
    if !record.tags.is_empty() {
        out.field("Tags", record.tags.join(", "));
    }
    if !record.matched_indicators.is_empty() {
        out.field("Evidence", record.matched_indicators.join(", "));
    }
    if let Some(modified) = record.last_modified {
        out.field("Modified", modified.format("%Y-%m-%d %H:%M"));
    }
    out.field("Updated", record.updated_at.format("%Y-%m-%d %H:%M"));

    if let Some(err) = &record.detection_error {
        out.warning(&format!("Last detection failed: {}", err.message));
    }
    Ok(())
}
