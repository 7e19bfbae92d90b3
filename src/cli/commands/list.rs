//! List Command
//!
//! Show stored projects, optionally filtered by category and type.

use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, print_json};
use crate::types::{Category, ProjectType, Result};

pub async fn run(
    ctx: &CommandContext,
    category: Option<Category>,
    project_type: Option<ProjectType>,
    format: &str,
) -> Result<()> {
    let store = ctx.open_store().await?;
    let records: Vec<_> = store
        .list_all()
        .await
        .into_iter()
        .filter(|r| category.is_none_or(|c| r.category == Some(c)))
        .filter(|r| project_type.is_none_or(|t| r.project_type == t))
        .collect();

    if format == "json" {
        return print_json(&records);
    }

    let out = Output::new();
    if records.is_empty() {
        out.info("No projects stored. Run 'projdash scan' first.");
        return Ok(());
    }

    out.header(&format!("Projects ({})", records.len()));
    for record in &records {
        out.project_row(record);
    }
    Ok(())
}
