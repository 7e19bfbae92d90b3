//! Stats Command
//!
//! Record counts by type, status and category.

use std::collections::BTreeMap;

use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, print_json};
use crate::types::Result;

pub async fn run(ctx: &CommandContext, format: &str) -> Result<()> {
    let store = ctx.open_store().await?;
    let stats = store.stats().await;

    if format == "json" {
        return print_json(&stats);
    }

    let out = Output::new();
    out.header("projdash Stats");
    out.field("Store", store.path().display());
    out.field("Projects", stats.total);

    print_group(&out, "By type", &stats.by_type);
    print_group(&out, "By status", &stats.by_status);
    print_group(&out, "By category", &stats.by_category);
    Ok(())
}

fn print_group(out: &Output, title: &str, counts: &BTreeMap<String, usize>) {
    if counts.is_empty() {
        return;
    }
    out.section(title);
    for (key, count) in counts {
        out.field(key, count);
    }
}
