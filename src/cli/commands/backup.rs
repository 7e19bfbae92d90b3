//! Backup Command

use crate::cli::ui::Output;
use crate::cli::util::CommandContext;
use crate::types::Result;

pub async fn run(ctx: &CommandContext) -> Result<()> {
    let store = ctx.open_store().await?;
    let path = store.backup().await?;
    Output::new().success(&format!("Backup written to {}", path.display()));
    Ok(())
}
