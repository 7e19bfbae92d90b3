//! Remove Command

use crate::cli::ui::Output;
use crate::cli::util::CommandContext;
use crate::types::{DashError, Result};

pub async fn run(ctx: &CommandContext, id: &str) -> Result<()> {
    let store = ctx.open_store().await?;
    if !store.remove(id).await? {
        return Err(DashError::ProjectNotFound { id: id.to_string() });
    }
    Output::new().success(&format!("Removed {}", id));
    Ok(())
}
