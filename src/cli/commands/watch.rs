//! Watch Command
//!
//! Stream filesystem changes under the scan root until Ctrl-C. With `--sync`,
//! changes trigger a debounced resync of the store.

use std::sync::Arc;
use std::time::Duration;

use console::style;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use crate::cli::ui::Output;
use crate::cli::util::CommandContext;
use crate::sync::ProjectSync;
use crate::types::{DashError, Result};

const RESYNC_DEBOUNCE: Duration = Duration::from_secs(2);

pub async fn run(ctx: &CommandContext, sync: bool) -> Result<()> {
    let out = Output::new();

    let syncer: Option<ProjectSync> = if sync { Some(ctx.sync().await?) } else { None };
    let scanner = match &syncer {
        Some(s) => s.scanner().clone(),
        None => Arc::new(ctx.scanner()),
    };

    if let Some(syncer) = &syncer {
        report_sync(&out, syncer).await;
    }

    let mut events = scanner.watcher().subscribe();
    scanner.start_watching()?;
    out.info(&format!(
        "Watching {} (Ctrl-C to stop)",
        scanner.root().display()
    ));

    let mut pending = false;
    let mut ticker = tokio::time::interval(RESYNC_DEBOUNCE);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            received = events.recv() => match received {
                Ok(event) => {
                    println!(
                        "  {} {:<7} {}",
                        style(event.timestamp.format("%H:%M:%S")).dim(),
                        event.kind,
                        event.path.display()
                    );
                    pending = true;
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Dropped {} watch events", skipped);
                    pending = true;
                }
                Err(RecvError::Closed) => {
                    scanner.stop_watching().await;
                    return Err(DashError::Watch("event channel closed".to_string()));
                }
            },
            _ = ticker.tick() => {
                if pending && let Some(syncer) = &syncer {
                    pending = false;
                    report_sync(&out, syncer).await;
                }
            }
        }
    }

    scanner.stop_watching().await;
    out.success("Stopped watching");
    Ok(())
}

async fn report_sync(out: &Output, syncer: &ProjectSync) {
    match syncer.run().await {
        Ok(report) => out.success(&format!(
            "Synced: {} added, {} updated, {} pruned",
            report.added,
            report.updated,
            report.pruned.len()
        )),
        Err(DashError::ScanInProgress) => {}
        Err(e) => out.error(&format!("Sync failed: {}", e)),
    }
}
