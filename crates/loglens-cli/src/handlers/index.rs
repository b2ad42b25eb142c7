use std::sync::Arc;

use anyhow::Result;
use loglens_engine::{IndexProgress, IndexQueue, WatchService};
use loglens_types::ParseLevel;

use crate::context::CliContext;
use crate::output::print_json;
use crate::types::{LevelArg, OutputFormat};

pub fn update(
    ctx: &CliContext,
    level: LevelArg,
    force: bool,
    source: Option<&str>,
) -> Result<()> {
    let roots = ctx.roots(source);
    if roots.is_empty() {
        println!("No enabled sources configured. Run `loglens init` first.");
        return Ok(());
    }

    let verbose = ctx.format == OutputFormat::Plain;
    let summary = ctx
        .engine
        .index_all(&roots, level.into(), force, |progress| {
            if !verbose {
                return;
            }
            match progress {
                IndexProgress::RootMissing { source, root } => {
                    println!("  {} root missing: {}", source, root.display());
                }
                IndexProgress::Scanning { source, root } => {
                    println!("Scanning {} ({})", source, root.display());
                }
                IndexProgress::SessionFailed { path, error } => {
                    println!("  failed {}: {}", path.display(), error);
                }
                IndexProgress::SessionIndexed { .. } => {}
            }
        })?;

    if ctx.format == OutputFormat::Json {
        return print_json(&serde_json::json!({
            "indexed": summary.indexed,
            "skipped": summary.skipped,
            "failed": summary.failed,
        }));
    }

    println!(
        "Indexed {} session(s), {} up to date, {} failed",
        summary.indexed, summary.skipped, summary.failed
    );
    Ok(())
}

pub fn watch(ctx: &CliContext) -> Result<()> {
    let roots = ctx.roots(None);
    if roots.is_empty() {
        println!("No enabled sources configured. Run `loglens init` first.");
        return Ok(());
    }

    // Catch up first so the watcher only has to handle the delta
    ctx.engine
        .index_all(&roots, ParseLevel::Full, false, |_| {})?;

    let queue = IndexQueue::start(Arc::clone(&ctx.engine), 4);
    let _watcher = WatchService::start(&roots, queue.handle(), ParseLevel::Full)?;

    println!("Watching {} source root(s); Ctrl-C to stop", roots.len());
    loop {
        std::thread::park();
    }
}

pub fn vacuum(ctx: &CliContext) -> Result<()> {
    let removed = ctx.engine.prune_missing()?;
    ctx.engine.vacuum()?;

    if ctx.format == OutputFormat::Json {
        return print_json(&serde_json::json!({ "removed": removed }));
    }

    println!("Removed {} stale session(s); store compacted", removed);
    Ok(())
}
