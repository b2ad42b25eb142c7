use std::path::PathBuf;

use loglens_types::{ParseLevel, SourceKind};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::Result;
use crate::queue::{IndexJob, QueueHandle};

/// Watches configured source roots and enqueues a re-index whenever a
/// session file is created or appended to.
///
/// The engine's change detection makes spurious notifications cheap: a job
/// for an unchanged file is a stat plus one store read.
pub struct WatchService {
    _watcher: RecommendedWatcher,
}

impl WatchService {
    pub fn start(
        roots: &[(SourceKind, PathBuf)],
        queue: QueueHandle,
        target: ParseLevel,
    ) -> Result<Self> {
        let mut watcher =
            notify::recommended_watcher(move |event: notify::Result<Event>| {
                let event = match event {
                    Ok(event) => event,
                    Err(err) => {
                        tracing::warn!(error = %err, "watch event error");
                        return;
                    }
                };

                if !matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_)
                ) {
                    return;
                }

                for path in event.paths {
                    if path.extension().and_then(|ext| ext.to_str()) != Some("jsonl") {
                        continue;
                    }
                    queue.submit(IndexJob {
                        path,
                        target,
                        force: false,
                    });
                }
            })?;

        for (source, root) in roots {
            if !root.exists() {
                tracing::debug!(source = %source, root = %root.display(), "watch root missing");
                continue;
            }
            watcher.watch(root, RecursiveMode::Recursive)?;
            tracing::info!(source = %source, root = %root.display(), "watching for session changes");
        }

        Ok(WatchService { _watcher: watcher })
    }
}
