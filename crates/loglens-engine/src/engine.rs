use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use loglens_index::{Database, SessionFilter};
use loglens_ingest::{
    Classification, Classifier, DiscoveredFile, read_events, read_header, scan_root,
};
use loglens_types::{
    Message, ParseLevel, Session, SourceKind, VisibilityKind, normalize_path,
    session_id_from_path,
};

use crate::fsmeta::{FileMeta, FileStat, SystemFileMeta};
use crate::{Error, Result};

/// Events kept for a session's timeline preview.
pub(crate) const PREVIEW_EVENT_LIMIT: usize = 30;

/// Progress reporting for bulk indexing runs.
#[derive(Debug, Clone)]
pub enum IndexProgress {
    RootMissing {
        source: SourceKind,
        root: PathBuf,
    },
    Scanning {
        source: SourceKind,
        root: PathBuf,
    },
    SessionIndexed {
        session_id: String,
        level: ParseLevel,
    },
    SessionFailed {
        path: PathBuf,
        error: String,
    },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IndexSummary {
    pub indexed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// The ingestion engine: walks session roots, drives each session through
/// the parse-level state machine, and serves timelines and search.
///
/// Per-session indexing is single-writer: overlapping requests for the same
/// file serialize on a keyed lock, so the store never observes a
/// half-written session. Different sessions index independently.
pub struct Engine {
    pub(crate) db: Mutex<Database>,
    pub(crate) classifier: Classifier,
    file_meta: Box<dyn FileMeta>,
    session_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Engine {
    pub fn new(db: Database, classifier: Classifier) -> Self {
        Self::with_file_meta(db, classifier, Box::new(SystemFileMeta))
    }

    /// Construct with an injected filesystem-metadata source; tests use this
    /// to simulate file changes without real I/O.
    pub fn with_file_meta(
        db: Database,
        classifier: Classifier,
        file_meta: Box<dyn FileMeta>,
    ) -> Self {
        Engine {
            db: Mutex::new(db),
            classifier,
            file_meta,
            session_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Single-row classification over a raw JSONL line, used for building
    /// live session content.
    pub fn classify_line(&self, line: &str) -> Result<Classification> {
        let row = loglens_ingest::decode_line(line)
            .map_err(|err| Error::Ingest(loglens_ingest::Error::Decode(err)))?;
        Ok(self.classifier.classify(&row, None))
    }

    /// Advance (or refresh) one session's index state.
    ///
    /// While the file is unchanged the parse level only moves forward; a
    /// size or mtime change resets the session to unparsed before
    /// re-indexing. `force` always re-parses.
    pub fn index_session(
        &self,
        path: &Path,
        target: ParseLevel,
        force: bool,
    ) -> Result<Session> {
        let path_key = normalize_path(path).to_string_lossy().to_string();
        let lock = self.session_lock(&path_key);
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let stat = self
            .file_meta
            .stat(path)
            .map_err(|err| Error::SourceUnavailable(path.to_path_buf(), err))?;

        let existing = self.db().get_session_by_path(&path_key)?;
        let unchanged = existing
            .as_ref()
            .is_some_and(|session| session_matches_stat(session, &stat));

        if !force
            && unchanged
            && let Some(existing) = &existing
            && existing.parse_level >= target
        {
            return Ok(existing.clone());
        }

        let header = read_header(path)?;
        let source = loglens_ingest::detect_source(path);
        let session_id = header
            .id
            .clone()
            .unwrap_or_else(|| session_id_from_path(path));

        let mut session = Session {
            id: session_id.clone(),
            source,
            file_path: path_key.clone(),
            parse_level: target,
            user_message_count: 0,
            assistant_message_count: 0,
            model: header.model,
            cwd: header.cwd,
            created_at: header.timestamp.or_else(|| {
                existing
                    .as_ref()
                    .filter(|_| unchanged)
                    .and_then(|session| session.created_at)
            }),
            last_modified_at: Some(stat.mtime),
            file_size: Some(stat.size),
            file_mtime: Some(stat.mtime),
        };

        match target {
            ParseLevel::Unparsed | ParseLevel::Metadata => {
                session.parse_level = ParseLevel::Metadata;
                self.db().replace_session(&session, &[], None)?;
            }
            ParseLevel::Preview => {
                let outcome = read_events(
                    path,
                    &self.classifier,
                    &session_id,
                    Some(PREVIEW_EVENT_LIMIT),
                )?;
                session.user_message_count = outcome.user_messages;
                session.assistant_message_count = outcome.assistant_messages;
                self.db()
                    .replace_session(&session, &[], Some(&outcome.events))?;
            }
            ParseLevel::Full => {
                let outcome = read_events(path, &self.classifier, &session_id, None)?;
                session.user_message_count = outcome.user_messages;
                session.assistant_message_count = outcome.assistant_messages;

                let messages: Vec<Message> = outcome
                    .events
                    .iter()
                    .filter(|event| {
                        matches!(
                            event.kind,
                            VisibilityKind::User | VisibilityKind::Assistant
                        )
                    })
                    .map(|event| Message {
                        session_id: session_id.clone(),
                        role: event.actor,
                        text: event.text.clone(),
                        position: event.position,
                    })
                    .collect();

                let preview_len = outcome.events.len().min(PREVIEW_EVENT_LIMIT);
                let preview = &outcome.events[..preview_len];

                self.db().replace_session(&session, &messages, Some(preview))?;
            }
        }

        tracing::debug!(
            session_id = %session.id,
            level = session.parse_level.as_str(),
            path = %path.display(),
            "indexed session"
        );
        Ok(session)
    }

    /// Discover session files under the given roots.
    pub fn scan(&self, roots: &[(SourceKind, PathBuf)]) -> Result<Vec<DiscoveredFile>> {
        let mut files = Vec::new();
        for (source, root) in roots {
            files.extend(scan_root(root, source)?);
        }
        Ok(files)
    }

    /// Index every session under the given roots to `target`. One session's
    /// failure is reported and skipped; it never aborts the run.
    pub fn index_all<F>(
        &self,
        roots: &[(SourceKind, PathBuf)],
        target: ParseLevel,
        force: bool,
        mut on_progress: F,
    ) -> Result<IndexSummary>
    where
        F: FnMut(IndexProgress),
    {
        let mut summary = IndexSummary::default();

        for (source, root) in roots {
            if !root.exists() {
                on_progress(IndexProgress::RootMissing {
                    source: source.clone(),
                    root: root.clone(),
                });
                continue;
            }

            on_progress(IndexProgress::Scanning {
                source: source.clone(),
                root: root.clone(),
            });

            for discovered in scan_root(root, source)? {
                if !force && self.is_up_to_date(&discovered.path, target) {
                    summary.skipped += 1;
                    continue;
                }

                match self.index_session(&discovered.path, target, force) {
                    Ok(session) => {
                        summary.indexed += 1;
                        on_progress(IndexProgress::SessionIndexed {
                            session_id: session.id,
                            level: session.parse_level,
                        });
                    }
                    Err(err) => {
                        summary.failed += 1;
                        tracing::warn!(
                            path = %discovered.path.display(),
                            error = %err,
                            "session indexing failed"
                        );
                        on_progress(IndexProgress::SessionFailed {
                            path: discovered.path,
                            error: err.to_string(),
                        });
                    }
                }
            }
        }

        Ok(summary)
    }

    /// Drop sessions whose source files no longer exist. Returns how many
    /// were removed.
    pub fn prune_missing(&self) -> Result<usize> {
        let files = self.db().all_session_files()?;
        let mut removed = 0;

        for (session_id, file_path) in files {
            if !Path::new(&file_path).exists() {
                self.db().delete_session(&session_id)?;
                removed += 1;
            }
        }

        Ok(removed)
    }

    pub fn list_sessions(&self, filter: &SessionFilter) -> Result<Vec<Session>> {
        Ok(self.db().list_sessions(filter)?)
    }

    pub fn get_session(&self, session_id: &str) -> Result<Option<Session>> {
        Ok(self.db().get_session(session_id)?)
    }

    /// Resolve a full session id from an exact id or unique prefix.
    pub fn resolve_session_id(&self, id_or_prefix: &str) -> Result<String> {
        let db = self.db();
        if db.get_session(id_or_prefix)?.is_some() {
            return Ok(id_or_prefix.to_string());
        }
        db.find_session_by_prefix(id_or_prefix)?
            .ok_or_else(|| Error::SessionNotFound(id_or_prefix.to_string()))
    }

    pub fn vacuum(&self) -> Result<()> {
        Ok(self.db().vacuum()?)
    }

    fn is_up_to_date(&self, path: &Path, target: ParseLevel) -> bool {
        let path_key = normalize_path(path).to_string_lossy().to_string();
        let Ok(stat) = self.file_meta.stat(path) else {
            return false;
        };
        match self.db().get_session_by_path(&path_key) {
            Ok(Some(session)) => {
                session_matches_stat(&session, &stat) && session.parse_level >= target
            }
            _ => false,
        }
    }

    pub(crate) fn db(&self) -> MutexGuard<'_, Database> {
        self.db
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn session_lock(&self, path_key: &str) -> Arc<Mutex<()>> {
        let mut locks = self
            .session_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks
            .entry(path_key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

fn session_matches_stat(session: &Session, stat: &FileStat) -> bool {
    session.file_size == Some(stat.size) && session.file_mtime == Some(stat.mtime)
}
