use chrono::{DateTime, Utc};
use loglens_types::{Actor, SourceKind};

/// Filter for session listing queries. Sessions always come back newest
/// first (by last modification, then creation).
#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    /// Restrict to one source tool
    pub source: Option<SourceKind>,
    /// Maximum number of rows
    pub limit: Option<usize>,
}

/// One full-text hit from the messages index, joined with enough session
/// context to rank it.
#[derive(Debug, Clone)]
pub struct MessageHit {
    pub session_id: String,
    pub role: Actor,
    pub text: String,
    /// Line index of the originating record in the source file
    pub position: usize,
    /// Raw bm25 score from FTS5 (smaller is better)
    pub score: f64,
    pub session_last_modified: Option<DateTime<Utc>>,
    pub source: SourceKind,
    pub file_path: String,
}
