use std::path::Path;

use chrono::Utc;
use loglens_types::{Message, Session, TimelineEvent};
use rusqlite::Connection;

use crate::records::{MessageHit, SessionFilter};
use crate::schema::init_schema;
use crate::{Result, queries};

/// Handle to the index store. One connection, single writer; readers get
/// snapshot isolation from WAL mode so listing and search never block on an
/// in-progress write to another session.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA foreign_keys = ON;
            PRAGMA busy_timeout = 5000;
            "#,
        )?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Replace everything stored for a session in one transaction: the
    /// session row, its messages (and through the triggers, its full-text
    /// rows), and its timeline preview. Either the full set for the new
    /// parse level lands, or none of it does.
    pub fn replace_session(
        &mut self,
        session: &Session,
        messages: &[Message],
        preview: Option<&[TimelineEvent]>,
    ) -> Result<()> {
        let preview_json = match preview {
            Some(events) => Some(serde_json::to_string(events)?),
            None => None,
        };

        let tx = self.conn.transaction()?;

        // A session's id can change once its file gains a metadata record
        // (path-hash fallback id -> declared id); the file path stays the
        // unit of identity on disk, so the stale row goes first.
        if let Some(old) = queries::session::get_by_path(&tx, &session.file_path)?
            && old.id != session.id
        {
            queries::session::delete(&tx, &old.id)?;
        }

        queries::session::upsert(&tx, session)?;
        queries::message::delete_for_session(&tx, &session.id)?;
        for message in messages {
            queries::message::insert(&tx, message)?;
        }
        match preview_json {
            Some(json) => queries::preview::upsert(
                &tx,
                &session.id,
                &json,
                Some(&Utc::now().to_rfc3339()),
            )?,
            None => queries::preview::delete(&tx, &session.id)?,
        }

        tx.commit()?;
        Ok(())
    }

    pub fn get_session(&self, session_id: &str) -> Result<Option<Session>> {
        queries::session::get_by_id(&self.conn, session_id)
    }

    pub fn get_session_by_path(&self, file_path: &str) -> Result<Option<Session>> {
        queries::session::get_by_path(&self.conn, file_path)
    }

    pub fn list_sessions(&self, filter: &SessionFilter) -> Result<Vec<Session>> {
        queries::session::list(&self.conn, filter)
    }

    pub fn find_session_by_prefix(&self, prefix: &str) -> Result<Option<String>> {
        queries::session::find_by_prefix(&self.conn, prefix)
    }

    pub fn delete_session(&self, session_id: &str) -> Result<()> {
        queries::session::delete(&self.conn, session_id)
    }

    pub fn all_session_files(&self) -> Result<Vec<(String, String)>> {
        queries::session::all_files(&self.conn)
    }

    pub fn messages_for_session(&self, session_id: &str) -> Result<Vec<Message>> {
        queries::message::for_session(&self.conn, session_id)
    }

    pub fn message_count(&self, session_id: &str) -> Result<usize> {
        queries::message::count_for_session(&self.conn, session_id)
    }

    pub fn search_messages(&self, match_expr: &str, limit: usize) -> Result<Vec<MessageHit>> {
        queries::message::search(&self.conn, match_expr, limit)
    }

    pub fn get_preview(&self, session_id: &str) -> Result<Option<Vec<TimelineEvent>>> {
        match queries::preview::get(&self.conn, session_id)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub fn vacuum(&self) -> Result<()> {
        self.conn.execute_batch("VACUUM")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loglens_types::{Actor, ParseLevel, SourceKind, VisibilityKind};

    fn new_event(kind: VisibilityKind, text: &str, position: usize) -> TimelineEvent {
        TimelineEvent {
            id: uuid::Uuid::new_v4(),
            session_id: "sess-1".to_string(),
            timestamp: None,
            actor: kind.actor(),
            kind,
            title: None,
            text: text.to_string(),
            attachments: Vec::new(),
            call_id: None,
            metadata: None,
            repeat_count: 1,
            position,
        }
    }

    fn session(id: &str, path: &str, level: ParseLevel) -> Session {
        Session {
            id: id.to_string(),
            source: SourceKind::Codex,
            file_path: path.to_string(),
            parse_level: level,
            user_message_count: 0,
            assistant_message_count: 0,
            model: None,
            cwd: None,
            created_at: None,
            last_modified_at: None,
            file_size: Some(0),
            file_mtime: None,
        }
    }

    fn message(session_id: &str, position: usize, text: &str) -> Message {
        Message {
            session_id: session_id.to_string(),
            role: Actor::User,
            text: text.to_string(),
            position,
        }
    }

    #[test]
    fn schema_initializes_empty() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.list_sessions(&SessionFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn replace_session_round_trips() {
        let mut db = Database::open_in_memory().unwrap();
        let sess = session("sess-1", "/logs/a.jsonl", ParseLevel::Full);
        let messages = vec![
            message("sess-1", 0, "Add web api handler"),
            message("sess-1", 4, "Fix api bug"),
        ];

        db.replace_session(&sess, &messages, None).unwrap();

        let stored = db.get_session("sess-1").unwrap().unwrap();
        assert_eq!(stored.parse_level, ParseLevel::Full);
        assert_eq!(db.message_count("sess-1").unwrap(), 2);

        let by_path = db.get_session_by_path("/logs/a.jsonl").unwrap().unwrap();
        assert_eq!(by_path.id, "sess-1");
    }

    #[test]
    fn replace_session_is_idempotent() {
        let mut db = Database::open_in_memory().unwrap();
        let sess = session("sess-1", "/logs/a.jsonl", ParseLevel::Full);
        let messages = vec![message("sess-1", 0, "hello world")];

        db.replace_session(&sess, &messages, None).unwrap();
        db.replace_session(&sess, &messages, None).unwrap();

        assert_eq!(db.message_count("sess-1").unwrap(), 1);
        assert_eq!(db.search_messages("\"hello\"", 10).unwrap().len(), 1);
    }

    #[test]
    fn fts_rows_follow_messages() {
        let mut db = Database::open_in_memory().unwrap();
        let sess = session("sess-1", "/logs/a.jsonl", ParseLevel::Full);
        db.replace_session(&sess, &[message("sess-1", 0, "searchable text body")], None)
            .unwrap();

        assert_eq!(db.search_messages("\"searchable\"", 10).unwrap().len(), 1);

        // Re-index with different content replaces the indexed rows
        db.replace_session(&sess, &[message("sess-1", 0, "different now")], None)
            .unwrap();
        assert!(db.search_messages("\"searchable\"", 10).unwrap().is_empty());
        assert_eq!(db.search_messages("\"different\"", 10).unwrap().len(), 1);
    }

    #[test]
    fn conjunctive_match_requires_all_tokens() {
        let mut db = Database::open_in_memory().unwrap();
        let sess = session("sess-1", "/logs/a.jsonl", ParseLevel::Full);
        db.replace_session(
            &sess,
            &[
                message("sess-1", 0, "Add web api handler"),
                message("sess-1", 1, "Fix api bug"),
            ],
            None,
        )
        .unwrap();

        let hits = db.search_messages("\"web\" AND \"api\"", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].position, 0);
    }

    #[test]
    fn preview_round_trips() {
        let mut db = Database::open_in_memory().unwrap();
        let sess = session("sess-1", "/logs/a.jsonl", ParseLevel::Preview);
        let preview = vec![
            new_event(VisibilityKind::User, "Implement X", 0),
            new_event(VisibilityKind::Assistant, "On it", 1),
        ];

        db.replace_session(&sess, &[], Some(&preview)).unwrap();

        let stored = db.get_preview("sess-1").unwrap().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].text, "Implement X");
        assert_eq!(stored[1].kind, VisibilityKind::Assistant);
    }

    #[test]
    fn delete_session_removes_everything() {
        let mut db = Database::open_in_memory().unwrap();
        let sess = session("sess-1", "/logs/a.jsonl", ParseLevel::Full);
        let preview = vec![new_event(VisibilityKind::User, "x", 0)];
        db.replace_session(&sess, &[message("sess-1", 0, "indexed text")], Some(&preview))
            .unwrap();

        db.delete_session("sess-1").unwrap();

        assert!(db.get_session("sess-1").unwrap().is_none());
        assert!(db.get_preview("sess-1").unwrap().is_none());
        assert!(db.search_messages("\"indexed\"", 10).unwrap().is_empty());
    }

    #[test]
    fn list_filters_by_source_and_limit() {
        let mut db = Database::open_in_memory().unwrap();

        for (index, source) in [SourceKind::Codex, SourceKind::Claude, SourceKind::Codex]
            .into_iter()
            .enumerate()
        {
            let mut sess = session(
                &format!("sess-{}", index),
                &format!("/logs/{}.jsonl", index),
                ParseLevel::Metadata,
            );
            sess.source = source;
            db.replace_session(&sess, &[], None).unwrap();
        }

        let codex_only = db
            .list_sessions(&SessionFilter {
                source: Some(SourceKind::Codex),
                limit: None,
            })
            .unwrap();
        assert_eq!(codex_only.len(), 2);

        let limited = db
            .list_sessions(&SessionFilter {
                source: None,
                limit: Some(2),
            })
            .unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn id_change_for_same_file_replaces_the_row() {
        let mut db = Database::open_in_memory().unwrap();
        db.replace_session(
            &session("file-abc123", "/logs/a.jsonl", ParseLevel::Metadata),
            &[],
            None,
        )
        .unwrap();
        db.replace_session(
            &session("sess-real", "/logs/a.jsonl", ParseLevel::Full),
            &[],
            None,
        )
        .unwrap();

        assert!(db.get_session("file-abc123").unwrap().is_none());
        let stored = db.get_session_by_path("/logs/a.jsonl").unwrap().unwrap();
        assert_eq!(stored.id, "sess-real");
    }

    #[test]
    fn prefix_lookup_disambiguates() {
        let mut db = Database::open_in_memory().unwrap();
        db.replace_session(
            &session("abc-123", "/logs/a.jsonl", ParseLevel::Metadata),
            &[],
            None,
        )
        .unwrap();
        db.replace_session(
            &session("abd-456", "/logs/b.jsonl", ParseLevel::Metadata),
            &[],
            None,
        )
        .unwrap();

        assert_eq!(
            db.find_session_by_prefix("abc").unwrap(),
            Some("abc-123".to_string())
        );
        assert_eq!(db.find_session_by_prefix("zzz").unwrap(), None);
        assert!(db.find_session_by_prefix("ab").is_err());
    }
}
