use rusqlite::Connection;

use crate::Result;

// Schema version (increment when changing table definitions)
pub const SCHEMA_VERSION: i32 = 3;

// NOTE: Store Design Rationale
//
// Why only three tables (sessions, messages, timeline_previews)?
// - Raw logs are the source of truth; the store is an index for fast
//   listing and search, never a second copy of the timeline
// - Full timelines are reconstructed from the file on demand, so improved
//   classification heuristics apply without a migration
//
// Why FTS5 with sync triggers (not manual dual writes)?
// - messages and messages_fts cannot drift when every INSERT/DELETE on
//   messages maintains the index inside the same transaction
//
// Why drop-and-recreate on version mismatch?
// - Everything in the store is derived; rebuilding from logs is cheaper
//   than carrying migration code for an index

pub fn init_schema(conn: &Connection) -> Result<()> {
    let current_version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if current_version != SCHEMA_VERSION {
        drop_all_tables(conn)?;
    }

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            source TEXT NOT NULL,
            file_path TEXT NOT NULL UNIQUE,
            parse_level TEXT NOT NULL DEFAULT 'unparsed',
            user_messages INTEGER NOT NULL DEFAULT 0,
            assistant_messages INTEGER NOT NULL DEFAULT 0,
            model TEXT,
            cwd TEXT,
            created_at TEXT,
            last_modified_at TEXT,
            file_size INTEGER,
            file_mtime TEXT
        );

        CREATE TABLE IF NOT EXISTS messages (
            session_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            role TEXT NOT NULL,
            text TEXT NOT NULL,
            PRIMARY KEY (session_id, position),
            FOREIGN KEY (session_id) REFERENCES sessions(id)
        );

        CREATE TABLE IF NOT EXISTS timeline_previews (
            session_id TEXT PRIMARY KEY,
            events TEXT NOT NULL,
            updated_at TEXT,
            FOREIGN KEY (session_id) REFERENCES sessions(id)
        );

        CREATE VIRTUAL TABLE IF NOT EXISTS messages_fts USING fts5(
            text,
            session_id UNINDEXED,
            position UNINDEXED
        );

        CREATE TRIGGER IF NOT EXISTS messages_ai AFTER INSERT ON messages BEGIN
            INSERT INTO messages_fts (text, session_id, position)
            VALUES (new.text, new.session_id, new.position);
        END;

        CREATE TRIGGER IF NOT EXISTS messages_ad AFTER DELETE ON messages BEGIN
            DELETE FROM messages_fts
            WHERE session_id = old.session_id AND position = old.position;
        END;

        CREATE INDEX IF NOT EXISTS idx_sessions_modified ON sessions(last_modified_at DESC);
        CREATE INDEX IF NOT EXISTS idx_sessions_source ON sessions(source);
        CREATE INDEX IF NOT EXISTS idx_messages_session ON messages(session_id);
        "#,
    )?;

    conn.execute_batch(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))?;

    Ok(())
}

fn drop_all_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DROP TRIGGER IF EXISTS messages_ai;
        DROP TRIGGER IF EXISTS messages_ad;
        DROP TABLE IF EXISTS messages_fts;
        DROP TABLE IF EXISTS timeline_previews;
        DROP TABLE IF EXISTS messages;
        DROP TABLE IF EXISTS sessions;
        "#,
    )?;
    Ok(())
}
