use loglens_types::{Actor, Message, SourceKind, parse_timestamp};
use rusqlite::{Connection, params};

use crate::Result;
use crate::records::MessageHit;

pub fn insert(conn: &Connection, message: &Message) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO messages (session_id, position, role, text)
        VALUES (?1, ?2, ?3, ?4)
        "#,
        params![
            &message.session_id,
            message.position as i64,
            message.role.as_str(),
            &message.text,
        ],
    )?;
    Ok(())
}

pub fn delete_for_session(conn: &Connection, session_id: &str) -> Result<usize> {
    let deleted = conn.execute("DELETE FROM messages WHERE session_id = ?1", [session_id])?;
    Ok(deleted)
}

pub fn count_for_session(conn: &Connection, session_id: &str) -> Result<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM messages WHERE session_id = ?1",
        [session_id],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

pub fn for_session(conn: &Connection, session_id: &str) -> Result<Vec<Message>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT session_id, position, role, text
        FROM messages
        WHERE session_id = ?1
        ORDER BY position ASC
        "#,
    )?;

    let messages = stmt
        .query_map([session_id], |row| {
            let role: String = row.get(2)?;
            Ok(Message {
                session_id: row.get(0)?,
                position: row.get::<_, i64>(1)? as usize,
                role: Actor::from_name(&role).unwrap_or(Actor::Info),
                text: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    Ok(messages)
}

/// Full-text search over message bodies.
///
/// `match_expr` is an FTS5 match expression (the engine builds a conjunctive
/// one from query keywords). Results come back ordered by bm25 so the caller
/// can blend in recency and position signals before capping.
pub fn search(conn: &Connection, match_expr: &str, limit: usize) -> Result<Vec<MessageHit>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT m.session_id,
               m.role,
               m.text,
               m.position,
               bm25(messages_fts) AS score,
               s.last_modified_at,
               s.source,
               s.file_path
        FROM messages_fts
        JOIN messages m
          ON m.session_id = messages_fts.session_id
         AND m.position = messages_fts.position
        JOIN sessions s ON s.id = m.session_id
        WHERE messages_fts MATCH ?1
        ORDER BY score
        LIMIT ?2
        "#,
    )?;

    let hits = stmt
        .query_map(params![match_expr, limit as i64], |row| {
            let role: String = row.get(1)?;
            let last_modified: Option<String> = row.get(5)?;
            let source: String = row.get(6)?;

            Ok(MessageHit {
                session_id: row.get(0)?,
                role: Actor::from_name(&role).unwrap_or(Actor::Info),
                text: row.get(2)?,
                position: row.get::<_, i64>(3)? as usize,
                score: row.get(4)?,
                session_last_modified: last_modified.as_deref().and_then(parse_timestamp),
                source: SourceKind::from_name(&source),
                file_path: row.get(7)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    Ok(hits)
}
