use chrono::{DateTime, Utc};
use loglens_types::{ParseLevel, Session, SourceKind, parse_timestamp};
use rusqlite::{Connection, Row, params};

use crate::records::SessionFilter;
use crate::{Error, Result};

const SESSION_COLUMNS: &str = "id, source, file_path, parse_level, user_messages, \
     assistant_messages, model, cwd, created_at, last_modified_at, file_size, file_mtime";

pub fn upsert(conn: &Connection, session: &Session) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO sessions (id, source, file_path, parse_level, user_messages,
                              assistant_messages, model, cwd, created_at,
                              last_modified_at, file_size, file_mtime)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        ON CONFLICT(id) DO UPDATE SET
            source = ?2,
            file_path = ?3,
            parse_level = ?4,
            user_messages = ?5,
            assistant_messages = ?6,
            model = COALESCE(?7, model),
            cwd = COALESCE(?8, cwd),
            created_at = COALESCE(?9, created_at),
            last_modified_at = ?10,
            file_size = ?11,
            file_mtime = ?12
        "#,
        params![
            &session.id,
            session.source.as_str(),
            &session.file_path,
            session.parse_level.as_str(),
            session.user_message_count as i64,
            session.assistant_message_count as i64,
            &session.model,
            &session.cwd,
            session.created_at.map(|ts| ts.to_rfc3339()),
            session.last_modified_at.map(|ts| ts.to_rfc3339()),
            session.file_size.map(|size| size as i64),
            session.file_mtime.map(|ts| ts.to_rfc3339()),
        ],
    )?;

    Ok(())
}

pub fn get_by_id(conn: &Connection, session_id: &str) -> Result<Option<Session>> {
    let query = format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1");
    let mut stmt = conn.prepare(&query)?;

    let mut rows = stmt.query([session_id])?;
    match rows.next()? {
        Some(row) => Ok(Some(map_session_row(row)?)),
        None => Ok(None),
    }
}

pub fn get_by_path(conn: &Connection, file_path: &str) -> Result<Option<Session>> {
    let query = format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE file_path = ?1");
    let mut stmt = conn.prepare(&query)?;

    let mut rows = stmt.query([file_path])?;
    match rows.next()? {
        Some(row) => Ok(Some(map_session_row(row)?)),
        None => Ok(None),
    }
}

pub fn list(conn: &Connection, filter: &SessionFilter) -> Result<Vec<Session>> {
    let mut where_clauses: Vec<&str> = Vec::new();
    let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(source) = &filter.source {
        where_clauses.push("source = ?");
        params.push(Box::new(source.as_str().to_string()));
    }

    let where_clause = if where_clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", where_clauses.join(" AND "))
    };
    let limit_clause = filter
        .limit
        .map(|limit| format!("LIMIT {}", limit))
        .unwrap_or_default();

    let query = format!(
        r#"
        SELECT {SESSION_COLUMNS}
        FROM sessions
        {where_clause}
        ORDER BY last_modified_at DESC, created_at DESC, id ASC
        {limit_clause}
        "#
    );

    let mut stmt = conn.prepare(&query)?;
    let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let sessions = stmt
        .query_map(param_refs.as_slice(), map_session_row)?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    Ok(sessions)
}

/// Find session by ID prefix (supports short IDs like "7f2abd2d")
pub fn find_by_prefix(conn: &Connection, prefix: &str) -> Result<Option<String>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id
        FROM sessions
        WHERE id LIKE ?1
        LIMIT 2
        "#,
    )?;

    let pattern = format!("{}%", prefix);
    let mut matches: Vec<String> = stmt
        .query_map([&pattern], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    match matches.len() {
        0 => Ok(None),
        1 => Ok(Some(matches.remove(0))),
        _ => Err(Error::Query(format!(
            "Ambiguous session ID prefix '{}': multiple sessions match",
            prefix
        ))),
    }
}

/// Remove a session and everything derived from it. The messages delete
/// trigger keeps the full-text index in sync.
pub fn delete(conn: &Connection, session_id: &str) -> Result<()> {
    conn.execute("DELETE FROM messages WHERE session_id = ?1", [session_id])?;
    conn.execute(
        "DELETE FROM timeline_previews WHERE session_id = ?1",
        [session_id],
    )?;
    conn.execute("DELETE FROM sessions WHERE id = ?1", [session_id])?;
    Ok(())
}

/// All (session id, file path) pairs, for raw-scan fallback and pruning.
pub fn all_files(conn: &Connection) -> Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, file_path
        FROM sessions
        ORDER BY last_modified_at DESC, id ASC
        "#,
    )?;

    let files = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    Ok(files)
}

fn map_session_row(row: &Row<'_>) -> std::result::Result<Session, rusqlite::Error> {
    let source: String = row.get(1)?;
    let parse_level: String = row.get(3)?;

    Ok(Session {
        id: row.get(0)?,
        source: SourceKind::from_name(&source),
        file_path: row.get(2)?,
        parse_level: ParseLevel::from_name(&parse_level).unwrap_or(ParseLevel::Unparsed),
        user_message_count: row.get::<_, i64>(4)? as usize,
        assistant_message_count: row.get::<_, i64>(5)? as usize,
        model: row.get(6)?,
        cwd: row.get(7)?,
        created_at: parse_ts(row.get::<_, Option<String>>(8)?),
        last_modified_at: parse_ts(row.get::<_, Option<String>>(9)?),
        file_size: row.get::<_, Option<i64>>(10)?.map(|size| size as u64),
        file_mtime: parse_ts(row.get::<_, Option<String>>(11)?),
    })
}

fn parse_ts(raw: Option<String>) -> Option<DateTime<Utc>> {
    raw.as_deref().and_then(parse_timestamp)
}
