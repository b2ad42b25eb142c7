use rusqlite::{Connection, OptionalExtension, params};

use crate::Result;

pub fn upsert(
    conn: &Connection,
    session_id: &str,
    events_json: &str,
    updated_at: Option<&str>,
) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO timeline_previews (session_id, events, updated_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(session_id) DO UPDATE SET
            events = ?2,
            updated_at = ?3
        "#,
        params![session_id, events_json, updated_at],
    )?;
    Ok(())
}

pub fn get(conn: &Connection, session_id: &str) -> Result<Option<String>> {
    let events = conn
        .query_row(
            "SELECT events FROM timeline_previews WHERE session_id = ?1",
            [session_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(events)
}

pub fn delete(conn: &Connection, session_id: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM timeline_previews WHERE session_id = ?1",
        [session_id],
    )?;
    Ok(())
}
