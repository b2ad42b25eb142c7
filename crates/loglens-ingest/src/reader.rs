use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::{DateTime, Utc};
use loglens_types::{TimelineEvent, parse_timestamp, truncate};
use uuid::Uuid;

use crate::Result;
use crate::classify::{Classification, Classifier, DropReason, RowContext};
use crate::schema::{RawRow, decode_line};

/// How many records a header scan inspects before giving up on a field.
const HEADER_SCAN_RECORDS: usize = 20;

/// Session-level fields extracted without reading message bodies.
#[derive(Debug, Clone, Default)]
pub struct SessionHeader {
    pub id: Option<String>,
    pub cwd: Option<String>,
    pub model: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub snippet: Option<String>,
}

/// Result of a full or bounded decode-classify pass over one session file.
#[derive(Debug, Clone, Default)]
pub struct ReadOutcome {
    pub events: Vec<TimelineEvent>,
    pub user_messages: usize,
    pub assistant_messages: usize,
    /// Lines that failed to decode and were skipped
    pub decode_failures: usize,
}

/// Extract header information from a session file (for metadata-level
/// indexing). Reads at most the first few records.
pub fn read_header(path: &Path) -> Result<SessionHeader> {
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut header = SessionHeader::default();

    for line in reader.lines().take(HEADER_SCAN_RECORDS) {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Ok(row) = decode_line(trimmed) else {
            continue;
        };

        if header.timestamp.is_none()
            && let Some(raw) = row.timestamp()
        {
            header.timestamp = parse_timestamp(raw);
        }

        match &row {
            RawRow::SessionMeta(meta) => {
                if header.id.is_none() {
                    header.id = meta.payload.id.clone();
                }
                if header.cwd.is_none() {
                    header.cwd = meta.payload.cwd.clone();
                }
                if header.model.is_none() {
                    header.model = meta.payload.model.clone();
                }
            }
            RawRow::TurnContext(turn) => {
                if header.cwd.is_none() {
                    header.cwd = turn.payload.cwd.clone();
                }
                if header.model.is_none() {
                    header.model = turn.payload.model.clone();
                }
            }
            RawRow::EventMessage(event) => {
                if header.snippet.is_none()
                    && event.payload.kind == "user_message"
                    && let Some(message) = &event.payload.message
                    && !message.trim().is_empty()
                    && !message.contains("<environment_context>")
                {
                    header.snippet = Some(truncate(message.trim(), 200));
                }
            }
            _ => {}
        }

        if header.id.is_some()
            && header.cwd.is_some()
            && header.model.is_some()
            && header.snippet.is_some()
            && header.timestamp.is_some()
        {
            break;
        }
    }

    Ok(header)
}

/// Decode and classify a session file into positioned timeline events.
///
/// `event_limit` bounds the number of emitted events (preview level); `None`
/// classifies every record. Malformed lines are counted and skipped, never
/// fatal. Consecutive rows suppressed as duplicates fold into the previous
/// event's `repeat_count`.
pub fn read_events(
    path: &Path,
    classifier: &Classifier,
    session_id: &str,
    event_limit: Option<usize>,
) -> Result<ReadOutcome> {
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut outcome = ReadOutcome::default();
    let mut prev: Option<RowContext> = None;

    for (position, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let row = match decode_line(trimmed) {
            Ok(row) => row,
            Err(err) => {
                outcome.decode_failures += 1;
                tracing::warn!(
                    path = %path.display(),
                    line = position + 1,
                    error = %err,
                    "skipping malformed record"
                );
                continue;
            }
        };

        match classifier.classify(&row, prev.as_ref()) {
            Classification::Event(classified) => {
                match classified.kind {
                    loglens_types::VisibilityKind::User => outcome.user_messages += 1,
                    loglens_types::VisibilityKind::Assistant => outcome.assistant_messages += 1,
                    _ => {}
                }

                prev = Some(RowContext::of(&classified));
                outcome.events.push(TimelineEvent {
                    id: Uuid::new_v4(),
                    session_id: session_id.to_string(),
                    timestamp: row.timestamp().and_then(parse_timestamp),
                    actor: classified.actor,
                    kind: classified.kind,
                    title: classified.title,
                    text: classified.text,
                    attachments: classified.attachments,
                    call_id: classified.call_id,
                    metadata: None,
                    repeat_count: 1,
                    position,
                });

                if let Some(limit) = event_limit
                    && outcome.events.len() >= limit
                {
                    break;
                }
            }
            Classification::Dropped(DropReason::Duplicate) => {
                if let Some(last) = outcome.events.last_mut() {
                    last.repeat_count += 1;
                }
            }
            Classification::Dropped(_) => {}
        }
    }

    Ok(outcome)
}
