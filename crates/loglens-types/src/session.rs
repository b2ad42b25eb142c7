use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::Actor;
use crate::source::SourceKind;

/// How completely a session has been indexed.
///
/// Levels only move forward while the underlying file is unchanged; any
/// change to the file's size or modification time resets the session to
/// `Unparsed` before the next transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseLevel {
    Unparsed,
    /// Session-level fields only, no message bodies read. Cheap, used for
    /// listing.
    Metadata,
    /// Metadata plus a bounded prefix of classified records for a short
    /// timeline preview.
    Preview,
    /// Every record classified; messages feed the full-text index.
    Full,
}

impl ParseLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseLevel::Unparsed => "unparsed",
            ParseLevel::Metadata => "metadata",
            ParseLevel::Preview => "preview",
            ParseLevel::Full => "full",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "unparsed" => Some(ParseLevel::Unparsed),
            "metadata" => Some(ParseLevel::Metadata),
            "preview" => Some(ParseLevel::Preview),
            "full" => Some(ParseLevel::Full),
            _ => None,
        }
    }
}

/// One complete conversation log file produced by one assistant CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session ID from the file's own metadata, or a stable hash of the
    /// file path when the file never states one.
    pub id: String,

    pub source: SourceKind,

    /// Absolute path to the session file
    pub file_path: String,

    pub parse_level: ParseLevel,

    pub user_message_count: usize,
    pub assistant_message_count: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_at: Option<DateTime<Utc>>,

    /// File size in bytes at the time of the last index pass. Together with
    /// `file_mtime` this decides whether a cached parse level is still valid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,

    /// File modification time at the time of the last index pass
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_mtime: Option<DateTime<Utc>>,
}

/// Denormalized, search-oriented projection of user/assistant events.
///
/// `position` matches the originating event's line index in the source file
/// and is strictly increasing within a session, so a search hit deep-links
/// back to its timeline location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub session_id: String,
    pub role: Actor,
    pub text: String,
    pub position: usize,
}
