use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// NOTE: Timeline Model Goals
//
// 1. Normalization: every source tool's raw records collapse into the same
//    event shape; nothing downstream branches on the producing tool.
// 2. Deep-linking: `position` is the record's line index in the source file,
//    so a search hit can be mapped back to its place in the timeline.
// 3. Replayability: events are immutable once written; re-indexing replaces
//    a session's events wholesale instead of mutating in place.

/// Who a timeline event is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    User,
    Assistant,
    Info,
}

impl Actor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Actor::User => "user",
            Actor::Assistant => "assistant",
            Actor::Info => "info",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "user" => Some(Actor::User),
            "assistant" => Some(Actor::Assistant),
            "info" => Some(Actor::Info),
            _ => None,
        }
    }
}

/// Category assigned to a classified event, controlling how it is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityKind {
    User,
    Assistant,
    Tool,
    CodeEdit,
    Reasoning,
    TokenUsage,
    /// Informational catch-all for rows that carry text but resolve to no
    /// specific kind. Nothing disappears without an explicit skip rule.
    Other,
}

impl VisibilityKind {
    /// True exactly for tool executions and code edits.
    pub fn is_tool_like(&self) -> bool {
        matches!(self, VisibilityKind::Tool | VisibilityKind::CodeEdit)
    }

    /// Default actor attribution for this kind.
    pub fn actor(&self) -> Actor {
        match self {
            VisibilityKind::User => Actor::User,
            VisibilityKind::Assistant
            | VisibilityKind::Tool
            | VisibilityKind::CodeEdit
            | VisibilityKind::Reasoning => Actor::Assistant,
            VisibilityKind::TokenUsage | VisibilityKind::Other => Actor::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VisibilityKind::User => "user",
            VisibilityKind::Assistant => "assistant",
            VisibilityKind::Tool => "tool",
            VisibilityKind::CodeEdit => "code_edit",
            VisibilityKind::Reasoning => "reasoning",
            VisibilityKind::TokenUsage => "token_usage",
            VisibilityKind::Other => "other",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "user" => Some(VisibilityKind::User),
            "assistant" => Some(VisibilityKind::Assistant),
            "tool" => Some(VisibilityKind::Tool),
            "code_edit" => Some(VisibilityKind::CodeEdit),
            "reasoning" => Some(VisibilityKind::Reasoning),
            "token_usage" => Some(VisibilityKind::TokenUsage),
            "other" => Some(VisibilityKind::Other),
            _ => None,
        }
    }
}

/// One classified, displayable unit derived from a raw record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEvent {
    /// Unique event ID
    pub id: Uuid,

    /// Session this event belongs to
    pub session_id: String,

    /// Record timestamp (UTC), when the source carried one
    pub timestamp: Option<DateTime<Utc>>,

    pub actor: Actor,
    pub kind: VisibilityKind,

    /// Short display label (e.g. the tool name for tool events)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Extracted body text
    pub text: String,

    /// Image or file references carried by the record
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,

    /// Provider call identifier linking tool calls to their outputs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,

    /// Source-specific leftovers kept for debugging
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,

    /// How many consecutive identical records folded into this event
    #[serde(default = "default_repeat_count")]
    pub repeat_count: u32,

    /// Line index of the originating record in the source file
    pub position: usize,
}

fn default_repeat_count() -> u32 {
    1
}

/// A user event plus the output events that follow it, up to the next user
/// event. Derived for display; always recomputable from a session's events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// The triggering user event. Leading output events with no preceding
    /// user event form a headless turn with `user: None`.
    pub user: Option<TimelineEvent>,
    pub outputs: Vec<TimelineEvent>,
}

impl ConversationTurn {
    /// Group a session's ordered events into turns.
    pub fn group(events: Vec<TimelineEvent>) -> Vec<ConversationTurn> {
        let mut turns: Vec<ConversationTurn> = Vec::new();

        for event in events {
            if event.kind == VisibilityKind::User {
                turns.push(ConversationTurn {
                    user: Some(event),
                    outputs: Vec::new(),
                });
            } else {
                match turns.last_mut() {
                    Some(turn) => turn.outputs.push(event),
                    None => turns.push(ConversationTurn {
                        user: None,
                        outputs: vec![event],
                    }),
                }
            }
        }

        turns
    }
}
