mod config;
mod edit;

pub use config::ClassifierConfig;
pub use edit::{args_look_like_edit, contains_patch_markers, output_confirms_edit};

use loglens_types::{Actor, VisibilityKind, truncate};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::schema::{EventMessagePayload, RawRow, ResponseItemPayload};
use config::normalize_tool_name;

// NOTE: Classification is a pure function of (row, previous visible row).
// The same raw bytes always yield the same outcome regardless of where in
// the file they appear; the only rolling state is the previous visible
// row's (kind, text) pair used for duplicate suppression. Absent fields
// yield empty/false signals, and unresolved kinds land in `Other` instead
// of disappearing, so nothing is lost without an explicit skip rule.

/// Outcome of classifying one raw row.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Dropped(DropReason),
    Event(ClassifiedEvent),
}

impl Classification {
    pub fn into_event(self) -> Option<ClassifiedEvent> {
        match self {
            Classification::Event(event) => Some(event),
            Classification::Dropped(_) => None,
        }
    }
}

/// Why a row produced no visible event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Record kinds that never surface (session metadata, turn context,
    /// legacy assistant echoes, unknown records)
    NonVisibleRecord,
    /// Event-message type on the skip list
    SkippedType,
    /// No text and no attachments after instruction-tag stripping
    EmptyText,
    /// Reasoning row whose only content is a summary duplicated elsewhere
    DuplicateSummary,
    /// User-role response item; the user's text surfaces via the
    /// environment-context path instead
    UserEcho,
    /// Identical in kind and text to the immediately preceding visible row
    Duplicate,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::NonVisibleRecord => "non_visible_record",
            DropReason::SkippedType => "skipped_type",
            DropReason::EmptyText => "empty_text",
            DropReason::DuplicateSummary => "duplicate_summary",
            DropReason::UserEcho => "user_echo",
            DropReason::Duplicate => "duplicate",
        }
    }
}

/// A visible timeline event, before the indexer assigns ids and positions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedEvent {
    pub actor: Actor,
    pub kind: VisibilityKind,
    pub title: Option<String>,
    pub text: String,
    pub attachments: Vec<String>,
    pub call_id: Option<String>,
    pub is_tool_like: bool,
}

/// Rolling context for duplicate suppression: the previous visible row's
/// kind and text, nothing else.
#[derive(Debug, Clone, PartialEq)]
pub struct RowContext {
    pub kind: VisibilityKind,
    pub text: String,
}

impl RowContext {
    pub fn of(event: &ClassifiedEvent) -> Self {
        RowContext {
            kind: event.kind,
            text: event.text.clone(),
        }
    }
}

pub struct Classifier {
    config: ClassifierConfig,
    tag_stripper: Option<Regex>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

impl Classifier {
    pub fn new(config: ClassifierConfig) -> Self {
        let tag_stripper = config.compile_tag_stripper();
        Classifier {
            config,
            tag_stripper,
        }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Decide whether a visible timeline event exists for this row, and if
    /// so, what kind. Never errors.
    pub fn classify(&self, row: &RawRow, prev: Option<&RowContext>) -> Classification {
        let classified = match row {
            RawRow::SessionMeta(_)
            | RawRow::AssistantMessage(_)
            | RawRow::TurnContext(_)
            | RawRow::Unknown => return Classification::Dropped(DropReason::NonVisibleRecord),
            RawRow::EventMessage(record) => self.classify_event_message(&record.payload),
            RawRow::ResponseItem(record) => self.classify_response_item(&record.payload),
        };

        match classified {
            Classification::Event(event) => {
                if let Some(prev) = prev
                    && prev.kind == event.kind
                    && prev.text == event.text
                {
                    return Classification::Dropped(DropReason::Duplicate);
                }
                Classification::Event(event)
            }
            dropped => dropped,
        }
    }

    fn classify_event_message(&self, payload: &EventMessagePayload) -> Classification {
        let kind_str = payload.kind.to_lowercase();

        if self.config.skip_types.iter().any(|t| t == &kind_str) {
            return Classification::Dropped(DropReason::SkippedType);
        }

        let raw_text = first_non_empty(&[
            payload.message.as_deref(),
            payload.text.as_deref(),
            payload.reason.as_deref(),
        ]);
        let mut text = self.strip_instruction_tags(&raw_text);

        if kind_str == "token_count" && text.is_empty() {
            text = summarize_token_info(payload.info.as_ref());
        }

        let attachments = image_refs(&payload.images);
        if text.is_empty() && attachments.is_empty() {
            return Classification::Dropped(DropReason::EmptyText);
        }

        let generic = self.resolve_kind(&kind_str);
        let kind = match kind_str.as_str() {
            "token_count" => VisibilityKind::TokenUsage,
            "agent_reasoning" => VisibilityKind::Reasoning,
            "user_message" | "agent_message" => {
                if generic == Some(VisibilityKind::Tool) {
                    self.edit_kind_from_text(&text)
                } else if kind_str == "user_message" {
                    VisibilityKind::User
                } else {
                    VisibilityKind::Assistant
                }
            }
            _ => match generic {
                Some(VisibilityKind::Tool) => self.edit_kind_from_text(&text),
                Some(kind) => kind,
                None => VisibilityKind::Other,
            },
        };

        Classification::Event(ClassifiedEvent {
            actor: kind.actor(),
            kind,
            title: None,
            text,
            attachments,
            call_id: payload.call_id.clone(),
            is_tool_like: kind.is_tool_like(),
        })
    }

    fn classify_response_item(&self, payload: &ResponseItemPayload) -> Classification {
        let kind_str = payload.kind.to_lowercase();

        let content_text = payload.content_text();
        let summary_text = payload.summary_text();

        // A reasoning row whose only content is its summary duplicates the
        // consolidated reasoning event.
        if kind_str == "reasoning" && !summary_text.is_empty() && content_text.is_empty() {
            return Classification::Dropped(DropReason::DuplicateSummary);
        }

        if kind_str == "message" && payload.role.as_deref() == Some("user") {
            return Classification::Dropped(DropReason::UserEcho);
        }

        let output_text = payload.output_text();
        let text = first_non_empty(&[
            Some(content_text.as_str()),
            Some(summary_text.as_str()),
            Some(synthesize_call_text(payload).as_str()),
            Some(output_text.as_str()),
        ]);
        if text.is_empty() {
            return Classification::Dropped(DropReason::EmptyText);
        }

        let generic = self.resolve_kind(&kind_str);
        let kind = match generic {
            Some(VisibilityKind::Tool) => self.detect_edit(payload, &text, &output_text),
            Some(kind) => kind,
            None => VisibilityKind::Other,
        };

        let title = if kind.is_tool_like() {
            payload.name.clone()
        } else {
            None
        };

        Classification::Event(ClassifiedEvent {
            actor: kind.actor(),
            kind,
            title,
            text,
            attachments: Vec::new(),
            call_id: payload.call_id.clone(),
            is_tool_like: kind.is_tool_like(),
        })
    }

    /// Code-edit detection for rows that resolved to `Tool`, strongest
    /// signal first: edit-verb name, key-shape evidence in arguments, patch
    /// envelopes in shell arguments, completion markers in output, patch
    /// envelopes in the detection text itself.
    fn detect_edit(
        &self,
        payload: &ResponseItemPayload,
        detection_text: &str,
        output_text: &str,
    ) -> VisibilityKind {
        let normalized_name = payload
            .name
            .as_deref()
            .map(normalize_tool_name)
            .unwrap_or_default();

        if self
            .config
            .edit_tool_names
            .iter()
            .any(|name| name == &normalized_name)
        {
            return VisibilityKind::CodeEdit;
        }

        let args = payload.arguments_value();
        if let Some(args) = &args
            && args_look_like_edit(args)
        {
            return VisibilityKind::CodeEdit;
        }

        if self
            .config
            .shell_tool_names
            .iter()
            .any(|name| name == &normalized_name)
        {
            let rendered = args
                .as_ref()
                .map(|value| value.to_string())
                .unwrap_or_default();
            if contains_patch_markers(&rendered) {
                return VisibilityKind::CodeEdit;
            }
        }

        if output_confirms_edit(output_text) || contains_patch_markers(detection_text) {
            return VisibilityKind::CodeEdit;
        }

        VisibilityKind::Tool
    }

    fn edit_kind_from_text(&self, text: &str) -> VisibilityKind {
        if contains_patch_markers(text) {
            VisibilityKind::CodeEdit
        } else {
            VisibilityKind::Tool
        }
    }

    /// Generic type→kind mapping: exact overrides, then well-known literals,
    /// then substring heuristics. Returns None when nothing resolves.
    fn resolve_kind(&self, kind_str: &str) -> Option<VisibilityKind> {
        if let Some(kind) = self.config.kind_overrides.get(kind_str) {
            return Some(*kind);
        }

        match kind_str {
            "user_message" => return Some(VisibilityKind::User),
            "agent_message" | "message" => return Some(VisibilityKind::Assistant),
            "agent_reasoning" | "reasoning" => return Some(VisibilityKind::Reasoning),
            "token_count" => return Some(VisibilityKind::TokenUsage),
            _ => {}
        }

        const TOOL_MARKERS: &[&str] = &[
            "tool", "exec", "command", "shell", "call", "mcp", "patch", "browser", "search",
            "fetch",
        ];
        const INFO_MARKERS: &[&str] = &["error", "warning", "notification", "status", "stream"];

        if TOOL_MARKERS.iter().any(|m| kind_str.contains(m)) {
            return Some(VisibilityKind::Tool);
        }
        if kind_str.contains("reason") {
            return Some(VisibilityKind::Reasoning);
        }
        if kind_str.contains("token") {
            return Some(VisibilityKind::TokenUsage);
        }
        if INFO_MARKERS.iter().any(|m| kind_str.contains(m)) {
            return Some(VisibilityKind::Other);
        }

        None
    }

    fn strip_instruction_tags(&self, text: &str) -> String {
        match &self.tag_stripper {
            Some(stripper) => stripper.replace_all(text, "").trim().to_string(),
            None => text.trim().to_string(),
        }
    }
}

fn first_non_empty(candidates: &[Option<&str>]) -> String {
    candidates
        .iter()
        .flatten()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Fallback detection text for tool calls: the tool name with its compacted
/// arguments, or the ghost-commit id for snapshot rows.
fn synthesize_call_text(payload: &ResponseItemPayload) -> String {
    if let Some(name) = &payload.name {
        let args = payload
            .arguments_value()
            .map(|value| truncate(&value.to_string(), 400))
            .unwrap_or_default();
        if args.is_empty() {
            return name.clone();
        }
        return format!("{} {}", name, args);
    }

    if let Some(commit) = &payload.ghost_commit {
        let id = commit
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if !id.is_empty() {
            return format!("snapshot {}", id);
        }
    }

    String::new()
}

fn summarize_token_info(info: Option<&Value>) -> String {
    let Some(info) = info else {
        return String::new();
    };

    let total = info
        .get("total_token_usage")
        .and_then(|usage| usage.get("total_tokens"))
        .or_else(|| info.get("total_tokens"))
        .and_then(Value::as_i64);

    match total {
        Some(total) => format!("{} tokens used", total),
        None => String::new(),
    }
}

fn image_refs(images: &[Value]) -> Vec<String> {
    images
        .iter()
        .filter_map(|image| match image {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Object(map) => map
                .get("url")
                .or_else(|| map.get("path"))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            _ => None,
        })
        .collect()
}
