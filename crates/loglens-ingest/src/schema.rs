use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// NOTE: Decoding Rationale
//
// Every source tool writes its own JSONL record family, but the shapes
// collapse onto one closed union: session metadata, turn context, event
// messages, response items, and a legacy assistant-message echo. Decoding is
// schema-on-read and tolerant: every payload field is optional, unknown
// discriminants land in `Unknown`, and fields we do not model are preserved
// in a flattened map so nothing is lost before classification.

/// One decoded record from a session file, prior to classification.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub enum RawRow {
    SessionMeta(SessionMetaRecord),
    /// Legacy echo of an assistant message; always superseded by a later
    /// canonical response item.
    #[serde(alias = "assistant")]
    AssistantMessage(AssistantMessageRecord),
    TurnContext(TurnContextRecord),
    #[serde(alias = "event_msg")]
    EventMessage(EventMessageRecord),
    ResponseItem(ResponseItemRecord),
    #[serde(other)]
    Unknown,
}

impl RawRow {
    /// Record timestamp string, when the envelope carried one.
    pub fn timestamp(&self) -> Option<&str> {
        match self {
            RawRow::SessionMeta(r) => r.timestamp.as_deref(),
            RawRow::AssistantMessage(r) => r.timestamp.as_deref(),
            RawRow::TurnContext(r) => r.timestamp.as_deref(),
            RawRow::EventMessage(r) => r.timestamp.as_deref(),
            RawRow::ResponseItem(r) => r.timestamp.as_deref(),
            RawRow::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SessionMetaRecord {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub payload: SessionMetaPayload,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SessionMetaPayload {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub originator: Option<String>,
    #[serde(default)]
    pub cli_version: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub model_provider: Option<String>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AssistantMessageRecord {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub message: Option<Value>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TurnContextRecord {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub payload: TurnContextPayload,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TurnContextPayload {
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub approval_policy: Option<String>,
    #[serde(default)]
    pub effort: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EventMessageRecord {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub payload: EventMessagePayload,
}

/// Semi-structured event-message payload: a lowercase `type` string plus
/// whatever free-form fields the producing tool attached.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EventMessagePayload {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub images: Vec<Value>,
    #[serde(default)]
    pub call_id: Option<String>,
    /// Token accounting detail on `token_count` rows
    #[serde(default)]
    pub info: Option<Value>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ResponseItemRecord {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub payload: ResponseItemPayload,
}

/// Semi-structured response-item payload. Content blocks, summaries, tool
/// arguments and outputs all vary by tool, so they stay generic JSON values;
/// classification inspects their shape rather than their declared type.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ResponseItemPayload {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Vec<Value>,
    #[serde(default)]
    pub summary: Vec<Value>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<Value>,
    #[serde(default)]
    pub input: Option<Value>,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub call_id: Option<String>,
    #[serde(default)]
    pub ghost_commit: Option<Value>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl ResponseItemPayload {
    /// Join the text of content blocks (`{"type":"...","text":"..."}` or bare
    /// strings) into one body.
    pub fn content_text(&self) -> String {
        join_text_blocks(&self.content)
    }

    /// Join summary items the same way.
    pub fn summary_text(&self) -> String {
        join_text_blocks(&self.summary)
    }

    /// Rendered output text: string outputs pass through, structured outputs
    /// fall back to their `content`/`output` string field.
    pub fn output_text(&self) -> String {
        match &self.output {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Object(map)) => map
                .get("content")
                .or_else(|| map.get("output"))
                .or_else(|| map.get("text"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            _ => String::new(),
        }
    }

    /// Tool arguments as a JSON value. String-encoded argument payloads are
    /// re-parsed; ones that are not valid JSON are wrapped as `{"raw": ...}`.
    pub fn arguments_value(&self) -> Option<Value> {
        let raw = self.arguments.as_ref().or(self.input.as_ref())?;
        Some(match raw {
            Value::String(s) => serde_json::from_str(s)
                .unwrap_or_else(|_| serde_json::json!({ "raw": s })),
            other => other.clone(),
        })
    }
}

fn join_text_blocks(blocks: &[Value]) -> String {
    blocks
        .iter()
        .filter_map(|block| match block {
            Value::String(s) => Some(s.as_str()),
            Value::Object(map) => map.get("text").and_then(Value::as_str),
            _ => None,
        })
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Envelope discriminants decoded directly into `RawRow` variants.
const ENVELOPE_TYPES: &[&str] = &[
    "session_meta",
    "assistant_message",
    "assistant",
    "turn_context",
    "event_msg",
    "event_message",
    "response_item",
];

/// Payload types that belong to the response-item family when a tool emits
/// them flat, without the envelope.
const RESPONSE_ITEM_TYPES: &[&str] = &[
    "message",
    "reasoning",
    "function_call",
    "function_call_output",
    "custom_tool_call",
    "custom_tool_call_output",
    "local_shell_call",
    "local_shell_call_output",
    "web_search_call",
    "ghost_snapshot",
];

/// Decode one line of a session file into a raw row.
///
/// The discriminant is the top-level `type` field; tools that wrap records
/// in an envelope keyed by `kind` are normalized first, and tools that emit
/// payload records flat (`{"type":"user_message","message":...}`) are
/// re-wrapped into the matching envelope. Unrecognized envelope
/// discriminants decode as `RawRow::Unknown` rather than failing, preserving
/// forward compatibility with new record kinds.
pub fn decode_line(line: &str) -> Result<RawRow, serde_json::Error> {
    let value: Value = serde_json::from_str(line)?;

    let mut map = match value {
        Value::Object(map) => map,
        other => return serde_json::from_value(other),
    };

    if !map.contains_key("type")
        && let Some(kind) = map.get("kind").and_then(Value::as_str).map(str::to_owned)
    {
        map.insert("type".to_string(), Value::String(kind));
    }

    let type_str = map.get("type").and_then(Value::as_str).unwrap_or_default();
    let is_flat_payload = !type_str.is_empty()
        && !ENVELOPE_TYPES.contains(&type_str)
        && !map.contains_key("payload");

    if is_flat_payload {
        let envelope_type = if RESPONSE_ITEM_TYPES.contains(&type_str) {
            "response_item"
        } else {
            "event_message"
        };

        let timestamp = map.get("timestamp").cloned();
        let mut wrapped = Map::new();
        wrapped.insert(
            "type".to_string(),
            Value::String(envelope_type.to_string()),
        );
        if let Some(timestamp) = timestamp {
            wrapped.insert("timestamp".to_string(), timestamp);
        }
        wrapped.insert("payload".to_string(), Value::Object(map));
        return serde_json::from_value(Value::Object(wrapped));
    }

    serde_json::from_value(Value::Object(map))
}
