use std::collections::HashMap;

use loglens_types::VisibilityKind;
use regex::Regex;

// NOTE: The skip list and edit-verb list are product decisions, not
// architecture: new tool releases add record types and tool names faster
// than this crate ships. Everything here is plain data injected at
// construction; nothing in the classifier reads a global.

/// Classification heuristics, injectable so callers can extend the lists
/// without code changes.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Event-message `type` strings that never produce a visible event.
    pub skip_types: Vec<String>,

    /// Tag names whose `<tag>...</tag>` spans are instructional wrappers,
    /// stripped from message text before emptiness checks.
    pub instruction_tags: Vec<String>,

    /// Tool names (normalized: lowercased, separators removed) that are
    /// edit verbs by themselves.
    pub edit_tool_names: Vec<String>,

    /// Tool names whose rendered arguments get patch-envelope inspection.
    pub shell_tool_names: Vec<String>,

    /// Exact `type` string overrides applied before the generic mapping.
    pub kind_overrides: HashMap<String, VisibilityKind>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        let skip_types = [
            // reasoning output markers (the consolidated agent_reasoning row
            // is the visible one)
            "agent_reasoning_delta",
            "agent_reasoning_raw_content",
            "agent_reasoning_raw_content_delta",
            "agent_reasoning_section_break",
            "reasoning_content_delta",
            "reasoning_summary_delta",
            "reasoning_summary_part_added",
            // turn boundaries and lifecycle noise
            "task_started",
            "task_complete",
            "turn_started",
            "turn_complete",
            "turn_aborted",
            "compacted",
            "turn_diff",
            // streaming deltas duplicated by their final row
            "agent_message_delta",
            "exec_command_output_delta",
            "mcp_tool_call_progress",
            // file-system snapshots and ambient context
            "ghost_snapshot",
            "environment_context",
            "session_configured",
            "shutdown_complete",
        ];

        let instruction_tags = [
            "user_instructions",
            "environment_context",
            "permissions_instructions",
            "collaboration_mode",
            "system_reminder",
        ];

        let edit_tool_names = [
            "edit",
            "write",
            "replace",
            "applypatch",
            "patch",
            "createfile",
            "writefile",
            "deletefile",
            "fileedit",
            "filewrite",
            "updatefile",
            "insert",
            "append",
            "move",
            "rename",
            "remove",
            "multiedit",
        ];

        let shell_tool_names = ["shell", "shellcommand", "bash", "exec", "execcommand", "localshell"];

        ClassifierConfig {
            skip_types: skip_types.iter().map(|s| s.to_string()).collect(),
            instruction_tags: instruction_tags.iter().map(|s| s.to_string()).collect(),
            edit_tool_names: edit_tool_names.iter().map(|s| s.to_string()).collect(),
            shell_tool_names: shell_tool_names.iter().map(|s| s.to_string()).collect(),
            kind_overrides: HashMap::new(),
        }
    }
}

impl ClassifierConfig {
    /// Compile the instruction-tag stripper. Tag spans are removed
    /// case-insensitively, across lines.
    pub(crate) fn compile_tag_stripper(&self) -> Option<Regex> {
        if self.instruction_tags.is_empty() {
            return None;
        }

        let names = self
            .instruction_tags
            .iter()
            .map(|tag| regex::escape(tag))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = format!(r"(?is)<({names})\b[^>]*>.*?</({names})\s*>");

        // A bad injected tag list should degrade to "no stripping", not
        // panic; the default list always compiles.
        Regex::new(&pattern).ok()
    }
}

/// Normalize a tool name for matching: lowercase with separators removed.
pub(crate) fn normalize_tool_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '_' | '-' | '.' | ' '))
        .flat_map(|c| c.to_lowercase())
        .collect()
}
