use serde_json::Value;

/// Patch-envelope markers that identify an edit regardless of tool name.
const PATCH_MARKERS: &[&str] = &[
    "*** begin patch",
    "*** update file",
    "*** add file",
    "*** delete file",
    "update file:",
];

/// Output phrases that confirm an edit completed.
const COMPLETION_MARKERS: &[&str] = &[
    "updated the following files",
    "success. updated the following files",
];

/// True when the text carries a patch envelope (case-insensitive).
pub fn contains_patch_markers(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    let lower = text.to_lowercase();
    PATCH_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// True when rendered tool output reports a completed file update.
pub fn output_confirms_edit(output: &str) -> bool {
    if output.is_empty() {
        return false;
    }
    let lower = output.to_lowercase();
    COMPLETION_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Recursive key-shape scan over tool arguments: does this value look like a
/// file edit?
///
/// Evidence, checked at every nesting level:
/// - `old_string` together with `new_string`
/// - a `patch` or `diff` key
/// - a path-like key (`file_path`/`filepath`/`path`) co-occurring with a
///   content-like key (`content`/`new_content`/`text`)
pub fn args_look_like_edit(value: &Value) -> bool {
    match value {
        Value::Object(map) => {
            if map.contains_key("old_string") && map.contains_key("new_string") {
                return true;
            }
            if map.contains_key("patch") || map.contains_key("diff") {
                return true;
            }

            let has_path = ["file_path", "filepath", "path"]
                .iter()
                .any(|key| map.contains_key(*key));
            let has_content = ["content", "new_content", "text"]
                .iter()
                .any(|key| map.contains_key(*key));
            if has_path && has_content {
                return true;
            }

            map.values().any(args_look_like_edit)
        }
        Value::Array(items) => items.iter().any(args_look_like_edit),
        _ => false,
    }
}
