use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use loglens_types::SourceKind;
use walkdir::WalkDir;

use crate::Result;
use crate::schema::{RawRow, decode_line};

/// A session file found under a configured source root.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub source: SourceKind,
}

/// Default session-log roots per source, for hosts where the tools are
/// installed in their standard locations.
pub fn default_log_roots() -> Vec<(SourceKind, PathBuf)> {
    let Some(home) = dirs::home_dir() else {
        return Vec::new();
    };

    vec![
        (SourceKind::Codex, home.join(".codex").join("sessions")),
        (SourceKind::Claude, home.join(".claude").join("projects")),
        (SourceKind::Gemini, home.join(".gemini").join("tmp")),
    ]
}

/// Identify the source tool for a session file.
///
/// Path components are the cheap signal; when they are inconclusive the
/// first decodable record is sniffed. Unknown files still index, attributed
/// to `Other`.
pub fn detect_source(path: &Path) -> SourceKind {
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name == ".codex" || name == "codex" {
            return SourceKind::Codex;
        }
        if name == ".claude" || name == "claude" {
            return SourceKind::Claude;
        }
        if name == ".gemini" || name == "gemini" {
            return SourceKind::Gemini;
        }
    }

    sniff_source(path).unwrap_or_else(|| SourceKind::Other("unknown".to_string()))
}

fn sniff_source(path: &Path) -> Option<SourceKind> {
    let file = std::fs::File::open(path).ok()?;
    let reader = BufReader::new(file);

    for line in reader.lines().take(5).map_while(|l| l.ok()) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match decode_line(trimmed) {
            Ok(RawRow::SessionMeta(_))
            | Ok(RawRow::ResponseItem(_))
            | Ok(RawRow::EventMessage(_))
            | Ok(RawRow::TurnContext(_)) => return Some(SourceKind::Codex),
            Ok(RawRow::AssistantMessage(_)) => return Some(SourceKind::Claude),
            _ => continue,
        }
    }

    None
}

/// Walk one source root for session files (`*.jsonl`), sorted for
/// deterministic indexing order.
pub fn scan_root(root: &Path, source: &SourceKind) -> Result<Vec<DiscoveredFile>> {
    let mut files = Vec::new();

    if !root.exists() {
        return Ok(files);
    }

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(root = %root.display(), error = %err, "skipping unreadable entry");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("jsonl") {
            continue;
        }

        files.push(DiscoveredFile {
            path: path.to_path_buf(),
            source: source.clone(),
        });
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn detects_source_from_path_components() {
        assert_eq!(
            detect_source(Path::new("/home/u/.codex/sessions/2026/01/a.jsonl")),
            SourceKind::Codex
        );
        assert_eq!(
            detect_source(Path::new("/home/u/.claude/projects/-work-app/b.jsonl")),
            SourceKind::Claude
        );
    }

    #[test]
    fn sniffs_rollout_records_when_path_is_neutral() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mystery.jsonl");
        fs::write(
            &path,
            r#"{"type":"session_meta","payload":{"id":"x","cwd":"/w"}}"#,
        )
        .unwrap();

        assert_eq!(detect_source(&path), SourceKind::Codex);
    }

    #[test]
    fn unknown_files_still_get_a_source() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.jsonl");
        fs::write(&path, r#"{"hello":"world"}"#).unwrap();

        assert_eq!(detect_source(&path), SourceKind::Other("unknown".to_string()));
    }

    #[test]
    fn scan_finds_only_jsonl_files() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("2026/01")).unwrap();
        fs::write(dir.path().join("2026/01/a.jsonl"), "{}").unwrap();
        fs::write(dir.path().join("2026/01/b.jsonl"), "{}").unwrap();
        fs::write(dir.path().join("readme.md"), "not a session").unwrap();

        let files = scan_root(dir.path(), &SourceKind::Codex).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].path < files[1].path);
    }

    #[test]
    fn missing_root_is_empty_not_fatal() {
        let files = scan_root(Path::new("/definitely/not/here"), &SourceKind::Codex).unwrap();
        assert!(files.is_empty());
    }
}
