use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Truncate a string to a maximum number of characters
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect::<String>() + "...(truncated)"
    }
}

/// Normalize a path for comparison (resolve to absolute, canonicalize if possible)
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        }
    })
}

/// Stable fallback session ID for files whose records never state one.
///
/// Hashes the normalized file path so the same file always maps to the same
/// session, even across re-indexing.
pub fn session_id_from_path(path: &Path) -> String {
    let normalized = normalize_path(path);

    let mut hasher = Sha256::new();
    hasher.update(normalized.to_string_lossy().as_bytes());
    let hash = hasher.finalize();

    format!(
        "file-{:016x}",
        u64::from_be_bytes([
            hash[0], hash[1], hash[2], hash[3], hash[4], hash[5], hash[6], hash[7]
        ])
    )
}

/// Parse an RFC 3339 timestamp, tolerating a trailing `Z` or offset.
/// Returns None rather than failing; record timestamps are best-effort.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_short_strings_untouched() {
        assert_eq!(truncate("hello", 10), "hello");
    }

    #[test]
    fn truncate_long_strings_marked() {
        let out = truncate("hello world", 5);
        assert_eq!(out, "hello...(truncated)");
    }

    #[test]
    fn session_id_is_deterministic() {
        let a = session_id_from_path(Path::new("/tmp/sessions/a.jsonl"));
        let b = session_id_from_path(Path::new("/tmp/sessions/a.jsonl"));
        let c = session_id_from_path(Path::new("/tmp/sessions/c.jsonl"));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("file-"));
    }

    #[test]
    fn parse_timestamp_accepts_rfc3339() {
        assert!(parse_timestamp("2026-01-05T10:00:00Z").is_some());
        assert!(parse_timestamp("2026-01-05T10:00:00+09:00").is_some());
        assert!(parse_timestamp("not a time").is_none());
    }
}
