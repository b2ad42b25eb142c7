use serde::{Deserialize, Serialize};

/// Which assistant CLI produced a session file.
///
/// A session is attributed to exactly one source; cross-tool merging is out
/// of scope. Unrecognized sources are preserved rather than rejected so that
/// sessions from newer tools still appear in listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Codex,
    Claude,
    Gemini,
    Other(String),
}

impl SourceKind {
    pub fn as_str(&self) -> &str {
        match self {
            SourceKind::Codex => "codex",
            SourceKind::Claude => "claude",
            SourceKind::Gemini => "gemini",
            SourceKind::Other(name) => name.as_str(),
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "codex" => SourceKind::Codex,
            "claude" | "claude_code" => SourceKind::Claude,
            "gemini" => SourceKind::Gemini,
            other => SourceKind::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_known_and_unknown_names() {
        assert_eq!(SourceKind::from_name("codex"), SourceKind::Codex);
        assert_eq!(SourceKind::from_name("claude_code"), SourceKind::Claude);

        let other = SourceKind::from_name("acme-cli");
        assert_eq!(other.as_str(), "acme-cli");
        assert_eq!(SourceKind::from_name(other.as_str()), other);
    }
}
