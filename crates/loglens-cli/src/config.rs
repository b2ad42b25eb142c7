use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use loglens_types::SourceKind;

/// Resolve the data directory based on priority:
/// 1. Explicit path (with tilde expansion)
/// 2. LOGLENS_PATH environment variable (with tilde expansion)
/// 3. XDG data directory
/// 4. ~/.loglens (fallback for systems without XDG)
pub fn resolve_data_dir(explicit_path: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(expand_tilde(path));
    }

    if let Ok(env_path) = std::env::var("LOGLENS_PATH") {
        return Ok(expand_tilde(&env_path));
    }

    if let Some(data_dir) = dirs::data_dir() {
        return Ok(data_dir.join("loglens"));
    }

    if let Some(home) = std::env::var_os("HOME") {
        return Ok(PathBuf::from(home).join(".loglens"));
    }

    anyhow::bail!("Could not determine data directory: no HOME or XDG data directory found")
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return PathBuf::from(home).join(stripped);
    }
    PathBuf::from(path)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub enabled: bool,
    pub log_root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub sources: BTreeMap<String, SourceConfig>,
}

impl Config {
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Probe the default log roots and enable every source that exists on
    /// this host.
    pub fn detect_sources() -> Self {
        let mut sources = BTreeMap::new();

        for (source, log_root) in loglens_ingest::default_log_roots() {
            if log_root.exists() {
                sources.insert(
                    source.as_str().to_string(),
                    SourceConfig {
                        enabled: true,
                        log_root,
                    },
                );
            }
        }

        Config { sources }
    }

    /// Enabled source roots, optionally restricted to one source name.
    pub fn roots(&self, only: Option<&str>) -> Vec<(SourceKind, PathBuf)> {
        self.sources
            .iter()
            .filter(|(name, config)| config.enabled && only.is_none_or(|o| o == name.as_str()))
            .map(|(name, config)| (SourceKind::from_name(name), config.log_root.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn save_and_load_round_trip() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.sources.insert(
            "codex".to_string(),
            SourceConfig {
                enabled: true,
                log_root: PathBuf::from("/home/user/.codex/sessions"),
            },
        );
        config.save_to(&config_path)?;

        let loaded = Config::load_from(&config_path)?;
        assert_eq!(loaded.sources.len(), 1);
        assert!(loaded.sources.get("codex").unwrap().enabled);

        Ok(())
    }

    #[test]
    fn missing_config_is_default() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config = Config::load_from(&temp_dir.path().join("nope.toml"))?;
        assert!(config.sources.is_empty());
        Ok(())
    }

    #[test]
    fn roots_respect_enabled_and_filter() {
        let mut config = Config::default();
        config.sources.insert(
            "codex".to_string(),
            SourceConfig {
                enabled: true,
                log_root: PathBuf::from("/a"),
            },
        );
        config.sources.insert(
            "claude".to_string(),
            SourceConfig {
                enabled: false,
                log_root: PathBuf::from("/b"),
            },
        );

        assert_eq!(config.roots(None).len(), 1);
        assert_eq!(config.roots(Some("codex")).len(), 1);
        assert!(config.roots(Some("claude")).is_empty());
    }
}
