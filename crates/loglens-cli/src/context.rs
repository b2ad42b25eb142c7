use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use loglens_engine::Engine;
use loglens_index::Database;
use loglens_ingest::{Classifier, ClassifierConfig};
use loglens_types::SourceKind;

use crate::args::Cli;
use crate::config::{Config, resolve_data_dir};
use crate::types::OutputFormat;

/// Everything a handler needs: the resolved configuration and a ready
/// engine over the on-disk store.
pub struct CliContext {
    pub config: Config,
    pub data_dir: PathBuf,
    pub engine: Arc<Engine>,
    pub format: OutputFormat,
}

impl CliContext {
    pub fn init(cli: &Cli) -> Result<Self> {
        let data_dir = resolve_data_dir(cli.data_dir.as_deref())?;
        let config = Config::load_from(&data_dir.join("config.toml"))?;

        let db = Database::open(&data_dir.join("index.db"))
            .with_context(|| format!("Failed to open index at {}", data_dir.display()))?;
        let engine = Arc::new(Engine::new(db, Classifier::new(ClassifierConfig::default())));

        Ok(CliContext {
            config,
            data_dir,
            engine,
            format: cli.format,
        })
    }

    pub fn roots(&self, only: Option<&str>) -> Vec<(SourceKind, PathBuf)> {
        self.config.roots(only)
    }
}
