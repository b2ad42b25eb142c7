use clap::ValueEnum;
use loglens_types::ParseLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Parse level selector for index commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LevelArg {
    Metadata,
    Preview,
    Full,
}

impl From<LevelArg> for ParseLevel {
    fn from(level: LevelArg) -> Self {
        match level {
            LevelArg::Metadata => ParseLevel::Metadata,
            LevelArg::Preview => ParseLevel::Preview,
            LevelArg::Full => ParseLevel::Full,
        }
    }
}
