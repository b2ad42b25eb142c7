use std::fmt;
use std::path::PathBuf;

/// Result type for loglens-engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the engine layer
#[derive(Debug)]
pub enum Error {
    /// Index store error
    Index(loglens_index::Error),

    /// Ingest layer error
    Ingest(loglens_ingest::Error),

    /// IO operation failed
    Io(std::io::Error),

    /// Session file unreadable or vanished; the session keeps its last
    /// committed parse level
    SourceUnavailable(PathBuf, std::io::Error),

    /// No session matches the given id or prefix
    SessionNotFound(String),

    /// File watcher failed to start or register a root
    Watch(notify::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Index(err) => write!(f, "Index error: {}", err),
            Error::Ingest(err) => write!(f, "Ingest error: {}", err),
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::SourceUnavailable(path, err) => {
                write!(f, "Session file unavailable: {}: {}", path.display(), err)
            }
            Error::SessionNotFound(id) => write!(f, "No session matches '{}'", id),
            Error::Watch(err) => write!(f, "Watcher error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Index(err) => Some(err),
            Error::Ingest(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::SourceUnavailable(_, err) => Some(err),
            Error::SessionNotFound(_) => None,
            Error::Watch(err) => Some(err),
        }
    }
}

impl From<notify::Error> for Error {
    fn from(err: notify::Error) -> Self {
        Error::Watch(err)
    }
}

impl From<loglens_index::Error> for Error {
    fn from(err: loglens_index::Error) -> Self {
        Error::Index(err)
    }
}

impl From<loglens_ingest::Error> for Error {
    fn from(err: loglens_ingest::Error) -> Self {
        Error::Ingest(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}
