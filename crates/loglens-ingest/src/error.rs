use std::fmt;

/// Result type for loglens-ingest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the ingest layer
#[derive(Debug)]
pub enum Error {
    /// IO operation failed (file unreadable, vanished mid-read)
    Io(std::io::Error),

    /// A whole file failed to decode (individual bad lines are skipped, not
    /// errors)
    Decode(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Decode(err) => write!(f, "Decode error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Decode(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decode(err)
    }
}
