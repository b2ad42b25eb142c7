use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};

/// The two file attributes that decide whether a cached parse level is
/// still valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub size: u64,
    pub mtime: DateTime<Utc>,
}

/// Filesystem-metadata source, injected so tests can simulate file changes
/// deterministically without touching the real filesystem.
pub trait FileMeta: Send + Sync {
    fn stat(&self, path: &Path) -> io::Result<FileStat>;
}

/// The real thing.
pub struct SystemFileMeta;

impl FileMeta for SystemFileMeta {
    fn stat(&self, path: &Path) -> io::Result<FileStat> {
        let metadata = std::fs::metadata(path)?;
        let mtime = metadata.modified()?;
        Ok(FileStat {
            size: metadata.len(),
            mtime: DateTime::<Utc>::from(mtime),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn system_stat_reports_size() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "hello").unwrap();

        let stat = SystemFileMeta.stat(file.path()).unwrap();
        assert_eq!(stat.size, 5);
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(SystemFileMeta.stat(Path::new("/no/such/file")).is_err());
    }
}
