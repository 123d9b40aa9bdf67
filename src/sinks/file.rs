//! File sink

use super::Sink;
use crate::core::{LoggerError, Result};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Appends records to a file through a buffer.
///
/// Buffered records reach the file on [`Sink::flush`] (called by
/// `Logger::flush_underlying`), when the buffer fills, and on drop.
pub struct FileSink {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                LoggerError::io_operation("opening log file", path.display().to_string(), e)
            })?;

        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Sink for FileSink {
    fn write_record(&self, record: &[u8]) -> Result<()> {
        self.writer.lock().write_all(record)?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.writer.lock().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        if let Err(e) = self.writer.get_mut().flush() {
            eprintln!(
                "[LOGGER ERROR] Failed to flush {} on drop: {}",
                self.path.display(),
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_file_sink_appends() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("app.log");

        let sink = FileSink::new(&path)?;
        sink.write_record(b"first\n")?;
        sink.write_record(b"second\n")?;
        sink.flush()?;
        assert_eq!(fs::read_to_string(&path)?, "first\nsecond\n");

        // Reopening appends instead of truncating
        drop(sink);
        let sink = FileSink::new(&path)?;
        sink.write_record(b"third\n")?;
        drop(sink);
        assert_eq!(fs::read_to_string(&path)?.lines().count(), 3);
        Ok(())
    }

    #[test]
    fn test_file_sink_missing_directory() {
        let dir = tempdir().unwrap();
        let result = FileSink::new(dir.path().join("missing").join("app.log"));
        assert!(matches!(result, Err(LoggerError::IoOperation { .. })));
    }
}
