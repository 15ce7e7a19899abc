//! Log writer module
//!
//! Routes access/info lines and error lines to stdout/stderr or files.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, OnceLock};

/// Global log writer instance
static LOG_WRITER: OnceLock<LogWriter> = OnceLock::new();

/// Log output target
enum LogTarget {
    Stdout,
    Stderr,
    File(Mutex<File>),
}

impl LogTarget {
    fn open(path: Option<&str>, fallback: Self) -> io::Result<Self> {
        match path {
            Some(p) => Ok(Self::File(Mutex::new(open_log_file(p)?))),
            None => Ok(fallback),
        }
    }

    fn write(&self, message: &str) {
        match self {
            Self::Stdout => println!("{message}"),
            Self::Stderr => eprintln!("{message}"),
            Self::File(file) => {
                // A poisoned lock only means another writer panicked mid-line
                let mut f = file.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                let _ = writeln!(f, "{message}");
            }
        }
    }
}

/// Thread-safe log writer
pub struct LogWriter {
    access: LogTarget,
    error: LogTarget,
}

impl LogWriter {
    fn new(access_log_file: Option<&str>, error_log_file: Option<&str>) -> io::Result<Self> {
        Ok(Self {
            access: LogTarget::open(access_log_file, LogTarget::Stdout)?,
            error: LogTarget::open(error_log_file, LogTarget::Stderr)?,
        })
    }

    /// Write to access log (also used for info lines)
    pub fn write_access(&self, message: &str) {
        self.access.write(message);
    }

    /// Write to error log
    pub fn write_error(&self, message: &str) {
        self.error.write(message);
    }
}

/// Open or create a log file for appending
fn open_log_file(path: &str) -> io::Result<File> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path)
}

/// Initialize the global log writer
///
/// Returns error if log files cannot be opened or the writer is already set.
pub fn init(access_log_file: Option<&str>, error_log_file: Option<&str>) -> io::Result<()> {
    let writer = LogWriter::new(access_log_file, error_log_file)?;
    LOG_WRITER.set(writer).map_err(|_| {
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            "Log writer already initialized",
        )
    })
}

/// Get the global log writer, if initialized
pub fn get() -> Option<&'static LogWriter> {
    LOG_WRITER.get()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_targets_append_lines() {
        let dir = tempfile::tempdir().unwrap();
        let access = dir.path().join("logs/access.log");
        let error = dir.path().join("logs/error.log");

        let writer =
            LogWriter::new(Some(access.to_str().unwrap()), Some(error.to_str().unwrap())).unwrap();
        writer.write_access("GET /api/muscles 200");
        writer.write_access("GET /style.css 200");
        writer.write_error("[ERROR] upstream down");

        let access_contents = std::fs::read_to_string(&access).unwrap();
        assert_eq!(access_contents, "GET /api/muscles 200\nGET /style.css 200\n");
        let error_contents = std::fs::read_to_string(&error).unwrap();
        assert_eq!(error_contents, "[ERROR] upstream down\n");
    }
}
