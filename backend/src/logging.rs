//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! Events go to stdout and to `<log_dir>/app.log`. The file is rotated once
//! it would exceed `max_bytes`, keeping `backups` older files as
//! `app.log.1` (newest) to `app.log.N` (oldest).
//!
//! `RUST_LOG` overrides the default `info` filter.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing_subscriber::{fmt::MakeWriter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::AppConfig;

pub const LOG_FILE_NAME: &str = "app.log";

/// Configuration for logging behavior.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Directory for `app.log`. `None` logs to stdout only.
    pub log_dir: Option<PathBuf>,
    pub max_bytes: u64,
    pub backups: usize,
    /// Filter used when `RUST_LOG` is unset.
    pub default_filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_dir: None,
            max_bytes: crate::config::DEFAULT_LOG_MAX_BYTES,
            backups: crate::config::DEFAULT_LOG_BACKUPS,
            default_filter: "info".to_string(),
        }
    }
}

impl From<&AppConfig> for LogConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            log_dir: Some(config.log_dir.clone()),
            max_bytes: config.log_max_bytes,
            backups: config.log_backups,
            ..Default::default()
        }
    }
}

/// Install the global subscriber. Call once at startup.
///
/// # Errors
///
/// Returns an error if the log directory or file cannot be created.
pub fn init_logging(config: &LogConfig) -> io::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(true);

    let file_layer = match &config.log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let writer = RotatingFileWriter::open(dir.join(LOG_FILE_NAME), config.max_bytes, config.backups)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(writer),
            )
        }
        None => None,
    };

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init();
    Ok(())
}

// =============================================================================
// Size-rotating file writer
// =============================================================================

struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    backups: usize,
    file: File,
    written: u64,
}

impl RotatingFile {
    fn open(path: PathBuf, max_bytes: u64, backups: usize) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            path,
            max_bytes,
            backups,
            file,
            written,
        })
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        if self.backups > 0 {
            for i in (1..self.backups).rev() {
                let from = backup_path(&self.path, i);
                if from.exists() {
                    fs::rename(&from, backup_path(&self.path, i + 1))?;
                }
            }
            fs::rename(&self.path, backup_path(&self.path, 1))?;
        }
        self.file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        self.written = 0;
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.max_bytes > 0 && self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }
}

fn backup_path(path: &Path, index: usize) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".{}", index));
    PathBuf::from(name)
}

/// `MakeWriter` over a shared, size-rotated log file.
#[derive(Clone)]
pub struct RotatingFileWriter {
    inner: Arc<Mutex<RotatingFile>>,
}

impl RotatingFileWriter {
    pub fn open(path: PathBuf, max_bytes: u64, backups: usize) -> io::Result<Self> {
        Ok(Self {
            inner: Arc::new(Mutex::new(RotatingFile::open(path, max_bytes, backups)?)),
        })
    }
}

pub struct RotatingFileGuard {
    inner: Arc<Mutex<RotatingFile>>,
}

impl Write for RotatingFileGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;
        guard.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;
        guard.file.flush()
    }
}

impl<'a> MakeWriter<'a> for RotatingFileWriter {
    type Writer = RotatingFileGuard;

    fn make_writer(&'a self) -> Self::Writer {
        RotatingFileGuard {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_rotation_keeps_backups() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(LOG_FILE_NAME);
        let writer = RotatingFileWriter::open(path.clone(), 10, 2).unwrap();

        for line in ["aaaaaaaa\n", "bbbbbbbb\n", "cccccccc\n", "dddddddd\n"] {
            writer.make_writer().write_all(line.as_bytes()).unwrap();
        }

        assert_eq!(fs::read_to_string(&path).unwrap(), "dddddddd\n");
        assert_eq!(fs::read_to_string(backup_path(&path, 1)).unwrap(), "cccccccc\n");
        assert_eq!(fs::read_to_string(backup_path(&path, 2)).unwrap(), "bbbbbbbb\n");
        assert!(!backup_path(&path, 3).exists());
    }

    #[test]
    fn test_zero_backups_truncates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(LOG_FILE_NAME);
        let writer = RotatingFileWriter::open(path.clone(), 5, 0).unwrap();

        writer.make_writer().write_all(b"first\n").unwrap();
        writer.make_writer().write_all(b"second\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second\n");
        assert!(!backup_path(&path, 1).exists());
    }

    #[test]
    fn test_existing_file_size_counts() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(LOG_FILE_NAME);
        fs::write(&path, "0123456789").unwrap();

        let writer = RotatingFileWriter::open(path.clone(), 12, 1).unwrap();
        writer.make_writer().write_all(b"xyz\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "xyz\n");
        assert_eq!(fs::read_to_string(backup_path(&path, 1)).unwrap(), "0123456789");
    }

    #[test]
    fn test_backup_path() {
        assert_eq!(
            backup_path(Path::new("/var/log/app.log"), 3),
            PathBuf::from("/var/log/app.log.3")
        );
    }
}
