//! Upload and output storage.
//!
//! Raw uploads are kept under `upload_dir` as `<prefix>-<name>`; processed
//! tables are written under `output_dir` as `processed-<prefix>-<name>` and
//! served back by name through [`Storage::resolve_download`].

use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::{StorageError, StorageResult};
use crate::export::write_table_to_path;
use crate::models::Table;

/// Keep only alphanumerics, `-`, `_` and `.`.
///
/// Anything else (path separators included) is dropped. A name with nothing
/// left becomes `upload-<8 hex>.csv`.
pub fn sanitize_filename(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();
    if safe.is_empty() || safe.chars().all(|c| c == '.') {
        format!("upload-{}.csv", unique_prefix())
    } else {
        safe
    }
}

/// Eight hex characters from a random v4 UUID.
pub fn unique_prefix() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Name of the processed file for an upload.
pub fn output_name(prefix: &str, safe_name: &str) -> String {
    format!("processed-{}-{}", prefix, safe_name)
}

/// Directories holding uploads and processed output.
#[derive(Debug, Clone)]
pub struct Storage {
    upload_dir: PathBuf,
    output_dir: PathBuf,
}

impl Storage {
    /// Open storage, creating both directories if needed.
    pub fn new(upload_dir: impl AsRef<Path>, output_dir: impl AsRef<Path>) -> StorageResult<Self> {
        let storage = Self {
            upload_dir: upload_dir.as_ref().to_path_buf(),
            output_dir: output_dir.as_ref().to_path_buf(),
        };
        fs::create_dir_all(&storage.upload_dir)?;
        fs::create_dir_all(&storage.output_dir)?;
        Ok(storage)
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Persist raw upload bytes.
    pub fn save_upload(&self, prefix: &str, safe_name: &str, bytes: &[u8]) -> StorageResult<PathBuf> {
        let path = self.upload_dir.join(format!("{}-{}", prefix, safe_name));
        fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Write a processed table under `name`.
    pub fn write_output(&self, name: &str, table: &Table) -> StorageResult<PathBuf> {
        let path = self.output_dir.join(name);
        write_table_to_path(table, &path)?;
        Ok(path)
    }

    /// Locate a processed file by the name a client asked for.
    ///
    /// The name is sanitized first, so it can never escape `output_dir`.
    pub fn resolve_download(&self, requested: &str) -> StorageResult<PathBuf> {
        let safe = sanitize_filename(requested);
        let path = self.output_dir.join(&safe);
        if path.is_file() {
            Ok(path)
        } else {
            Err(StorageError::NotFound(safe))
        }
    }
}
