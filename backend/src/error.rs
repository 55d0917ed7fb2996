//! Error types for the rebate formatting pipeline.
//!
//! - [`CsvError`] - CSV reading and parsing errors
//! - [`ValidationError`] - Required-column contract violations
//! - [`RestructureError`] - Structural inconsistencies found by the engine
//! - [`ExportError`] - CSV serialization errors
//! - [`StorageError`] - Upload/output directory errors
//! - [`ConfigError`] - Environment configuration errors
//! - [`FileError`] - Per-file pipeline failure (one upload of a batch)
//! - [`ServerError`] - HTTP-level errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::api::types::error_response;

// =============================================================================
// CSV Parsing Errors
// =============================================================================

/// Errors during CSV decoding and parsing.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed record.
    #[error("Line {line}: {message}")]
    Parse { line: u64, message: String },

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No header row found.
    #[error("No headers found in CSV")]
    NoHeaders,

    /// The same header appears twice.
    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),
}

impl From<csv::Error> for CsvError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        CsvError::Parse {
            line,
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Required-column contract violations.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// One or more required columns are absent. Lists every missing name.
    #[error("Missing required columns: {}", missing.join(", "))]
    MissingColumns { missing: Vec<String> },
}

// =============================================================================
// Restructuring Errors
// =============================================================================

/// Structural inconsistencies detected while restructuring a table.
#[derive(Debug, Error)]
pub enum RestructureError {
    /// A column the engine relies on is not in the table.
    #[error("Column '{0}' is not present in the table")]
    MissingColumn(String),

    /// A row does not have one value per column.
    #[error("Row {row} has {found} values, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while serializing a table to CSV.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV writer error.
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Writer could not be flushed into a buffer.
    #[error("Failed to finalize CSV buffer: {0}")]
    Buffer(String),
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors from the upload/output storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Requested file does not exist.
    #[error("File not found: {0}")]
    NotFound(String),

    /// Output serialization failed.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// IO error.
    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable is set but cannot be interpreted.
    #[error("Invalid value for {key}: '{value}'")]
    Invalid { key: String, value: String },
}

// =============================================================================
// Per-file Pipeline Errors
// =============================================================================

/// Failure of a single uploaded file.
///
/// Each variant is scoped to one input; sibling files in the same batch
/// are processed independently.
#[derive(Debug, Error)]
pub enum FileError {
    /// Extension is not `.csv`.
    #[error("Only CSV files are supported: {0}")]
    UnsupportedType(String),

    /// Upload had no bytes.
    #[error("Uploaded file is empty: {0}")]
    EmptyUpload(String),

    /// Content is not readable CSV.
    #[error("Invalid CSV format for {file}: {source}")]
    Csv {
        file: String,
        #[source]
        source: CsvError,
    },

    /// Required-column contract violated.
    #[error("Missing required columns in {file}: {}", missing.join(", "))]
    MissingColumns { file: String, missing: Vec<String> },

    /// The restructuring engine rejected the table.
    #[error("Failed to process {file}: {source}")]
    Processing {
        file: String,
        #[source]
        source: RestructureError,
    },

    /// Upload could not be stored or output could not be written.
    #[error("Could not write output for {file}: {source}")]
    Output {
        file: String,
        #[source]
        source: StorageError,
    },

    /// The worker task running this file did not complete.
    #[error("Worker for {file} did not complete: {message}")]
    Worker { file: String, message: String },
}

impl FileError {
    /// HTTP status class this failure maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            FileError::UnsupportedType(_) | FileError::EmptyUpload(_) | FileError::Csv { .. } => {
                StatusCode::BAD_REQUEST
            }
            FileError::MissingColumns { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            FileError::Processing { .. } | FileError::Output { .. } | FileError::Worker { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Missing column names, if this is a contract violation.
    pub fn missing_columns(&self) -> Option<&[String]> {
        match self {
            FileError::MissingColumns { missing, .. } => Some(missing),
            _ => None,
        }
    }
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Failed to bind or serve.
    #[error("Server IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for ServerError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(name) => ServerError::NotFound(name),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Internal(_) | ServerError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let detail = match &self {
            ServerError::BadRequest(msg) => msg.clone(),
            ServerError::NotFound(_) => "File not found".to_string(),
            other => other.to_string(),
        };
        (status, Json(error_response(&detail))).into_response()
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for restructuring operations.
pub type RestructureResult<T> = Result<T, RestructureError>;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_lists_every_name() {
        let err = ValidationError::MissingColumns {
            missing: vec!["Level".into(), "Lumpsum - Amount".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("Level"));
        assert!(msg.contains("Lumpsum - Amount"));
    }

    #[test]
    fn test_file_error_status_classes() {
        let missing = FileError::MissingColumns {
            file: "a.csv".into(),
            missing: vec!["Level".into()],
        };
        assert_eq!(missing.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(missing.missing_columns(), Some(&["Level".to_string()][..]));

        let processing = FileError::Processing {
            file: "a.csv".into(),
            source: RestructureError::MissingColumn("Level".into()),
        };
        assert_eq!(processing.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(processing.missing_columns().is_none());

        assert_eq!(
            FileError::EmptyUpload("a.csv".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_bad_request_maps_to_400() {
        let response = ServerError::BadRequest("No files uploaded.".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_storage_not_found_maps_to_404() {
        let err: ServerError = StorageError::NotFound("x.csv".into()).into();
        assert!(matches!(err, ServerError::NotFound(_)));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
