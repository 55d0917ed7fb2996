//! REST API types for the upload page.
//!
//! Field names are snake_case to match the page's JavaScript.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::FileError;
use crate::transform::pipeline::{BatchOutcome, BatchTotals, FileReport};

/// Response to `POST /api/process`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessResponse {
    /// Successfully processed files, in upload order
    pub results: Vec<FileReport>,

    /// Files that failed, in upload order
    pub failures: Vec<FileFailure>,

    /// Sums over `results`
    pub totals: BatchTotals,
}

/// One failed file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileFailure {
    pub file: String,

    /// HTTP status class of the failure (400, 422 or 500)
    pub status: u16,

    pub error: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_columns: Option<Vec<String>>,
}

impl From<&FileError> for FileFailure {
    fn from(err: &FileError) -> Self {
        let file = match err {
            FileError::UnsupportedType(f) | FileError::EmptyUpload(f) => f.clone(),
            FileError::Csv { file, .. }
            | FileError::MissingColumns { file, .. }
            | FileError::Processing { file, .. }
            | FileError::Output { file, .. }
            | FileError::Worker { file, .. } => file.clone(),
        };
        FileFailure {
            file,
            status: err.status().as_u16(),
            error: err.to_string(),
            missing_columns: err.missing_columns().map(<[String]>::to_vec),
        }
    }
}

impl ProcessResponse {
    /// HTTP status for the whole batch.
    ///
    /// 200 when at least one file succeeded (or nothing failed); otherwise
    /// the most severe per-file status.
    pub fn status(&self) -> StatusCode {
        if !self.results.is_empty() || self.failures.is_empty() {
            return StatusCode::OK;
        }
        self.failures
            .iter()
            .map(|f| f.status)
            .max()
            .and_then(|s| StatusCode::from_u16(s).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<BatchOutcome> for ProcessResponse {
    fn from(outcome: BatchOutcome) -> Self {
        let mut results = Vec::new();
        let mut failures = Vec::new();
        for item in outcome.outcomes {
            match item {
                Ok(report) => results.push(report),
                Err(err) => failures.push(FileFailure::from(&err)),
            }
        }
        ProcessResponse {
            results,
            failures,
            totals: outcome.totals,
        }
    }
}

/// Create an error response body
pub fn error_response(detail: &str) -> Value {
    json!({ "detail": detail })
}
