//! Per-file and batch processing around the restructuring engine.
//!
//! For every uploaded file:
//! 1. sanitize the name and reject non-CSV or empty uploads
//! 2. store the raw upload
//! 3. parse it into a text [`Table`]
//! 4. check the required-column contract
//! 5. restructure and write the result to the output directory
//!
//! A failure in any step is scoped to that file; the rest of a batch keeps
//! going.
//!
//! # Example
//!
//! ```rust,ignore
//! use rebate_formatter::pipeline::{process_batch, ProcessOptions, Upload};
//!
//! let outcome = process_batch(&storage, ProcessOptions::default(), uploads).await;
//! println!("{} files, {} headers", outcome.totals.files_processed, outcome.totals.total_headers);
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;

use super::restructure::{restructure_with, GroupOrder, RestructureOptions, Restructured};
use crate::api::logs::{log_error, log_info, log_info_indent, log_success, log_warning};
use crate::error::FileError;
use crate::export::write_table_to_path;
use crate::models::{Metrics, Table, REQUIRED_COLUMNS};
use crate::parser::{format_delimiter, parse_bytes_auto};
use crate::storage::{output_name, sanitize_filename, unique_prefix, Storage};
use crate::validation::validate_columns;

/// Name used when an upload carries no filename.
pub const DEFAULT_UPLOAD_NAME: &str = "input.csv";

/// Options for the processing pipeline
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ProcessOptions {
    /// Relative order of rebate groups in the output
    pub order: GroupOrder,
}

impl ProcessOptions {
    fn restructure_options(&self) -> RestructureOptions {
        RestructureOptions { order: self.order }
    }
}

/// One uploaded file.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

/// Successful processing of one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReport {
    pub input_file: String,
    pub output_file: String,
    pub download_url: String,
    pub size_bytes: usize,
    pub elapsed_ms: f64,
    #[serde(flatten)]
    pub metrics: Metrics,
}

/// Sums over the successful files of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchTotals {
    pub files_processed: usize,
    pub total_headers: usize,
    pub total_lumpsum: usize,
    pub total_output_rows: usize,
}

impl BatchTotals {
    pub fn from_reports<'a>(reports: impl IntoIterator<Item = &'a FileReport>) -> Self {
        reports.into_iter().fold(Self::default(), |mut acc, r| {
            acc.files_processed += 1;
            acc.total_headers += r.metrics.header_count;
            acc.total_lumpsum += r.metrics.lumpsum_count;
            acc.total_output_rows += r.metrics.output_rows;
            acc
        })
    }
}

/// Result of one file within a batch.
pub type FileOutcome = Result<FileReport, FileError>;

/// Result of a whole batch, in upload order.
#[derive(Debug)]
pub struct BatchOutcome {
    pub outcomes: Vec<FileOutcome>,
    pub totals: BatchTotals,
}

impl BatchOutcome {
    pub fn reports(&self) -> impl Iterator<Item = &FileReport> {
        self.outcomes.iter().filter_map(|o| o.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileError> {
        self.outcomes.iter().filter_map(|o| o.as_ref().err())
    }
}

/// Parse, validate and restructure raw CSV bytes for the file `name`.
pub fn restructure_bytes(
    name: &str,
    bytes: &[u8],
    options: &ProcessOptions,
) -> Result<Restructured, FileError> {
    let parsed = parse_bytes_auto(bytes).map_err(|source| {
        log_error(format!("CSV read failed for file={}: {}", name, source));
        FileError::Csv {
            file: name.to_string(),
            source,
        }
    })?;
    log_info_indent(
        format!(
            "Parsed {} rows, {} columns (encoding {}, delimiter '{}')",
            parsed.table.len(),
            parsed.table.columns.len(),
            parsed.encoding,
            format_delimiter(parsed.delimiter)
        ),
        1,
    );

    let missing = validate_columns(&parsed.table, &REQUIRED_COLUMNS);
    if !missing.is_empty() {
        log_warning(format!(
            "Validation failed for file={} missing_columns={:?}",
            name, missing
        ));
        return Err(FileError::MissingColumns {
            file: name.to_string(),
            missing,
        });
    }

    restructure_with(parsed.table, &options.restructure_options()).map_err(|source| {
        log_error(format!("Processing failed for file={}: {}", name, source));
        FileError::Processing {
            file: name.to_string(),
            source,
        }
    })
}

/// Process one uploaded file end to end.
pub fn process_upload(
    storage: &Storage,
    options: &ProcessOptions,
    filename: Option<&str>,
    bytes: &[u8],
) -> Result<FileReport, FileError> {
    let started = Instant::now();
    let safe_name = sanitize_filename(filename.unwrap_or(DEFAULT_UPLOAD_NAME));

    if !safe_name.to_lowercase().ends_with(".csv") {
        log_warning(format!("Rejected non-CSV upload: {}", safe_name));
        return Err(FileError::UnsupportedType(safe_name));
    }
    if bytes.is_empty() {
        log_warning(format!("Rejected empty upload: {}", safe_name));
        return Err(FileError::EmptyUpload(safe_name));
    }

    let prefix = unique_prefix();
    storage
        .save_upload(&prefix, &safe_name, bytes)
        .map_err(|source| FileError::Output {
            file: safe_name.clone(),
            source,
        })?;
    log_info(format!(
        "Uploaded file saved: name={} size_bytes={}",
        safe_name,
        bytes.len()
    ));

    let result = restructure_bytes(&safe_name, bytes, options)?;

    let output_file = output_name(&prefix, &safe_name);
    storage
        .write_output(&output_file, &result.table)
        .map_err(|source| {
            log_error(format!("Output write failed for file={}: {}", safe_name, source));
            FileError::Output {
                file: safe_name.clone(),
                source,
            }
        })?;

    let elapsed_ms = round_ms(started.elapsed().as_secs_f64() * 1000.0);
    log_success(format!(
        "File processed successfully file={} output={} rows_in={} rows_out={} elapsed_ms={}",
        safe_name, output_file, result.metrics.input_rows, result.metrics.output_rows, elapsed_ms
    ));

    Ok(FileReport {
        download_url: format!("/api/download/{}", output_file),
        input_file: safe_name,
        output_file,
        size_bytes: bytes.len(),
        elapsed_ms,
        metrics: result.metrics,
    })
}

/// Process every upload independently, each on a blocking worker.
///
/// Outcomes keep upload order; totals cover successful files only.
pub async fn process_batch(
    storage: &Storage,
    options: ProcessOptions,
    uploads: Vec<Upload>,
) -> BatchOutcome {
    log_info(format!("Processing batch of {} file(s)", uploads.len()));

    let tasks = uploads.into_iter().map(|upload| {
        let storage = storage.clone();
        let label = upload.filename.clone().unwrap_or_else(|| DEFAULT_UPLOAD_NAME.to_string());
        async move {
            let handle = tokio::task::spawn_blocking(move || {
                process_upload(&storage, &options, upload.filename.as_deref(), &upload.bytes)
            });
            match handle.await {
                Ok(outcome) => outcome,
                Err(e) => Err(FileError::Worker {
                    file: label,
                    message: e.to_string(),
                }),
            }
        }
    });

    let outcomes = futures::future::join_all(tasks).await;
    let totals = BatchTotals::from_reports(outcomes.iter().filter_map(|o| o.as_ref().ok()));

    log_info(format!(
        "Batch done: {} succeeded, {} failed",
        totals.files_processed,
        outcomes.len() - totals.files_processed
    ));

    BatchOutcome { outcomes, totals }
}

/// Restructure a CSV file on disk into `output`.
pub fn process_path(input: &Path, output: &Path, options: &ProcessOptions) -> Result<Metrics, FileError> {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_UPLOAD_NAME.to_string());

    let bytes = std::fs::read(input).map_err(|e| FileError::Csv {
        file: name.clone(),
        source: e.into(),
    })?;
    if bytes.is_empty() {
        return Err(FileError::EmptyUpload(name));
    }

    let result = restructure_bytes(&name, &bytes, options)?;
    write_output_file(&name, output, &result.table)?;
    log_success(format!(
        "Wrote {} ({} rows)",
        output.display(),
        result.metrics.output_rows
    ));
    Ok(result.metrics)
}

fn write_output_file(name: &str, output: &Path, table: &Table) -> Result<(), FileError> {
    write_table_to_path(table, output).map_err(|e| FileError::Output {
        file: name.to_string(),
        source: e.into(),
    })
}

fn round_ms(ms: f64) -> f64 {
    (ms * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_table;
    use axum::http::StatusCode;
    use tempfile::tempdir;

    const GOOD_CSV: &str = "\
Rebate Name,Level,Lumpsum - Fee Type,Lumpsum - Amount,Lumpsum - Branch,Lumpsum - Lumpsum Date,Lumpsum - Pay Date
X,,Flat,100,NY,1/2/2024,2/1/2024
X,,Pct,5,NY,1/3/2024,2/2/2024
Y,,Flat,50,LA,bad,
";

    fn storage() -> (tempfile::TempDir, Storage) {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("uploads"), dir.path().join("output")).unwrap();
        (dir, storage)
    }

    #[test]
    fn test_process_upload_writes_output() {
        let (_dir, storage) = storage();
        let report =
            process_upload(&storage, &ProcessOptions::default(), Some("fees.csv"), GOOD_CSV.as_bytes()).unwrap();

        assert_eq!(report.input_file, "fees.csv");
        assert!(report.output_file.starts_with("processed-"));
        assert!(report.output_file.ends_with("-fees.csv"));
        assert_eq!(report.download_url, format!("/api/download/{}", report.output_file));
        assert_eq!(report.size_bytes, GOOD_CSV.len());
        assert_eq!(report.metrics.output_rows, 5);

        let written = std::fs::read_to_string(storage.output_dir().join(&report.output_file)).unwrap();
        let table = parse_table(&written, b',').unwrap();
        assert_eq!(table.columns.len(), 7);
        assert_eq!(table.get(0, "Level"), Some("Header"));
        assert_eq!(table.get(1, "Lumpsum - Lumpsum Date"), Some("01/02/2024"));
        assert_eq!(table.get(4, "Lumpsum - Lumpsum Date"), Some(""));

        let uploads: Vec<_> = std::fs::read_dir(storage.upload_dir()).unwrap().collect();
        assert_eq!(uploads.len(), 1);
    }

    #[test]
    fn test_report_json_is_flat() {
        let (_dir, storage) = storage();
        let report =
            process_upload(&storage, &ProcessOptions::default(), Some("fees.csv"), GOOD_CSV.as_bytes()).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["input_rows"], 3);
        assert_eq!(json["distinct_rebates"], 2);
        assert_eq!(json["header_count"], 2);
        assert_eq!(json["lumpsum_count"], 3);
        assert_eq!(json["output_rows"], 5);
        assert!(json.get("metrics").is_none());
    }

    #[test]
    fn test_missing_filename_defaults() {
        let (_dir, storage) = storage();
        let report = process_upload(&storage, &ProcessOptions::default(), None, GOOD_CSV.as_bytes()).unwrap();
        assert_eq!(report.input_file, DEFAULT_UPLOAD_NAME);
    }

    #[test]
    fn test_non_csv_rejected() {
        let (_dir, storage) = storage();
        let err = process_upload(&storage, &ProcessOptions::default(), Some("fees.xlsx"), b"x").unwrap_err();
        assert!(matches!(err, FileError::UnsupportedType(ref n) if n == "fees.xlsx"));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_empty_upload_rejected() {
        let (_dir, storage) = storage();
        let err = process_upload(&storage, &ProcessOptions::default(), Some("fees.csv"), b"").unwrap_err();
        assert!(matches!(err, FileError::EmptyUpload(_)));
    }

    #[test]
    fn test_missing_columns_listed() {
        let (_dir, storage) = storage();
        let csv = "Rebate Name,Lumpsum - Amount\nX,1\n";
        let err = process_upload(&storage, &ProcessOptions::default(), Some("a.csv"), csv.as_bytes()).unwrap_err();

        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            err.missing_columns().unwrap(),
            &[
                "Level",
                "Lumpsum - Fee Type",
                "Lumpsum - Branch",
                "Lumpsum - Lumpsum Date",
                "Lumpsum - Pay Date",
            ]
        );
        assert_eq!(std::fs::read_dir(storage.output_dir()).unwrap().count(), 0);
    }

    #[test]
    fn test_malformed_csv_is_bad_request() {
        let (_dir, storage) = storage();
        let csv = "a,b\n1,2,3\n";
        let err = process_upload(&storage, &ProcessOptions::default(), Some("a.csv"), csv.as_bytes()).unwrap_err();
        assert!(matches!(err, FileError::Csv { .. }));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_lexical_option_applies() {
        let csv = "\
Rebate Name,Level,Lumpsum - Fee Type,Lumpsum - Amount,Lumpsum - Branch,Lumpsum - Lumpsum Date,Lumpsum - Pay Date
B,,f,1,x,,
A,,f,2,x,,
";
        let options = ProcessOptions { order: GroupOrder::Lexical };
        let result = restructure_bytes("a.csv", csv.as_bytes(), &options).unwrap();
        assert_eq!(result.table.get(0, "Rebate Name"), Some("A"));

        let result = restructure_bytes("a.csv", csv.as_bytes(), &ProcessOptions::default()).unwrap();
        assert_eq!(result.table.get(0, "Rebate Name"), Some("B"));
    }

    #[tokio::test]
    async fn test_batch_isolates_failures() {
        let (_dir, storage) = storage();
        let uploads = vec![
            Upload { filename: Some("good.csv".into()), bytes: GOOD_CSV.as_bytes().to_vec() },
            Upload { filename: Some("bad.csv".into()), bytes: b"Rebate Name\nX\n".to_vec() },
            Upload { filename: Some("good2.csv".into()), bytes: GOOD_CSV.as_bytes().to_vec() },
        ];

        let outcome = process_batch(&storage, ProcessOptions::default(), uploads).await;

        assert_eq!(outcome.outcomes.len(), 3);
        assert!(outcome.outcomes[0].is_ok());
        assert!(matches!(outcome.outcomes[1], Err(FileError::MissingColumns { .. })));
        assert_eq!(outcome.outcomes[2].as_ref().unwrap().input_file, "good2.csv");
        assert_eq!(outcome.failures().count(), 1);
        assert_eq!(
            outcome.totals,
            BatchTotals {
                files_processed: 2,
                total_headers: 4,
                total_lumpsum: 6,
                total_output_rows: 10,
            }
        );
    }

    #[test]
    fn test_process_path() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.csv");
        let output = dir.path().join("out.csv");
        std::fs::write(&input, GOOD_CSV).unwrap();

        let metrics = process_path(&input, &output, &ProcessOptions::default()).unwrap();
        assert_eq!(metrics.output_rows, 5);
        assert!(output.exists());
    }

    #[test]
    fn test_round_ms() {
        assert_eq!(round_ms(1.23456), 1.23);
        assert_eq!(round_ms(0.0), 0.0);
    }
}
