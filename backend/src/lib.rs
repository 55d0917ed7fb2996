//! # Rebate Formatter - Header/Lumpsum restructuring for rebate fee exports
//!
//! Takes flat CSV exports of rebate lumpsum fees and rewrites them so that
//! every rebate gets one synthetic `Header` row followed by its `Lumpsum`
//! detail rows. Lumpsum and pay dates are normalized to `MM/DD/YYYY` along
//! the way.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Parser    │────▶│  Validation │────▶│ Restructure │────▶│ Output CSV  │
//! │  (ISO/UTF8) │     │  (auto-enc) │     │ (7 columns) │     │ (H + L rows)│     │  (storage)  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rebate_formatter::{restructure, validate_columns, Table, REQUIRED_COLUMNS};
//!
//! let table = Table::from_str_rows(
//!     &REQUIRED_COLUMNS,
//!     &[&["X", "", "Flat", "100", "NY", "2024-01-02", ""]],
//! );
//! assert!(validate_columns(&table, &REQUIRED_COLUMNS).is_empty());
//!
//! let out = restructure(table).unwrap();
//! assert_eq!(out.metrics.header_count, 1);
//! assert_eq!(out.table.get(0, "Level"), Some("Header"));
//! assert_eq!(out.table.get(1, "Lumpsum - Lumpsum Date"), Some("01/02/2024"));
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Text table, tiers, metrics and column names
//! - [`parser`] - CSV parsing with encoding and delimiter detection
//! - [`validation`] - Required-column contract
//! - [`transform`] - Dates, grouping, restructuring and the file pipeline
//! - [`export`] - CSV serialization
//! - [`storage`] - Upload and output directories
//! - [`config`] - Environment configuration
//! - [`logging`] - `tracing` setup with a size-rotated log file
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Validation
pub mod validation;

// Transformation
pub mod transform;

// Output
pub mod export;
pub mod storage;

// Runtime
pub mod config;
pub mod logging;

// HTTP API
pub mod api;

pub use transform::pipeline;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, CsvError, ExportError, FileError, RestructureError, ServerError, StorageError,
    ValidationError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    Metrics, Table, Tier, DATE_COLUMNS, DETAIL_COLUMNS, LEVEL_COLUMN, REBATE_NAME_COLUMN,
    REQUIRED_COLUMNS,
};

// =============================================================================
// Re-exports - Parsing and export
// =============================================================================

pub use export::{write_table, write_table_to_path};
pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes_auto, parse_file_auto,
    parse_table, ParseResult,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{is_valid, validate, validate_columns};

// =============================================================================
// Re-exports - Transformation
// =============================================================================

pub use transform::{
    normalize_date, restructure, restructure_with, GroupOrder, RestructureOptions, Restructured,
};

pub use pipeline::{
    process_batch, process_path, process_upload, BatchOutcome, BatchTotals, FileReport,
    ProcessOptions, Upload,
};

// =============================================================================
// Re-exports - Runtime
// =============================================================================

pub use config::AppConfig;
pub use storage::Storage;
