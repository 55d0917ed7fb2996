//! Domain models for the rebate formatting pipeline.
//!
//! - [`Table`] - Column-ordered text table (every cell is a string)
//! - [`Tier`] - Header/Lumpsum classification of an output row
//! - [`Metrics`] - Per-table summary of a restructuring pass
//! - Column contract constants ([`REQUIRED_COLUMNS`], [`DATE_COLUMNS`], ...)

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Column Contract
// =============================================================================

/// Grouping key: one header row per distinct value.
pub const REBATE_NAME_COLUMN: &str = "Rebate Name";

/// Tier column, overwritten with `Header` or `Lumpsum`.
pub const LEVEL_COLUMN: &str = "Level";

/// Columns that must all be present, in declared order.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    REBATE_NAME_COLUMN,
    LEVEL_COLUMN,
    "Lumpsum - Fee Type",
    "Lumpsum - Amount",
    "Lumpsum - Branch",
    "Lumpsum - Lumpsum Date",
    "Lumpsum - Pay Date",
];

/// Columns normalized to `MM/DD/YYYY`.
pub const DATE_COLUMNS: [&str; 2] = ["Lumpsum - Lumpsum Date", "Lumpsum - Pay Date"];

/// Detail-only columns, blanked on header rows.
pub const DETAIL_COLUMNS: [&str; 5] = [
    "Lumpsum - Fee Type",
    "Lumpsum - Amount",
    "Lumpsum - Branch",
    "Lumpsum - Lumpsum Date",
    "Lumpsum - Pay Date",
];

// =============================================================================
// Table
// =============================================================================

/// An ordered text table.
///
/// Each row holds one value per entry of `columns`, positionally aligned.
/// Column order is significant and preserved end-to-end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Column names, in source order.
    pub columns: Vec<String>,
    /// Rows, each aligned with `columns`.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Create a table from column names and rows.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    /// Build a table from string slices. Mostly useful in tests and examples.
    pub fn from_str_rows(columns: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|v| v.to_string()).collect())
                .collect(),
        }
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Value of `column` in row `row`.
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx).map(String::as_str)
    }

    /// All values of one column, in row order.
    pub fn column_values(&self, column: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(column)?;
        Some(
            self.rows
                .iter()
                .map(|r| r.get(idx).map(String::as_str).unwrap_or(""))
                .collect(),
        )
    }
}

// =============================================================================
// Row Tier
// =============================================================================

/// Classification of an output row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    /// Synthetic group row, detail fields blank.
    Header,
    /// Original input row.
    Lumpsum,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Header => "Header",
            Tier::Lumpsum => "Lumpsum",
        }
    }

    /// Sort rank within a group; headers come first.
    pub fn rank(&self) -> u8 {
        match self {
            Tier::Header => 0,
            Tier::Lumpsum => 1,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Metrics
// =============================================================================

/// Summary of one restructuring pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    /// Rows in the input table.
    pub input_rows: usize,
    /// Distinct grouping-key values (empty counts as one value).
    pub distinct_rebates: usize,
    /// Synthetic header rows emitted.
    pub header_count: usize,
    /// Detail rows emitted (every input row).
    pub lumpsum_count: usize,
    /// Rows in the output table.
    pub output_rows: usize,
}
