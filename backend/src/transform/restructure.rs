//! The restructuring engine.
//!
//! Turns a flat table of lumpsum rows into a two-tier table:
//!
//! 1. normalize the date columns to `MM/DD/YYYY`
//! 2. synthesize one `Header` row per distinct rebate name
//! 3. tag every input row `Lumpsum` and append it after the headers
//! 4. stable-sort by (rebate group, tier) and keep the input column order
//!
//! The engine is pure: no I/O, no logging, no shared state. It assumes the
//! table already passed [`crate::validation::validate`].
//!
//! # Example
//!
//! ```rust
//! use rebate_formatter::{restructure, Table, REQUIRED_COLUMNS};
//!
//! let table = Table::from_str_rows(
//!     &REQUIRED_COLUMNS,
//!     &[&["X", "", "Flat", "100", "NY", "1/2/2024", "2/1/2024"]],
//! );
//! let out = restructure(table).unwrap();
//! assert_eq!(out.metrics.output_rows, 2);
//! assert_eq!(out.table.rows[0][1], "Header");
//! assert_eq!(out.table.rows[1][5], "01/02/2024");
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::dates::normalize_date;
use super::grouper::{synthesize_headers, Groups};
use crate::error::{RestructureError, RestructureResult};
use crate::models::{Metrics, Table, Tier, DATE_COLUMNS, DETAIL_COLUMNS, LEVEL_COLUMN, REBATE_NAME_COLUMN};

/// How groups are ordered relative to each other in the output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupOrder {
    /// Groups appear in the order their rebate name first occurs.
    #[default]
    FirstSeen,
    /// Groups are sorted by rebate name, byte-wise ascending.
    Lexical,
}

impl FromStr for GroupOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first-seen" | "first_seen" | "firstseen" => Ok(GroupOrder::FirstSeen),
            "lexical" | "alphabetical" => Ok(GroupOrder::Lexical),
            other => Err(format!("unknown group order '{}'", other)),
        }
    }
}

impl fmt::Display for GroupOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupOrder::FirstSeen => f.write_str("first-seen"),
            GroupOrder::Lexical => f.write_str("lexical"),
        }
    }
}

/// Options for [`restructure_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestructureOptions {
    pub order: GroupOrder,
}

/// Output of one restructuring pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restructured {
    /// Header and lumpsum rows, input column order.
    pub table: Table,
    pub metrics: Metrics,
}

/// Restructure `table` with default options (first-seen group order).
pub fn restructure(table: Table) -> RestructureResult<Restructured> {
    restructure_with(table, &RestructureOptions::default())
}

/// Restructure `table`.
pub fn restructure_with(
    mut table: Table,
    options: &RestructureOptions,
) -> RestructureResult<Restructured> {
    let width = table.columns.len();
    for (row, values) in table.rows.iter().enumerate() {
        if values.len() != width {
            return Err(RestructureError::RaggedRow {
                row,
                expected: width,
                found: values.len(),
            });
        }
    }

    let key_idx = require(&table, REBATE_NAME_COLUMN)?;
    let level_idx = require(&table, LEVEL_COLUMN)?;

    normalize_dates(&mut table);

    let input_rows = table.rows.len();
    let groups = Groups::build(&table.rows, key_idx);

    let blank_idxs: Vec<usize> = DETAIL_COLUMNS
        .iter()
        .filter_map(|c| table.column_index(c))
        .collect();
    let headers = synthesize_headers(&table.rows, &groups, level_idx, &blank_idxs);
    let header_count = headers.len();

    let Table { columns, rows } = table;
    let mut merged: Vec<(Tier, Vec<String>)> = Vec::with_capacity(header_count + input_rows);
    merged.extend(headers.into_iter().map(|row| (Tier::Header, row)));
    merged.extend(rows.into_iter().map(|mut row| {
        row[level_idx] = Tier::Lumpsum.as_str().to_string();
        (Tier::Lumpsum, row)
    }));

    // Vec::sort_by is stable: rows with equal (group, tier) keep merge order.
    match options.order {
        GroupOrder::FirstSeen => merged.sort_by(|(ta, a), (tb, b)| {
            let ra = groups.rank_of(&a[key_idx]);
            let rb = groups.rank_of(&b[key_idx]);
            ra.cmp(&rb).then_with(|| ta.rank().cmp(&tb.rank()))
        }),
        GroupOrder::Lexical => merged.sort_by(|(ta, a), (tb, b)| {
            match a[key_idx].cmp(&b[key_idx]) {
                Ordering::Equal => ta.rank().cmp(&tb.rank()),
                other => other,
            }
        }),
    }

    let rows: Vec<Vec<String>> = merged.into_iter().map(|(_, row)| row).collect();
    let metrics = Metrics {
        input_rows,
        distinct_rebates: groups.len(),
        header_count,
        lumpsum_count: input_rows,
        output_rows: rows.len(),
    };

    // Rows were never re-keyed, so `columns` is still the input order.
    Ok(Restructured {
        table: Table { columns, rows },
        metrics,
    })
}

/// Normalize every present date column in place. Absent columns are skipped.
pub fn normalize_dates(table: &mut Table) {
    let idxs: Vec<usize> = DATE_COLUMNS
        .iter()
        .filter_map(|c| table.column_index(c))
        .collect();
    for row in &mut table.rows {
        for &idx in &idxs {
            if let Some(cell) = row.get_mut(idx) {
                *cell = normalize_date(cell);
            }
        }
    }
}

fn require(table: &Table, column: &str) -> RestructureResult<usize> {
    table
        .column_index(column)
        .ok_or_else(|| RestructureError::MissingColumn(column.to_string()))
}
