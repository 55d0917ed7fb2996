//! Required-column validation.
//!
//! Gates the restructuring engine: a table must carry every column of
//! [`REQUIRED_COLUMNS`]. Extra columns are allowed and pass through untouched.
//!
//! # Example
//!
//! ```rust
//! use rebate_formatter::{validate_columns, Table, REQUIRED_COLUMNS};
//!
//! let table = Table::from_str_rows(&["Rebate Name", "Level"], &[]);
//! let missing = validate_columns(&table, &REQUIRED_COLUMNS);
//! assert_eq!(missing.len(), 5);
//! assert_eq!(missing[0], "Lumpsum - Fee Type");
//! ```

use crate::error::ValidationError;
use crate::models::{Table, REQUIRED_COLUMNS};

/// Return the required columns absent from `table`, in declared order.
///
/// An empty result means the table is valid.
pub fn validate_columns(table: &Table, required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|col| !table.has_column(col))
        .map(|col| col.to_string())
        .collect()
}

/// Check `table` against the fixed rebate column contract.
pub fn validate(table: &Table) -> Result<(), ValidationError> {
    let missing = validate_columns(table, &REQUIRED_COLUMNS);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingColumns { missing })
    }
}

/// Convenience wrapper around [`validate`].
pub fn is_valid(table: &Table) -> bool {
    validate(table).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(columns: &[&str]) -> Table {
        Table::from_str_rows(columns, &[])
    }

    #[test]
    fn test_full_contract_is_valid() {
        let table = table_with(&REQUIRED_COLUMNS);
        assert!(validate_columns(&table, &REQUIRED_COLUMNS).is_empty());
        assert!(is_valid(&table));
    }

    #[test]
    fn test_extra_columns_permitted() {
        let mut cols = vec!["Notes"];
        cols.extend(REQUIRED_COLUMNS.iter().rev());
        cols.push("Region");
        assert!(is_valid(&table_with(&cols)));
    }

    #[test]
    fn test_each_removed_column_is_reported() {
        for removed in REQUIRED_COLUMNS {
            let cols: Vec<&str> = REQUIRED_COLUMNS
                .iter()
                .copied()
                .filter(|c| *c != removed)
                .collect();
            let missing = validate_columns(&table_with(&cols), &REQUIRED_COLUMNS);
            assert_eq!(missing, vec![removed.to_string()]);
        }
    }

    #[test]
    fn test_all_missing_listed_in_contract_order() {
        let table = table_with(&["Lumpsum - Branch", "Other"]);
        let missing = validate_columns(&table, &REQUIRED_COLUMNS);
        assert_eq!(
            missing,
            vec![
                "Rebate Name",
                "Level",
                "Lumpsum - Fee Type",
                "Lumpsum - Amount",
                "Lumpsum - Lumpsum Date",
                "Lumpsum - Pay Date",
            ]
        );
    }

    #[test]
    fn test_empty_column_set() {
        let missing = validate_columns(&Table::default(), &REQUIRED_COLUMNS);
        assert_eq!(missing.len(), REQUIRED_COLUMNS.len());

        match validate(&Table::default()) {
            Err(ValidationError::MissingColumns { missing }) => assert_eq!(missing.len(), 7),
            Ok(()) => panic!("empty table must fail validation"),
        }
    }

    #[test]
    fn test_column_names_are_case_sensitive() {
        let mut cols: Vec<&str> = REQUIRED_COLUMNS.to_vec();
        cols[0] = "rebate name";
        let missing = validate_columns(&table_with(&cols), &REQUIRED_COLUMNS);
        assert_eq!(missing, vec!["Rebate Name".to_string()]);
    }
}
