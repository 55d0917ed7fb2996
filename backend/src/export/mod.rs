//! [`Table`] to CSV serialization.
//!
//! Output is always comma-separated with a header row, columns and rows in
//! exactly the order the table holds them.

use std::path::Path;

use crate::error::ExportError;
use crate::models::Table;

/// Serialize `table` into CSV bytes.
pub fn write_table(table: &Table) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Buffer(e.error().to_string()))
}

/// Serialize `table` into a CSV file at `path`.
pub fn write_table_to_path(table: &Table, path: &Path) -> Result<(), ExportError> {
    let bytes = write_table(table)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_table;
    use tempfile::tempdir;

    #[test]
    fn test_header_then_rows_in_order() {
        let table = Table::from_str_rows(&["b", "a"], &[&["2", "1"], &["4", "3"]]);
        let bytes = write_table(&table).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "b,a\n2,1\n4,3\n");
    }

    #[test]
    fn test_values_needing_quotes() {
        let table = Table::from_str_rows(&["Rebate Name", "Note"], &[&["Acme, Inc", "say \"hi\""]]);
        let text = String::from_utf8(write_table(&table).unwrap()).unwrap();
        assert_eq!(text, "Rebate Name,Note\n\"Acme, Inc\",\"say \"\"hi\"\"\"\n");

        let back = parse_table(&text, b',').unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn test_empty_cells_kept() {
        let table = Table::from_str_rows(&["a", "b", "c"], &[&["", "x", ""]]);
        let text = String::from_utf8(write_table(&table).unwrap()).unwrap();
        assert_eq!(text, "a,b,c\n,x,\n");
    }

    #[test]
    fn test_write_to_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let table = Table::from_str_rows(&["a"], &[&["1"]]);
        write_table_to_path(&table, &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\n1\n");
    }
}
