//! CSV to [`Table`] parser with encoding and delimiter auto-detection.
//!
//! Every cell is read as text: no type inference, no NA markers, column
//! order exactly as in the header line.

use std::collections::HashSet;
use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::models::Table;

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Parsed table
    pub table: Table,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: u8,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding.
///
/// Latin-1 labels decode through the WHATWG `windows-1252` table, which
/// matches ISO-8859-1 on `0xA0..=0xFF`. Invalid UTF-8 is decoded lossily.
/// A leading byte order mark is dropped so it never sticks to the first
/// column name.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8(bytes.to_vec())
            .unwrap_or_else(|_| String::from_utf8_lossy(bytes).into_owned()),
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()
        }
        _ => {
            // Fallback: try UTF-8 with lossy conversion
            String::from_utf8_lossy(bytes).into_owned()
        }
    };
    match decoded.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => decoded,
    }
}

/// Detect the delimiter by counting occurrences in the first line.
///
/// Falls back to `,` when the header has no candidate separator.
pub fn detect_delimiter(content: &str) -> u8 {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [b',', b';', b'\t', b'|'];
    let mut best_sep = b',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.bytes().filter(|&b| b == sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV text with an explicit delimiter.
///
/// Short rows are padded with empty cells; rows longer than the header are
/// rejected. Blank lines are skipped.
///
/// # Example
/// ```
/// use rebate_formatter::parse_table;
///
/// let table = parse_table("name,age\nAlice,30\nBob,", b',').unwrap();
///
/// assert_eq!(table.columns, vec!["name", "age"]);
/// assert_eq!(table.get(0, "name"), Some("Alice"));
/// assert_eq!(table.get(1, "age"), Some(""));
/// ```
pub fn parse_table(content: &str, delimiter: u8) -> CsvResult<Table> {
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if columns.is_empty() || columns.iter().all(|c| c.trim().is_empty()) {
        return Err(CsvError::NoHeaders);
    }

    let mut seen = HashSet::new();
    for col in &columns {
        if !seen.insert(col.as_str()) {
            return Err(CsvError::DuplicateColumn(col.clone()));
        }
    }

    let width = columns.len();
    let mut rows = Vec::new();

    for record in reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) && record.len() <= 1 {
            continue;
        }
        if record.len() > width {
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            return Err(CsvError::Parse {
                line,
                message: format!("expected {} fields, saw {}", width, record.len()),
            });
        }

        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        row.resize(width, String::new());
        rows.push(row);
    }

    Ok(Table::new(columns, rows))
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> CsvResult<ParseResult> {
    if bytes.is_empty() {
        return Err(CsvError::EmptyFile);
    }

    // Valid UTF-8 wins; chardet guesses poorly on mostly-ASCII input
    let encoding = match std::str::from_utf8(bytes) {
        Ok(_) => "utf-8".to_string(),
        Err(_) => detect_encoding(bytes),
    };

    // Decode content
    let content = decode_content(bytes, &encoding);

    // Detect delimiter
    let delimiter = detect_delimiter(&content);

    let table = parse_table(&content, delimiter)?;
    Ok(ParseResult {
        table,
        encoding,
        delimiter,
    })
}

/// Parse a CSV file with auto-detection of encoding and delimiter.
pub fn parse_file_auto<P: AsRef<Path>>(path: P) -> CsvResult<ParseResult> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}

/// Printable form of a delimiter byte.
pub fn format_delimiter(d: u8) -> String {
    match d {
        b'\t' => "\\t".to_string(),
        c => (c as char).to_string(),
    }
}
