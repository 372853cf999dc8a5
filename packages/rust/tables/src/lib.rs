//! CSV table loading for CourseDocs.
//!
//! Course rosters and link sheets arrive as CSV exports from spreadsheet
//! tools, which take liberties with encoding and row shape. Loading is
//! therefore best-effort: header cells are upper-cased and trimmed so later
//! lookups are exact, short or ragged records are tolerated, unreadable
//! records are skipped with a warning, and files that are not valid UTF-8
//! are decoded as Latin-1.

use std::path::Path;

use coursedocs_shared::{CourseDocsError, Result};
use tracing::{debug, warn};

mod rows;

pub use rows::{course_rows, link_rows};

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// A loaded table: normalized header names plus raw cell values in original
/// row order.
#[derive(Debug, Clone)]
pub struct Table {
    /// Header names, upper-cased and trimmed.
    pub headers: Vec<String>,
    /// Data rows. A row may be shorter than `headers` when the source
    /// record was ragged.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Load a table from a CSV file on disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| CourseDocsError::io(path, e))?;
        let table = Self::parse(&decode_bytes(&bytes))?;
        debug!(
            path = %path.display(),
            columns = table.headers.len(),
            rows = table.rows.len(),
            "loaded table"
        );
        Ok(table)
    }

    /// Parse CSV content into a table. An unreadable header row is fatal;
    /// unreadable data records are skipped with a warning.
    pub fn parse(content: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| CourseDocsError::table(format!("unreadable header row: {e}")))?
            .iter()
            .map(|h| h.trim().to_uppercase())
            .collect();

        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            match record {
                Ok(record) => rows.push(record.iter().map(str::to_string).collect()),
                Err(e) => warn!(row = index, error = %e, "skipping unreadable record"),
            }
        }

        Ok(Self { headers, rows })
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether a column with this (normalized) name exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Position of a column by (normalized) name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell value at `row` under `column`. Returns `""` when the column does
    /// not exist or the row is too short to reach it.
    pub fn cell(&self, row: usize, column: &str) -> &str {
        let Some(col) = self.column_index(column) else {
            return "";
        };
        self.rows
            .get(row)
            .and_then(|cells| cells.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode raw table bytes: UTF-8 when valid, Latin-1 otherwise. Every byte
/// maps to a char in Latin-1, so the fallback cannot fail. A leading UTF-8
/// BOM is dropped so it cannot leak into the first header name.
pub fn decode_bytes(bytes: &[u8]) -> String {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    };
    match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_uppercases_and_trims_headers() {
        let table = Table::parse("nivel , Horario,id\nNIVEL 01,8:30 A 10:00AM,27\n")
            .expect("parse table");
        assert_eq!(table.headers, vec!["NIVEL", "HORARIO", "ID"]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.cell(0, "NIVEL"), "NIVEL 01");
    }

    #[test]
    fn cell_of_missing_column_is_empty() {
        let table = Table::parse("NIVEL\nNIVEL 01\n").expect("parse table");
        assert_eq!(table.cell(0, "HORARIO"), "");
        assert!(!table.has_column("HORARIO"));
    }

    #[test]
    fn ragged_rows_are_tolerated() {
        let table = Table::parse("NIVEL,HORARIO,ID\nNIVEL 01\nNIVEL 02,9:00 A 10:30AM,3\n")
            .expect("parse table");
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, "HORARIO"), "");
        assert_eq!(table.cell(1, "ID"), "3");
    }

    #[test]
    fn cell_out_of_range_row_is_empty() {
        let table = Table::parse("NIVEL\nNIVEL 01\n").expect("parse table");
        assert_eq!(table.cell(5, "NIVEL"), "");
    }

    #[test]
    fn decode_valid_utf8() {
        assert_eq!(decode_bytes("NIVEL,NIÑOS".as_bytes()), "NIVEL,NIÑOS");
    }

    #[test]
    fn decode_latin1_fallback() {
        // "NIÑOS" in Latin-1: Ñ is a single 0xD1 byte, invalid as UTF-8
        let bytes = [b'N', b'I', 0xD1, b'O', b'S'];
        assert_eq!(decode_bytes(&bytes), "NIÑOS");
    }

    #[test]
    fn decode_strips_utf8_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"NIVEL,ID");
        assert_eq!(decode_bytes(&bytes), "NIVEL,ID");
    }

    #[test]
    fn from_path_reads_latin1_file() {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("coursedocs-tables-{nanos}"));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        let path = dir.join("links.csv");

        let mut bytes = b"EDAD,NIVEL,LINK\n".to_vec();
        bytes.extend_from_slice(&[b'N', b'I', 0xD1, b'O', b'S']);
        bytes.extend_from_slice(b",NIVEL 1,https://chat.example/abc\n");
        std::fs::write(&path, bytes).expect("write csv");

        let table = Table::from_path(&path).expect("load table");
        assert_eq!(table.cell(0, "EDAD"), "NIÑOS");
        assert_eq!(table.cell(0, "LINK"), "https://chat.example/abc");

        std::fs::remove_dir_all(&dir).ok();
    }
}
