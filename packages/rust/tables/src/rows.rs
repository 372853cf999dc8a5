//! Typed row extraction from loaded tables.
//!
//! Tables are positional and stringly; these functions lift them into the
//! domain row types. Cell values stay raw apart from whitespace trimming,
//! so matching and rendering can derive keys from the original text.

use coursedocs_shared::{CourseRow, LinkRow, columns};

use crate::Table;

/// Extract course roster rows in table order.
pub fn course_rows(table: &Table) -> Vec<CourseRow> {
    (0..table.len())
        .map(|row| CourseRow {
            level: table.cell(row, columns::NIVEL).trim().to_string(),
            schedule: table.cell(row, columns::HORARIO).trim().to_string(),
            id: clean_id(table.cell(row, columns::ID)),
            category: non_empty(table.cell(row, columns::CATEGORIA)),
        })
        .collect()
}

/// Extract link sheet rows in table order. The level is read from
/// `level_column`; `time` and `category` are populated only when the sheet
/// carries the corresponding column.
pub fn link_rows(table: &Table, level_column: &str) -> Vec<LinkRow> {
    let has_time = table.has_column(columns::HORA);
    let has_category = table.has_column(columns::EDAD);

    (0..table.len())
        .map(|row| LinkRow {
            level: table.cell(row, level_column).trim().to_string(),
            time: has_time.then(|| table.cell(row, columns::HORA).to_string()),
            category: has_category.then(|| table.cell(row, columns::EDAD).to_string()),
            link: table.cell(row, columns::LINK).to_string(),
        })
        .collect()
}

/// Spreadsheet tools export integer id cells as floats. Drop the `.0`
/// suffix so ids read back as they were typed.
fn clean_id(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed.strip_suffix(".0").unwrap_or(trimmed).to_string()
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
