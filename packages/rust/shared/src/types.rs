//! Core domain types for CourseDocs batches.

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

/// Column names recognized in input tables. Header cells are upper-cased and
/// trimmed at load time, so lookups against these constants are exact.
pub mod columns {
    /// Course roster level column; also the preferred level column in link
    /// sheets.
    pub const NIVEL: &str = "NIVEL";
    /// Fallback level column in link sheets.
    pub const LEVEL: &str = "LEVEL";
    /// Course roster schedule column.
    pub const HORARIO: &str = "HORARIO";
    /// Course roster id column.
    pub const ID: &str = "ID";
    /// Course roster category column.
    pub const CATEGORIA: &str = "CATEGORIA";
    /// Link sheet start time column.
    pub const HORA: &str = "HORA";
    /// Link sheet age group column.
    pub const EDAD: &str = "EDAD";
    /// Link sheet link column.
    pub const LINK: &str = "LINK";
}

// ---------------------------------------------------------------------------
// Sentinels
// ---------------------------------------------------------------------------

/// Pasted into a document when no link row matches the course row.
pub const LINK_NOT_FOUND: &str = "LINK_NOT_FOUND";

/// Pasted into a document when a link row matches but its link cell is empty.
pub const MISSING_LINK: &str = "MISSING_LINK";

// ---------------------------------------------------------------------------
// Audience labels
// ---------------------------------------------------------------------------

/// Audience label for adult courses. Templates carry this wording, and the
/// renderer rewrites it in place when the course targets another audience.
pub const ADULTS_LABEL: &str = "para adultos";

/// Audience label for kids courses.
pub const KIDS_LABEL: &str = "para niños";

/// Audience label for youth courses.
pub const YOUTH_LABEL: &str = "para jóvenes";

// ---------------------------------------------------------------------------
// CourseRow
// ---------------------------------------------------------------------------

/// One row of the course roster, with raw cell values as they appeared in the
/// table. Derived keys (level code, start time, normalized category) are
/// always recomputed from these fields, never stored.
#[derive(Debug, Clone)]
pub struct CourseRow {
    /// Raw level cell, e.g. `"NIVEL 01"`.
    pub level: String,
    /// Raw schedule cell, e.g. `"8:30 A 10:00AM"`.
    pub schedule: String,
    /// Raw id cell. May be empty; resolution to a display id happens at
    /// render time.
    pub id: String,
    /// Raw category cell, when the roster carries one.
    pub category: Option<String>,
}

// ---------------------------------------------------------------------------
// LinkRow
// ---------------------------------------------------------------------------

/// One row of the link sheet. `time` and `category` are `None` when the
/// sheet does not carry the corresponding column.
#[derive(Debug, Clone)]
pub struct LinkRow {
    /// Raw level cell from the sheet's level column.
    pub level: String,
    /// Raw time cell (`HORA`), present in time-keyed sheets.
    pub time: Option<String>,
    /// Raw category cell (`EDAD`), present in category-keyed sheets.
    pub category: Option<String>,
    /// Raw link cell. Empty means the row has no usable link.
    pub link: String,
}

// ---------------------------------------------------------------------------
// RenderContext
// ---------------------------------------------------------------------------

/// Resolved substitution values for rendering one document.
#[derive(Debug, Clone)]
pub struct RenderContext {
    /// Value for `{{LEVEL}}`: the raw level cell, unmodified.
    pub level: String,
    /// Value for `{{ID}}`: the resolved row identifier.
    pub id: String,
    /// Value for `{{WA_LINK}}`: the matched link or a sentinel.
    pub wa_link: String,
    /// Value for `{{SCHEDULE}}`: days text joined with the raw schedule.
    pub schedule: String,
    /// Audience label, e.g. `"para adultos"`.
    pub type_label: String,
}
