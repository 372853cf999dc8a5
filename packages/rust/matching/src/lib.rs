//! Course-to-link matching for CourseDocs.
//!
//! A link sheet is joined against the course roster by derived keys, never
//! by raw cells. The sheet's columns decide the mode once per batch: an
//! `EDAD` column makes the sheet category-keyed, otherwise an `HORA` column
//! makes it time-keyed, otherwise no matching is possible and every course
//! resolves to the not-found sentinel.

mod normalize;

pub use normalize::{normalize_category, normalize_level, parse_start_time};

use coursedocs_shared::{
    ADULTS_LABEL, CourseRow, KIDS_LABEL, LINK_NOT_FOUND, LinkRow, MISSING_LINK, YOUTH_LABEL,
    columns,
};
use serde::Serialize;

// ---------------------------------------------------------------------------
// MatchMode
// ---------------------------------------------------------------------------

/// How link sheet rows are keyed. Detected once per batch from the sheet's
/// headers and applied to every course row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Sheet rows are keyed by age group (`EDAD` column).
    Category,
    /// Sheet rows are keyed by start time (`HORA` column).
    Time,
    /// The sheet carries neither key column; nothing can match.
    Unknown,
}

impl MatchMode {
    /// Pick the mode from the link sheet's header names. `EDAD` wins over
    /// `HORA` when both are present.
    pub fn detect(headers: &[String]) -> Self {
        if headers.iter().any(|h| h == columns::EDAD) {
            Self::Category
        } else if headers.iter().any(|h| h == columns::HORA) {
            Self::Time
        } else {
            Self::Unknown
        }
    }
}

impl std::fmt::Display for MatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Category => "category",
            Self::Time => "time",
            Self::Unknown => "unknown",
        };
        write!(f, "{name}")
    }
}

/// Level column to read from a link sheet: `NIVEL` when present, `LEVEL`
/// otherwise. This choice is independent of the match mode.
pub fn level_column(headers: &[String]) -> &'static str {
    if headers.iter().any(|h| h == columns::NIVEL) {
        columns::NIVEL
    } else {
        columns::LEVEL
    }
}

// ---------------------------------------------------------------------------
// Matcher
// ---------------------------------------------------------------------------

/// Find the link for one course row: the link cell of the first sheet row
/// whose keys match in sheet order, [`MISSING_LINK`] when that cell is
/// empty, or [`LINK_NOT_FOUND`] when no row matches.
pub fn find_link(course: &CourseRow, links: &[LinkRow], mode: MatchMode) -> String {
    match mode {
        MatchMode::Time => find_by_time(course, links),
        MatchMode::Category => find_by_category(course, links),
        MatchMode::Unknown => LINK_NOT_FOUND.to_string(),
    }
}

fn find_by_time(course: &CourseRow, links: &[LinkRow]) -> String {
    // A course without a parseable start time can never match, even against
    // sheet rows whose time cell is equally unparseable.
    let Some(start) = parse_start_time(&course.schedule) else {
        return LINK_NOT_FOUND.to_string();
    };
    let level = normalize_level(&course.level);

    for link in links {
        let time = link.time.as_deref().unwrap_or("");
        if parse_start_time(time) == Some(start) && normalize_level(&link.level) == level {
            return link_value(link);
        }
    }
    LINK_NOT_FOUND.to_string()
}

fn find_by_category(course: &CourseRow, links: &[LinkRow]) -> String {
    let course_category = normalize_category(course.category.as_deref().unwrap_or(""));
    let level = normalize_level(&course.level);

    for link in links {
        if normalize_level(&link.level) != level {
            continue;
        }
        let link_category = normalize_category(link.category.as_deref().unwrap_or(""));
        if categories_match(&course_category, &link_category) {
            return link_value(link);
        }
    }
    LINK_NOT_FOUND.to_string()
}

/// Category compatibility, most specific rule first: a kids course accepts
/// a `kid` sheet row, a youth course accepts a `joven` sheet row, anything
/// else requires exact equality of the normalized keys.
fn categories_match(course: &str, link: &str) -> bool {
    if course.contains("nino") && link.contains("kid") {
        return true;
    }
    if course.contains("joven") && link.contains("joven") {
        return true;
    }
    course == link
}

fn link_value(link: &LinkRow) -> String {
    if link.link.is_empty() {
        MISSING_LINK.to_string()
    } else {
        link.link.clone()
    }
}

// ---------------------------------------------------------------------------
// Audience label
// ---------------------------------------------------------------------------

/// Audience label for a course row, derived from its category. Kids take
/// precedence over youth when a category names both; rows without a
/// category are adult courses.
pub fn type_label(category: Option<&str>) -> &'static str {
    let key = normalize_category(category.unwrap_or(""));
    if key.contains("nino") {
        KIDS_LABEL
    } else if key.contains("joven") {
        YOUTH_LABEL
    } else {
        ADULTS_LABEL
    }
}
