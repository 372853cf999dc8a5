//! Key normalization for matching.
//!
//! Matching never compares raw cells. Every comparison key is derived from
//! the raw text on demand by the functions here, so cosmetic differences
//! between sheets (prefixes, zero padding, accents, case) cannot break a
//! join.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Matches a `LEVEL`/`NIVEL` prefix and any whitespace after it.
static LEVEL_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:LEVEL|NIVEL)\s*").expect("level prefix regex"));

/// Matches leading zero digits.
static LEADING_ZEROS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0+").expect("leading zeros regex"));

/// Matches the first `H:MM` or `H.MM` fragment in a schedule cell.
static START_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})[:.](\d{2})").expect("start time regex"));

/// Canonical level code: strip a `LEVEL`/`NIVEL` prefix, strip leading
/// zeros, upper-case the remainder. `"NIVEL 01"`, `"Level 1"` and `"1"`
/// all map to `"1"`.
pub fn normalize_level(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_prefix = LEVEL_PREFIX_RE.replace(trimmed, "");
    LEADING_ZEROS_RE.replace(&without_prefix, "").to_uppercase()
}

/// First start time in the text as `(hour, minute)`, or `None` when no
/// `H:MM`/`H.MM` fragment is present. Values are taken as written; there
/// is no range validation.
pub fn parse_start_time(raw: &str) -> Option<(u32, u32)> {
    START_TIME_RE.captures(raw).and_then(|caps| {
        let hour = caps[1].parse().ok()?;
        let minute = caps[2].parse().ok()?;
        Some((hour, minute))
    })
}

/// Canonical category key: decompose accents, keep the ASCII remainder,
/// lower-case, trim. `"NIÑOS"` maps to `"ninos"`, `"Jóvenes"` to
/// `"jovenes"`.
pub fn normalize_category(raw: &str) -> String {
    raw.nfkd()
        .filter(char::is_ascii)
        .collect::<String>()
        .to_lowercase()
        .trim()
        .to_string()
}
