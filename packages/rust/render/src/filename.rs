//! Output file name synthesis.

use std::sync::LazyLock;

use regex::Regex;

/// Characters that are invalid in file names on common filesystems.
static ILLEGAL_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\\/*?:"<>|]"#).expect("illegal chars regex"));

/// Build the `.docx` file name for one course row.
///
/// The raw level is kept verbatim. The schedule keeps its meaning but drops
/// separators (`:`, `/`, spaces) first, so times survive the final
/// illegal-character sweep: `"8:30 A 10:00AM"` becomes `830A1000AM` rather
/// than losing its digits. An appended id keeps rows with identical level
/// and schedule apart.
pub fn build_filename(
    level_raw: &str,
    schedule_raw: &str,
    category_prefix: &str,
    id: Option<&str>,
) -> String {
    let schedule: String = schedule_raw
        .chars()
        .filter(|c| !matches!(c, ':' | ' ' | '/'))
        .collect();

    let mut name = format!("{category_prefix}{level_raw}_{schedule}");
    if let Some(id) = id {
        name.push('_');
        name.push_str(id);
    }
    name.push_str(".docx");

    ILLEGAL_CHARS_RE.replace_all(&name, "").into_owned()
}
