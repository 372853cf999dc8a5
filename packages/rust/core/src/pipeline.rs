//! End-to-end `generate` pipeline: tables in, one rendered document per
//! course row out, streamed into an archive sink.

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use tracing::{info, instrument, warn};

use coursedocs_archive::ZipSink;
use coursedocs_matching::{MatchMode, find_link, level_column, normalize_category, type_label};
use coursedocs_render::{RenderRules, Template, build_filename};
use coursedocs_shared::{
    CourseDocsError, CourseRow, GenerateOptions, LinkRow, RenderContext, Result,
};
use coursedocs_tables::{Table, course_rows, link_rows};

/// Configuration for the `generate` pipeline.
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    /// Course roster CSV.
    pub courses_path: PathBuf,
    /// Link sheet CSV.
    pub links_path: PathBuf,
    /// .docx template.
    pub template_path: PathBuf,
    /// Merged runtime options.
    pub options: GenerateOptions,
}

/// A warning recorded for one course row that could not be processed.
#[derive(Debug, Clone, Serialize)]
pub struct RowWarning {
    /// Zero-based row index in roster order.
    pub row: usize,
    pub message: String,
}

/// Result of the `generate` pipeline.
#[derive(Debug)]
pub struct GenerateResult {
    /// Match mode detected from the link sheet.
    pub mode: MatchMode,
    /// Course rows seen.
    pub rows_total: usize,
    /// Documents rendered and handed to the sink.
    pub files_created: usize,
    /// Per-row failures, in roster order.
    pub warnings: Vec<RowWarning>,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

// ---------------------------------------------------------------------------
// Pipeline boundaries
// ---------------------------------------------------------------------------

/// Destination for rendered documents.
pub trait DocumentSink {
    /// Accept one named document.
    fn accept(&mut self, name: &str, bytes: &[u8]) -> Result<()>;
}

impl<W: std::io::Write + std::io::Seek> DocumentSink for ZipSink<W> {
    fn accept(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        self.add(name, bytes)
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each course row is rendered.
    fn row_rendered(&self, current: usize, total: usize, filename: &str);
    /// Called when the pipeline completes.
    fn done(&self, result: &GenerateResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn row_rendered(&self, _current: usize, _total: usize, _filename: &str) {}
    fn done(&self, _result: &GenerateResult) {}
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Run the full `generate` pipeline.
///
/// 1. Load the course roster and link sheet
/// 2. Load and validate the template, compile the rewrite rules
/// 3. Detect the match mode from the link sheet's headers
/// 4. Render one document per course row, in roster order
/// 5. Stream each document into the sink
///
/// A failing row is recorded as a warning and the batch continues. Only
/// missing inputs, an unreadable table or template, and an invalid anchor
/// pattern stop the batch.
#[instrument(skip_all, fields(
    courses = %config.courses_path.display(),
    links = %config.links_path.display(),
))]
pub fn generate(
    config: &GenerateConfig,
    sink: &mut dyn DocumentSink,
    progress: &dyn ProgressReporter,
) -> Result<GenerateResult> {
    let start = Instant::now();

    // --- Phase 1: Inputs ---
    progress.phase("Loading tables");
    ensure_exists(&config.courses_path, "course roster")?;
    ensure_exists(&config.links_path, "link sheet")?;
    ensure_exists(&config.template_path, "template")?;

    let courses_table = Table::from_path(&config.courses_path)?;
    let links_table = Table::from_path(&config.links_path)?;

    progress.phase("Loading template");
    let template = Template::from_path(&config.template_path)?;
    let rules = RenderRules::new(&config.options)?;

    // --- Phase 2: Match mode ---
    let mode = MatchMode::detect(&links_table.headers);
    let level_col = level_column(&links_table.headers);
    info!(%mode, level_column = level_col, "match mode detected");
    if mode == MatchMode::Unknown {
        warn!("link sheet has neither EDAD nor HORA column; no row can match");
    }

    let links = link_rows(&links_table, level_col);
    let courses = course_rows(&courses_table);

    // --- Phase 3: Render rows ---
    progress.phase("Rendering documents");
    let total = courses.len();
    let mut files_created = 0usize;
    let mut warnings = Vec::new();

    for (index, course) in courses.iter().enumerate() {
        let outcome = render_row(index, course, &links, mode, &template, &rules, &config.options)
            .and_then(|(filename, bytes)| {
                sink.accept(&filename, &bytes)?;
                Ok(filename)
            });

        match outcome {
            Ok(filename) => {
                files_created += 1;
                progress.row_rendered(index + 1, total, &filename);
            }
            Err(e) => {
                warn!(row = index, error = %e, "row failed, continuing");
                warnings.push(RowWarning {
                    row: index,
                    message: e.to_string(),
                });
            }
        }
    }

    let result = GenerateResult {
        mode,
        rows_total: total,
        files_created,
        warnings,
        elapsed: start.elapsed(),
    };
    progress.done(&result);

    info!(
        rows = result.rows_total,
        files_created = result.files_created,
        warnings = result.warnings.len(),
        elapsed_ms = result.elapsed.as_millis(),
        "generate pipeline complete"
    );

    Ok(result)
}

/// Render one course row to a named document.
fn render_row(
    index: usize,
    course: &CourseRow,
    links: &[LinkRow],
    mode: MatchMode,
    template: &Template,
    rules: &RenderRules,
    options: &GenerateOptions,
) -> Result<(String, Vec<u8>)> {
    let row_id = resolve_row_id(&course.id, index);
    let wa_link = find_link(course, links, mode);
    let label = type_label(course.category.as_deref());

    let context = RenderContext {
        level: course.level.clone(),
        id: row_id,
        wa_link,
        schedule: format!("{} / {}", options.days_text, course.schedule),
        type_label: label.to_string(),
    };
    let bytes = template.render(&context, rules)?;

    let prefix = category_prefix(mode, course);
    let id_suffix = options.unique_ids.then_some(context.id.as_str());
    let filename = build_filename(&course.level, &course.schedule, &prefix, id_suffix);

    Ok((filename, bytes))
}

/// Row id for rendering: the cleaned id cell, or a positional fallback for
/// rows without one. `"nan"` is what float-typed empty cells read back as
/// after a spreadsheet export.
fn resolve_row_id(raw: &str, index: usize) -> String {
    if raw.is_empty() || raw == "nan" {
        format!("Row{index}")
    } else {
        raw.to_string()
    }
}

/// File name prefix carrying the category in category-keyed batches, so
/// sibling audiences with the same level and schedule stay distinct.
fn category_prefix(mode: MatchMode, course: &CourseRow) -> String {
    if mode != MatchMode::Category {
        return String::new();
    }
    match course.category.as_deref() {
        Some(category) => format!("{}_", normalize_category(category).to_uppercase()),
        None => String::new(),
    }
}

fn ensure_exists(path: &Path, what: &str) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(CourseDocsError::config(format!(
            "{what} not found at {}",
            path.display()
        )))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use coursedocs_render::extract_text;
    use docx_rs::{Docx, Paragraph, Run};

    fn temp_dir(name: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("coursedocs-{name}-{nanos}"));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).expect("write file");
        path
    }

    fn write_template(dir: &Path, paragraphs: &[&str]) -> PathBuf {
        let mut docx = Docx::new();
        for text in paragraphs {
            docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*text)));
        }
        let path = dir.join("template.docx");
        let file = std::fs::File::create(&path).expect("create template");
        docx.build().pack(file).expect("pack template");
        path
    }

    fn options() -> GenerateOptions {
        GenerateOptions {
            date_text: "24 de febrero de 2026".into(),
            days_text: "TUESDAY TO FRIDAY".into(),
            anchor_pattern: r"(?i)24 de \w+ de 2025".into(),
            unique_ids: false,
        }
    }

    fn make_config(dir: &Path, courses: &str, links: &str, template: &[&str]) -> GenerateConfig {
        GenerateConfig {
            courses_path: write_file(dir, "courses.csv", courses),
            links_path: write_file(dir, "links.csv", links),
            template_path: write_template(dir, template),
            options: options(),
        }
    }

    #[derive(Default)]
    struct MemorySink {
        docs: Vec<(String, Vec<u8>)>,
        fail_on: Option<String>,
    }

    impl DocumentSink for MemorySink {
        fn accept(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
            if self.fail_on.as_deref() == Some(name) {
                return Err(CourseDocsError::Archive(format!("refusing {name}")));
            }
            self.docs.push((name.to_string(), bytes.to_vec()));
            Ok(())
        }
    }

    fn doc_text(sink: &MemorySink, index: usize) -> String {
        extract_text(&sink.docs[index].1)
            .expect("extract text")
            .join("\n")
    }

    #[test]
    fn time_mode_end_to_end() {
        let dir = temp_dir("time-mode");
        let config = make_config(
            &dir,
            "NIVEL,HORARIO,ID\n\
             NIVEL 01,8:30 A 10:00AM,27\n\
             NIVEL 02,4:00 A 5:30PM,31\n",
            "HORA,NIVEL,LINK\n\
             8:30 AM,LEVEL 1,https://chat.example/a\n",
            &["Nivel {{LEVEL}} (grupo {{ID}})", "Enlace: {{WA_LINK}}"],
        );
        let mut sink = MemorySink::default();

        let result = generate(&config, &mut sink, &SilentProgress).expect("generate");

        assert_eq!(result.mode, MatchMode::Time);
        assert_eq!(result.rows_total, 2);
        assert_eq!(result.files_created, 2);
        assert!(result.warnings.is_empty());

        assert_eq!(sink.docs[0].0, "NIVEL 01_830A1000AM.docx");
        assert_eq!(sink.docs[1].0, "NIVEL 02_400A530PM.docx");

        let first = doc_text(&sink, 0);
        assert!(first.contains("Nivel NIVEL 01 (grupo 27)"));
        assert!(first.contains("https://chat.example/a"));

        // Second row has no matching time in the sheet
        let second = doc_text(&sink, 1);
        assert!(second.contains("LINK_NOT_FOUND"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn category_mode_end_to_end() {
        let dir = temp_dir("category-mode");
        let config = make_config(
            &dir,
            "NIVEL,HORARIO,ID,CATEGORIA\n\
             NIVEL 2,4:00 PM,8,NIÑOS\n",
            "EDAD,NIVEL,LINK\n\
             KIDS,2,https://chat.example/k\n",
            &["Curso para adultos", "Enlace: {{WA_LINK}}"],
        );
        let mut sink = MemorySink::default();

        let result = generate(&config, &mut sink, &SilentProgress).expect("generate");

        assert_eq!(result.mode, MatchMode::Category);
        assert_eq!(result.files_created, 1);
        assert_eq!(sink.docs[0].0, "NINOS_NIVEL 2_400PM.docx");

        let text = doc_text(&sink, 0);
        assert!(text.contains("Curso para niños"));
        assert!(text.contains("https://chat.example/k"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn failing_row_recorded_and_batch_continues() {
        let dir = temp_dir("failing-row");
        let config = make_config(
            &dir,
            "NIVEL,HORARIO,ID\n\
             NIVEL 1,8:30,1\n\
             NIVEL 2,9:30,2\n\
             NIVEL 3,10:30,3\n",
            "HORA,NIVEL,LINK\n8:30,1,https://chat.example/a\n",
            &["{{LEVEL}}"],
        );
        let mut sink = MemorySink {
            fail_on: Some("NIVEL 2_930.docx".into()),
            ..MemorySink::default()
        };

        let result = generate(&config, &mut sink, &SilentProgress).expect("generate");

        assert_eq!(result.rows_total, 3);
        assert_eq!(result.files_created, 2);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].row, 1);
        assert!(result.warnings[0].message.contains("refusing"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_template_is_fatal() {
        let dir = temp_dir("missing-template");
        let mut config = make_config(
            &dir,
            "NIVEL,HORARIO\nNIVEL 1,8:30\n",
            "HORA,NIVEL,LINK\n",
            &["{{LEVEL}}"],
        );
        config.template_path = dir.join("nope.docx");
        let mut sink = MemorySink::default();

        let err = generate(&config, &mut sink, &SilentProgress).expect_err("must fail");
        assert!(err.to_string().contains("template not found"));
        assert!(sink.docs.is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn header_only_roster_renders_nothing() {
        let dir = temp_dir("empty-roster");
        let config = make_config(
            &dir,
            "NIVEL,HORARIO,ID\n",
            "HORA,NIVEL,LINK\n8:30,1,https://chat.example/a\n",
            &["{{LEVEL}}"],
        );
        let mut sink = MemorySink::default();

        let result = generate(&config, &mut sink, &SilentProgress).expect("generate");

        assert_eq!(result.rows_total, 0);
        assert_eq!(result.files_created, 0);
        assert!(result.warnings.is_empty());
        assert!(sink.docs.is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn unknown_mode_renders_with_sentinel() {
        let dir = temp_dir("unknown-mode");
        let config = make_config(
            &dir,
            "NIVEL,HORARIO\nNIVEL 1,8:30\n",
            "NIVEL,LINK\n1,https://chat.example/a\n",
            &["Enlace: {{WA_LINK}}"],
        );
        let mut sink = MemorySink::default();

        let result = generate(&config, &mut sink, &SilentProgress).expect("generate");

        assert_eq!(result.mode, MatchMode::Unknown);
        assert_eq!(result.files_created, 1);
        assert!(doc_text(&sink, 0).contains("LINK_NOT_FOUND"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn blank_id_falls_back_to_row_index() {
        let dir = temp_dir("row-id");
        let config = make_config(
            &dir,
            "NIVEL,HORARIO,ID\nNIVEL 1,8:30,\nNIVEL 2,9:30,nan\n",
            "HORA,NIVEL,LINK\n",
            &["Grupo {{ID}}"],
        );
        let mut sink = MemorySink::default();

        generate(&config, &mut sink, &SilentProgress).expect("generate");

        assert!(doc_text(&sink, 0).contains("Grupo Row0"));
        assert!(doc_text(&sink, 1).contains("Grupo Row1"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn unique_ids_append_to_filenames() {
        let dir = temp_dir("unique-ids");
        let mut config = make_config(
            &dir,
            "NIVEL,HORARIO,ID\nNIVEL 1,8:30,27\nNIVEL 1,8:30,31\n",
            "HORA,NIVEL,LINK\n",
            &["{{LEVEL}}"],
        );
        config.options.unique_ids = true;
        let mut sink = MemorySink::default();

        generate(&config, &mut sink, &SilentProgress).expect("generate");

        assert_eq!(sink.docs[0].0, "NIVEL 1_830_27.docx");
        assert_eq!(sink.docs[1].0, "NIVEL 1_830_31.docx");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn zip_sink_collects_rendered_documents() {
        let dir = temp_dir("zip-sink");
        let config = make_config(
            &dir,
            "NIVEL,HORARIO\nNIVEL 1,8:30\nNIVEL 1,8:30\n",
            "HORA,NIVEL,LINK\n8:30,1,https://chat.example/a\n",
            &["{{LEVEL}}"],
        );
        let mut sink = ZipSink::in_memory();

        let result = generate(&config, &mut sink, &SilentProgress).expect("generate");
        let (_, report) = sink.finish().expect("finish archive");

        assert_eq!(result.files_created, 2);
        assert_eq!(report.entries.len(), 2);
        // Same level and schedule on both rows; the sink keeps them apart
        assert_eq!(report.entries[0].name, "NIVEL 1_830.docx");
        assert_eq!(report.entries[1].name, "NIVEL 1_830 (1).docx");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
