//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use coursedocs_archive::{ArchiveReport, ZipSink};
use coursedocs_core::pipeline::{GenerateConfig, GenerateResult, ProgressReporter, generate};
use coursedocs_matching::{
    MatchMode, level_column, normalize_category, normalize_level, parse_start_time,
};
use coursedocs_shared::{AppConfig, GenerateOptions, LinkRow, init_config, load_config};
use coursedocs_tables::{Table, course_rows, link_rows};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// CourseDocs — one filled document per course row, zipped.
#[derive(Parser)]
#[command(
    name = "coursedocs",
    version,
    about = "Fill a .docx template once per course row and package the results as a zip.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Generate one document per course row and package them as a zip.
    Generate(GenerateArgs),

    /// Inspect input tables: headers, detected match mode, derived keys.
    Inspect {
        /// Link sheet CSV.
        #[arg(long)]
        links: PathBuf,

        /// Course roster CSV to preview alongside the link sheet.
        #[arg(long)]
        courses: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Arguments for `coursedocs generate`.
#[derive(Args)]
pub(crate) struct GenerateArgs {
    /// Course roster CSV.
    #[arg(long)]
    pub courses: PathBuf,

    /// Link sheet CSV.
    #[arg(long)]
    pub links: PathBuf,

    /// .docx template to fill per course row.
    #[arg(long)]
    pub template: PathBuf,

    /// Output zip path (defaults to the configured archive name).
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Replacement text for the template's date anchor.
    #[arg(long)]
    pub date_text: Option<String>,

    /// Days text prepended to the raw schedule in {{SCHEDULE}}.
    #[arg(long)]
    pub days_text: Option<String>,

    /// Append the row id to generated file names.
    #[arg(long)]
    pub unique_ids: bool,

    /// Write a JSON archive report to this path.
    #[arg(long)]
    pub report: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "coursedocs=info",
        1 => "coursedocs=debug",
        _ => "coursedocs=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Generate(args) => cmd_generate(args),
        Command::Inspect { links, courses } => cmd_inspect(&links, courses.as_deref()),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// generate
// ---------------------------------------------------------------------------

fn cmd_generate(args: GenerateArgs) -> Result<()> {
    let config = load_config()?;

    // CLI flags override config file values
    let mut options = GenerateOptions::from(&config);
    if let Some(date_text) = args.date_text {
        options.date_text = date_text;
    }
    if let Some(days_text) = args.days_text {
        options.days_text = days_text;
    }
    if args.unique_ids {
        options.unique_ids = true;
    }

    let out_path = args
        .out
        .unwrap_or_else(|| PathBuf::from(&config.defaults.archive_name));

    let generate_config = GenerateConfig {
        courses_path: args.courses,
        links_path: args.links,
        template_path: args.template,
        options,
    };

    info!(
        courses = %generate_config.courses_path.display(),
        links = %generate_config.links_path.display(),
        template = %generate_config.template_path.display(),
        out = %out_path.display(),
        "generating course documents"
    );

    let reporter = CliProgress::new();
    let mut sink = ZipSink::create(&out_path)?;
    let result = generate(&generate_config, &mut sink, &reporter)?;
    let (_, archive_report) = sink.finish()?;

    print_summary(&result, &out_path);

    if let Some(report_path) = &args.report {
        write_report(report_path, &result, &archive_report)?;
        println!("  Report:   {}", report_path.display());
    }
    println!();

    Ok(())
}

fn print_summary(result: &GenerateResult, out_path: &Path) {
    println!();
    println!(
        "  Generated {} of {} documents",
        result.files_created, result.rows_total
    );
    println!("  Mode:     {}", result.mode);
    println!("  Archive:  {}", out_path.display());
    println!("  Time:     {:.1}s", result.elapsed.as_secs_f64());
    if !result.warnings.is_empty() {
        println!();
        println!("  Skipped rows:");
        for warning in &result.warnings {
            println!("    row {}: {}", warning.row, warning.message);
        }
    }
}

fn write_report(path: &Path, result: &GenerateResult, archive: &ArchiveReport) -> Result<()> {
    let report = serde_json::json!({
        "mode": result.mode,
        "rows_total": result.rows_total,
        "files_created": result.files_created,
        "warnings": result.warnings,
        "elapsed_ms": result.elapsed.as_millis() as u64,
        "archive": archive,
    });
    std::fs::write(path, serde_json::to_string_pretty(&report)?)
        .map_err(|e| eyre!("cannot write report to '{}': {e}", path.display()))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn row_rendered(&self, current: usize, total: usize, filename: &str) {
        self.spinner
            .set_message(format!("Rendering [{current}/{total}] {filename}"));
    }

    fn done(&self, _result: &GenerateResult) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// inspect
// ---------------------------------------------------------------------------

fn cmd_inspect(links: &Path, courses: Option<&Path>) -> Result<()> {
    let links_table = Table::from_path(links)?;
    let mode = MatchMode::detect(&links_table.headers);
    let level_col = level_column(&links_table.headers);
    let rows = link_rows(&links_table, level_col);

    println!();
    println!("  Link sheet:   {}", links.display());
    println!("  Headers:      {}", links_table.headers.join(", "));
    println!("  Match mode:   {mode}");
    println!("  Level column: {level_col}");
    println!("  Rows:         {}", rows.len());
    println!();

    for link in &rows {
        println!(
            "    level={:<8} key={:<16} link={}",
            normalize_level(&link.level),
            link_key(mode, link),
            if link.link.trim().is_empty() {
                "(empty)"
            } else {
                link.link.as_str()
            },
        );
    }
    if !rows.is_empty() {
        println!();
    }

    if let Some(courses_path) = courses {
        let courses_table = Table::from_path(courses_path)?;
        let rows = course_rows(&courses_table);

        println!("  Course roster: {}", courses_path.display());
        println!("  Headers:       {}", courses_table.headers.join(", "));
        println!("  Rows:          {}", rows.len());
        println!();

        for course in &rows {
            println!(
                "    level={:<8} start={:<8} category={}",
                normalize_level(&course.level),
                format_start_time(&course.schedule),
                course
                    .category
                    .as_deref()
                    .map(normalize_category)
                    .unwrap_or_else(|| "-".into()),
            );
        }
        if !rows.is_empty() {
            println!();
        }
    }

    Ok(())
}

/// Derived key of one link row under the detected mode.
fn link_key(mode: MatchMode, link: &LinkRow) -> String {
    match mode {
        MatchMode::Time => format_start_time(link.time.as_deref().unwrap_or("")),
        MatchMode::Category => normalize_category(link.category.as_deref().unwrap_or("")),
        MatchMode::Unknown => "-".into(),
    }
}

fn format_start_time(raw: &str) -> String {
    match parse_start_time(raw) {
        Some((hour, minute)) => format!("{hour}:{minute:02}"),
        None => "(none)".into(),
    }
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
