//! iperc CLI - record IPERC hazard assessments and render their reports

// Global invariants enforced:
// - Every record is validated by the core before it reaches the store
// - Reports are written atomically; a failed render leaves no partial file
// - CLI flags override the environment, which overrides the config file

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use iperc_core::config::{self, ResolvedConfig, StoreKind};
use iperc_core::pdf::{self, Disposition};
use iperc_core::record::{EvaluationRecord, RecordDraft, RecordSummary};
use iperc_core::store::{open_store, RecordStore};
use iperc_core::{atomic_write, html, layout, report, risk, service};
use rayon::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};

const EXPORT_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";

#[derive(Parser)]
#[command(name = "iperc")]
#[command(about = "Record IPERC hazard assessments and render their risk matrix reports")]
#[command(version = env!("IPERC_VERSION"))]
struct Cli {
    /// Path to config file (default: auto-discover)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Record store (overrides config file and IPERC_USE_LOCAL_STORE).
    /// The memory store lives only for one invocation
    #[arg(long, global = true)]
    store: Option<StoreArg>,

    /// SQLite database path (overrides config file)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an evaluation from a JSON draft and print its id
    Create {
        /// Draft JSON file, or `-` for stdin
        #[arg(long)]
        input: PathBuf,
    },
    /// Replace the header and rows of an existing evaluation
    Update {
        /// Evaluation id (IPERC-<year>-<hex>)
        id: String,

        /// Draft JSON file, or `-` for stdin
        #[arg(long)]
        input: PathBuf,
    },
    /// Print one evaluation
    Show {
        id: String,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List stored evaluations
    List {
        /// Only evaluations with a row assigned to this person (case-insensitive)
        #[arg(long)]
        responsible: Option<String>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Maximum number of entries (overrides config file)
        #[arg(long)]
        limit: Option<usize>,

        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Render the PDF report of one evaluation
    Pdf {
        id: String,

        /// Mark the document as a download (attachment) instead of inline
        #[arg(long)]
        download: bool,

        /// Output file (default: ./IPERC_<id>.pdf)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Render every stored evaluation to DIR/IPERC_<id>.pdf
    Export {
        #[arg(long)]
        dir: PathBuf,
    },
    /// Print the page layout (draw commands) of one evaluation as JSON
    Layout { id: String },
    /// Classify a risk magnitude
    Classify { magnitude: u32 },
    /// Score a probability and severity pair
    Score {
        /// Probability (1-5)
        #[arg(value_parser = clap::value_parser!(u8).range(1..=5))]
        probability: u8,

        /// Severity (1-50)
        #[arg(value_parser = clap::value_parser!(u8).range(1..=50))]
        severity: u8,
    },
    /// Validate or show configuration
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate a config file
    Validate {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Show the resolved configuration (merged defaults + config file)
    Show {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Html,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum StoreArg {
    Memory,
    Sqlite,
}

impl From<StoreArg> for StoreKind {
    fn from(arg: StoreArg) -> Self {
        match arg {
            StoreArg::Memory => StoreKind::Memory,
            StoreArg::Sqlite => StoreKind::Sqlite,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Create { ref input } => {
            let resolved = resolve_config(&cli)?;
            warn_if_not_persistent(&resolved, "create");
            let mut store = open_store(&resolved)?;
            let draft = read_draft(input)?;
            let record = service::create_record(store.as_mut(), &draft, Utc::now())?;
            println!("{}", record.id);
        }
        Commands::Update { ref id, ref input } => {
            let resolved = resolve_config(&cli)?;
            warn_if_not_persistent(&resolved, "update");
            let mut store = open_store(&resolved)?;
            let draft = read_draft(input)?;
            let record = service::update_record(store.as_mut(), id, &draft, Utc::now())?;
            println!("Updated {} ({} rows)", record.id, record.rows.len());
        }
        Commands::Show {
            ref id,
            format,
            ref output,
        } => {
            let resolved = resolve_config(&cli)?;
            let store = open_store(&resolved)?;
            let record = service::load_record(store.as_ref(), id)?;
            let rendered = match format {
                OutputFormat::Text => report::render_text(&record),
                OutputFormat::Json => report::render_json(&record)?,
                OutputFormat::Html => html::render_record(&record),
            };
            emit(output.as_deref(), &rendered)?;
        }
        Commands::List {
            ref responsible,
            format,
            limit,
            ref output,
        } => {
            let resolved = resolve_config(&cli)?;
            let store = open_store(&resolved)?;
            let limit = limit.unwrap_or(resolved.list_limit);
            if limit == 0 {
                anyhow::bail!("--limit must be positive");
            }
            let summaries = match responsible {
                Some(name) => service::find_by_responsible(store.as_ref(), name)?
                    .iter()
                    .take(limit)
                    .map(EvaluationRecord::summary)
                    .collect(),
                None => service::list_summaries(store.as_ref(), limit)?,
            };
            let title = match responsible {
                Some(name) => format!("Evaluaciones IPERC - {}", name.trim()),
                None => "Evaluaciones IPERC".to_string(),
            };
            emit(output.as_deref(), &render_listing(format, &title, &summaries)?)?;
        }
        Commands::Pdf {
            ref id,
            download,
            ref output,
        } => {
            let resolved = resolve_config(&cli)?;
            let store = open_store(&resolved)?;
            let record = service::load_record(store.as_ref(), id)?;
            let document = pdf::render_pdf(
                &record,
                &resolved.layout,
                Disposition::from_download_flag(download),
            )?;
            let path = output
                .clone()
                .unwrap_or_else(|| PathBuf::from(&document.filename));
            atomic_write(&path, &document.bytes)?;

            eprintln!("Wrote {} ({} pages)", path.display(), document.page_count);
            println!("Content-Type: {}", document.content_type());
            println!("Content-Disposition: {}", document.content_disposition());
        }
        Commands::Export { ref dir } => {
            let resolved = resolve_config(&cli)?;
            let store = open_store(&resolved)?;
            export_all(store.as_ref(), &resolved, dir)?;
        }
        Commands::Layout { ref id } => {
            let resolved = resolve_config(&cli)?;
            let store = open_store(&resolved)?;
            let record = service::load_record(store.as_ref(), id)?;
            let report = layout::layout(&record, &resolved.layout)?;
            let json =
                serde_json::to_string_pretty(&report).context("failed to serialize layout")?;
            println!("{}", json);
        }
        Commands::Classify { magnitude } => {
            let c = risk::classify(magnitude);
            println!("{} {} {} {}", magnitude, c.level, c.color, c.class);
        }
        Commands::Score {
            probability,
            severity,
        } => {
            let (magnitude, c) = risk::score(probability, severity);
            println!(
                "{} x {} = {} {} {} {}",
                probability, severity, magnitude, c.level, c.color, c.class
            );
        }
        Commands::Config { ref action } => match action {
            ConfigAction::Validate { path } => {
                let working_dir = std::env::current_dir()?;
                let resolved = config::load_and_resolve(&working_dir, path.as_deref());

                match resolved {
                    Ok(config) => {
                        if let Some(ref p) = config.config_path {
                            println!("Config valid: {}", p.display());
                        } else {
                            println!("No config file found. Using defaults.");
                        }
                    }
                    Err(e) => {
                        eprintln!("Config validation failed: {:#}", e);
                        std::process::exit(1);
                    }
                }
            }
            ConfigAction::Show { path } => {
                let working_dir = std::env::current_dir()?;
                let resolved = config::load_and_resolve(&working_dir, path.as_deref())
                    .context("failed to load configuration")?;
                print_config(&resolved);
            }
        },
    }

    Ok(())
}

/// Load configuration and apply the global CLI overrides
fn resolve_config(cli: &Cli) -> anyhow::Result<ResolvedConfig> {
    let working_dir = std::env::current_dir()?;
    let mut resolved = config::load_and_resolve(&working_dir, cli.config.as_deref())
        .context("failed to load configuration")?;

    if let Some(ref p) = resolved.config_path {
        log::info!("using config: {}", p.display());
    }
    if let Some(store) = cli.store {
        resolved.store = store.into();
    }
    if let Some(ref data) = cli.data {
        resolved.data_path = data.clone();
    }
    Ok(resolved)
}

fn warn_if_not_persistent(resolved: &ResolvedConfig, command: &str) {
    if !resolved.store.is_persistent() {
        log::warn!(
            "`{}` is writing to the {} store; the record is gone when this command exits",
            command,
            resolved.store.as_str()
        );
    }
}

/// Read a draft from a JSON file, or stdin when `input` is `-`
fn read_draft(input: &Path) -> anyhow::Result<RecordDraft> {
    let content = if input == Path::new("-") {
        std::io::read_to_string(std::io::stdin()).context("failed to read draft from stdin")?
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("failed to read draft: {}", input.display()))?
    };
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse draft: {}", input.display()))
}

fn render_listing(
    format: OutputFormat,
    title: &str,
    summaries: &[RecordSummary],
) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Text => report::render_summaries_text(summaries),
        OutputFormat::Json => report::render_summaries_json(summaries)?,
        OutputFormat::Html => html::render_summaries(title, summaries),
    })
}

/// Print to stdout, or write atomically to `output`
fn emit(output: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            atomic_write(path, content.as_bytes())?;
            eprintln!("Wrote {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}

/// Render every stored record to `dir` in parallel
///
/// Records are loaded up front; rendering shares nothing, so a failure in one
/// record does not stop the others.
fn export_all(
    store: &dyn RecordStore,
    resolved: &ResolvedConfig,
    dir: &Path,
) -> anyhow::Result<()> {
    let records = store.list(None)?;
    if records.is_empty() {
        println!("No evaluations to export.");
        return Ok(());
    }
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory: {}", dir.display()))?;

    let progress = ProgressBar::new(records.len() as u64);
    progress.set_style(
        ProgressStyle::with_template(EXPORT_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );

    let results: Vec<(String, anyhow::Result<usize>)> = records
        .par_iter()
        .map(|record| {
            let result = pdf::render_pdf(record, &resolved.layout, Disposition::Attachment)
                .and_then(|document| {
                    atomic_write(&dir.join(&document.filename), &document.bytes)?;
                    Ok(document.page_count)
                });
            progress.set_message(record.id.clone());
            progress.inc(1);
            (record.id.clone(), result)
        })
        .collect();
    progress.finish_and_clear();

    let mut written = 0;
    let mut pages = 0;
    for (id, result) in &results {
        match result {
            Ok(count) => {
                written += 1;
                pages += count;
            }
            Err(e) => eprintln!("failed to export {}: {:#}", id, e),
        }
    }
    println!(
        "Exported {} of {} evaluations ({} pages) to {}",
        written,
        results.len(),
        pages,
        dir.display()
    );

    if written < results.len() {
        anyhow::bail!("{} evaluations failed to export", results.len() - written);
    }
    Ok(())
}

fn print_config(resolved: &ResolvedConfig) {
    println!("Configuration:");
    if let Some(ref p) = resolved.config_path {
        println!("  Source: {}", p.display());
    } else {
        println!("  Source: defaults (no config file found)");
    }
    println!();
    println!("Store:");
    println!("  backend: {}", resolved.store.as_str());
    println!("  data_path: {}", resolved.data_path.display());
    println!("  list_limit: {}", resolved.list_limit);
    println!();
    println!("Layout:");
    println!("  repeat_header: {}", resolved.layout.repeat_header);
    println!("  columns:");
    for column in &resolved.layout.schema.columns {
        println!("    {:<22} {}", column.title, column.width);
    }
    println!(
        "  table width: {} of {:.2}",
        resolved.layout.schema.total_width(),
        resolved.layout.page.content_width()
    );
}
