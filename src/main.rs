//! CLI entry point for the grade failure rater.
//!
//! Loads every grade spreadsheet in a directory, runs the failure pipeline
//! once and prints the requested view.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use grade_fail_rater::config::parse_threshold;
use grade_fail_rater::output::{
    GroupFilter, groups, records_for, render_report, score_rows, to_json, write_csv,
};
use grade_fail_rater::source::DirectorySource;
use grade_fail_rater::{PipelineConfig, Snapshot, SnapshotCache};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "grade_fail_rater")]
#[command(about = "Failure counts per student, group and module from grade spreadsheets", long_about = None)]
struct Cli {
    /// Directory holding the grade spreadsheets (overrides GRADES_DIR)
    #[arg(short, long, global = true)]
    dir: Option<PathBuf>,

    /// Sheet to read from each workbook (overrides GRADES_SHEET)
    #[arg(short, long, global = true)]
    sheet: Option<String>,

    /// Passing score; anything strictly below fails (overrides PASS_THRESHOLD)
    #[arg(short, long, global = true)]
    threshold: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the failure report
    Report {
        /// Restrict the breakdown and student ranking to one group
        #[arg(short, long)]
        group: Option<String>,

        /// Number of modules and students to list
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// List the groups found in the sources
    Groups,
    /// Print one aggregate view as CSV or JSON
    Export {
        #[arg(value_enum)]
        view: View,

        #[arg(short, long, value_enum, default_value_t = Format::Csv)]
        format: Format,
    },
    /// Print the clean scores of one student or group
    Scores {
        #[arg(short, long)]
        group: Option<String>,

        #[arg(long)]
        student_id: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum View {
    Students,
    Groups,
    Modules,
    Breakdown,
    Snapshot,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/grade_fail_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("grade_fail_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = build_config(&cli)?;

    info!(
        dir = %config.source_dir.display(),
        sheet = %config.sheet_name,
        threshold = config.pass_threshold,
        "Loading grade sources"
    );

    let reader = Arc::new(DirectorySource::from_config(&config));
    let cache = SnapshotCache::new(reader, config.clone());
    let snapshot = cache.get().await.with_context(|| {
        format!(
            "no failure report could be computed from {}",
            config.source_dir.display()
        )
    })?;

    for rejected in &snapshot.report.sources_rejected {
        warn!(source = %rejected.source, error = %rejected.error, "Source skipped");
    }

    let command = cli.command.unwrap_or(Commands::Report {
        group: None,
        limit: 10,
    });

    match command {
        Commands::Report { group, limit } => {
            let filter = GroupFilter::from_option(group);
            print!("{}", render_report(&snapshot, &filter, limit));
        }
        Commands::Groups => {
            for group in groups(&snapshot) {
                println!("{group}");
            }
        }
        Commands::Export { view, format } => export(&snapshot, view, format)?,
        Commands::Scores { group, student_id } => {
            let records = records_for(&snapshot, group.as_deref(), student_id.as_deref());
            if records.is_empty() {
                info!("No scores match this selection");
            }
            let rows = score_rows(&records, snapshot.pass_threshold);
            write_csv(&rows, std::io::stdout().lock())?;
        }
    }

    Ok(())
}

fn build_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = PipelineConfig::from_env().context("invalid environment configuration")?;

    if let Some(dir) = &cli.dir {
        config.source_dir = dir.clone();
    }
    if let Some(sheet) = &cli.sheet {
        config.sheet_name = sheet.clone();
    }
    if let Some(raw) = &cli.threshold {
        config.pass_threshold = parse_threshold(raw)?;
    }

    config.validate()?;
    Ok(config)
}

fn export(snapshot: &Snapshot, view: View, format: Format) -> Result<()> {
    let views = &snapshot.views;

    match format {
        Format::Csv => {
            let stdout = std::io::stdout().lock();
            match view {
                View::Students => write_csv(&views.by_student, stdout)?,
                View::Groups => write_csv(&views.by_group, stdout)?,
                View::Modules => write_csv(&views.by_module, stdout)?,
                View::Breakdown => write_csv(&views.by_group_module, stdout)?,
                View::Snapshot => anyhow::bail!("the full snapshot can only be exported as JSON"),
            }
        }
        Format::Json => {
            let json = match view {
                View::Students => serde_json::to_string_pretty(&views.by_student)?,
                View::Groups => serde_json::to_string_pretty(&views.by_group)?,
                View::Modules => serde_json::to_string_pretty(&views.by_module)?,
                View::Breakdown => serde_json::to_string_pretty(&views.by_group_module)?,
                View::Snapshot => to_json(snapshot)?,
            };
            println!("{json}");
        }
    }

    Ok(())
}
