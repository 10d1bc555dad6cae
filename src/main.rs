//! checkup-stats - per-class statistics from student health checkups
//!
//! A CLI tool that reads a school health-checkup spreadsheet and reports,
//! class by class, the distribution of body composition, blood pressure,
//! liver function, vision, overall assessment, and remark keywords.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (unreadable file, missing sheet or columns, etc.)

mod analysis;
mod cli;
mod config;
mod loader;
mod models;
mod report;

use analysis::AnalysisOptions;
use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, DEFAULT_CONFIG_FILE};
use indicatif::{ProgressBar, ProgressStyle};
use loader::LoadOptions;
use models::{Preview, Report, ReportMetadata};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("checkup-stats v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .checkup-stats.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to customize the sheet, column headers, keywords, and more.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete statistics workflow. Returns the exit code.
fn run(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let Some(input) = args.input.clone() else {
        println!("ℹ️  No input file given. Pass --input <FILE> with a checkup spreadsheet (.xlsx or .csv).");
        println!("   Run with --help for all options.");
        return Ok(0);
    };

    // Handle --list-sheets: print the sheet names and exit
    if args.list_sheets {
        return handle_list_sheets(&input);
    }

    // Step 1: Load the sheet
    println!("📥 Loading: {}", input.display());
    let load_options = LoadOptions::from(&config);
    let spinner = loading_spinner(&args, &load_options.sheet);
    let loaded = loader::load_dataset(&input, &load_options);
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let dataset = loaded?;

    // Step 2: Aggregate per class
    println!("🔬 Aggregating {} records...", dataset.records.len());
    let options = AnalysisOptions::from(&config);
    let analysis = analysis::analyze(&dataset, &options);

    if analysis.skipped_records > 0 {
        warn!(
            "{} records have no class and were left out of the statistics",
            analysis.skipped_records
        );
    }

    // Step 3: Build the report
    println!("📝 Generating report...");

    let metadata = ReportMetadata {
        source: input.display().to_string(),
        sheet: dataset.sheet.clone(),
        generated_at: Utc::now(),
        language: config.report.language,
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };

    let report = Report {
        metadata,
        preview: Preview::from_dataset(&dataset, config.report.preview_rows),
        analysis,
    };

    // Step 4: Render and save
    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
        OutputFormat::Html => report::generate_html_report(&report),
    };

    let output_path = args.output_path(&config.report.output);
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    // Print summary
    println!("\n📊 Summary:");
    println!("   Sheet: {}", report.metadata.sheet);
    println!("   Records: {}", report.analysis.record_count);
    println!("   Classes: {}", report.analysis.class_count);
    if report.analysis.skipped_records > 0 {
        println!("   Skipped (no class): {}", report.analysis.skipped_records);
    }
    println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
    println!("\n✅ Done! Report saved to: {}", output_path.display());

    Ok(0)
}

/// Handle --list-sheets: print the sheets of the input workbook.
fn handle_list_sheets(input: &Path) -> Result<i32> {
    let sheets = loader::list_sheets(input)?;

    println!("📄 Sheets in {}:", input.display());
    for sheet in &sheets {
        println!("   - {}", sheet);
    }

    Ok(0)
}

/// Spinner shown while the workbook is parsed. Hidden in quiet mode.
fn loading_spinner(args: &Args, sheet: &str) -> Option<ProgressBar> {
    if args.quiet {
        return None;
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        pb.set_style(style);
    }
    pb.set_message(format!("Reading sheet '{}'", sheet));
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
