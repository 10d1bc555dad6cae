//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::Language;
use clap::Parser;
use std::path::{Path, PathBuf};

/// checkup-stats - per-class statistics from student health checkups
///
/// Reads a health-checkup spreadsheet and reports, class by class, how
/// students are distributed across body composition, blood pressure,
/// liver function, vision, overall assessment, and remark keywords.
///
/// Examples:
///   checkup-stats --input checkup.xlsx
///   checkup-stats --input checkup.xlsx --format html --language ko
///   checkup-stats --input checkup.xlsx --sheet "Sheet1" --output stats.json --format json
///   checkup-stats --input checkup.xlsx --list-sheets
///   checkup-stats --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Spreadsheet with the checkup records (.xlsx, .xlsm, .xls, .ods, .csv)
    ///
    /// Without an input, nothing is analyzed and a hint is printed.
    #[arg(short, long, value_name = "FILE", env = "CHECKUP_INPUT")]
    pub input: Option<PathBuf>,

    /// Sheet holding the records
    ///
    /// Overrides the config file. Ignored for CSV input.
    #[arg(short, long, value_name = "NAME")]
    pub sheet: Option<String>,

    /// Output file path for the report
    ///
    /// Defaults to the config's report path with the extension of --format.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, html, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Language of labels and headings (en, ko)
    #[arg(long, value_name = "LANG")]
    pub language: Option<Language>,

    /// Number of raw rows shown in the data preview
    #[arg(long, value_name = "ROWS")]
    pub preview_rows: Option<usize>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .checkup-stats.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// List the sheets of the input workbook and exit
    #[arg(long, requires = "input")]
    pub list_sheets: bool,

    /// Generate a default .checkup-stats.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// Self-contained HTML page with tabs and charts
    Html,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// File extension of reports in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Html => "html",
            OutputFormat::Json => "json",
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.preview_rows == Some(0) {
            return Err("Preview rows must be at least 1".to_string());
        }

        if let Some(ref sheet) = self.sheet {
            if sheet.trim().is_empty() {
                return Err("Sheet name must not be empty".to_string());
            }
        }

        // Validate input file if provided
        if let Some(ref input) = self.input {
            if !input.exists() {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
            if !input.is_file() {
                return Err(format!("Input path is not a file: {}", input.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Report path: the explicit --output, or the configured default with
    /// the extension of the chosen format.
    pub fn output_path(&self, configured: &str) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| Path::new(configured).with_extension(self.format.extension()))
    }
}
