//! Errors raised while loading a checkup sheet.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, LoadError>;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to open workbook {}: {source}", .path.display())]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("Failed to read CSV file {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Unsupported file type: {} (expected .xlsx, .xlsm, .xls, .ods or .csv)", .path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("Sheet '{sheet}' not found (available: {})", .available.join(", "))]
    SheetNotFound {
        sheet: String,
        available: Vec<String>,
    },

    #[error("Sheet '{sheet}' has no header row")]
    EmptySheet { sheet: String },

    #[error("Sheet '{sheet}' is missing required columns: {}", .missing.join(", "))]
    MissingColumns { sheet: String, missing: Vec<String> },
}
