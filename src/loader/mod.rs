//! Spreadsheet loading.
//!
//! This module reads one sheet of a workbook (or a CSV file) into a
//! table of cells, checks that the required columns are present, and
//! turns each row into a [`Record`].

mod error;

pub use error::{LoadError, Result};

use crate::config::ColumnsConfig;
use crate::models::{Dataset, Field, Record};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;
use tracing::{debug, info};

/// Settings for loading a checkup sheet.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Sheet to read. Ignored for CSV files.
    pub sheet: String,
    /// Header names of the required columns.
    pub columns: ColumnsConfig,
}

impl From<&crate::config::Config> for LoadOptions {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            sheet: config.input.sheet.clone(),
            columns: config.columns.clone(),
        }
    }
}

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

static EMPTY: Cell = Cell::Empty;

impl Cell {
    /// Build a cell from raw text; blank text is an empty cell.
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(trimmed.to_string())
        }
    }

    /// Numeric value of the cell. Text is parsed; anything that isn't a
    /// finite number is `None`.
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            Cell::Empty => None,
            Cell::Number(v) => Some(*v),
            Cell::Text(s) => s.parse::<f64>().ok(),
        };
        value.filter(|v| v.is_finite())
    }

    /// Text value of the cell. Whole numbers drop their fraction, so a
    /// class stored as `3.0` reads as "3".
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Number(v) => Some(format_number(*v)),
            Cell::Text(s) => Some(s.clone()),
        }
    }

    pub fn display(&self) -> String {
        self.as_text().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::Int(v) => Cell::Number(*v as f64),
            Data::Float(v) => Cell::Number(*v),
            Data::String(s) => Cell::from_text(s),
            other => Cell::from_text(&other.to_string()),
        }
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn normalize_header(header: &str) -> String {
    header.trim().trim_start_matches('\u{feff}').trim().to_string()
}

/// Header row and data rows of one sheet.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// Kind of input file, decided by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceKind {
    Workbook,
    Csv,
}

fn source_kind(path: &Path) -> Result<SourceKind> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(SourceKind::Workbook),
        "csv" => Ok(SourceKind::Csv),
        _ => Err(LoadError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Sheet name used for a CSV file: its file stem.
fn csv_sheet_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// List the sheet names of a workbook. A CSV file has a single sheet.
pub fn list_sheets(path: &Path) -> Result<Vec<String>> {
    match source_kind(path)? {
        SourceKind::Csv => Ok(vec![csv_sheet_name(path)]),
        SourceKind::Workbook => {
            let workbook = open_workbook_auto(path).map_err(|source| LoadError::Workbook {
                path: path.to_path_buf(),
                source,
            })?;
            Ok(workbook.sheet_names())
        }
    }
}

/// Read one sheet of a workbook.
pub fn read_workbook(path: &Path, sheet: &str) -> Result<Table> {
    let workbook_error = |source: calamine::Error| LoadError::Workbook {
        path: path.to_path_buf(),
        source,
    };

    let mut workbook = open_workbook_auto(path).map_err(workbook_error)?;

    let available = workbook.sheet_names();
    if !available.iter().any(|name| name == sheet) {
        return Err(LoadError::SheetNotFound {
            sheet: sheet.to_string(),
            available,
        });
    }

    let range = workbook.worksheet_range(sheet).map_err(workbook_error)?;
    debug!("Sheet '{}' spans {:?}", sheet, range.get_size());

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(Cell::from).collect::<Vec<_>>());

    let header = rows.next().ok_or_else(|| LoadError::EmptySheet {
        sheet: sheet.to_string(),
    })?;

    Ok(Table {
        headers: header.iter().map(|c| normalize_header(&c.display())).collect(),
        rows: rows.collect(),
    })
}

/// Read a CSV file with a header row.
pub fn read_csv(path: &Path) -> Result<Table> {
    let csv_error = |source: csv::Error| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(csv_error)?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(normalize_header)
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(LoadError::EmptySheet {
            sheet: csv_sheet_name(path),
        });
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        rows.push(record.iter().map(Cell::from_text).collect());
    }

    Ok(Table { headers, rows })
}

/// Find the position of every required column.
///
/// Reports all missing columns at once.
pub fn resolve_columns(headers: &[String], columns: &ColumnsConfig, sheet: &str) -> Result<Vec<usize>> {
    let mut indices = Vec::with_capacity(Field::ALL.len());
    let mut missing = Vec::new();

    for field in Field::ALL {
        let name = columns.header(field).trim();
        match headers.iter().position(|h| h == name) {
            Some(index) => indices.push(index),
            None => missing.push(name.to_string()),
        }
    }

    if !missing.is_empty() {
        return Err(LoadError::MissingColumns {
            sheet: sheet.to_string(),
            missing,
        });
    }

    Ok(indices)
}

/// Build a record from one row. `indices` follows [`Field::ALL`].
fn to_record(row: &[Cell], indices: &[usize]) -> Record {
    // Field discriminants match their position in Field::ALL.
    let cell = |field: Field| row.get(indices[field as usize]).unwrap_or(&EMPTY);

    Record {
        class: cell(Field::Class).as_text(),
        sex: cell(Field::Sex).as_text(),
        height: cell(Field::Height).as_number(),
        weight: cell(Field::Weight).as_number(),
        bmi: cell(Field::Bmi).as_number(),
        obesity: cell(Field::Obesity).as_text(),
        systolic: cell(Field::Systolic).as_number(),
        diastolic: cell(Field::Diastolic).as_number(),
        ast: cell(Field::Ast).as_number(),
        alt: cell(Field::Alt).as_number(),
        hemoglobin: cell(Field::Hemoglobin).as_number(),
        chest_xray: cell(Field::ChestXray).as_text(),
        vision_left: cell(Field::VisionLeft).as_number(),
        vision_right: cell(Field::VisionRight).as_number(),
        overall: cell(Field::Overall).as_text(),
        action: cell(Field::Action).as_text(),
        remarks: cell(Field::Remarks).as_text(),
    }
}

/// Restrict a table to the required columns and parse its rows.
pub fn build_dataset(table: Table, columns: &ColumnsConfig, source: &Path, sheet: &str) -> Result<Dataset> {
    let indices = resolve_columns(&table.headers, columns, sheet)?;

    let mut records = Vec::with_capacity(table.rows.len());
    let mut raw_rows = Vec::with_capacity(table.rows.len());
    let mut blank = 0usize;

    for row in &table.rows {
        if row.iter().all(Cell::is_empty) {
            blank += 1;
            continue;
        }

        records.push(to_record(row, &indices));
        raw_rows.push(
            indices
                .iter()
                .map(|&i| row.get(i).map(Cell::display).unwrap_or_default())
                .collect(),
        );
    }

    if blank > 0 {
        debug!("Skipped {} blank rows", blank);
    }

    Ok(Dataset {
        source: source.to_path_buf(),
        sheet: sheet.to_string(),
        columns: indices.iter().map(|&i| table.headers[i].clone()).collect(),
        records,
        raw_rows,
    })
}

/// Load the checkup records of a spreadsheet.
pub fn load_dataset(path: &Path, options: &LoadOptions) -> Result<Dataset> {
    let (table, sheet) = match source_kind(path)? {
        SourceKind::Workbook => (read_workbook(path, &options.sheet)?, options.sheet.clone()),
        SourceKind::Csv => (read_csv(path)?, csv_sheet_name(path)),
    };

    debug!(
        "Read {} columns and {} rows from '{}'",
        table.headers.len(),
        table.rows.len(),
        sheet
    );

    let dataset = build_dataset(table, &options.columns, path, &sheet)?;
    info!(
        "Loaded {} records from {} (sheet '{}')",
        dataset.records.len(),
        path.display(),
        sheet
    );

    Ok(dataset)
}
