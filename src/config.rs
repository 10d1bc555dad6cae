//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.checkup-stats.toml` files.

use crate::models::{Field, Language};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".checkup-stats.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Input settings.
    #[serde(default)]
    pub input: InputConfig,

    /// Header names of the required columns.
    #[serde(default)]
    pub columns: ColumnsConfig,

    /// Analysis settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Input spreadsheet settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Name of the sheet holding the checkup records.
    #[serde(default = "default_sheet")]
    pub sheet: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            sheet: default_sheet(),
        }
    }
}

fn default_sheet() -> String {
    "데이터 엑셀다운".to_string()
}

/// Header names of the 17 required columns.
///
/// Missing keys fall back to the headers of the standard school checkup
/// export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnsConfig {
    pub class: String,
    pub sex: String,
    pub height: String,
    pub weight: String,
    pub bmi: String,
    pub obesity: String,
    pub systolic: String,
    pub diastolic: String,
    pub ast: String,
    pub alt: String,
    pub hemoglobin: String,
    pub chest_xray: String,
    pub vision_left: String,
    pub vision_right: String,
    pub overall: String,
    pub action: String,
    pub remarks: String,
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        Self {
            class: "반".to_string(),
            sex: "성별".to_string(),
            height: "신장".to_string(),
            weight: "체중".to_string(),
            bmi: "체질량지수_학생".to_string(),
            obesity: "비만도_학생".to_string(),
            systolic: "혈압(최고)".to_string(),
            diastolic: "혈압(최저)".to_string(),
            ast: "혈청지오티(AST)".to_string(),
            alt: "혈청지피티(ALT)".to_string(),
            hemoglobin: "혈색소(Hb)".to_string(),
            chest_xray: "흉부X선검사".to_string(),
            vision_left: "시력(좌)".to_string(),
            vision_right: "시력(우)".to_string(),
            overall: "종합판정".to_string(),
            action: "조치사항".to_string(),
            remarks: "소견".to_string(),
        }
    }
}

impl ColumnsConfig {
    /// Header name of a field.
    pub fn header(&self, field: Field) -> &str {
        match field {
            Field::Class => &self.class,
            Field::Sex => &self.sex,
            Field::Height => &self.height,
            Field::Weight => &self.weight,
            Field::Bmi => &self.bmi,
            Field::Obesity => &self.obesity,
            Field::Systolic => &self.systolic,
            Field::Diastolic => &self.diastolic,
            Field::Ast => &self.ast,
            Field::Alt => &self.alt,
            Field::Hemoglobin => &self.hemoglobin,
            Field::ChestXray => &self.chest_xray,
            Field::VisionLeft => &self.vision_left,
            Field::VisionRight => &self.vision_right,
            Field::Overall => &self.overall,
            Field::Action => &self.action,
            Field::Remarks => &self.remarks,
        }
    }

    /// All header names, in sheet order.
    pub fn headers(&self) -> Vec<String> {
        Field::ALL
            .iter()
            .map(|&field| self.header(field).to_string())
            .collect()
    }
}

/// Analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Keywords tallied in remedial action and remarks text.
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
        }
    }
}

fn default_keywords() -> Vec<String> {
    vec!["체중", "빈혈", "고혈압", "간", "추가검사", "시력"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Default report path; the extension follows the output format.
    #[serde(default = "default_output")]
    pub output: String,

    /// Language of labels and headings.
    #[serde(default)]
    pub language: Language,

    /// Number of raw rows in the data preview.
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            language: Language::default(),
            preview_rows: default_preview_rows(),
        }
    }
}

fn default_output() -> String {
    "checkup_report.md".to_string()
}

fn default_preview_rows() -> usize {
    30
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref sheet) = args.sheet {
            self.input.sheet = sheet.clone();
        }

        if let Some(language) = args.language {
            self.report.language = language;
        }

        if let Some(rows) = args.preview_rows {
            self.report.preview_rows = rows;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
