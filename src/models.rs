//! Data models for the checkup statistics pipeline.
//!
//! This module contains the core data structures shared by the loader,
//! the analysis pipeline, and the report generators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Language used for category labels and report headings.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English labels
    #[default]
    En,
    /// Korean labels, as used on the original checkup forms
    Ko,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::En => write!(f, "en"),
            Language::Ko => write!(f, "ko"),
        }
    }
}

impl Language {
    /// Label of the bucket that collects records with missing inputs.
    pub fn unknown(&self) -> &'static str {
        match self {
            Language::En => "unknown",
            Language::Ko => "미상",
        }
    }

    /// Heading of the class column in tables.
    pub fn class_heading(&self) -> &'static str {
        match self {
            Language::En => "Class",
            Language::Ko => "반",
        }
    }

    /// Tab label of the raw data preview.
    pub fn preview_tab(&self) -> &'static str {
        match self {
            Language::En => "Raw data",
            Language::Ko => "원본 데이터",
        }
    }

    /// Title shown above the raw data preview.
    pub fn preview_title(&self) -> &'static str {
        match self {
            Language::En => "Raw data preview",
            Language::Ko => "원본 데이터 미리보기",
        }
    }
}

/// A column of the checkup sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Class,
    Sex,
    Height,
    Weight,
    Bmi,
    Obesity,
    Systolic,
    Diastolic,
    Ast,
    Alt,
    Hemoglobin,
    ChestXray,
    VisionLeft,
    VisionRight,
    Overall,
    Action,
    Remarks,
}

impl Field {
    /// All required columns, in sheet order.
    pub const ALL: [Field; 17] = [
        Field::Class,
        Field::Sex,
        Field::Height,
        Field::Weight,
        Field::Bmi,
        Field::Obesity,
        Field::Systolic,
        Field::Diastolic,
        Field::Ast,
        Field::Alt,
        Field::Hemoglobin,
        Field::ChestXray,
        Field::VisionLeft,
        Field::VisionRight,
        Field::Overall,
        Field::Action,
        Field::Remarks,
    ];
}

/// One student's checkup row.
///
/// Numeric fields are `None` when the cell is blank or not a number.
/// Text fields are `None` when the cell is blank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Class (반) label, the grouping key of every aggregation.
    pub class: Option<String>,
    pub sex: Option<String>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub bmi: Option<f64>,
    /// Pre-labeled obesity judgment (비만도).
    pub obesity: Option<String>,
    /// Systolic blood pressure (mmHg).
    pub systolic: Option<f64>,
    /// Diastolic blood pressure (mmHg).
    pub diastolic: Option<f64>,
    /// Serum AST (IU/L).
    pub ast: Option<f64>,
    /// Serum ALT (IU/L).
    pub alt: Option<f64>,
    pub hemoglobin: Option<f64>,
    pub chest_xray: Option<String>,
    pub vision_left: Option<f64>,
    pub vision_right: Option<f64>,
    /// Pre-labeled overall assessment (종합판정).
    pub overall: Option<String>,
    /// Remedial action text (조치사항).
    pub action: Option<String>,
    /// Remarks text (소견).
    pub remarks: Option<String>,
}

/// Records loaded from one sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    /// Path of the source spreadsheet.
    pub source: PathBuf,
    /// Name of the sheet the records came from.
    pub sheet: String,
    /// Header names of the selected columns, in sheet order.
    pub columns: Vec<String>,
    /// Parsed records.
    pub records: Vec<Record>,
    /// Cell text of the selected columns, as found in the sheet.
    pub raw_rows: Vec<Vec<String>>,
}

/// The six analysis dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Obesity,
    BloodPressure,
    Liver,
    Vision,
    Overall,
    Keywords,
}

impl Dimension {
    /// Dimensions in report order.
    pub const ALL: [Dimension; 6] = [
        Dimension::Obesity,
        Dimension::BloodPressure,
        Dimension::Liver,
        Dimension::Vision,
        Dimension::Overall,
        Dimension::Keywords,
    ];

    /// Stable identifier used for anchors and element ids.
    pub fn key(&self) -> &'static str {
        match self {
            Dimension::Obesity => "obesity",
            Dimension::BloodPressure => "blood-pressure",
            Dimension::Liver => "liver",
            Dimension::Vision => "vision",
            Dimension::Overall => "overall",
            Dimension::Keywords => "keywords",
        }
    }

    /// Whether every record lands in exactly one category.
    ///
    /// Keyword hits are not exclusive: one remark may mention several.
    pub fn is_exclusive(&self) -> bool {
        !matches!(self, Dimension::Keywords)
    }

    pub fn tab_label(&self, lang: Language) -> &'static str {
        match (self, lang) {
            (Dimension::Obesity, Language::En) => "Body composition",
            (Dimension::Obesity, Language::Ko) => "체격",
            (Dimension::BloodPressure, Language::En) => "Blood pressure",
            (Dimension::BloodPressure, Language::Ko) => "혈압",
            (Dimension::Liver, Language::En) => "Liver function",
            (Dimension::Liver, Language::Ko) => "간기능",
            (Dimension::Vision, Language::En) => "Vision",
            (Dimension::Vision, Language::Ko) => "시력",
            (Dimension::Overall, Language::En) => "Overall assessment",
            (Dimension::Overall, Language::Ko) => "종합판정",
            (Dimension::Keywords, Language::En) => "Actions / remarks",
            (Dimension::Keywords, Language::Ko) => "조치사항/소견",
        }
    }

    pub fn subtitle(&self, lang: Language) -> &'static str {
        match (self, lang) {
            (Dimension::Obesity, Language::En) => "Obesity distribution by class",
            (Dimension::Obesity, Language::Ko) => "체격 관련 (학급별 비만도 분포)",
            (Dimension::BloodPressure, Language::En) => {
                "Blood pressure (hypertension / hypotension share)"
            }
            (Dimension::BloodPressure, Language::Ko) => "혈압 관련 (고혈압 / 저혈압 비율)",
            (Dimension::Liver, Language::En) => "Abnormal liver function share (AST or ALT ≥ 40)",
            (Dimension::Liver, Language::Ko) => "간기능 이상 비율 (AST 또는 ALT ≥ 40)",
            (Dimension::Vision, Language::En) => "Vision (education office criteria)",
            (Dimension::Vision, Language::Ko) => "시력 관련 (교육청 기준)",
            (Dimension::Overall, Language::En) => "Overall assessment distribution",
            (Dimension::Overall, Language::Ko) => "종합판정 분포",
            (Dimension::Keywords, Language::En) => "Keyword analysis of actions and remarks",
            (Dimension::Keywords, Language::Ko) => "조치사항/소견 키워드 분석",
        }
    }

    pub fn chart_title(&self, lang: Language) -> &'static str {
        match (self, lang) {
            (Dimension::Obesity, Language::En) => "Obesity distribution by class (%)",
            (Dimension::Obesity, Language::Ko) => "학급별 비만도 분포 (%)",
            (Dimension::BloodPressure, Language::En) => "Blood pressure judgment by class (%)",
            (Dimension::BloodPressure, Language::Ko) => "학급별 혈압 판정 분포 (%)",
            (Dimension::Liver, Language::En) => "Liver function by class (%)",
            (Dimension::Liver, Language::Ko) => "학급별 간기능 이상 분포 (%)",
            (Dimension::Vision, Language::En) => "Vision judgment by class (%)",
            (Dimension::Vision, Language::Ko) => "학급별 시력 판정 분포 (%)",
            (Dimension::Overall, Language::En) => "Overall assessment by class (%)",
            (Dimension::Overall, Language::Ko) => "학급별 종합판정 분포 (%)",
            (Dimension::Keywords, Language::En) => "Keyword share by class (%)",
            (Dimension::Keywords, Language::Ko) => "학급별 조치사항/소견 키워드 비율 (%)",
        }
    }

    /// Heading of the category axis (chart legend and table columns).
    pub fn category_heading(&self, lang: Language) -> &'static str {
        match (self, lang) {
            (Dimension::Obesity, Language::En) => "Obesity",
            (Dimension::Obesity, Language::Ko) => "비만도_학생",
            (Dimension::BloodPressure, Language::En) => "Blood pressure",
            (Dimension::BloodPressure, Language::Ko) => "혈압판정",
            (Dimension::Liver, Language::En) => "Liver function",
            (Dimension::Liver, Language::Ko) => "간기능 이상",
            (Dimension::Vision, Language::En) => "Vision",
            (Dimension::Vision, Language::Ko) => "시력판정",
            (Dimension::Overall, Language::En) => "Overall assessment",
            (Dimension::Overall, Language::Ko) => "종합판정",
            (Dimension::Keywords, Language::En) => "Keyword",
            (Dimension::Keywords, Language::Ko) => "키워드",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Count and within-class share of one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub class: String,
    pub category: String,
    pub count: usize,
    /// Share of the class total, scaled to 100.
    pub percentage: f64,
}

/// Per-class distribution of one dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub dimension: Dimension,
    /// Classes in display order.
    pub classes: Vec<String>,
    /// Categories in display order.
    pub categories: Vec<String>,
    /// Observed (class, category) rows, class-major.
    pub rows: Vec<AggregateRow>,
}

impl Distribution {
    /// Rows belonging to one class.
    pub fn rows_for<'a>(&'a self, class: &'a str) -> impl Iterator<Item = &'a AggregateRow> + 'a {
        self.rows.iter().filter(move |row| row.class == class)
    }

    /// Percentage of a (class, category) cell, if it was observed.
    pub fn percentage(&self, class: &str, category: &str) -> Option<f64> {
        self.rows
            .iter()
            .find(|row| row.class == class && row.category == category)
            .map(|row| row.percentage)
    }

    /// Sum of the percentages of one class.
    pub fn class_total(&self, class: &str) -> f64 {
        self.rows_for(class).map(|row| row.percentage).sum()
    }

    /// Reshape into a class-by-category matrix rounded to one decimal.
    pub fn pivot(&self) -> PivotTable {
        let cells = self
            .classes
            .iter()
            .map(|class| {
                self.categories
                    .iter()
                    .map(|category| self.percentage(class, category).map(round1))
                    .collect()
            })
            .collect();

        PivotTable {
            classes: self.classes.clone(),
            categories: self.categories.clone(),
            cells,
        }
    }
}

/// Class-by-category matrix of percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotTable {
    pub classes: Vec<String>,
    pub categories: Vec<String>,
    /// `cells[class][category]`; `None` where the pair was never observed.
    pub cells: Vec<Vec<Option<f64>>>,
}

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    /// Records read from the sheet.
    pub record_count: usize,
    /// Distinct classes among the aggregated records.
    pub class_count: usize,
    /// Records left out of aggregation because their class is blank.
    pub skipped_records: usize,
    /// One distribution per dimension, in report order.
    pub distributions: Vec<Distribution>,
}

impl Analysis {
    pub fn distribution(&self, dimension: Dimension) -> Option<&Distribution> {
        self.distributions.iter().find(|d| d.dimension == dimension)
    }
}

/// First rows of the selected columns, shown unprocessed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Preview {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Preview {
    /// Take the first `limit` raw rows of a dataset.
    pub fn from_dataset(dataset: &Dataset, limit: usize) -> Self {
        Self {
            columns: dataset.columns.clone(),
            rows: dataset.raw_rows.iter().take(limit).cloned().collect(),
        }
    }
}

/// Metadata about the generated report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Path of the analyzed spreadsheet.
    pub source: String,
    /// Sheet the records came from.
    pub sheet: String,
    /// Date and time of the run.
    pub generated_at: DateTime<Utc>,
    /// Language of the labels.
    pub language: Language,
    /// Duration of the run in seconds.
    pub duration_seconds: f64,
}

/// The complete checkup statistics report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub analysis: Analysis,
    pub preview: Preview,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(class: &str, category: &str, count: usize, percentage: f64) -> AggregateRow {
        AggregateRow {
            class: class.to_string(),
            category: category.to_string(),
            count,
            percentage,
        }
    }

    fn sample_distribution() -> Distribution {
        Distribution {
            dimension: Dimension::Liver,
            classes: vec!["1".to_string(), "2".to_string()],
            categories: vec!["abnormal".to_string(), "normal".to_string()],
            rows: vec![
                row("1", "abnormal", 1, 100.0 / 3.0),
                row("1", "normal", 2, 200.0 / 3.0),
                row("2", "normal", 4, 100.0),
            ],
        }
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(33.333), 33.3);
        assert_eq!(round1(66.666), 66.7);
        assert_eq!(round1(0.0), 0.0);
    }

    #[test]
    fn test_pivot_marks_unobserved_cells() {
        let pivot = sample_distribution().pivot();

        assert_eq!(pivot.classes, vec!["1", "2"]);
        assert_eq!(pivot.cells[0], vec![Some(33.3), Some(66.7)]);
        assert_eq!(pivot.cells[1], vec![None, Some(100.0)]);
    }

    #[test]
    fn test_class_total() {
        let dist = sample_distribution();
        assert!((dist.class_total("1") - 100.0).abs() < 1e-9);
        assert_eq!(dist.class_total("3"), 0.0);
    }

    #[test]
    fn test_dimension_labels() {
        assert_eq!(Dimension::Obesity.tab_label(Language::Ko), "체격");
        assert_eq!(Dimension::Keywords.tab_label(Language::Ko), "조치사항/소견");
        assert_eq!(Dimension::Vision.category_heading(Language::Ko), "시력판정");
        assert!(Dimension::Overall.is_exclusive());
        assert!(!Dimension::Keywords.is_exclusive());
    }

    #[test]
    fn test_preview_truncates() {
        let dataset = Dataset {
            source: PathBuf::from("sample.csv"),
            sheet: "sample".to_string(),
            columns: vec!["반".to_string()],
            records: Vec::new(),
            raw_rows: (0..50).map(|i| vec![i.to_string()]).collect(),
        };

        let preview = Preview::from_dataset(&dataset, 30);
        assert_eq!(preview.rows.len(), 30);
        assert_eq!(preview.rows[29], vec!["29"]);
    }
}
