//! Per-record health judgments derived from raw measurements.
//!
//! Every classifier is a pure function of its inputs. A missing
//! measurement yields the `Unknown` judgment instead of an error.

use crate::models::{Language, Record};
use serde::{Deserialize, Serialize};

/// Slack for threshold comparisons on differences of decimal inputs.
const EPSILON: f64 = 1e-9;

/// A categorical judgment with a fixed display order.
pub trait Judgment: Copy + PartialEq + 'static {
    /// All variants in display order; `Unknown` is last.
    const ORDER: &'static [Self];

    fn label(self, lang: Language) -> &'static str;
}

/// Blood pressure judgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BloodPressure {
    HypertensionSuspected,
    HypotensionSuspected,
    Normal,
    Unknown,
}

impl Judgment for BloodPressure {
    const ORDER: &'static [Self] = &[
        BloodPressure::HypertensionSuspected,
        BloodPressure::HypotensionSuspected,
        BloodPressure::Normal,
        BloodPressure::Unknown,
    ];

    fn label(self, lang: Language) -> &'static str {
        match (self, lang) {
            (BloodPressure::HypertensionSuspected, Language::En) => "hypertension suspected",
            (BloodPressure::HypertensionSuspected, Language::Ko) => "고혈압 의심",
            (BloodPressure::HypotensionSuspected, Language::En) => "hypotension suspected",
            (BloodPressure::HypotensionSuspected, Language::Ko) => "저혈압 의심",
            (BloodPressure::Normal, Language::En) => "normal",
            (BloodPressure::Normal, Language::Ko) => "정상",
            (BloodPressure::Unknown, _) => lang.unknown(),
        }
    }
}

/// Vision judgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vision {
    /// Left and right acuity differ by 0.3 or more.
    LeftRightDifference,
    /// Either eye below 0.3.
    SevereReduction,
    /// Either eye below 0.7.
    MildReduction,
    Normal,
    Unknown,
}

impl Judgment for Vision {
    const ORDER: &'static [Self] = &[
        Vision::LeftRightDifference,
        Vision::SevereReduction,
        Vision::MildReduction,
        Vision::Normal,
        Vision::Unknown,
    ];

    fn label(self, lang: Language) -> &'static str {
        match (self, lang) {
            (Vision::LeftRightDifference, Language::En) => "left-right difference ≥0.3",
            (Vision::LeftRightDifference, Language::Ko) => "좌우차 0.3 이상",
            (Vision::SevereReduction, Language::En) => "severe reduction (<0.3)",
            (Vision::SevereReduction, Language::Ko) => "심한 시력저하 (0.3 미만)",
            (Vision::MildReduction, Language::En) => "mild reduction (0.3–0.7)",
            (Vision::MildReduction, Language::Ko) => "경도 시력저하 (0.3~0.7)",
            (Vision::Normal, Language::En) => "normal",
            (Vision::Normal, Language::Ko) => "정상",
            (Vision::Unknown, _) => lang.unknown(),
        }
    }
}

/// Liver function judgment from serum enzymes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiverFunction {
    Abnormal,
    Normal,
    Unknown,
}

impl Judgment for LiverFunction {
    const ORDER: &'static [Self] = &[
        LiverFunction::Abnormal,
        LiverFunction::Normal,
        LiverFunction::Unknown,
    ];

    fn label(self, lang: Language) -> &'static str {
        match (self, lang) {
            (LiverFunction::Abnormal, Language::En) => "abnormal",
            (LiverFunction::Abnormal, Language::Ko) => "이상",
            (LiverFunction::Normal, Language::En) => "normal",
            (LiverFunction::Normal, Language::Ko) => "정상",
            (LiverFunction::Unknown, _) => lang.unknown(),
        }
    }
}

/// Classify blood pressure.
///
/// High readings win over low ones. A single known high reading is enough
/// for `HypertensionSuspected`; every other outcome needs both readings.
pub fn classify_blood_pressure(systolic: Option<f64>, diastolic: Option<f64>) -> BloodPressure {
    let high = systolic.is_some_and(|s| s >= 130.0) || diastolic.is_some_and(|d| d >= 80.0);
    if high {
        return BloodPressure::HypertensionSuspected;
    }

    let (Some(systolic), Some(diastolic)) = (systolic, diastolic) else {
        return BloodPressure::Unknown;
    };

    if systolic < 90.0 || diastolic < 60.0 {
        BloodPressure::HypotensionSuspected
    } else {
        BloodPressure::Normal
    }
}

/// Classify visual acuity. Asymmetry is checked before absolute level.
///
/// The left/right difference is compared against 0.3 with a 1e-9 slack,
/// so decimal inputs that differ by exactly 0.3 count as a difference.
/// A plain float comparison disagrees on such pairs: `0.7 - 0.4` is
/// `0.29999999999999993`, and `>= 0.3` alone would call (0.7, 0.4) a
/// mild reduction instead.
pub fn classify_vision(left: Option<f64>, right: Option<f64>) -> Vision {
    let (Some(left), Some(right)) = (left, right) else {
        return Vision::Unknown;
    };

    if (left - right).abs() >= 0.3 - EPSILON {
        Vision::LeftRightDifference
    } else if left < 0.3 || right < 0.3 {
        Vision::SevereReduction
    } else if left < 0.7 || right < 0.7 {
        Vision::MildReduction
    } else {
        Vision::Normal
    }
}

/// Classify liver function. Either enzyme at 40 or above is abnormal.
pub fn classify_liver(ast: Option<f64>, alt: Option<f64>) -> LiverFunction {
    let abnormal = ast.is_some_and(|v| v >= 40.0) || alt.is_some_and(|v| v >= 40.0);
    if abnormal {
        LiverFunction::Abnormal
    } else if ast.is_some() && alt.is_some() {
        LiverFunction::Normal
    } else {
        LiverFunction::Unknown
    }
}

pub fn blood_pressure(record: &Record) -> BloodPressure {
    classify_blood_pressure(record.systolic, record.diastolic)
}

pub fn vision(record: &Record) -> Vision {
    classify_vision(record.vision_left, record.vision_right)
}

pub fn liver(record: &Record) -> LiverFunction {
    classify_liver(record.ast, record.alt)
}
