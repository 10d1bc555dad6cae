//! Per-class aggregation and percentage statistics.
//!
//! This module groups records by class, counts categories within each
//! class, and converts the counts into within-class percentages.

use crate::analysis::classify::{self, Judgment};
use crate::models::{AggregateRow, Dimension, Distribution, Language, Record};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Class label with natural ordering: integer labels first, numerically,
/// then everything else lexicographically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassKey(pub String);

impl Ord for ClassKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0.parse::<i64>(), other.0.parse::<i64>()) {
            (Ok(a), Ok(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for ClassKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Records grouped by class, in class order.
pub type ClassGroups<'a> = BTreeMap<ClassKey, Vec<&'a Record>>;

/// Group records by class. Records without a class are left out.
pub fn group_by_class(records: &[Record]) -> ClassGroups<'_> {
    let mut grouped: ClassGroups<'_> = BTreeMap::new();

    for record in records {
        if let Some(ref class) = record.class {
            grouped
                .entry(ClassKey(class.clone()))
                .or_default()
                .push(record);
        }
    }

    grouped
}

/// Share of `count` in `total`, scaled to 100. Zero when `total` is zero.
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// Number of non-overlapping occurrences of `keyword` in `text`.
pub fn count_keyword(text: &str, keyword: &str) -> usize {
    if keyword.is_empty() {
        return 0;
    }
    text.matches(keyword).count()
}

/// Remedial action and remarks of a class, joined into one text.
pub fn class_text(members: &[&Record]) -> String {
    members
        .iter()
        .map(|r| {
            format!(
                "{} {}",
                r.action.as_deref().unwrap_or(""),
                r.remarks.as_deref().unwrap_or("")
            )
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Category counts of one class.
struct ClassTally {
    class: String,
    counts: BTreeMap<String, usize>,
    total: usize,
}

/// Count one label per record within each class.
fn tally_labels<F>(groups: &ClassGroups<'_>, label_of: F) -> Vec<ClassTally>
where
    F: Fn(&Record) -> String,
{
    groups
        .iter()
        .map(|(class, members)| {
            let mut counts: BTreeMap<String, usize> = BTreeMap::new();
            for &record in members.iter() {
                *counts.entry(label_of(record)).or_default() += 1;
            }
            ClassTally {
                class: class.0.clone(),
                counts,
                total: members.len(),
            }
        })
        .collect()
}

/// Categories seen in any class.
fn observed(tallies: &[ClassTally]) -> BTreeSet<String> {
    tallies
        .iter()
        .flat_map(|t| t.counts.keys().cloned())
        .collect()
}

/// Observed labels of a judgment, in the judgment's own order.
fn judgment_order<J: Judgment>(lang: Language, observed: &BTreeSet<String>) -> Vec<String> {
    J::ORDER
        .iter()
        .map(|j| j.label(lang).to_string())
        .filter(|label| observed.contains(label))
        .collect()
}

/// Observed free-text labels, sorted, with the unknown bucket last.
fn free_text_order(observed: BTreeSet<String>, unknown: &str) -> Vec<String> {
    let (mut known, unknowns): (Vec<_>, Vec<_>) =
        observed.into_iter().partition(|category| category != unknown);
    known.extend(unknowns);
    known
}

fn into_distribution(
    dimension: Dimension,
    tallies: Vec<ClassTally>,
    categories: Vec<String>,
) -> Distribution {
    let mut rows = Vec::new();

    for tally in &tallies {
        for category in &categories {
            if let Some(&count) = tally.counts.get(category) {
                rows.push(AggregateRow {
                    class: tally.class.clone(),
                    category: category.clone(),
                    count,
                    percentage: percentage(count, tally.total),
                });
            }
        }
    }

    Distribution {
        dimension,
        classes: tallies.into_iter().map(|t| t.class).collect(),
        categories,
        rows,
    }
}

fn judgment_distribution<J, F>(
    dimension: Dimension,
    groups: &ClassGroups<'_>,
    lang: Language,
    judge: F,
) -> Distribution
where
    J: Judgment,
    F: Fn(&Record) -> J,
{
    let tallies = tally_labels(groups, |record| judge(record).label(lang).to_string());
    let categories = judgment_order::<J>(lang, &observed(&tallies));
    into_distribution(dimension, tallies, categories)
}

/// Tally a pre-labeled text field. Blank cells count as the unknown label
/// of `lang`; a cell whose text already equals that label ("unknown" or
/// "미상") lands in the same bucket and is ordered last with it.
fn free_text_distribution<F>(
    dimension: Dimension,
    groups: &ClassGroups<'_>,
    lang: Language,
    field: F,
) -> Distribution
where
    F: Fn(&Record) -> Option<&str>,
{
    let unknown = lang.unknown();
    let tallies = tally_labels(groups, |record| field(record).unwrap_or(unknown).to_string());
    let categories = free_text_order(observed(&tallies), unknown);
    into_distribution(dimension, tallies, categories)
}

/// Distribution of the pre-labeled obesity category.
///
/// Blank cells and cells reading the unknown label share one category.
pub fn obesity_distribution(groups: &ClassGroups<'_>, lang: Language) -> Distribution {
    free_text_distribution(Dimension::Obesity, groups, lang, |r| r.obesity.as_deref())
}

/// Distribution of the blood pressure judgment.
pub fn blood_pressure_distribution(groups: &ClassGroups<'_>, lang: Language) -> Distribution {
    judgment_distribution(Dimension::BloodPressure, groups, lang, classify::blood_pressure)
}

/// Distribution of the liver function judgment.
pub fn liver_distribution(groups: &ClassGroups<'_>, lang: Language) -> Distribution {
    judgment_distribution(Dimension::Liver, groups, lang, classify::liver)
}

/// Distribution of the vision judgment.
pub fn vision_distribution(groups: &ClassGroups<'_>, lang: Language) -> Distribution {
    judgment_distribution(Dimension::Vision, groups, lang, classify::vision)
}

/// Distribution of the pre-labeled overall assessment.
///
/// Blank cells and cells reading the unknown label share one category.
pub fn overall_distribution(groups: &ClassGroups<'_>, lang: Language) -> Distribution {
    free_text_distribution(Dimension::Overall, groups, lang, |r| r.overall.as_deref())
}

/// Keyword tally over remedial action and remarks text.
///
/// Every keyword gets a row for every class, zero counts included.
/// Percentages are shares of the class's total keyword hits.
pub fn keyword_distribution(groups: &ClassGroups<'_>, keywords: &[String]) -> Distribution {
    let tallies = groups
        .iter()
        .map(|(class, members)| {
            let text = class_text(members);
            let counts: BTreeMap<String, usize> = keywords
                .iter()
                .map(|kw| (kw.clone(), count_keyword(&text, kw)))
                .collect();
            let total = counts.values().sum();
            ClassTally {
                class: class.0.clone(),
                counts,
                total,
            }
        })
        .collect();

    into_distribution(Dimension::Keywords, tallies, keywords.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(class: &str) -> Record {
        Record {
            class: Some(class.to_string()),
            ..Record::default()
        }
    }

    fn with_bp(class: &str, systolic: Option<f64>, diastolic: Option<f64>) -> Record {
        Record {
            systolic,
            diastolic,
            ..record(class)
        }
    }

    fn with_text(class: &str, action: Option<&str>, remarks: Option<&str>) -> Record {
        Record {
            action: action.map(String::from),
            remarks: remarks.map(String::from),
            ..record(class)
        }
    }

    fn keywords() -> Vec<String> {
        ["체중", "빈혈", "고혈압", "간", "추가검사", "시력"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_class_key_natural_order() {
        let mut keys: Vec<ClassKey> = ["10", "2", "B", "1", "A"]
            .into_iter()
            .map(|s| ClassKey(s.to_string()))
            .collect();
        keys.sort();

        let ordered: Vec<&str> = keys.iter().map(|k| k.0.as_str()).collect();
        assert_eq!(ordered, vec!["1", "2", "10", "A", "B"]);
    }

    #[test]
    fn test_group_by_class_skips_blank_class() {
        let records = vec![record("2"), record("1"), Record::default(), record("2")];
        let groups = group_by_class(&records);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups.get(&ClassKey("2".to_string())).map(Vec::len), Some(2));
        assert_eq!(groups.keys().next().map(|k| k.0.as_str()), Some("1"));
    }

    #[test]
    fn test_percentage_zero_total() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(1, 4), 25.0);
    }

    #[test]
    fn test_exclusive_percentages_sum_to_100() {
        let records = vec![
            with_bp("1", Some(140.0), Some(70.0)),
            with_bp("1", Some(85.0), Some(55.0)),
            with_bp("1", Some(110.0), Some(70.0)),
            with_bp("2", Some(110.0), Some(70.0)),
            with_bp("2", None, None),
            with_bp("2", Some(120.0), Some(75.0)),
        ];
        let groups = group_by_class(&records);
        let dist = blood_pressure_distribution(&groups, Language::En);

        for class in &dist.classes {
            assert!((dist.class_total(class) - 100.0).abs() < 0.1);
        }
        assert_eq!(
            dist.categories,
            vec![
                "hypertension suspected",
                "hypotension suspected",
                "normal",
                "unknown"
            ]
        );
    }

    #[test]
    fn test_all_null_blood_pressure_is_unknown() {
        let records = vec![
            with_bp("1", Some(110.0), Some(70.0)),
            with_bp("3", None, None),
            with_bp("3", None, None),
            with_bp("3", None, None),
        ];
        let groups = group_by_class(&records);
        let dist = blood_pressure_distribution(&groups, Language::En);

        let rows: Vec<_> = dist.rows_for("3").collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].category, "unknown");
        assert_eq!(rows[0].count, 3);
        assert_eq!(rows[0].percentage, 100.0);
    }

    #[test]
    fn test_free_text_unknown_sorted_last() {
        let mut a = record("1");
        a.obesity = Some("정상".to_string());
        let mut b = record("1");
        b.obesity = Some("비만".to_string());
        let c = record("1");

        let records = vec![a, b, c];
        let groups = group_by_class(&records);
        let dist = obesity_distribution(&groups, Language::Ko);

        assert_eq!(dist.categories, vec!["비만", "정상", "미상"]);
        let pivot = dist.pivot();
        assert_eq!(pivot.cells[0], vec![Some(33.3), Some(33.3), Some(33.3)]);
    }

    #[test]
    fn test_literal_unknown_label_merges_with_blank() {
        let mut a = record("1");
        a.overall = Some("미상".to_string());
        let mut b = record("1");
        b.overall = Some("정상A".to_string());
        let c = record("1");

        let records = vec![a, b, c];
        let groups = group_by_class(&records);

        let ko = overall_distribution(&groups, Language::Ko);
        assert_eq!(ko.categories, vec!["정상A", "미상"]);
        let unknown = ko.rows_for("1").find(|r| r.category == "미상").unwrap();
        assert_eq!(unknown.count, 2);

        // In English the literal "미상" is an ordinary label.
        let en = overall_distribution(&groups, Language::En);
        assert_eq!(en.categories, vec!["미상", "정상A", "unknown"]);
    }

    #[test]
    fn test_unobserved_categories_have_no_rows() {
        let mut a = record("1");
        a.overall = Some("정상A".to_string());
        let mut b = record("2");
        b.overall = Some("정상B".to_string());

        let records = vec![a, b];
        let groups = group_by_class(&records);
        let dist = overall_distribution(&groups, Language::Ko);

        assert_eq!(dist.rows.len(), 2);
        assert_eq!(dist.percentage("1", "정상B"), None);
        assert_eq!(dist.percentage("2", "정상B"), Some(100.0));
    }

    #[test]
    fn test_keyword_counted_per_occurrence() {
        assert_eq!(count_keyword("빈혈 추적 빈혈 의심", "빈혈"), 2);
        assert_eq!(count_keyword("간기능 이상", "간"), 1);
        assert_eq!(count_keyword("anything", ""), 0);

        let records = vec![with_text("1", Some("빈혈 추적"), Some("빈혈 의심"))];
        let groups = group_by_class(&records);
        let dist = keyword_distribution(&groups, &keywords());

        let anemia = dist
            .rows_for("1")
            .find(|r| r.category == "빈혈")
            .map(|r| r.count);
        assert_eq!(anemia, Some(2));
    }

    #[test]
    fn test_keyword_rows_include_zero_counts() {
        let records = vec![
            with_text("1", Some("체중 관리"), Some("고혈압 의심")),
            with_text("2", None, None),
        ];
        let groups = group_by_class(&records);
        let dist = keyword_distribution(&groups, &keywords());

        assert_eq!(dist.rows.len(), 12);
        assert_eq!(dist.percentage("1", "체중"), Some(50.0));
        assert_eq!(dist.percentage("1", "빈혈"), Some(0.0));
        assert_eq!(dist.class_total("2"), 0.0);
    }

    #[test]
    fn test_class_text_joins_fields() {
        let a = with_text("1", Some("체중"), None);
        let b = with_text("1", None, Some("시력"));
        let members = vec![&a, &b];

        assert_eq!(class_text(&members), "체중   시력");
    }

    #[test]
    fn test_distribution_is_deterministic() {
        let records = vec![
            with_bp("2", Some(140.0), Some(90.0)),
            with_bp("1", Some(100.0), Some(65.0)),
            with_bp("10", None, Some(50.0)),
        ];
        let first = blood_pressure_distribution(&group_by_class(&records), Language::En);
        let second = blood_pressure_distribution(&group_by_class(&records), Language::En);

        assert_eq!(first, second);
        assert_eq!(first.classes, vec!["1", "2", "10"]);
    }
}
