//! Analysis pipeline.
//!
//! Classifies each record and aggregates the judgments into per-class
//! distributions. Nothing here touches the filesystem.

pub mod aggregator;
pub mod classify;

pub use aggregator::*;

use crate::models::{Analysis, Dataset, Language};

/// Settings of one pipeline run.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Language of category labels.
    pub language: Language,
    /// Keyword vocabulary for the remarks tally.
    pub keywords: Vec<String>,
}

impl From<&crate::config::Config> for AnalysisOptions {
    fn from(config: &crate::config::Config) -> Self {
        let mut keywords: Vec<String> = Vec::new();
        for keyword in &config.analysis.keywords {
            let keyword = keyword.trim();
            if !keyword.is_empty() && !keywords.iter().any(|k| k == keyword) {
                keywords.push(keyword.to_string());
            }
        }

        Self {
            language: config.report.language,
            keywords,
        }
    }
}

/// Run the classification and aggregation pipeline over a dataset.
pub fn analyze(dataset: &Dataset, options: &AnalysisOptions) -> Analysis {
    let groups = group_by_class(&dataset.records);
    let aggregated: usize = groups.values().map(Vec::len).sum();
    let lang = options.language;

    let distributions = vec![
        obesity_distribution(&groups, lang),
        blood_pressure_distribution(&groups, lang),
        liver_distribution(&groups, lang),
        vision_distribution(&groups, lang),
        overall_distribution(&groups, lang),
        keyword_distribution(&groups, &options.keywords),
    ];

    Analysis {
        record_count: dataset.records.len(),
        class_count: groups.len(),
        skipped_records: dataset.records.len() - aggregated,
        distributions,
    }
}
