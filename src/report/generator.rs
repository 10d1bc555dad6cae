//! Markdown and JSON report generation.
//!
//! This module generates the per-class statistics report: one section per
//! analysis dimension, each with a text bar chart and a pivot table, plus
//! a preview of the raw rows.

use crate::models::{Distribution, Language, Preview, Report, ReportMetadata};
use anyhow::Result;
use std::cmp::Ordering;

/// Width of a text bar, in cells.
const BAR_WIDTH: usize = 40;

/// Fill glyph per category, cycled when there are more categories.
const GLYPHS: [char; 8] = ['█', '▓', '▒', '░', '#', '=', '+', '*'];

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let lang = report.metadata.language;
    let mut output = String::new();

    // Title
    output.push_str("# Health Checkup Statistics by Class\n\n");

    // Metadata section
    output.push_str(&generate_metadata_section(report));

    // Table of contents
    output.push_str(&generate_table_of_contents(report));

    // One section per dimension
    for dist in &report.analysis.distributions {
        output.push_str(&generate_distribution_section(dist, lang));
    }

    // Raw data preview
    output.push_str(&generate_preview_section(&report.preview, lang));

    // Footer
    output.push_str(&generate_footer(&report.metadata));

    output
}

/// Generate the metadata section.
fn generate_metadata_section(report: &Report) -> String {
    let metadata = &report.metadata;
    let analysis = &report.analysis;
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** `{}`\n", metadata.source));
    section.push_str(&format!("- **Sheet:** {}\n", metadata.sheet));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Language:** {}\n", metadata.language));
    section.push_str(&format!("- **Records:** {}\n", analysis.record_count));
    section.push_str(&format!("- **Classes:** {}\n", analysis.class_count));
    if analysis.skipped_records > 0 {
        section.push_str(&format!(
            "- **Skipped (no class):** {}\n",
            analysis.skipped_records
        ));
    }
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents(report: &Report) -> String {
    let lang = report.metadata.language;
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");

    for dist in &report.analysis.distributions {
        toc.push_str(&format!(
            "- [{}](#{})\n",
            dist.dimension.tab_label(lang),
            dist.dimension.key()
        ));
    }
    toc.push_str(&format!("- [{}](#raw-data)\n", lang.preview_tab()));
    toc.push('\n');

    toc
}

/// Generate the chart and table of one dimension.
fn generate_distribution_section(dist: &Distribution, lang: Language) -> String {
    let mut section = String::new();
    let dimension = dist.dimension;

    section.push_str(&format!(
        "## {} {{#{}}}\n\n",
        dimension.tab_label(lang),
        dimension.key()
    ));
    section.push_str(&format!("*{}*\n\n", dimension.subtitle(lang)));

    if dist.classes.is_empty() {
        section.push_str("No records with a class label.\n\n");
        return section;
    }

    section.push_str(&format!("### {}\n\n", dimension.chart_title(lang)));
    section.push_str(&text_bar_chart(dist));
    section.push_str(&pivot_table_markdown(dist, lang));

    section
}

/// Split `width` cells among shares proportionally (largest remainder).
///
/// Returns all zeros when the shares sum to zero.
pub fn segment_widths(shares: &[f64], width: usize) -> Vec<usize> {
    let total: f64 = shares.iter().sum();
    if total <= 0.0 {
        return vec![0; shares.len()];
    }

    let exact: Vec<f64> = shares.iter().map(|s| s / total * width as f64).collect();
    let mut widths: Vec<usize> = exact.iter().map(|e| e.floor() as usize).collect();
    let mut remaining = width.saturating_sub(widths.iter().sum());

    let mut order: Vec<usize> = (0..exact.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.partial_cmp(&ra).unwrap_or(Ordering::Equal).then(a.cmp(&b))
    });

    for i in order {
        if remaining == 0 {
            break;
        }
        widths[i] += 1;
        remaining -= 1;
    }

    widths
}

/// Render a 100%-stacked bar per class, with a legend.
pub fn text_bar_chart(dist: &Distribution) -> String {
    let label_width = dist
        .classes
        .iter()
        .map(|c| c.chars().count())
        .max()
        .unwrap_or(0);

    let mut chart = String::from("```text\n");

    for class in &dist.classes {
        let shares: Vec<f64> = dist
            .categories
            .iter()
            .map(|category| dist.percentage(class, category).unwrap_or(0.0))
            .collect();
        let widths = segment_widths(&shares, BAR_WIDTH);

        let mut bar = String::new();
        for (i, width) in widths.iter().enumerate() {
            bar.extend(std::iter::repeat(GLYPHS[i % GLYPHS.len()]).take(*width));
        }
        let filled: usize = widths.iter().sum();
        bar.extend(std::iter::repeat(' ').take(BAR_WIDTH - filled));

        let labels: Vec<String> = shares
            .iter()
            .filter(|share| **share > 0.0)
            .map(|share| format!("{:.1}", share))
            .collect();

        let padding = label_width - class.chars().count();
        chart.push_str(&format!(
            "{}{} |{}| {}\n",
            class,
            " ".repeat(padding),
            bar,
            labels.join(" / ")
        ));
    }

    chart.push('\n');
    for (i, category) in dist.categories.iter().enumerate() {
        chart.push_str(&format!("{} {}\n", GLYPHS[i % GLYPHS.len()], category));
    }
    chart.push_str("```\n\n");

    chart
}

/// Render the class-by-category pivot table, one decimal per cell.
pub fn pivot_table_markdown(dist: &Distribution, lang: Language) -> String {
    let pivot = dist.pivot();
    let mut table = String::new();

    table.push_str(&format!("| {} ", lang.class_heading()));
    for category in &pivot.categories {
        table.push_str(&format!("| {} ", escape_cell(category)));
    }
    table.push_str("|\n|:---");
    for _ in &pivot.categories {
        table.push_str("|---:");
    }
    table.push_str("|\n");

    for (class, cells) in pivot.classes.iter().zip(&pivot.cells) {
        table.push_str(&format!("| {} ", escape_cell(class)));
        for cell in cells {
            match cell {
                Some(value) => table.push_str(&format!("| {:.1} ", value)),
                None => table.push_str("| - "),
            }
        }
        table.push_str("|\n");
    }
    table.push('\n');

    table
}

/// Generate the raw data preview section.
fn generate_preview_section(preview: &Preview, lang: Language) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {} {{#raw-data}}\n\n", lang.preview_tab()));
    section.push_str(&format!("*{}*\n\n", lang.preview_title()));

    if preview.rows.is_empty() {
        section.push_str("No rows.\n\n");
        return section;
    }

    section.push_str(&format!(
        "| {} |\n",
        preview
            .columns
            .iter()
            .map(|c| escape_cell(c))
            .collect::<Vec<_>>()
            .join(" | ")
    ));
    section.push_str(&format!("|{}\n", ":---|".repeat(preview.columns.len())));

    for row in &preview.rows {
        section.push_str(&format!(
            "| {} |\n",
            row.iter()
                .map(|c| escape_cell(c))
                .collect::<Vec<_>>()
                .join(" | ")
        ));
    }
    section.push('\n');

    section
}

/// Escape text for use inside a Markdown table cell.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}

/// Generate the report footer.
fn generate_footer(metadata: &ReportMetadata) -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by checkup-stats v{} in {:.2}s*\n",
        env!("CARGO_PKG_VERSION"),
        metadata.duration_seconds
    ));

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AggregateRow, Analysis, Dimension};
    use chrono::Utc;

    fn row(class: &str, category: &str, count: usize, percentage: f64) -> AggregateRow {
        AggregateRow {
            class: class.to_string(),
            category: category.to_string(),
            count,
            percentage,
        }
    }

    fn liver_distribution() -> Distribution {
        Distribution {
            dimension: Dimension::Liver,
            classes: vec!["1".to_string(), "10".to_string()],
            categories: vec!["abnormal".to_string(), "normal".to_string()],
            rows: vec![
                row("1", "abnormal", 1, 25.0),
                row("1", "normal", 3, 75.0),
                row("10", "normal", 2, 100.0),
            ],
        }
    }

    fn create_test_report() -> Report {
        let distributions = Dimension::ALL
            .iter()
            .map(|&dimension| Distribution {
                dimension,
                ..liver_distribution()
            })
            .collect();

        Report {
            metadata: ReportMetadata {
                source: "checkup.xlsx".to_string(),
                sheet: "데이터 엑셀다운".to_string(),
                generated_at: Utc::now(),
                language: Language::Ko,
                duration_seconds: 0.25,
            },
            analysis: Analysis {
                record_count: 7,
                class_count: 2,
                skipped_records: 1,
                distributions,
            },
            preview: Preview {
                columns: vec!["반".to_string(), "소견".to_string()],
                rows: vec![vec!["1".to_string(), "a|b".to_string()]],
            },
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("# Health Checkup Statistics by Class"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("- **Skipped (no class):** 1"));
        for dimension in Dimension::ALL {
            assert!(markdown.contains(&format!("## {}", dimension.tab_label(Language::Ko))));
        }
        assert!(markdown.contains("## 원본 데이터"));
        assert!(markdown.contains("| 1 | a\\|b |"));
    }

    #[test]
    fn test_segment_widths() {
        assert_eq!(segment_widths(&[25.0, 75.0], 40), vec![10, 30]);
        assert_eq!(segment_widths(&[0.0, 0.0], 40), vec![0, 0]);

        let thirds = segment_widths(&[100.0 / 3.0, 100.0 / 3.0, 100.0 / 3.0], 40);
        assert_eq!(thirds.iter().sum::<usize>(), 40);
        assert_eq!(thirds, vec![14, 13, 13]);
    }

    #[test]
    fn test_text_bar_chart() {
        let chart = text_bar_chart(&liver_distribution());

        let bars: Vec<&str> = chart.lines().filter(|l| l.contains('|')).collect();
        assert_eq!(bars.len(), 2);
        assert!(bars[0].starts_with("1  |"));
        assert!(bars[0].ends_with("25.0 / 75.0"));
        assert!(bars[1].starts_with("10 |"));
        assert_eq!(bars[1].matches('▓').count(), 40);
        assert!(chart.contains("█ abnormal"));
    }

    #[test]
    fn test_pivot_table_markdown() {
        let table = pivot_table_markdown(&liver_distribution(), Language::En);

        assert!(table.starts_with("| Class | abnormal | normal |"));
        assert!(table.contains("| 1 | 25.0 | 75.0 |"));
        assert!(table.contains("| 10 | - | 100.0 |"));
    }

    #[test]
    fn test_empty_distribution_section() {
        let dist = Distribution {
            dimension: Dimension::Vision,
            classes: Vec::new(),
            categories: Vec::new(),
            rows: Vec::new(),
        };
        let section = generate_distribution_section(&dist, Language::En);
        assert!(section.contains("No records with a class label."));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"metadata\""));
        assert!(json.contains("\"distributions\""));
        assert!(json.contains("\"blood_pressure\""));
        assert!(json.contains("\"percentage\""));
    }
}
