//! Self-contained HTML report.
//!
//! One tab per dimension plus a raw data tab, switched with CSS radio
//! buttons so the page works without scripts. Charts are inline SVG
//! stacked bars.

use crate::models::{Distribution, Language, Preview, Report};
use std::fmt::Write;

/// Segment colors, cycled per category.
const PALETTE: [&str; 10] = [
    "#636efa", "#ef553b", "#00cc96", "#ab63fa", "#ffa15a", "#19d3f3", "#ff6692", "#b6e880",
    "#ff97ff", "#fecb52",
];

/// Segments below this share (in percent) are drawn without a label.
const LABEL_MIN_SHARE: f64 = 5.0;

const PLOT_LEFT: f64 = 56.0;
const PLOT_TOP: f64 = 24.0;
const PLOT_HEIGHT: f64 = 260.0;
const SLOT_WIDTH: f64 = 64.0;
const LEGEND_WIDTH: f64 = 200.0;

const STYLE: &str = r#"
body { font-family: "Noto Sans KR", "Segoe UI", sans-serif; margin: 2rem; color: #1f2430; }
h1 { margin-bottom: 0.25rem; }
.meta { color: #5b6270; margin-bottom: 1.5rem; }
.tabs > input { display: none; }
.tabs > label { display: inline-block; padding: 0.5rem 1rem; border: 1px solid #d0d4dc; border-bottom: none; border-radius: 6px 6px 0 0; cursor: pointer; background: #f3f4f7; }
.tabs > input:checked + label { background: #ffffff; font-weight: 600; }
.panel { display: none; border: 1px solid #d0d4dc; padding: 1rem 1.5rem; }
table { border-collapse: collapse; margin-top: 1rem; font-size: 0.9rem; }
th, td { border: 1px solid #d0d4dc; padding: 0.3rem 0.6rem; }
td.num { text-align: right; }
th { background: #f3f4f7; }
.preview { overflow-x: auto; }
"#;

/// Generate a complete HTML page.
pub fn generate_html_report(report: &Report) -> String {
    let lang = report.metadata.language;
    let metadata = &report.metadata;
    let analysis = &report.analysis;
    let mut html = String::new();

    let _ = writeln!(html, "<!DOCTYPE html>");
    let _ = writeln!(html, "<html lang=\"{}\">", lang);
    let _ = writeln!(html, "<head>");
    let _ = writeln!(html, "<meta charset=\"utf-8\">");
    let _ = writeln!(html, "<title>Health Checkup Statistics by Class</title>");
    let _ = writeln!(html, "<style>{}", STYLE);

    // Each radio shows the panel with the matching id.
    let mut keys: Vec<&str> = analysis
        .distributions
        .iter()
        .map(|d| d.dimension.key())
        .collect();
    keys.push("raw-data");
    for key in &keys {
        let _ = writeln!(
            html,
            "#tab-{key}:checked ~ #panel-{key} {{ display: block; }}"
        );
    }
    let _ = writeln!(html, "</style>");
    let _ = writeln!(html, "</head>");
    let _ = writeln!(html, "<body>");

    let _ = writeln!(html, "<h1>Health Checkup Statistics by Class</h1>");
    let _ = writeln!(
        html,
        "<p class=\"meta\">{} &middot; {} &middot; {} records, {} classes &middot; {}</p>",
        escape_html(&metadata.source),
        escape_html(&metadata.sheet),
        analysis.record_count,
        analysis.class_count,
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    let _ = writeln!(html, "<div class=\"tabs\">");
    for (i, dist) in analysis.distributions.iter().enumerate() {
        write_tab(
            &mut html,
            dist.dimension.key(),
            dist.dimension.tab_label(lang),
            i == 0,
        );
    }
    write_tab(
        &mut html,
        "raw-data",
        lang.preview_tab(),
        analysis.distributions.is_empty(),
    );

    for dist in &analysis.distributions {
        let _ = writeln!(
            html,
            "<section class=\"panel\" id=\"panel-{}\">",
            dist.dimension.key()
        );
        let _ = writeln!(html, "<h2>{}</h2>", escape_html(dist.dimension.subtitle(lang)));
        html.push_str(&stacked_bar_svg(dist, lang));
        html.push_str(&pivot_table_html(dist, lang));
        let _ = writeln!(html, "</section>");
    }

    let _ = writeln!(html, "<section class=\"panel\" id=\"panel-raw-data\">");
    let _ = writeln!(html, "<h2>{}</h2>", escape_html(lang.preview_title()));
    html.push_str(&preview_table_html(&report.preview));
    let _ = writeln!(html, "</section>");

    let _ = writeln!(html, "</div>");
    let _ = writeln!(
        html,
        "<p class=\"meta\">Report generated by checkup-stats v{} in {:.2}s</p>",
        env!("CARGO_PKG_VERSION"),
        metadata.duration_seconds
    );
    let _ = writeln!(html, "</body>");
    let _ = writeln!(html, "</html>");

    html
}

fn write_tab(html: &mut String, key: &str, label: &str, checked: bool) {
    let _ = writeln!(
        html,
        "<input type=\"radio\" name=\"tabs\" id=\"tab-{}\"{}>",
        key,
        if checked { " checked" } else { "" }
    );
    let _ = writeln!(
        html,
        "<label for=\"tab-{}\">{}</label>",
        key,
        escape_html(label)
    );
}

/// Upper bound of the value axis: 100, or the tallest stack rounded up
/// to the next multiple of 25.
fn axis_max(dist: &Distribution) -> f64 {
    let tallest = dist
        .classes
        .iter()
        .map(|class| dist.class_total(class))
        .fold(0.0, f64::max);

    if tallest <= 100.0 {
        100.0
    } else {
        (tallest / 25.0).ceil() * 25.0
    }
}

/// Render a stacked bar per class as an inline SVG chart.
pub fn stacked_bar_svg(dist: &Distribution, lang: Language) -> String {
    let mut svg = String::new();

    if dist.classes.is_empty() {
        let _ = writeln!(svg, "<p>No records with a class label.</p>");
        return svg;
    }

    let plot_width = SLOT_WIDTH * dist.classes.len() as f64;
    let legend_x = PLOT_LEFT + plot_width + 24.0;
    let width = legend_x + LEGEND_WIDTH;
    let legend_height = 40.0 + 20.0 * dist.categories.len() as f64;
    let height = (PLOT_TOP + PLOT_HEIGHT + 56.0).max(legend_height);
    let y_max = axis_max(dist);
    let baseline = PLOT_TOP + PLOT_HEIGHT;

    let _ = writeln!(
        svg,
        "<svg xmlns='http://www.w3.org/2000/svg' width='{width:.0}' height='{height:.0}' viewBox='0 0 {width:.0} {height:.0}' role='img' font-family='sans-serif' font-size='12'>"
    );
    let _ = writeln!(
        svg,
        "  <title>{}</title>",
        escape_html(dist.dimension.chart_title(lang))
    );

    // Value axis with gridlines every 25%.
    let mut tick = 0.0;
    while tick <= y_max {
        let y = baseline - tick / y_max * PLOT_HEIGHT;
        let _ = writeln!(
            svg,
            "  <line x1='{PLOT_LEFT:.0}' y1='{y:.1}' x2='{:.0}' y2='{y:.1}' stroke='#e3e6ec'/>",
            PLOT_LEFT + plot_width
        );
        let _ = writeln!(
            svg,
            "  <text x='{:.0}' y='{:.1}' text-anchor='end' fill='#5b6270'>{tick:.0}</text>",
            PLOT_LEFT - 6.0,
            y + 4.0
        );
        tick += 25.0;
    }

    for (i, class) in dist.classes.iter().enumerate() {
        let x = PLOT_LEFT + i as f64 * SLOT_WIDTH + SLOT_WIDTH * 0.15;
        let bar_width = SLOT_WIDTH * 0.7;
        let mut top = baseline;

        for (j, category) in dist.categories.iter().enumerate() {
            let share = match dist.percentage(class, category) {
                Some(share) if share > 0.0 => share,
                _ => continue,
            };
            let segment = share / y_max * PLOT_HEIGHT;
            top -= segment;

            let _ = writeln!(
                svg,
                "  <rect class='segment' x='{x:.1}' y='{top:.1}' width='{bar_width:.1}' height='{segment:.1}' fill='{}'><title>{}: {share:.1}%</title></rect>",
                PALETTE[j % PALETTE.len()],
                escape_html(category)
            );
            if share >= LABEL_MIN_SHARE {
                let _ = writeln!(
                    svg,
                    "  <text class='value' x='{:.1}' y='{:.1}' text-anchor='middle' fill='#ffffff'>{share:.1}</text>",
                    x + bar_width / 2.0,
                    top + segment / 2.0 + 4.0
                );
            }
        }

        let _ = writeln!(
            svg,
            "  <text x='{:.1}' y='{:.1}' text-anchor='middle'>{}</text>",
            x + bar_width / 2.0,
            baseline + 18.0,
            escape_html(class)
        );
    }

    let _ = writeln!(
        svg,
        "  <text x='{:.1}' y='{:.1}' text-anchor='middle' fill='#5b6270'>{}</text>",
        PLOT_LEFT + plot_width / 2.0,
        baseline + 44.0,
        escape_html(lang.class_heading())
    );

    let _ = writeln!(
        svg,
        "  <text x='{legend_x:.0}' y='{PLOT_TOP:.0}' font-weight='600'>{}</text>",
        escape_html(dist.dimension.category_heading(lang))
    );
    for (j, category) in dist.categories.iter().enumerate() {
        let y = PLOT_TOP + 12.0 + j as f64 * 20.0;
        let _ = writeln!(
            svg,
            "  <rect x='{legend_x:.0}' y='{y:.0}' width='12' height='12' fill='{}'/>",
            PALETTE[j % PALETTE.len()]
        );
        let _ = writeln!(
            svg,
            "  <text x='{:.0}' y='{:.0}'>{}</text>",
            legend_x + 18.0,
            y + 10.0,
            escape_html(category)
        );
    }

    let _ = writeln!(svg, "</svg>");
    svg
}

/// Render the class-by-category pivot table.
pub fn pivot_table_html(dist: &Distribution, lang: Language) -> String {
    let pivot = dist.pivot();
    let mut html = String::new();

    let _ = writeln!(html, "<table>");
    let _ = write!(html, "<thead><tr><th>{}</th>", escape_html(lang.class_heading()));
    for category in &pivot.categories {
        let _ = write!(html, "<th>{}</th>", escape_html(category));
    }
    let _ = writeln!(html, "</tr></thead>");

    let _ = writeln!(html, "<tbody>");
    for (class, cells) in pivot.classes.iter().zip(&pivot.cells) {
        let _ = write!(html, "<tr><th>{}</th>", escape_html(class));
        for cell in cells {
            match cell {
                Some(value) => {
                    let _ = write!(html, "<td class=\"num\">{:.1}</td>", value);
                }
                None => html.push_str("<td class=\"num\">-</td>"),
            }
        }
        let _ = writeln!(html, "</tr>");
    }
    let _ = writeln!(html, "</tbody>");
    let _ = writeln!(html, "</table>");

    html
}

fn preview_table_html(preview: &Preview) -> String {
    let mut html = String::new();

    let _ = writeln!(html, "<div class=\"preview\"><table>");
    let _ = write!(html, "<thead><tr>");
    for column in &preview.columns {
        let _ = write!(html, "<th>{}</th>", escape_html(column));
    }
    let _ = writeln!(html, "</tr></thead>");

    let _ = writeln!(html, "<tbody>");
    for row in &preview.rows {
        let _ = write!(html, "<tr>");
        for cell in row {
            let _ = write!(html, "<td>{}</td>", escape_html(cell));
        }
        let _ = writeln!(html, "</tr>");
    }
    let _ = writeln!(html, "</tbody>");
    let _ = writeln!(html, "</table></div>");

    html
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AggregateRow, Analysis, Dimension, ReportMetadata};
    use chrono::Utc;

    fn row(class: &str, category: &str, count: usize, percentage: f64) -> AggregateRow {
        AggregateRow {
            class: class.to_string(),
            category: category.to_string(),
            count,
            percentage,
        }
    }

    fn blood_pressure_distribution() -> Distribution {
        Distribution {
            dimension: Dimension::BloodPressure,
            classes: vec!["1".to_string(), "2".to_string()],
            categories: vec![
                "hypertension suspected".to_string(),
                "normal".to_string(),
                "unknown".to_string(),
            ],
            rows: vec![
                row("1", "hypertension suspected", 1, 3.0),
                row("1", "normal", 32, 97.0),
                row("2", "unknown", 3, 100.0),
            ],
        }
    }

    fn create_test_report(preview: Preview) -> Report {
        let distributions = Dimension::ALL
            .iter()
            .map(|&dimension| Distribution {
                dimension,
                ..blood_pressure_distribution()
            })
            .collect();

        Report {
            metadata: ReportMetadata {
                source: "checkup.xlsx".to_string(),
                sheet: "Sheet1".to_string(),
                generated_at: Utc::now(),
                language: Language::En,
                duration_seconds: 0.1,
            },
            analysis: Analysis {
                record_count: 36,
                class_count: 2,
                skipped_records: 0,
                distributions,
            },
            preview,
        }
    }

    #[test]
    fn test_generate_html_report() {
        let preview = Preview {
            columns: vec!["반".to_string(), "소견".to_string()],
            rows: vec![vec!["1".to_string(), "<b>check</b>".to_string()]],
        };
        let html = generate_html_report(&create_test_report(preview));

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert_eq!(html.matches("type=\"radio\"").count(), 7);
        assert_eq!(html.matches(" checked>").count(), 1);
        assert!(html.contains("id=\"tab-obesity\" checked"));
        assert!(html.contains("#tab-raw-data:checked ~ #panel-raw-data"));
        assert_eq!(html.matches("<svg").count(), 6);
        assert!(html.contains("&lt;b&gt;check&lt;/b&gt;"));
        assert!(!html.contains("<b>check</b>"));
    }

    #[test]
    fn test_svg_segments_and_labels() {
        let svg = stacked_bar_svg(&blood_pressure_distribution(), Language::En);

        assert_eq!(svg.matches("class='segment'").count(), 3);
        // The 3% segment stays unlabeled.
        assert_eq!(svg.matches("class='value'").count(), 2);
        assert!(svg.contains(">97.0</text>"));
        assert!(svg.contains(">100.0</text>"));
        for tick in ["0", "25", "50", "75", "100"] {
            assert!(svg.contains(&format!("fill='#5b6270'>{}</text>", tick)));
        }
    }

    #[test]
    fn test_axis_grows_for_overlapping_keywords() {
        let dist = Distribution {
            dimension: Dimension::Keywords,
            classes: vec!["1".to_string()],
            categories: vec!["빈혈".to_string(), "시력".to_string()],
            rows: vec![row("1", "빈혈", 4, 80.0), row("1", "시력", 3, 60.0)],
        };

        assert_eq!(axis_max(&dist), 150.0);
        assert_eq!(axis_max(&blood_pressure_distribution()), 100.0);
    }

    #[test]
    fn test_pivot_table_html() {
        let table = pivot_table_html(&blood_pressure_distribution(), Language::Ko);

        assert!(table.contains("<th>반</th>"));
        assert!(table.contains("<tr><th>2</th><td class=\"num\">-</td><td class=\"num\">-</td><td class=\"num\">100.0</td></tr>"));
    }

    #[test]
    fn test_empty_distribution_has_no_chart() {
        let dist = Distribution {
            dimension: Dimension::Liver,
            classes: Vec::new(),
            categories: Vec::new(),
            rows: Vec::new(),
        };
        let svg = stacked_bar_svg(&dist, Language::En);
        assert!(!svg.contains("<svg"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a & <b>"), "a &amp; &lt;b&gt;");
        assert_eq!(escape_html("\"'"), "&quot;&#39;");
    }
}
