use analytics::{ComparisonResult, RegressionResult};
use analyzer::{BatchEntry, Groups, Outcome};
use anyhow::{Context, Result};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, Table as TextTable};
use configuration::{OutputConfig, OutputFormat};
use core_types::Table;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

const SKIPPED: &str = "insufficient data";

/// One rectangular block of results, rendered as a table or written as a CSV file.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub title: String,
    /// File name (without extension) used by the `csv` format.
    pub file_stem: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Everything a command produces: its result sets plus the JSON document
/// printed by the `json` format.
#[derive(Debug, Clone)]
pub struct Report {
    pub sets: Vec<ResultSet>,
    pub json: serde_json::Value,
}

impl Report {
    fn new<T: Serialize + ?Sized>(sets: Vec<ResultSet>, payload: &T) -> Result<Self> {
        let json = serde_json::to_value(payload).context("Failed to serialize results")?;
        Ok(Self { sets, json })
    }
}

/// Renders `report` in the configured format.
pub fn emit(report: &Report, output: &OutputConfig) -> Result<()> {
    match output.format {
        OutputFormat::Table => {
            for set in &report.sets {
                println!("{}", set.title);
                println!("{}", render_table(set));
            }
        }
        OutputFormat::Csv => {
            fs::create_dir_all(&output.directory).with_context(|| {
                format!("Failed to create output directory {}", output.directory.display())
            })?;
            for set in &report.sets {
                let path = write_csv(set, &output.directory)?;
                println!("{}", path.display());
            }
        }
        OutputFormat::Json => {
            let text = serde_json::to_string_pretty(&report.json)?;
            println!("{}", text);
        }
    }
    Ok(())
}

fn render_table(set: &ResultSet) -> TextTable {
    let mut table = TextTable::new();
    table.load_preset(UTF8_FULL_CONDENSED).apply_modifier(UTF8_ROUND_CORNERS);
    table.set_header(set.header.iter().map(Cell::new).collect::<Vec<_>>());
    for row in &set.rows {
        table.add_row(row.iter().map(Cell::new).collect::<Vec<_>>());
    }
    table
}

fn write_csv(set: &ResultSet, directory: &std::path::Path) -> Result<PathBuf> {
    let path = directory.join(format!("{}.csv", set.file_stem));
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record(&set.header)?;
    for row in &set.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    tracing::info!(path = %path.display(), rows = set.rows.len(), "Wrote results.");
    Ok(path)
}

/// Builds a file-system friendly name: spaces become `_`, `%` becomes `pct`.
pub fn file_stem(parts: &[&str]) -> String {
    parts
        .join("_")
        .replace(' ', "_")
        .replace('%', "pct")
        .replace(['/', '\\'], "_")
}

fn number(value: f64) -> String {
    if value.is_nan() {
        "n/a".to_string()
    } else if value == f64::INFINITY {
        "inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{:.4}", value)
    }
}

fn p_value(value: f64) -> String {
    if value > 0.0 && value < 1e-4 {
        format!("{:.2e}", value)
    } else {
        number(value)
    }
}

fn optional_p(value: Option<f64>) -> String {
    value.map(p_value).unwrap_or_default()
}

fn significance(significant: bool) -> String {
    if significant { "*".to_string() } else { String::new() }
}

fn strings(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

const COMPARISON_HEADER: [&str; 11] = [
    "group a", "group b", "method", "n a", "n b", "mean a", "mean b", "t", "df", "p", "adj p",
];

fn comparison_row(result: &ComparisonResult) -> Vec<String> {
    vec![
        result.group_a.clone(),
        result.group_b.clone(),
        result.method.to_string(),
        result.summary_a.n.to_string(),
        result.summary_b.n.to_string(),
        number(result.summary_a.mean),
        number(result.summary_b.mean),
        number(result.t_statistic),
        number(result.degrees_of_freedom),
        p_value(result.p_value),
        optional_p(result.adjusted_p_value),
    ]
}

/// `compare`: a single two-sample test.
pub fn comparison(result: &ComparisonResult, alpha: f64) -> Result<Report> {
    let mut header = strings(&COMPARISON_HEADER);
    header.push(format!("p < {}", alpha));
    let mut row = comparison_row(result);
    row.push(significance(result.is_significant(alpha)));

    let set = ResultSet {
        title: format!("{}: {} vs {}", result.metric, result.group_a, result.group_b),
        file_stem: file_stem(&["compare", &result.metric]),
        header,
        rows: vec![row],
    };
    Report::new(vec![set], result)
}

#[derive(Serialize)]
struct GroupSummary<'a> {
    label: &'a str,
    n: usize,
    mean: f64,
    variance: f64,
    std_dev: f64,
}

/// `groups`: the partition of one metric with descriptive statistics.
pub fn groups(groups: &Groups) -> Result<Report> {
    let summaries: Vec<GroupSummary<'_>> = groups
        .iter()
        .map(|(_, group)| {
            let summary = analytics::SampleSummary::from_values(&group.values);
            GroupSummary {
                label: &group.label,
                n: summary.n,
                mean: summary.mean,
                variance: summary.variance,
                std_dev: summary.std_dev(),
            }
        })
        .collect();

    let rows = summaries
        .iter()
        .map(|s| {
            vec![
                s.label.to_string(),
                s.n.to_string(),
                number(s.mean),
                number(s.variance),
                number(s.std_dev),
            ]
        })
        .collect();

    let set = ResultSet {
        title: format!("{}: {} groups", groups.metric(), groups.len()),
        file_stem: file_stem(&["groups", groups.metric()]),
        header: strings(&["group", "n", "mean", "variance", "std dev"]),
        rows,
    };
    Report::new(vec![set], &summaries)
}

/// `versus-others`: one result set per metric.
pub fn versus_others(
    entries: &[BatchEntry<ComparisonResult>],
    metrics: &[String],
    alpha: f64,
) -> Result<Report> {
    let mut header = strings(&["company"]);
    header.extend(strings(&COMPARISON_HEADER[1..]));
    header.push(format!("p < {}", alpha));

    let sets = metrics
        .iter()
        .map(|metric| {
            let rows = entries
                .iter()
                .filter(|e| e.metric == *metric)
                .map(|e| match &e.outcome {
                    Outcome::Computed(result) => {
                        let mut row = vec![e.subject.clone()];
                        row.extend(comparison_row(result).into_iter().skip(1));
                        row.push(significance(result.is_significant(alpha)));
                        row
                    }
                    Outcome::Skipped { .. } => skipped_row(&e.subject, header.len()),
                })
                .collect();
            ResultSet {
                title: format!("{}: focus companies vs the rest", metric),
                file_stem: file_stem(&["versus_others", metric]),
                header: header.clone(),
                rows,
            }
        })
        .collect();
    Report::new(sets, entries)
}

/// `pre-post`: one result set per metric.
pub fn pre_post(
    entries: &[BatchEntry<RegressionResult>],
    metrics: &[String],
    split_year: i32,
    alpha: f64,
) -> Result<Report> {
    let mut header = strings(&["company", "n", "pre mean", "shift", "se", "t", "df", "p", "adj p"]);
    header.push(format!("p < {}", alpha));

    let sets = metrics
        .iter()
        .map(|metric| {
            let rows = entries
                .iter()
                .filter(|e| e.metric == *metric)
                .map(|e| match &e.outcome {
                    Outcome::Computed(fit) => vec![
                        e.subject.clone(),
                        fit.n.to_string(),
                        number(fit.intercept),
                        number(fit.slope),
                        number(fit.slope_std_error),
                        number(fit.t_statistic),
                        number(fit.degrees_of_freedom),
                        p_value(fit.p_value),
                        optional_p(fit.adjusted_p_value),
                        significance(fit.is_significant(alpha)),
                    ],
                    Outcome::Skipped { .. } => skipped_row(&e.subject, header.len()),
                })
                .collect();
            ResultSet {
                title: format!("{}: before {} vs from {}", metric, split_year, split_year),
                file_stem: file_stem(&["pre_post", &split_year.to_string(), metric]),
                header: header.clone(),
                rows,
            }
        })
        .collect();
    Report::new(sets, entries)
}

fn skipped_row(subject: &str, width: usize) -> Vec<String> {
    let mut row = vec![subject.to_string(), SKIPPED.to_string()];
    row.resize(width, String::new());
    row
}

#[derive(Serialize)]
struct Inventory<'a> {
    metrics: Vec<&'a str>,
    companies: Vec<&'a str>,
    periods: Vec<&'a str>,
}

/// `metrics`: what the loaded table contains.
pub fn inventory(table: &Table) -> Result<Report> {
    let inventory = Inventory {
        metrics: table.metrics(),
        companies: table.companies(),
        periods: table.periods(),
    };

    let rows = inventory
        .metrics
        .iter()
        .map(|metric| {
            let total = table.rows_for_metric(metric).count();
            let missing = table.rows_for_metric(metric).filter(|o| !o.is_valid()).count();
            vec![metric.to_string(), total.to_string(), missing.to_string()]
        })
        .collect();

    let sets = vec![
        ResultSet {
            title: format!(
                "{} metrics, {} companies, {} periods",
                inventory.metrics.len(),
                inventory.companies.len(),
                inventory.periods.len()
            ),
            file_stem: "metrics".to_string(),
            header: strings(&["metric", "observations", "missing"]),
            rows,
        },
        ResultSet {
            title: "companies".to_string(),
            file_stem: "companies".to_string(),
            header: strings(&["company"]),
            rows: inventory.companies.iter().map(|c| vec![c.to_string()]).collect(),
        },
    ];
    Report::new(sets, &inventory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use analytics::SampleSummary;
    use core_types::TestMethod;
    use pretty_assertions::assert_eq;

    fn result() -> ComparisonResult {
        ComparisonResult {
            metric: "ROE (%)".to_string(),
            group_a: "company=A".to_string(),
            group_b: "company=B".to_string(),
            method: TestMethod::Welch,
            summary_a: SampleSummary::from_values(&[1.0, 2.0, 3.0]),
            summary_b: SampleSummary::from_values(&[2.0, 4.0]),
            mean_difference: -1.0,
            t_statistic: -0.75,
            degrees_of_freedom: 1.5,
            p_value: 0.00001,
            adjusted_p_value: None,
        }
    }

    #[test]
    fn file_stem_sanitizes_metric_names() {
        assert_eq!(file_stem(&["compare", "ROE (%)"]), "compare_ROE_(pct)");
        assert_eq!(file_stem(&["groups", "Debt/Equity"]), "groups_Debt_Equity");
    }

    #[test]
    fn numbers_are_formatted_for_humans() {
        assert_eq!(number(f64::NAN), "n/a");
        assert_eq!(number(f64::NEG_INFINITY), "-inf");
        assert_eq!(number(2.931574476), "2.9316");
        assert_eq!(p_value(0.00001), "1.00e-5");
        assert_eq!(p_value(0.0), "0.0000");
    }

    #[test]
    fn comparison_report_flags_significance() {
        let report = comparison(&result(), 0.05).unwrap();
        let set = &report.sets[0];
        assert_eq!(set.header.len(), set.rows[0].len());
        assert_eq!(set.rows[0].last().unwrap(), "*");
        assert_eq!(set.file_stem, "compare_ROE_(pct)");
        assert_eq!(report.json["method"], "Welch");
    }

    #[test]
    fn skipped_cells_fill_the_row() {
        let entries = vec![
            BatchEntry {
                subject: "A".to_string(),
                metric: "ROE (%)".to_string(),
                outcome: Outcome::Computed(result()),
            },
            BatchEntry {
                subject: "C".to_string(),
                metric: "ROE (%)".to_string(),
                outcome: Outcome::Skipped {
                    reason: "too few".to_string(),
                },
            },
        ];
        let report = versus_others(&entries, &["ROE (%)".to_string()], 0.05).unwrap();
        let set = &report.sets[0];

        assert_eq!(set.rows.len(), 2);
        assert_eq!(set.rows[0][0], "A");
        assert_eq!(set.rows[0].len(), set.header.len());
        assert_eq!(set.rows[1][0], "C");
        assert_eq!(set.rows[1][1], SKIPPED);
        assert_eq!(set.rows[1].len(), set.header.len());
        assert_eq!(report.json[1]["outcome"]["status"], "skipped");
    }

    #[test]
    fn csv_output_is_written_per_set() {
        let dir = tempfile::tempdir().unwrap();
        let output = OutputConfig {
            directory: dir.path().join("out"),
            format: OutputFormat::Csv,
        };
        let report = comparison(&result(), 0.05).unwrap();

        emit(&report, &output).unwrap();

        let written = fs::read_to_string(dir.path().join("out").join("compare_ROE_(pct).csv")).unwrap();
        let mut lines = written.lines();
        assert!(lines.next().unwrap().starts_with("group a,group b,method"));
        assert!(lines.next().unwrap().starts_with("company=A,company=B,Welch,3,2"));
    }
}
