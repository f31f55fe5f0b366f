use core_types::CorrectionMethod;
use serde::Deserialize;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
///
/// Every section is optional in the file; missing sections fall back to
/// their `Default` implementations.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub analysis: AnalysisConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

/// How observations are laid out in the source CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum Layout {
    /// One row per company, period, metric and value.
    #[default]
    Long,
    /// One row per company and period, one column per metric.
    Wide,
}

/// Where the observation table comes from and how to read it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Path of the CSV file. Usually supplied on the command line.
    pub path: Option<PathBuf>,
    pub layout: Layout,
    /// Column holding the company identifier. Defaults to `company` for the
    /// long layout and `ticker` for the wide layout.
    pub company_column: Option<String>,
    /// Column holding the period. Defaults to `period` (long) or `year` (wide).
    pub period_column: Option<String>,
    /// Long layout only: column holding the metric name.
    pub metric_column: String,
    /// Long layout only: column holding the numeric value.
    pub value_column: String,
    /// Wide layout only: columns that are neither keys nor metrics.
    pub ignore_columns: Vec<String>,
}

impl DataConfig {
    pub fn company_column(&self) -> &str {
        match (&self.company_column, self.layout) {
            (Some(column), _) => column,
            (None, Layout::Long) => "company",
            (None, Layout::Wide) => "ticker",
        }
    }

    pub fn period_column(&self) -> &str {
        match (&self.period_column, self.layout) {
            (Some(column), _) => column,
            (None, Layout::Long) => "period",
            (None, Layout::Wide) => "year",
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: None,
            layout: Layout::default(),
            company_column: None,
            period_column: None,
            metric_column: "metric".to_string(),
            value_column: "value".to_string(),
            ignore_columns: vec!["in_index6".to_string()],
        }
    }
}

/// Parameters for the statistical tests.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// `true` selects the pooled Student test, `false` Welch's test.
    pub equal_variance: bool,
    /// Significance level used to flag results.
    pub alpha: f64,
    /// Correction applied across each batch of comparisons of one metric.
    pub correction: CorrectionMethod,
    /// Metrics analysed by the batch commands. Empty means every metric in the table.
    pub metrics: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            equal_variance: false,
            alpha: 0.05,
            correction: CorrectionMethod::None,
            metrics: Vec::new(),
        }
    }
}

/// How results are presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputFormat {
    /// A formatted table on stdout.
    #[default]
    Table,
    /// One CSV file per result set in the output directory.
    Csv,
    /// Pretty-printed JSON on stdout.
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    pub format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("output"),
            format: OutputFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set, e.g. `info` or `analyzer=debug`.
    pub level: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}
