use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyzerError {
    #[error("No observations of '{metric}' found for group '{key}'")]
    GroupNotFound { key: String, metric: String },

    #[error("Metric '{0}' does not appear in the data")]
    UnknownMetric(String),

    #[error("Period '{0}' does not contain a four-digit year")]
    MissingPeriodYear(String),

    #[error("Calculation error: {0}")]
    Analytics(#[from] analytics::AnalyticsError),
}
