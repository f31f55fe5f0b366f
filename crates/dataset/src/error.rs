use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataLoadError {
    #[error("Failed to open data source '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Required column '{0}' is missing from the header")]
    MissingColumn(String),

    #[error("Line {line}: column '{column}' is empty")]
    EmptyField { line: u64, column: String },

    #[error("Line {line}: value '{value}' in column '{column}' is not a number")]
    MalformedValue {
        line: u64,
        column: String,
        value: String,
    },

    #[error("The header has no metric columns besides the key and ignored columns")]
    NoMetricColumns,

    #[error("The data source contains no observations")]
    NoObservations,
}
