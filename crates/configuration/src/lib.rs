use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{
    AnalysisConfig, Config, DataConfig, Layout, LoggingConfig, OutputConfig, OutputFormat,
};

/// Prefix of the environment variables that override file settings,
/// e.g. `PERFSTAT__ANALYSIS__ALPHA=0.01`.
pub const ENV_PREFIX: &str = "PERFSTAT";

/// Loads the application configuration.
///
/// Sources are layered in increasing priority: built-in defaults, the TOML
/// file (`path`, or `perfstat.toml` in the working directory if it exists),
/// then `PERFSTAT__*` environment variables. The result is validated before
/// it is returned.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let file = match path {
        Some(path) => config::File::from(path)
            .format(config::FileFormat::Toml)
            .required(true),
        None => config::File::with_name("perfstat").required(false),
    };

    let builder = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("analysis.metrics")
                .with_list_parse_key("data.ignore_columns"),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    validate(&config)?;

    Ok(config)
}

/// Rejects settings that would make every analysis fail later.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    let alpha = config.analysis.alpha;
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(ConfigError::ValidationError(format!(
            "analysis.alpha must be between 0 and 1 (exclusive), got {}",
            alpha
        )));
    }

    let data = &config.data;
    let columns = [
        ("data.company_column", data.company_column()),
        ("data.period_column", data.period_column()),
        ("data.metric_column", data.metric_column.as_str()),
        ("data.value_column", data.value_column.as_str()),
    ];
    for (name, value) in columns {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!("{} must not be empty", name)));
        }
    }
    if data.company_column() == data.period_column() {
        return Err(ConfigError::ValidationError(
            "data.company_column and data.period_column must differ".to_string(),
        ));
    }

    Ok(())
}
