use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Not enough data in group '{group}': need at least {required} valid observations, found {found}")]
    InsufficientData {
        group: String,
        required: usize,
        found: usize,
    },

    #[error("Regressor for '{group}' is constant; the slope cannot be estimated")]
    ConstantRegressor { group: String },

    #[error("Regressor and response lengths differ ({x} vs {y})")]
    LengthMismatch { x: usize, y: usize },
}
