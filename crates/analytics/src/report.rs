use crate::descriptive::SampleSummary;
use core_types::TestMethod;
use serde::{Deserialize, Serialize};

/// The outcome of a two-sample t-test between two groups of one metric.
///
/// This struct is the final output of `AnalyticsEngine::compare` and is
/// never mutated afterwards, apart from attaching a corrected p-value when it
/// is part of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub metric: String,
    pub group_a: String,
    pub group_b: String,
    pub method: TestMethod,

    pub summary_a: SampleSummary,
    pub summary_b: SampleSummary,

    /// `mean(a) - mean(b)`; the t-statistic always carries this sign.
    pub mean_difference: f64,
    pub t_statistic: f64,
    pub degrees_of_freedom: f64,
    /// Two-sided, in `[0, 1]`.
    pub p_value: f64,
    /// Set when the result is part of a corrected batch.
    pub adjusted_p_value: Option<f64>,
}

impl ComparisonResult {
    /// The p-value significance decisions should use.
    pub fn effective_p_value(&self) -> f64 {
        self.adjusted_p_value.unwrap_or(self.p_value)
    }

    pub fn is_significant(&self, alpha: f64) -> bool {
        self.effective_p_value() < alpha
    }
}

/// Least-squares fit of `y = intercept + slope * x` with inference on the slope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    pub metric: String,
    pub group: String,
    pub n: usize,
    pub intercept: f64,
    pub slope: f64,
    pub slope_std_error: f64,
    pub t_statistic: f64,
    pub degrees_of_freedom: f64,
    pub p_value: f64,
    pub adjusted_p_value: Option<f64>,
}

impl RegressionResult {
    pub fn effective_p_value(&self) -> f64 {
        self.adjusted_p_value.unwrap_or(self.p_value)
    }

    pub fn is_significant(&self, alpha: f64) -> bool {
        self.effective_p_value() < alpha
    }
}
