use crate::descriptive::SampleSummary;
use crate::distribution::two_sided_p_value;
use crate::error::AnalyticsError;
use crate::report::{ComparisonResult, RegressionResult};
use core_types::{Group, TestMethod};

/// Minimum finite observations per group for a two-sample t-test.
pub const MIN_GROUP_SIZE: usize = 2;

/// Minimum usable points for a regression with at least one residual degree of freedom.
pub const MIN_REGRESSION_POINTS: usize = 3;

/// A stateless calculator for comparing groups of metric observations.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnalyticsEngine {}

impl AnalyticsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs an independent two-sample, two-sided t-test of `group_a` against `group_b`.
    ///
    /// # Arguments
    ///
    /// * `group_a`, `group_b` - The samples to compare. Non-finite values are ignored.
    /// * `equal_variance` - `true` for the pooled (Student) test, `false` for Welch's test.
    ///
    /// # Returns
    ///
    /// A `ComparisonResult`, or `AnalyticsError::InsufficientData` when either
    /// group has fewer than two finite values.
    pub fn compare(
        &self,
        group_a: &Group,
        group_b: &Group,
        equal_variance: bool,
    ) -> Result<ComparisonResult, AnalyticsError> {
        let (a, level_a) = finite_summary(group_a)?;
        let (b, level_b) = finite_summary(group_b)?;
        let method = TestMethod::from_equal_variance(equal_variance);

        let (standard_error, df) = match method {
            TestMethod::Student => student_standard_error(&a, &b),
            TestMethod::Welch => welch_standard_error(&a, &b),
        };

        let mean_difference = a.mean - b.mean;

        // Only exactly constant samples are degenerate; any spread, however
        // small next to the level, goes through the ordinary test.
        let degenerate = match (level_a, level_b) {
            (Some(la), Some(lb)) => Some(la == lb),
            _ if standard_error == 0.0 => Some(mean_difference == 0.0),
            _ => None,
        };

        let (t_statistic, degrees_of_freedom, p_value) = match degenerate {
            Some(same_level) => {
                // Equal constants are indistinguishable; different constants
                // are separated with certainty.
                let pooled_df = (a.n + b.n - 2) as f64;
                if same_level {
                    tracing::debug!(
                        group_a = %group_a.label,
                        group_b = %group_b.label,
                        "Zero variance and equal means; reporting t = 0, p = 1."
                    );
                    (0.0, pooled_df, 1.0)
                } else {
                    tracing::debug!(
                        group_a = %group_a.label,
                        group_b = %group_b.label,
                        "Zero variance with distinct means; reporting an infinite t-statistic."
                    );
                    let direction = match (level_a, level_b) {
                        (Some(la), Some(lb)) => la - lb,
                        _ => mean_difference,
                    };
                    (direction.signum() * f64::INFINITY, pooled_df, 0.0)
                }
            }
            None => {
                let t = mean_difference / standard_error;
                (t, df, two_sided_p_value(t, df))
            }
        };

        Ok(ComparisonResult {
            metric: group_a.metric.clone(),
            group_a: group_a.label.clone(),
            group_b: group_b.label.clone(),
            method,
            summary_a: a,
            summary_b: b,
            mean_difference,
            t_statistic,
            degrees_of_freedom,
            p_value,
            adjusted_p_value: None,
        })
    }

    /// Fits `y = intercept + slope * x` by ordinary least squares and tests
    /// `slope = 0` with a two-sided t-test on `n - 2` degrees of freedom.
    ///
    /// With a 0/1 indicator as `x` the slope is the difference between the
    /// two subgroup means, and the test matches a pooled-variance t-test.
    /// Pairs whose `y` is not finite are skipped.
    pub fn regress_on_indicator(
        &self,
        group: &str,
        metric: &str,
        x: &[f64],
        y: &[f64],
    ) -> Result<RegressionResult, AnalyticsError> {
        if x.len() != y.len() {
            return Err(AnalyticsError::LengthMismatch {
                x: x.len(),
                y: y.len(),
            });
        }

        let points: Vec<(f64, f64)> = x
            .iter()
            .zip(y)
            .filter(|(xi, yi)| xi.is_finite() && yi.is_finite())
            .map(|(xi, yi)| (*xi, *yi))
            .collect();

        let n = points.len();
        if n < MIN_REGRESSION_POINTS {
            return Err(AnalyticsError::InsufficientData {
                group: group.to_string(),
                required: MIN_REGRESSION_POINTS,
                found: n,
            });
        }

        let n_f = n as f64;
        let x_mean = points.iter().map(|(xi, _)| xi).sum::<f64>() / n_f;
        let y_mean = points.iter().map(|(_, yi)| yi).sum::<f64>() / n_f;

        let sxx: f64 = points.iter().map(|(xi, _)| (xi - x_mean).powi(2)).sum();
        if sxx == 0.0 {
            return Err(AnalyticsError::ConstantRegressor {
                group: group.to_string(),
            });
        }
        let sxy: f64 = points
            .iter()
            .map(|(xi, yi)| (xi - x_mean) * (yi - y_mean))
            .sum();

        let slope = sxy / sxx;
        let intercept = y_mean - slope * x_mean;

        let sse: f64 = points
            .iter()
            .map(|(xi, yi)| (yi - intercept - slope * xi).powi(2))
            .sum();
        let df = n_f - 2.0;
        let slope_std_error = (sse / df / sxx).sqrt();

        // A perfect fit: the response is exactly constant at each of two
        // regressor values, or the residuals vanish outright.
        let perfect_fit = match response_levels(&points).as_deref() {
            Some(&[first, second]) => Some(first == second),
            _ if sse == 0.0 => Some(slope == 0.0),
            _ => None,
        };

        let (t_statistic, p_value) = match perfect_fit {
            Some(true) => (0.0, 1.0),
            Some(false) => (slope.signum() * f64::INFINITY, 0.0),
            None => {
                let t = slope / slope_std_error;
                (t, two_sided_p_value(t, df))
            }
        };

        Ok(RegressionResult {
            metric: metric.to_string(),
            group: group.to_string(),
            n,
            intercept,
            slope,
            slope_std_error,
            t_statistic,
            degrees_of_freedom: df,
            p_value,
            adjusted_p_value: None,
        })
    }
}

/// Summarises the finite values of `group`, enforcing the minimum size.
/// Also returns the common value when every finite value is identical.
fn finite_summary(group: &Group) -> Result<(SampleSummary, Option<f64>), AnalyticsError> {
    let finite: Vec<f64> = group.values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.len() < group.values.len() {
        tracing::warn!(
            group = %group.label,
            dropped = group.values.len() - finite.len(),
            "Ignoring non-finite values."
        );
    }
    if finite.len() < MIN_GROUP_SIZE {
        return Err(AnalyticsError::InsufficientData {
            group: group.label.clone(),
            required: MIN_GROUP_SIZE,
            found: finite.len(),
        });
    }
    Ok((SampleSummary::from_values(&finite), constant_level(&finite)))
}

fn constant_level(values: &[f64]) -> Option<f64> {
    let (&first, rest) = values.split_first()?;
    rest.iter().all(|&v| v == first).then_some(first)
}

/// The response at each distinct regressor value, in first-seen order, or
/// `None` if the response varies at any regressor value.
fn response_levels(points: &[(f64, f64)]) -> Option<Vec<f64>> {
    let mut levels: Vec<(f64, f64)> = Vec::new();
    for &(x, y) in points {
        match levels.iter().find(|(lx, _)| *lx == x) {
            Some(&(_, ly)) if ly != y => return None,
            Some(_) => {}
            None => levels.push((x, y)),
        }
    }
    Some(levels.into_iter().map(|(_, y)| y).collect())
}

/// Pooled standard error and `n_a + n_b - 2` degrees of freedom.
fn student_standard_error(a: &SampleSummary, b: &SampleSummary) -> (f64, f64) {
    let df = (a.n + b.n - 2) as f64;
    let pooled_variance =
        ((a.n - 1) as f64 * a.variance + (b.n - 1) as f64 * b.variance) / df;
    let standard_error = (pooled_variance * (1.0 / a.n as f64 + 1.0 / b.n as f64)).sqrt();
    (standard_error, df)
}

/// Unpooled standard error and Welch–Satterthwaite degrees of freedom.
fn welch_standard_error(a: &SampleSummary, b: &SampleSummary) -> (f64, f64) {
    let qa = a.mean_variance();
    let qb = b.mean_variance();
    let standard_error = (qa + qb).sqrt();
    let df = (qa + qb).powi(2) / (qa * qa / (a.n - 1) as f64 + qb * qb / (b.n - 1) as f64);
    (standard_error, df)
}
