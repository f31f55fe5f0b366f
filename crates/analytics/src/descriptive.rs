use serde::{Deserialize, Serialize};

/// Size, mean and unbiased variance of one sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleSummary {
    pub n: usize,
    pub mean: f64,
    /// Sample variance with the `n - 1` denominator. NaN when `n < 2`.
    pub variance: f64,
}

impl SampleSummary {
    /// Summarises `values`. Callers are expected to have dropped non-finite
    /// values already.
    pub fn from_values(values: &[f64]) -> Self {
        let n = values.len();
        if n == 0 {
            return Self {
                n,
                mean: f64::NAN,
                variance: f64::NAN,
            };
        }

        let mean = values.iter().sum::<f64>() / n as f64;
        // Two-pass so that a constant sample has exactly zero variance.
        let variance = if n > 1 {
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            f64::NAN
        };

        Self { n, mean, variance }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }

    /// Squared standard error of the mean.
    pub fn mean_variance(&self) -> f64 {
        self.variance / self.n as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_uses_unbiased_variance() {
        let s = SampleSummary::from_values(&[100.0, 110.0, 90.0, 105.0]);
        assert_eq!(s.n, 4);
        assert!((s.mean - 101.25).abs() < 1e-12);
        assert!((s.variance - 218.75 / 3.0).abs() < 1e-9, "variance={}", s.variance);
    }

    #[test]
    fn constant_sample_has_zero_variance() {
        let s = SampleSummary::from_values(&[5.0, 5.0, 5.0]);
        assert_eq!(s.variance, 0.0);
        assert_eq!(s.std_dev(), 0.0);
    }

    #[test]
    fn single_value_has_undefined_variance() {
        let s = SampleSummary::from_values(&[3.0]);
        assert_eq!(s.mean, 3.0);
        assert!(s.variance.is_nan());
    }
}
