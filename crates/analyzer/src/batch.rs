use analytics::{AnalyticsError, ComparisonResult, RegressionResult, adjust_p_values};
use core_types::CorrectionMethod;
use serde::Serialize;

/// The result of one cell of a batch command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome<T> {
    Computed(T),
    /// The cell had too little data to test; the batch carries on.
    Skipped { reason: String },
}

impl<T> Outcome<T> {
    pub fn computed(&self) -> Option<&T> {
        match self {
            Outcome::Computed(result) => Some(result),
            Outcome::Skipped { .. } => None,
        }
    }

    /// Turns per-cell data shortfalls into `Skipped`; any other error is
    /// handed back to abort the batch.
    pub(crate) fn from_result(result: Result<T, AnalyticsError>) -> Result<Self, AnalyticsError> {
        match result {
            Ok(value) => Ok(Outcome::Computed(value)),
            Err(err @ AnalyticsError::InsufficientData { .. })
            | Err(err @ AnalyticsError::ConstantRegressor { .. }) => Ok(Outcome::Skipped {
                reason: err.to_string(),
            }),
            Err(err) => Err(err),
        }
    }
}

/// One (subject, metric) cell of a batch command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchEntry<T> {
    pub subject: String,
    pub metric: String,
    pub outcome: Outcome<T>,
}

/// A result whose p-value can be adjusted after the batch has run.
pub trait Adjustable {
    fn p_value(&self) -> f64;
    fn set_adjusted_p_value(&mut self, adjusted: f64);
}

impl Adjustable for ComparisonResult {
    fn p_value(&self) -> f64 {
        self.p_value
    }

    fn set_adjusted_p_value(&mut self, adjusted: f64) {
        self.adjusted_p_value = Some(adjusted);
    }
}

impl Adjustable for RegressionResult {
    fn p_value(&self) -> f64 {
        self.p_value
    }

    fn set_adjusted_p_value(&mut self, adjusted: f64) {
        self.adjusted_p_value = Some(adjusted);
    }
}

/// Applies `method` separately to the computed cells of each metric.
/// Skipped cells do not count towards the family size.
pub(crate) fn correct_per_metric<T: Adjustable>(
    entries: &mut [BatchEntry<T>],
    metrics: &[String],
    method: CorrectionMethod,
) {
    if method == CorrectionMethod::None {
        return;
    }

    for metric in metrics {
        let mut family: Vec<&mut T> = entries
            .iter_mut()
            .filter(|entry| entry.metric == *metric)
            .filter_map(|entry| match &mut entry.outcome {
                Outcome::Computed(result) => Some(result),
                Outcome::Skipped { .. } => None,
            })
            .collect();

        let raw: Vec<f64> = family.iter().map(|result| result.p_value()).collect();
        let adjusted = adjust_p_values(&raw, method);
        for (result, p) in family.iter_mut().zip(adjusted) {
            result.set_adjusted_p_value(p);
        }

        tracing::debug!(metric = %metric, family = raw.len(), %method, "Adjusted p-values.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Fake {
        p: f64,
        adjusted: Option<f64>,
    }

    impl Adjustable for Fake {
        fn p_value(&self) -> f64 {
            self.p
        }

        fn set_adjusted_p_value(&mut self, adjusted: f64) {
            self.adjusted = Some(adjusted);
        }
    }

    fn entry(metric: &str, p: Option<f64>) -> BatchEntry<Fake> {
        BatchEntry {
            subject: "X".to_string(),
            metric: metric.to_string(),
            outcome: match p {
                Some(p) => Outcome::Computed(Fake { p, adjusted: None }),
                None => Outcome::Skipped {
                    reason: "insufficient data".to_string(),
                },
            },
        }
    }

    #[test]
    fn correction_is_applied_per_metric() {
        let mut entries = vec![
            entry("roe", Some(0.01)),
            entry("margin", Some(0.04)),
            entry("roe", Some(0.02)),
            entry("roe", None),
        ];
        let metrics = vec!["roe".to_string(), "margin".to_string()];

        correct_per_metric(&mut entries, &metrics, CorrectionMethod::Bonferroni);

        let adjusted: Vec<Option<f64>> = entries
            .iter()
            .map(|e| e.outcome.computed().and_then(|f| f.adjusted))
            .collect();
        // Two computed "roe" cells, one "margin" cell.
        assert_eq!(adjusted, vec![Some(0.02), Some(0.04), Some(0.04), None]);
    }

    #[test]
    fn no_correction_leaves_results_untouched() {
        let mut entries = vec![entry("roe", Some(0.01))];
        correct_per_metric(&mut entries, &["roe".to_string()], CorrectionMethod::None);
        assert_eq!(entries[0].outcome.computed().unwrap().adjusted, None);
    }

    #[test]
    fn shortfalls_become_skipped() {
        let insufficient: Result<Fake, AnalyticsError> = Err(AnalyticsError::InsufficientData {
            group: "company=C".to_string(),
            required: 2,
            found: 1,
        });
        let outcome = Outcome::from_result(insufficient).unwrap();
        assert!(matches!(outcome, Outcome::Skipped { ref reason } if reason.starts_with("Not enough data in group 'company=C'")));

        let mismatch: Result<Fake, AnalyticsError> = Err(AnalyticsError::LengthMismatch { x: 1, y: 2 });
        assert!(Outcome::from_result(mismatch).is_err());
    }

    #[test]
    fn skipped_serializes_with_status_tag() {
        let outcome: Outcome<ComparisonResult> = Outcome::Skipped {
            reason: "insufficient data".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["reason"], "insufficient data");
    }
}
