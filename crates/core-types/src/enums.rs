use serde::{Deserialize, Serialize};
use std::fmt;

/// The flavour of two-sample t-test that produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestMethod {
    /// Pooled-variance test, `df = n_a + n_b - 2`.
    Student,
    /// Unequal-variance test with Welch–Satterthwaite degrees of freedom.
    Welch,
}

impl TestMethod {
    /// Maps the `equal_variance` switch onto the test it selects.
    pub fn from_equal_variance(equal_variance: bool) -> Self {
        if equal_variance {
            TestMethod::Student
        } else {
            TestMethod::Welch
        }
    }
}

impl fmt::Display for TestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestMethod::Student => write!(f, "Student"),
            TestMethod::Welch => write!(f, "Welch"),
        }
    }
}

/// Multiple-comparison correction applied to a batch of p-values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum CorrectionMethod {
    /// Report raw p-values.
    #[default]
    None,
    /// Multiply every p-value by the number of tests.
    Bonferroni,
    /// Holm's step-down procedure.
    Holm,
}

impl fmt::Display for CorrectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrectionMethod::None => write!(f, "none"),
            CorrectionMethod::Bonferroni => write!(f, "bonferroni"),
            CorrectionMethod::Holm => write!(f, "holm"),
        }
    }
}

/// A column of the observation table that rows can be partitioned by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum KeyField {
    Company,
    Period,
}
