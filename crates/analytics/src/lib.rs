//! # Perfstat Analytics Engine
//!
//! This crate holds the statistical kernel of the workspace: descriptive
//! statistics, the Student t distribution, two-sample t-tests, a least-squares
//! fit against a binary indicator, and multiple-comparison corrections.
//!
//! ## Architectural Principles
//!
//! - **Pure Logic:** No I/O and no knowledge of how groups were selected. It
//!   depends only on `core-types`.
//! - **Stateless Calculation:** The `AnalyticsEngine` takes samples as input
//!   and returns immutable result structs, so every call is independent and
//!   safe to run in parallel.
//!
//! ## Public API
//!
//! - `AnalyticsEngine`: `compare` (Student/Welch t-test) and `regress_on_indicator`.
//! - `ComparisonResult` / `RegressionResult`: the serializable outputs.
//! - `SampleSummary`: size, mean and unbiased variance of one sample.
//! - `adjust_p_values`: Bonferroni and Holm corrections.
//! - `AnalyticsError`: the error types that can be returned from this crate.

pub mod correction;
pub mod descriptive;
pub mod distribution;
pub mod engine;
pub mod error;
pub mod report;

pub use correction::adjust_p_values;
pub use descriptive::SampleSummary;
pub use distribution::{students_t_cdf, two_sided_p_value};
pub use engine::AnalyticsEngine;
pub use error::AnalyticsError;
pub use report::{ComparisonResult, RegressionResult};
