//! # Perfstat Analyzer
//!
//! The filter/group stage. It turns the loaded observation table into the
//! groups a question needs and hands them to the `analytics` engine.
//!
//! ## Architectural Principles
//!
//! - **Read-only data:** The `Analyzer` borrows the table and never mutates it.
//! - **Deterministic output:** Groups keep table order and batch results come
//!   back in input order, even though batch cells run in parallel.
//! - **Explicit shortfalls:** In batch commands a cell with too little data is
//!   reported as `Outcome::Skipped`; every other error aborts the batch.
//!
//! ## Public API
//!
//! - `group_by` / `Groups`: partition one metric by company and/or period.
//! - `Selector` / `select`: richer predicates ("all but", year bounds).
//! - `Analyzer`: `compare_keys`, `versus_others`, `pre_post`.

use analytics::{AnalyticsEngine, ComparisonResult, RegressionResult};
use configuration::AnalysisConfig;
use core_types::{Group, GroupKey, GroupKeys, Table, period_year};
use rayon::prelude::*;
use std::collections::HashSet;

pub mod batch;
pub mod error;
pub mod grouping;
pub mod selection;

pub use batch::{BatchEntry, Outcome};
pub use error::AnalyzerError;
pub use grouping::{Groups, group_by};
pub use selection::{CompanyFilter, PeriodFilter, Selector, select};

/// Runs comparisons over a borrowed observation table.
pub struct Analyzer<'t> {
    table: &'t Table,
    config: AnalysisConfig,
    engine: AnalyticsEngine,
}

impl<'t> Analyzer<'t> {
    pub fn new(table: &'t Table, config: AnalysisConfig) -> Self {
        Self {
            table,
            config,
            engine: AnalyticsEngine::new(),
        }
    }

    /// Partitions `metric`, rejecting metrics the table has never seen.
    pub fn groups(&self, metric: &str, keys: GroupKeys) -> Result<Groups, AnalyzerError> {
        self.require_metric(metric)?;
        let groups = group_by(self.table, keys, metric);
        tracing::info!(metric, groups = groups.len(), "Partitioned observations.");
        Ok(groups)
    }

    /// Compares the groups identified by two keys.
    ///
    /// Each key is looked up in a partition over the fields it names, so
    /// `company=A` can be set against `period=2016` as well as `company=B`.
    pub fn compare_keys(
        &self,
        metric: &str,
        a: &GroupKey,
        b: &GroupKey,
    ) -> Result<ComparisonResult, AnalyzerError> {
        let groups_a = self.groups(metric, a.fields())?;
        let group_a = groups_a.get(a)?;
        if b.fields() == a.fields() {
            return self.compare(group_a, groups_a.get(b)?);
        }
        let groups_b = group_by(self.table, b.fields(), metric);
        self.compare(group_a, groups_b.get(b)?)
    }

    fn compare(&self, a: &Group, b: &Group) -> Result<ComparisonResult, AnalyzerError> {
        let result = self.engine.compare(a, b, self.config.equal_variance)?;
        tracing::debug!(
            metric = %result.metric,
            a = %result.group_a,
            b = %result.group_b,
            t = result.t_statistic,
            p = result.p_value,
            "Comparison complete."
        );
        Ok(result)
    }

    /// The metrics a batch command should cover: the requested ones, else the
    /// configured ones, else every metric in the table.
    pub fn resolve_metrics(&self, requested: &[String]) -> Result<Vec<String>, AnalyzerError> {
        let chosen: Vec<String> = if !requested.is_empty() {
            requested.to_vec()
        } else if !self.config.metrics.is_empty() {
            self.config.metrics.clone()
        } else {
            self.table.metrics().into_iter().map(str::to_string).collect()
        };

        for metric in &chosen {
            self.require_metric(metric)?;
        }
        Ok(chosen)
    }

    /// Compares each focus company against the pooled observations of every
    /// company outside the focus list, once per metric. Repeated focus
    /// companies are tested once, at their first position.
    pub fn versus_others(
        &self,
        focus: &[String],
        metrics: &[String],
    ) -> Result<Vec<BatchEntry<ComparisonResult>>, AnalyzerError> {
        let metrics = self.resolve_metrics(metrics)?;
        let companies = self.table.companies();

        let mut seen = HashSet::new();
        let focus: Vec<String> = focus
            .iter()
            .filter(|company| seen.insert(company.as_str()))
            .cloned()
            .collect();

        for company in &focus {
            if !companies.contains(&company.as_str()) {
                return Err(AnalyzerError::GroupNotFound {
                    key: GroupKey::company(company.as_str()).to_string(),
                    metric: metrics.join(", "),
                });
            }
        }
        let others = Selector::all_except(&focus);
        if companies.iter().all(|c| focus.iter().any(|f| f.as_str() == *c)) {
            return Err(AnalyzerError::GroupNotFound {
                key: others.to_string(),
                metric: metrics.join(", "),
            });
        }

        let cells: Vec<(&String, &String)> = focus
            .iter()
            .flat_map(|company| metrics.iter().map(move |metric| (company, metric)))
            .collect();
        tracing::info!(
            focus = focus.len(),
            metrics = metrics.len(),
            cells = cells.len(),
            "Comparing focus companies against the rest."
        );

        let mut entries = cells
            .par_iter()
            .map(|&(company, metric)| -> Result<BatchEntry<ComparisonResult>, AnalyzerError> {
                let group_a = selection::gather(self.table, &Selector::company(company.as_str()), metric);
                let group_b = selection::gather(self.table, &others, metric);
                let result = self.engine.compare(&group_a, &group_b, self.config.equal_variance);
                Ok(BatchEntry {
                    subject: company.clone(),
                    metric: metric.clone(),
                    outcome: Outcome::from_result(result)?,
                })
            })
            .collect::<Result<Vec<_>, AnalyzerError>>()?;

        batch::correct_per_metric(&mut entries, &metrics, self.config.correction);
        Ok(entries)
    }

    /// Regresses each company's metric on a post-period indicator
    /// (`1` for years on or after `split_year`, `0` before), once per metric.
    pub fn pre_post(
        &self,
        split_year: i32,
        metrics: &[String],
    ) -> Result<Vec<BatchEntry<RegressionResult>>, AnalyzerError> {
        let metrics = self.resolve_metrics(metrics)?;
        let companies = self.table.companies();

        let cells: Vec<(&str, &String)> = companies
            .iter()
            .flat_map(|company| metrics.iter().map(move |metric| (*company, metric)))
            .collect();
        tracing::info!(
            split_year,
            companies = companies.len(),
            metrics = metrics.len(),
            "Testing for a shift at the split year."
        );

        let mut entries = cells
            .par_iter()
            .map(|&(company, metric)| -> Result<BatchEntry<RegressionResult>, AnalyzerError> {
                let (x, y) = self.indicator_series(company, metric, split_year)?;
                let label = GroupKey::company(company).to_string();
                let result = self.engine.regress_on_indicator(&label, metric, &x, &y);
                Ok(BatchEntry {
                    subject: company.to_string(),
                    metric: metric.clone(),
                    outcome: Outcome::from_result(result)?,
                })
            })
            .collect::<Result<Vec<_>, AnalyzerError>>()?;

        batch::correct_per_metric(&mut entries, &metrics, self.config.correction);
        Ok(entries)
    }

    /// Builds the indicator and response series for one company and metric.
    /// Missing values are dropped; a usable value whose period has no year is an error.
    fn indicator_series(
        &self,
        company: &str,
        metric: &str,
        split_year: i32,
    ) -> Result<(Vec<f64>, Vec<f64>), AnalyzerError> {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for observation in self
            .table
            .rows_for_metric(metric)
            .filter(|o| o.company == company && o.is_valid())
        {
            let year = period_year(&observation.period)
                .ok_or_else(|| AnalyzerError::MissingPeriodYear(observation.period.clone()))?;
            x.push(if year >= split_year { 1.0 } else { 0.0 });
            y.push(observation.value);
        }
        Ok((x, y))
    }

    fn require_metric(&self, metric: &str) -> Result<(), AnalyzerError> {
        if self.table.has_metric(metric) {
            Ok(())
        } else {
            Err(AnalyzerError::UnknownMetric(metric.to_string()))
        }
    }
}
