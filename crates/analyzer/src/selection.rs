use crate::error::AnalyzerError;
use core_types::{Group, Observation, Table, period_year};
use std::fmt;

/// Which companies a selection admits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompanyFilter {
    Any,
    Is(String),
    /// Every company except the listed ones, e.g. "the rest of the index".
    Except(Vec<String>),
}

/// Which periods a selection admits. Year bounds read the year out of the
/// period label; periods without one never match a bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodFilter {
    Any,
    /// Year strictly before the bound.
    Before(i32),
    /// Year on or after the bound.
    From(i32),
}

/// A predicate over observations that is more expressive than a `GroupKey`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub company: CompanyFilter,
    pub period: PeriodFilter,
}

impl Selector {
    pub fn new(company: CompanyFilter, period: PeriodFilter) -> Self {
        Self { company, period }
    }

    pub fn company(company: impl Into<String>) -> Self {
        Self::new(CompanyFilter::Is(company.into()), PeriodFilter::Any)
    }

    pub fn all_except(companies: &[String]) -> Self {
        Self::new(CompanyFilter::Except(companies.to_vec()), PeriodFilter::Any)
    }

    pub fn matches(&self, observation: &Observation) -> bool {
        let company_ok = match &self.company {
            CompanyFilter::Any => true,
            CompanyFilter::Is(name) => observation.company == *name,
            CompanyFilter::Except(names) => !names.contains(&observation.company),
        };
        if !company_ok {
            return false;
        }

        match &self.period {
            PeriodFilter::Any => true,
            PeriodFilter::Before(bound) => period_year(&observation.period).is_some_and(|y| y < *bound),
            PeriodFilter::From(bound) => period_year(&observation.period).is_some_and(|y| y >= *bound),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let company = match &self.company {
            CompanyFilter::Any => None,
            CompanyFilter::Is(name) => Some(format!("company={}", name)),
            CompanyFilter::Except(names) => Some(format!("others (excl. {})", names.join(", "))),
        };
        let period = match &self.period {
            PeriodFilter::Any => None,
            PeriodFilter::Before(year) => Some(format!("period<{}", year)),
            PeriodFilter::From(year) => Some(format!("period>={}", year)),
        };
        match (company, period) {
            (Some(c), Some(p)) => write!(f, "{}, {}", c, p),
            (Some(c), None) => write!(f, "{}", c),
            (None, Some(p)) => write!(f, "{}", p),
            (None, None) => write!(f, "all"),
        }
    }
}

/// Builds the group of finite `metric` values admitted by `selector`, which
/// may be empty.
pub(crate) fn gather(table: &Table, selector: &Selector, metric: &str) -> Group {
    let values: Vec<f64> = table
        .rows_for_metric(metric)
        .filter(|o| o.is_valid() && selector.matches(o))
        .map(|o| o.value)
        .collect();
    Group::new(selector.to_string(), metric, values)
}

/// Builds the group of finite `metric` values admitted by `selector`.
///
/// Fails with `GroupNotFound` when nothing usable is selected.
pub fn select(table: &Table, selector: &Selector, metric: &str) -> Result<Group, AnalyzerError> {
    let group = gather(table, selector, metric);
    if group.is_empty() {
        return Err(AnalyzerError::GroupNotFound {
            key: group.label,
            metric: metric.to_string(),
        });
    }
    Ok(group)
}
