use crate::enums::KeyField;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// One row of the input table: a single metric value for a company in a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub company: String,
    /// Reporting period identifier, e.g. `2016` or `2016Q1`.
    pub period: String,
    pub metric: String,
    /// May be non-finite when the source cell was missing; such rows never
    /// reach a statistical test.
    pub value: f64,
}

impl Observation {
    pub fn new(
        company: impl Into<String>,
        period: impl Into<String>,
        metric: impl Into<String>,
        value: f64,
    ) -> Self {
        Self {
            company: company.into(),
            period: period.into(),
            metric: metric.into(),
            value,
        }
    }

    /// Whether the value can take part in a test.
    pub fn is_valid(&self) -> bool {
        self.value.is_finite()
    }
}

/// The loaded observation table.
///
/// A `Table` is built once by the data loader and then only ever borrowed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    observations: Vec<Observation>,
}

impl Table {
    pub fn new(observations: Vec<Observation>) -> Self {
        Self { observations }
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Rows recorded for `metric`, in table order.
    pub fn rows_for_metric<'a>(&'a self, metric: &'a str) -> impl Iterator<Item = &'a Observation> {
        self.observations.iter().filter(move |o| o.metric == metric)
    }

    pub fn has_metric(&self, metric: &str) -> bool {
        self.observations.iter().any(|o| o.metric == metric)
    }

    /// Distinct metric names in first-seen order.
    pub fn metrics(&self) -> Vec<&str> {
        first_seen(self.observations.iter().map(|o| o.metric.as_str()))
    }

    /// Distinct companies in first-seen order.
    pub fn companies(&self) -> Vec<&str> {
        first_seen(self.observations.iter().map(|o| o.company.as_str()))
    }

    /// Distinct periods in first-seen order.
    pub fn periods(&self) -> Vec<&str> {
        first_seen(self.observations.iter().map(|o| o.period.as_str()))
    }
}

fn first_seen<'a>(items: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    items.filter(|item| seen.insert(*item)).collect()
}

/// Which observation fields a partition is keyed on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct GroupKeys {
    pub company: bool,
    pub period: bool,
}

impl GroupKeys {
    pub fn from_fields(fields: &[KeyField]) -> Self {
        Self {
            company: fields.contains(&KeyField::Company),
            period: fields.contains(&KeyField::Period),
        }
    }
}

/// The values of the requested key fields shared by every row of a group.
///
/// A field left as `None` was not part of the partition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    pub company: Option<String>,
    pub period: Option<String>,
}

impl GroupKey {
    pub fn company(company: impl Into<String>) -> Self {
        Self {
            company: Some(company.into()),
            period: None,
        }
    }

    pub fn company_period(company: impl Into<String>, period: impl Into<String>) -> Self {
        Self {
            company: Some(company.into()),
            period: Some(period.into()),
        }
    }

    /// The key of `observation` under the partition described by `keys`.
    pub fn project(observation: &Observation, keys: GroupKeys) -> Self {
        Self {
            company: keys.company.then(|| observation.company.clone()),
            period: keys.period.then(|| observation.period.clone()),
        }
    }

    /// The fields this key constrains.
    pub fn fields(&self) -> GroupKeys {
        GroupKeys {
            company: self.company.is_some(),
            period: self.period.is_some(),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.company, &self.period) {
            (Some(c), Some(p)) => write!(f, "company={},period={}", c, p),
            (Some(c), None) => write!(f, "company={}", c),
            (None, Some(p)) => write!(f, "period={}", p),
            (None, None) => write!(f, "all"),
        }
    }
}

impl FromStr for GroupKey {
    type Err = CoreError;

    /// Parses `company=A`, `period=Q1`, `company=A,period=Q1` or `all`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |msg: String| CoreError::InvalidInput("group key".to_string(), msg);
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty key".to_string()));
        }

        let mut key = GroupKey::default();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(key);
        }

        for part in trimmed.split(',') {
            let (field, value) = part
                .split_once('=')
                .ok_or_else(|| invalid(format!("expected `field=value`, got `{}`", part.trim())))?;
            let value = value.trim();
            if value.is_empty() {
                return Err(invalid(format!("missing value for `{}`", field.trim())));
            }
            let slot = match field.trim().to_ascii_lowercase().as_str() {
                "company" | "ticker" => &mut key.company,
                "period" | "year" => &mut key.period,
                other => return Err(invalid(format!("unknown field `{}`", other))),
            };
            if slot.is_some() {
                return Err(invalid(format!("field `{}` given twice", field.trim())));
            }
            *slot = Some(value.to_string());
        }

        Ok(key)
    }
}

/// A labelled sample of finite values for one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub label: String,
    pub metric: String,
    pub values: Vec<f64>,
}

impl Group {
    pub fn new(label: impl Into<String>, metric: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            metric: metric.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Reads the calendar year out of a period label.
///
/// The first run of exactly four digits wins, so `2016`, `2016Q1`, `FY2016`
/// and `Q1-2016` all yield `2016`.
pub fn period_year(period: &str) -> Option<i32> {
    period
        .split(|c: char| !c.is_ascii_digit())
        .find(|run| run.len() == 4)
        .and_then(|run| run.parse().ok())
}
