use crate::error::AnalyzerError;
use core_types::{Group, GroupKey, GroupKeys, Table};
use std::collections::HashMap;

/// A partition of one metric's finite observations, in first-encountered order.
#[derive(Debug, Clone, PartialEq)]
pub struct Groups {
    metric: String,
    entries: Vec<(GroupKey, Group)>,
    index: HashMap<GroupKey, usize>,
}

impl Groups {
    pub fn metric(&self) -> &str {
        &self.metric
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GroupKey, &Group)> {
        self.entries.iter().map(|(key, group)| (key, group))
    }

    /// Looks up the group for `key`, failing with `GroupNotFound` if the
    /// partition produced no such group.
    pub fn get(&self, key: &GroupKey) -> Result<&Group, AnalyzerError> {
        self.index
            .get(key)
            .map(|&idx| &self.entries[idx].1)
            .ok_or_else(|| AnalyzerError::GroupNotFound {
                key: key.to_string(),
                metric: self.metric.clone(),
            })
    }
}

/// Partitions the finite observations of `metric` by the requested key fields.
///
/// Rows of other metrics and non-finite values are discarded before
/// partitioning, so a key whose rows are all missing never appears. Groups
/// keep table order, both among themselves and within each group.
pub fn group_by(table: &Table, keys: GroupKeys, metric: &str) -> Groups {
    let mut entries: Vec<(GroupKey, Group)> = Vec::new();
    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut dropped = 0usize;

    for observation in table.rows_for_metric(metric) {
        if !observation.is_valid() {
            dropped += 1;
            continue;
        }

        let key = GroupKey::project(observation, keys);
        match index.get(&key) {
            Some(&idx) => entries[idx].1.values.push(observation.value),
            None => {
                index.insert(key.clone(), entries.len());
                let group = Group::new(key.to_string(), metric, vec![observation.value]);
                entries.push((key, group));
            }
        }
    }

    if dropped > 0 {
        tracing::debug!(metric, dropped, "Discarded non-finite observations while grouping.");
    }

    Groups {
        metric: metric.to_string(),
        entries,
        index,
    }
}
