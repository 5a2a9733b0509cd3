//! Category-grouped and conditional analytics.
//!
//! Grouped analytics partition the records by category and describe every
//! metric within each partition. Conditional analytics select the records
//! whose condition metric lies strictly above (or below) its dataset-wide
//! mean and report the subset's metric means.
//!
//! # Example
//!
//! ```
//! use equip_insight::grouped::{conditional_analytics, grouped_analytics, CategoryPolicy, Condition, ConditionStatus};
//! use equip_insight::record::{EquipmentRecord, EquipmentTable};
//!
//! let rec = |cat: &str, p: f64| EquipmentRecord {
//!     name: String::new(),
//!     category: Some(cat.into()),
//!     flowrate: Some(1.0),
//!     pressure: Some(p),
//!     temperature: None,
//! };
//! let records = vec![rec("Pump", 1.0), rec("Pump", 3.0), rec("Valve", 8.0)];
//! let table = EquipmentTable::new(&records);
//!
//! let grouped = grouped_analytics(&table, CategoryPolicy::Keep);
//! assert_eq!(grouped["Pump"].pressure.mean, Some(2.0));
//!
//! let cond = conditional_analytics(&table, &Condition::default());
//! assert_eq!(cond.status, ConditionStatus::Matched);
//! assert_eq!(cond.total_records, 1);
//! assert_eq!(cond.mean_per_metric.pressure, Some(8.0));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::record::{EquipmentRecord, EquipmentTable, Metric, PerMetric};
use crate::stats::{describe, mean, DescriptiveStats};

/// Records partitioned by category, keyed in sorted order.
pub type CategoryGroups<'a> = BTreeMap<String, Vec<&'a EquipmentRecord>>;

/// `category → metric → stats`.
pub type GroupedAnalytics = BTreeMap<String, PerMetric<DescriptiveStats>>;

// ── Category policy ──────────────────────────────────────────────────

/// What to do with records whose category was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryPolicy {
    /// Keep them as their own `"Uncategorized"` group.
    #[default]
    Keep,
    /// Exclude them from every grouped metric.
    Drop,
}

/// Partitions records by category under `policy`.
pub fn partition_by_category<'a>(
    table: &EquipmentTable<'a>,
    policy: CategoryPolicy,
) -> CategoryGroups<'a> {
    let mut groups: CategoryGroups<'a> = BTreeMap::new();
    for rec in table.records() {
        if policy == CategoryPolicy::Drop && rec.is_uncategorized() {
            continue;
        }
        groups
            .entry(rec.category_label().to_string())
            .or_default()
            .push(rec);
    }
    groups
}

/// Describes every metric of every partition.
pub fn describe_groups(groups: &CategoryGroups<'_>) -> GroupedAnalytics {
    groups
        .iter()
        .map(|(category, records)| {
            let stats = PerMetric::from_fn(|m| {
                let values: Vec<f64> = records.iter().filter_map(|r| r.metric(m)).collect();
                describe(&values)
            });
            (category.clone(), stats)
        })
        .collect()
}

/// Partitions by category and describes every metric per partition.
///
/// Under [`CategoryPolicy::Keep`] the per-category counts of each metric
/// sum to that metric's dataset-wide present count.
pub fn grouped_analytics(table: &EquipmentTable<'_>, policy: CategoryPolicy) -> GroupedAnalytics {
    let groups = partition_by_category(table, policy);
    debug!(categories = groups.len(), ?policy, "grouped analytics");
    describe_groups(&groups)
}

// ── Conditions ───────────────────────────────────────────────────────

/// Direction of a mean comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    #[default]
    Above,
    Below,
}

/// Selects records whose `metric` is strictly above or below its mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Condition {
    pub metric: Metric,
    pub comparison: Comparison,
}

impl Default for Condition {
    fn default() -> Self {
        Self {
            metric: Metric::Pressure,
            comparison: Comparison::Above,
        }
    }
}

impl Condition {
    pub fn new(metric: Metric, comparison: Comparison) -> Self {
        Self { metric, comparison }
    }

    /// `true` if `value` satisfies the condition against `reference`.
    pub fn matches(&self, value: f64, reference: f64) -> bool {
        match self.comparison {
            Comparison::Above => value > reference,
            Comparison::Below => value < reference,
        }
    }

    /// Human-readable label, e.g. `"Records with ABOVE average pressure"`.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.comparison {
            Comparison::Above => "ABOVE",
            Comparison::Below => "BELOW",
        };
        write!(f, "Records with {dir} average {}", self.metric.key())
    }
}

// ── Conditional analytics ────────────────────────────────────────────

/// Outcome of evaluating a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConditionStatus {
    /// The condition metric has no values at all, so there is no mean.
    NoReferenceData,
    /// A mean exists but no record satisfies the condition.
    EmptySubset,
    Matched,
}

/// Metric means over the records that satisfy a condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionalAnalytics {
    pub condition_label: String,
    pub status: ConditionStatus,
    /// Dataset-wide mean of the condition metric.
    pub reference_mean: Option<f64>,
    /// Size of the selected subset; `0` is a valid result.
    pub total_records: usize,
    pub mean_per_metric: PerMetric<Option<f64>>,
}

/// Evaluates `condition` over the table.
pub fn conditional_analytics(
    table: &EquipmentTable<'_>,
    condition: &Condition,
) -> ConditionalAnalytics {
    let condition_label = condition.label();
    let reference_mean = mean(&table.values(condition.metric));

    let Some(reference) = reference_mean else {
        return ConditionalAnalytics {
            condition_label,
            status: ConditionStatus::NoReferenceData,
            reference_mean: None,
            total_records: 0,
            mean_per_metric: PerMetric::default(),
        };
    };

    let subset: Vec<&EquipmentRecord> = table
        .records()
        .iter()
        .filter(|r| {
            r.metric(condition.metric)
                .is_some_and(|v| condition.matches(v, reference))
        })
        .collect();

    let status = if subset.is_empty() {
        ConditionStatus::EmptySubset
    } else {
        ConditionStatus::Matched
    };
    let mean_per_metric = PerMetric::from_fn(|m| {
        let values: Vec<f64> = subset.iter().filter_map(|r| r.metric(m)).collect();
        mean(&values)
    });

    debug!(
        condition = %condition_label,
        reference,
        matched = subset.len(),
        "conditional analytics"
    );

    ConditionalAnalytics {
        condition_label,
        status,
        reference_mean,
        total_records: subset.len(),
        mean_per_metric,
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::UNCATEGORIZED;

    fn rec(cat: &str, f: Option<f64>, p: Option<f64>, t: Option<f64>) -> EquipmentRecord {
        EquipmentRecord {
            name: String::new(),
            category: (!cat.is_empty()).then(|| cat.to_string()),
            flowrate: f,
            pressure: p,
            temperature: t,
        }
    }

    fn sample() -> Vec<EquipmentRecord> {
        vec![
            rec("Pump", Some(10.0), Some(2.0), Some(50.0)),
            rec("Pump", Some(20.0), Some(4.0), None),
            rec("Valve", Some(5.0), Some(6.0), Some(70.0)),
            rec("", None, Some(8.0), Some(90.0)),
        ]
    }

    #[test]
    fn groups_by_category() {
        let records = sample();
        let grouped = grouped_analytics(&EquipmentTable::new(&records), CategoryPolicy::Keep);
        assert_eq!(grouped.len(), 3);
        assert_eq!(grouped["Pump"].flowrate.count, 2);
        assert_eq!(grouped["Pump"].flowrate.mean, Some(15.0));
        assert_eq!(grouped["Pump"].temperature.count, 1);
        assert_eq!(grouped[UNCATEGORIZED].flowrate.count, 0);
        assert_eq!(grouped[UNCATEGORIZED].flowrate.mean, None);
    }

    #[test]
    fn partition_counts_are_conserved() {
        let records = sample();
        let table = EquipmentTable::new(&records);
        let grouped = grouped_analytics(&table, CategoryPolicy::Keep);
        for m in Metric::ALL {
            let sum: usize = grouped.values().map(|s| s.get(m).count).sum();
            assert_eq!(sum, table.valid_count(m), "metric {m}");
        }
    }

    #[test]
    fn drop_policy_excludes_uncategorized_everywhere() {
        let records = sample();
        let grouped = grouped_analytics(&EquipmentTable::new(&records), CategoryPolicy::Drop);
        assert!(!grouped.contains_key(UNCATEGORIZED));
        let pressure: usize = grouped.values().map(|s| s.pressure.count).sum();
        assert_eq!(pressure, 3);
    }

    #[test]
    fn drop_policy_keeps_literal_uncategorized_category() {
        let records = vec![
            rec(UNCATEGORIZED, Some(1.0), Some(1.0), None),
            rec("", Some(2.0), Some(2.0), None),
        ];
        let table = EquipmentTable::new(&records);
        let dropped = grouped_analytics(&table, CategoryPolicy::Drop);
        assert_eq!(dropped[UNCATEGORIZED].flowrate.count, 1);
        assert_eq!(dropped[UNCATEGORIZED].flowrate.mean, Some(1.0));

        let kept = grouped_analytics(&table, CategoryPolicy::Keep);
        assert_eq!(kept[UNCATEGORIZED].flowrate.count, 2);
    }

    #[test]
    fn above_mean_pressure() {
        // Mean pressure = 5.0
        let records = sample();
        let cond = conditional_analytics(&EquipmentTable::new(&records), &Condition::default());
        assert_eq!(cond.condition_label, "Records with ABOVE average pressure");
        assert_eq!(cond.reference_mean, Some(5.0));
        assert_eq!(cond.status, ConditionStatus::Matched);
        assert_eq!(cond.total_records, 2);
        assert_eq!(cond.mean_per_metric.flowrate, Some(5.0));
        assert_eq!(cond.mean_per_metric.pressure, Some(7.0));
        assert_eq!(cond.mean_per_metric.temperature, Some(80.0));
    }

    #[test]
    fn below_mean_condition() {
        let records = sample();
        let condition = Condition::new(Metric::Flowrate, Comparison::Below);
        let cond = conditional_analytics(&EquipmentTable::new(&records), &condition);
        assert_eq!(cond.condition_label, "Records with BELOW average flowrate");
        // Mean flowrate = 35/3; below: 10 and 5.
        assert_eq!(cond.total_records, 2);
        assert_eq!(cond.mean_per_metric.flowrate, Some(7.5));
    }

    #[test]
    fn identical_pressures_give_empty_subset() {
        let records = vec![
            rec("Pump", Some(1.0), Some(3.0), None),
            rec("Pump", Some(2.0), Some(3.0), None),
        ];
        let cond = conditional_analytics(&EquipmentTable::new(&records), &Condition::default());
        assert_eq!(cond.status, ConditionStatus::EmptySubset);
        assert_eq!(cond.total_records, 0);
        assert_eq!(cond.mean_per_metric, PerMetric::default());
        assert_eq!(cond.reference_mean, Some(3.0));
    }

    #[test]
    fn repeated_inexact_pressures_give_empty_subset() {
        for (p, n) in [(3.3, 3), (3.3, 6), (7.7, 9), (0.1, 10)] {
            let records: Vec<EquipmentRecord> = (0..n)
                .map(|i| rec("Pump", Some(i as f64), Some(p), None))
                .collect();
            let table = EquipmentTable::new(&records);
            for comparison in [Comparison::Above, Comparison::Below] {
                let condition = Condition::new(Metric::Pressure, comparison);
                let cond = conditional_analytics(&table, &condition);
                assert_eq!(cond.reference_mean, Some(p), "{n} copies of {p}");
                assert_eq!(cond.status, ConditionStatus::EmptySubset, "{n} copies of {p}");
                assert_eq!(cond.total_records, 0, "{n} copies of {p}");
            }
        }
    }

    #[test]
    fn no_pressure_at_all() {
        let records = vec![rec("Pump", Some(1.0), None, None)];
        let cond = conditional_analytics(&EquipmentTable::new(&records), &Condition::default());
        assert_eq!(cond.status, ConditionStatus::NoReferenceData);
        assert_eq!(cond.total_records, 0);
        assert_eq!(cond.reference_mean, None);
    }

    #[test]
    fn condition_deserializes_with_defaults() {
        let c: Condition = serde_json::from_str(r#"{"comparison": "below"}"#).unwrap();
        assert_eq!(c, Condition::new(Metric::Pressure, Comparison::Below));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn record_strategy() -> impl Strategy<Value = EquipmentRecord> {
        let metric = || proptest::option::weighted(0.8, -1e3_f64..1e3);
        (
            prop_oneof![Just("Pump"), Just("Valve"), Just("Reactor"), Just("")],
            metric(),
            metric(),
            metric(),
        )
            .prop_map(|(cat, f, p, t)| EquipmentRecord {
                name: String::new(),
                category: (!cat.is_empty()).then(|| cat.to_string()),
                flowrate: f,
                pressure: p,
                temperature: t,
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn grouped_counts_sum_to_total(records in proptest::collection::vec(record_strategy(), 1..80)) {
            let table = EquipmentTable::new(&records);
            let grouped = grouped_analytics(&table, CategoryPolicy::Keep);
            for m in Metric::ALL {
                let sum: usize = grouped.values().map(|s| s.get(m).count).sum();
                prop_assert_eq!(sum, table.valid_count(m));
            }
        }

        #[test]
        fn matched_subset_is_strictly_above_mean(records in proptest::collection::vec(record_strategy(), 1..80)) {
            let table = EquipmentTable::new(&records);
            let cond = conditional_analytics(&table, &Condition::default());
            if let Some(reference) = cond.reference_mean {
                let expected = records
                    .iter()
                    .filter(|r| r.pressure.is_some_and(|p| p > reference))
                    .count();
                prop_assert_eq!(cond.total_records, expected);
            } else {
                prop_assert_eq!(cond.status, ConditionStatus::NoReferenceData);
            }
        }

        #[test]
        fn constant_condition_metric_selects_nothing(p in -1e3_f64..1e3, n in 1_usize..60) {
            let records: Vec<EquipmentRecord> = (0..n)
                .map(|_| EquipmentRecord {
                    name: String::new(),
                    category: None,
                    flowrate: None,
                    pressure: Some(p),
                    temperature: None,
                })
                .collect();
            let cond = conditional_analytics(&EquipmentTable::new(&records), &Condition::default());
            prop_assert_eq!(cond.total_records, 0);
            prop_assert_eq!(cond.status, ConditionStatus::EmptySubset);
        }
    }
}
