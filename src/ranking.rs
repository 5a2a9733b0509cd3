//! Performance ranking of records and categories.
//!
//! Records are ordered by one metric, highest first. The sort is stable,
//! so ties keep input order, and absent values sort below every present
//! value.

use std::cmp::Ordering;

use serde::Serialize;

use crate::grouped::CategoryGroups;
use crate::record::{EquipmentRecord, EquipmentTable, Metric};
use crate::stats::mean;

/// Descending order with absent values last.
fn descending(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// ── Record ranking ───────────────────────────────────────────────────

/// One ranked record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingEntry {
    /// 1-based position.
    pub rank: usize,
    pub name: String,
    pub category: String,
    pub flowrate: Option<f64>,
    pub pressure: Option<f64>,
    pub temperature: Option<f64>,
}

/// Ranks every record by `metric`, descending.
///
/// ```
/// use equip_insight::ranking::rank_records;
/// use equip_insight::record::{EquipmentRecord, EquipmentTable, Metric};
///
/// let rec = |name: &str, f: Option<f64>| EquipmentRecord {
///     name: name.into(),
///     category: Some("Pump".into()),
///     flowrate: f,
///     pressure: None,
///     temperature: None,
/// };
/// let records = vec![rec("A", Some(5.0)), rec("B", None), rec("C", Some(9.0)), rec("D", Some(5.0))];
/// let ranking = rank_records(&EquipmentTable::new(&records), Metric::Flowrate);
///
/// let names: Vec<&str> = ranking.iter().map(|e| e.name.as_str()).collect();
/// assert_eq!(names, ["C", "A", "D", "B"]);
/// assert_eq!(ranking[3].rank, 4);
/// ```
pub fn rank_records(table: &EquipmentTable<'_>, metric: Metric) -> Vec<RankingEntry> {
    let mut ordered: Vec<&EquipmentRecord> = table.records().iter().collect();
    ordered.sort_by(|a, b| descending(a.metric(metric), b.metric(metric)));

    ordered
        .into_iter()
        .enumerate()
        .map(|(i, r)| RankingEntry {
            rank: i + 1,
            name: r.name.clone(),
            category: r.category_label().to_string(),
            flowrate: r.flowrate,
            pressure: r.pressure,
            temperature: r.temperature,
        })
        .collect()
}

// ── Category ranking ─────────────────────────────────────────────────

/// One ranked category with its metric means.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRankingEntry {
    pub rank: usize,
    pub category: String,
    /// Number of records in the category.
    pub count: usize,
    pub mean_flowrate: Option<f64>,
    pub mean_pressure: Option<f64>,
    pub mean_temperature: Option<f64>,
}

impl CategoryRankingEntry {
    fn mean_of(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Flowrate => self.mean_flowrate,
            Metric::Pressure => self.mean_pressure,
            Metric::Temperature => self.mean_temperature,
        }
    }
}

/// Ranks categories by their mean `metric`, descending.
///
/// `order` fixes the tie-break: categories that compare equal keep the
/// position they have in `order` (first appearance in the input).
/// Categories missing from `groups` are skipped.
pub fn rank_categories(
    groups: &CategoryGroups<'_>,
    order: &[&str],
    metric: Metric,
) -> Vec<CategoryRankingEntry> {
    let mut entries: Vec<CategoryRankingEntry> = order
        .iter()
        .filter_map(|&category| {
            let records = groups.get(category)?;
            let mean_for = |m: Metric| {
                let values: Vec<f64> = records.iter().filter_map(|r| r.metric(m)).collect();
                mean(&values)
            };
            Some(CategoryRankingEntry {
                rank: 0,
                category: category.to_string(),
                count: records.len(),
                mean_flowrate: mean_for(Metric::Flowrate),
                mean_pressure: mean_for(Metric::Pressure),
                mean_temperature: mean_for(Metric::Temperature),
            })
        })
        .collect();

    entries.sort_by(|a, b| descending(a.mean_of(metric), b.mean_of(metric)));
    for (i, e) in entries.iter_mut().enumerate() {
        e.rank = i + 1;
    }
    entries
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouped::{partition_by_category, CategoryPolicy};
    use crate::profiling::categories_in_order;

    fn rec(name: &str, cat: &str, f: Option<f64>, p: Option<f64>) -> EquipmentRecord {
        EquipmentRecord {
            name: name.to_string(),
            category: Some(cat.to_string()),
            flowrate: f,
            pressure: p,
            temperature: None,
        }
    }

    #[test]
    fn stable_descending_with_absent_last() {
        let records = vec![
            rec("A", "Pump", None, None),
            rec("B", "Pump", Some(3.0), None),
            rec("C", "Pump", Some(7.0), None),
            rec("D", "Pump", Some(3.0), None),
            rec("E", "Pump", None, None),
        ];
        let ranking = rank_records(&EquipmentTable::new(&records), Metric::Flowrate);
        let names: Vec<&str> = ranking.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["C", "B", "D", "A", "E"]);
        let ranks: Vec<usize> = ranking.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn ranking_by_other_metric() {
        let records = vec![
            rec("A", "Pump", Some(1.0), Some(9.0)),
            rec("B", "Pump", Some(2.0), Some(1.0)),
        ];
        let ranking = rank_records(&EquipmentTable::new(&records), Metric::Pressure);
        assert_eq!(ranking[0].name, "A");
    }

    #[test]
    fn negative_values_rank_above_absent() {
        let records = vec![rec("A", "Pump", None, None), rec("B", "Pump", Some(-5.0), None)];
        let ranking = rank_records(&EquipmentTable::new(&records), Metric::Flowrate);
        assert_eq!(ranking[0].name, "B");
    }

    #[test]
    fn categories_ranked_by_mean() {
        let records = vec![
            rec("A", "Valve", Some(2.0), None),
            rec("B", "Pump", Some(10.0), None),
            rec("C", "Pump", Some(20.0), None),
            rec("D", "Tank", None, None),
            rec("E", "Valve", Some(4.0), None),
        ];
        let table = EquipmentTable::new(&records);
        let groups = partition_by_category(&table, CategoryPolicy::Keep);
        let ranking = rank_categories(&groups, &categories_in_order(&table), Metric::Flowrate);

        let cats: Vec<&str> = ranking.iter().map(|e| e.category.as_str()).collect();
        assert_eq!(cats, vec!["Pump", "Valve", "Tank"]);
        assert_eq!(ranking[0].mean_flowrate, Some(15.0));
        assert_eq!(ranking[0].count, 2);
        assert_eq!(ranking[2].mean_flowrate, None);
        assert_eq!(ranking[2].rank, 3);
    }

    #[test]
    fn category_ties_keep_first_appearance() {
        let records = vec![
            rec("A", "Valve", Some(5.0), None),
            rec("B", "Pump", Some(5.0), None),
        ];
        let table = EquipmentTable::new(&records);
        let groups = partition_by_category(&table, CategoryPolicy::Keep);
        let ranking = rank_categories(&groups, &categories_in_order(&table), Metric::Flowrate);
        assert_eq!(ranking[0].category, "Valve");
        assert_eq!(ranking[1].category, "Pump");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn ranking_is_a_sorted_permutation(
            flows in proptest::collection::vec(proptest::option::weighted(0.8, -1e3_f64..1e3), 0..60)
        ) {
            let records: Vec<EquipmentRecord> = flows
                .iter()
                .enumerate()
                .map(|(i, &f)| EquipmentRecord {
                    name: format!("E{i}"),
                    category: Some("Pump".into()),
                    flowrate: f,
                    pressure: None,
                    temperature: None,
                })
                .collect();
            let ranking = rank_records(&EquipmentTable::new(&records), Metric::Flowrate);
            prop_assert_eq!(ranking.len(), records.len());
            for w in ranking.windows(2) {
                prop_assert!(descending(w[0].flowrate, w[1].flowrate) != Ordering::Greater);
            }
        }
    }
}
