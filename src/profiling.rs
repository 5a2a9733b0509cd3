//! Dataset-level coverage profiling.
//!
//! Reports how complete each metric is and how records distribute over
//! equipment categories. Absent values are expected input, not errors.
//!
//! # Example
//!
//! ```
//! use equip_insight::csv_parser::CsvReader;
//! use equip_insight::profiling::profile_coverage;
//! use equip_insight::record::{normalize, EquipmentTable};
//!
//! let csv = "name,type,flowrate,pressure,temperature\nA,Pump,1,2,NA\nB,Valve,3,4,5\n";
//! let rows = CsvReader::new().read_str(csv).unwrap();
//! let batch = normalize(&rows).unwrap();
//! let cov = profile_coverage(&EquipmentTable::new(&batch.records));
//!
//! assert_eq!(cov.metrics.temperature.absent_count, 1);
//! assert_eq!(cov.metrics.temperature.missing_pct, 50.0);
//! assert_eq!(cov.total_absent, 1);
//! ```

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::record::{EquipmentTable, Metric, PerMetric};

// ── Metric coverage ───────────────────────────────────────────────────

/// Completeness of one metric.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MetricCoverage {
    /// Number of present values.
    pub valid_count: usize,
    /// Number of absent values.
    pub absent_count: usize,
    /// Absent percentage (0.0 to 100.0).
    pub missing_pct: f64,
}

/// Completeness of the whole batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageProfile {
    pub row_count: usize,
    pub metrics: PerMetric<MetricCoverage>,
    /// Total absent cells across the three metrics.
    pub total_absent: usize,
    /// Overall absent rate over all metric cells (0.0 to 100.0).
    pub sparsity_pct: f64,
    /// Number of distinct categories, placeholder included.
    pub category_count: usize,
}

fn pct(part: usize, whole: usize) -> f64 {
    if whole > 0 {
        (part as f64 / whole as f64) * 100.0
    } else {
        0.0
    }
}

/// Computes the coverage of `metric` over the table.
pub fn metric_coverage(table: &EquipmentTable<'_>, metric: Metric) -> MetricCoverage {
    let row_count = table.len();
    let valid_count = table.valid_count(metric);
    let absent_count = row_count - valid_count;
    MetricCoverage {
        valid_count,
        absent_count,
        missing_pct: pct(absent_count, row_count),
    }
}

/// Profiles the completeness of every metric.
pub fn profile_coverage(table: &EquipmentTable<'_>) -> CoverageProfile {
    let row_count = table.len();
    let metrics = PerMetric::from_fn(|m| metric_coverage(table, m));
    let total_absent: usize = Metric::ALL
        .iter()
        .map(|&m| metrics.get(m).absent_count)
        .sum();

    CoverageProfile {
        row_count,
        metrics,
        total_absent,
        sparsity_pct: pct(total_absent, row_count * Metric::ALL.len()),
        category_count: category_distribution(table).len(),
    }
}

// ── Category distribution ─────────────────────────────────────────────

/// Record count per category, keyed in sorted order.
///
/// Counts sum to the number of records.
pub fn category_distribution(table: &EquipmentTable<'_>) -> BTreeMap<String, usize> {
    let mut freq: BTreeMap<String, usize> = BTreeMap::new();
    for rec in table.records() {
        *freq.entry(rec.category_label().to_string()).or_insert(0) += 1;
    }
    freq
}

/// Categories in order of first appearance.
pub fn categories_in_order<'a>(table: &EquipmentTable<'a>) -> Vec<&'a str> {
    let mut seen: HashSet<&'a str> = HashSet::new();
    let mut order: Vec<&'a str> = Vec::new();
    for rec in table.records() {
        let label = rec.category_label();
        if seen.insert(label) {
            order.push(label);
        }
    }
    order
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{EquipmentRecord, UNCATEGORIZED};

    fn rec(cat: &str, f: Option<f64>, p: Option<f64>, t: Option<f64>) -> EquipmentRecord {
        EquipmentRecord {
            name: String::new(),
            category: (!cat.is_empty()).then(|| cat.to_string()),
            flowrate: f,
            pressure: p,
            temperature: t,
        }
    }

    #[test]
    fn coverage_counts() {
        let records = vec![
            rec("Pump", Some(1.0), None, Some(3.0)),
            rec("Pump", None, None, Some(4.0)),
            rec("Valve", Some(2.0), Some(1.0), Some(5.0)),
            rec("Valve", Some(2.0), Some(1.0), None),
        ];
        let table = EquipmentTable::new(&records);
        let cov = profile_coverage(&table);

        assert_eq!(cov.row_count, 4);
        assert_eq!(cov.metrics.flowrate.valid_count, 3);
        assert_eq!(cov.metrics.flowrate.absent_count, 1);
        assert_eq!(cov.metrics.pressure.absent_count, 2);
        assert_eq!(cov.metrics.pressure.missing_pct, 50.0);
        assert_eq!(cov.total_absent, 4);
        assert!((cov.sparsity_pct - 100.0 / 3.0).abs() < 1e-12);
        assert_eq!(cov.category_count, 2);
    }

    #[test]
    fn fully_present_has_zero_sparsity() {
        let records = vec![rec("Pump", Some(1.0), Some(2.0), Some(3.0))];
        let cov = profile_coverage(&EquipmentTable::new(&records));
        assert_eq!(cov.total_absent, 0);
        assert_eq!(cov.sparsity_pct, 0.0);
    }

    #[test]
    fn empty_table_coverage() {
        let cov = profile_coverage(&EquipmentTable::new(&[]));
        assert_eq!(cov.row_count, 0);
        assert_eq!(cov.metrics.flowrate.missing_pct, 0.0);
        assert_eq!(cov.sparsity_pct, 0.0);
    }

    #[test]
    fn category_distribution_sums_to_total() {
        let records = vec![
            rec("Pump", None, None, None),
            rec("", None, None, None),
            rec("Pump", None, None, None),
            rec("Compressor", None, None, None),
        ];
        let table = EquipmentTable::new(&records);
        let dist = category_distribution(&table);
        assert_eq!(dist["Pump"], 2);
        assert_eq!(dist[UNCATEGORIZED], 1);
        assert_eq!(dist.values().sum::<usize>(), records.len());
        let keys: Vec<&String> = dist.keys().collect();
        assert_eq!(keys, vec!["Compressor", "Pump", UNCATEGORIZED]);
    }

    #[test]
    fn categories_keep_first_appearance_order() {
        let records = vec![
            rec("Valve", None, None, None),
            rec("Pump", None, None, None),
            rec("Valve", None, None, None),
        ];
        let table = EquipmentTable::new(&records);
        assert_eq!(categories_in_order(&table), vec!["Valve", "Pump"]);
    }

    #[test]
    fn category_order_outlives_table_view() {
        let records: Vec<EquipmentRecord> = (0..500)
            .map(|i| rec(&format!("C{}", i % 50), None, None, None))
            .chain([rec("", None, None, None)])
            .collect();
        let order = {
            let table = EquipmentTable::new(&records);
            categories_in_order(&table)
        };
        assert_eq!(order.len(), 51);
        assert_eq!(order[0], "C0");
        assert_eq!(order[49], "C49");
        assert_eq!(order[50], UNCATEGORIZED);
    }
}
