//! Pairwise Pearson correlation between the three metrics.
//!
//! Each pair is computed over the records where *both* metrics are present
//! (pairwise deletion), so an absent pressure never drops a record from the
//! flowrate–temperature pair. Undefined correlations (fewer than two pairs,
//! zero variance) are reported as `0.0`.
//!
//! # Example
//!
//! ```
//! use equip_insight::correlation::{correlation_matrix, CorrelationStrength};
//! use equip_insight::record::{EquipmentRecord, EquipmentTable, Metric};
//!
//! let records: Vec<EquipmentRecord> = (0..5)
//!     .map(|i| EquipmentRecord {
//!         name: format!("E{i}"),
//!         category: Some("Pump".into()),
//!         flowrate: Some(i as f64),
//!         pressure: Some(10.0 - 2.0 * i as f64),
//!         temperature: Some(50.0),
//!     })
//!     .collect();
//! let corr = correlation_matrix(&EquipmentTable::new(&records));
//!
//! assert!((corr.get(Metric::Flowrate, Metric::Pressure) + 1.0).abs() < 1e-12);
//! assert_eq!(corr.get(Metric::Flowrate, Metric::Temperature), 0.0);
//! assert_eq!(corr.entries.len(), 9);
//! assert_eq!(corr.pairs[0].strength, CorrelationStrength::Strong);
//! ```

use std::collections::BTreeMap;

use serde::Serialize;
use u_analytics::correlation;

use crate::record::{EquipmentTable, Metric};

/// |r| at or above which a correlation is strong.
pub const STRONG_THRESHOLD: f64 = 0.7;
/// |r| at or above which a correlation is moderate.
pub const MODERATE_THRESHOLD: f64 = 0.4;

// ── Strength ─────────────────────────────────────────────────────────

/// Qualitative strength of a correlation coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CorrelationStrength {
    Strong,
    Moderate,
    Weak,
}

impl CorrelationStrength {
    pub fn from_r(r: f64) -> Self {
        let a = r.abs();
        if a >= STRONG_THRESHOLD {
            Self::Strong
        } else if a >= MODERATE_THRESHOLD {
            Self::Moderate
        } else {
            Self::Weak
        }
    }
}

// ── Pearson ──────────────────────────────────────────────────────────

/// Pearson correlation over positionally aligned columns.
///
/// Positions where either side is absent are skipped. Returns `0.0` when
/// fewer than two complete pairs remain or either side has zero variance.
/// Three or more pairs go through [`u_analytics::correlation::pearson`];
/// two distinct points are collinear, so only the direction is reported.
///
/// ```
/// use equip_insight::correlation::pearson;
///
/// let x = [Some(1.0), Some(2.0), None, Some(3.0)];
/// let y = [Some(2.0), Some(4.0), Some(100.0), Some(6.0)];
/// assert!((pearson(&x, &y) - 1.0).abs() < 1e-12);
/// assert_eq!(pearson(&[Some(1.0)], &[Some(2.0)]), 0.0);
/// ```
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> f64 {
    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .unzip();

    match xs.len() {
        0 | 1 => 0.0,
        2 => {
            let slope = (xs[1] - xs[0]) * (ys[1] - ys[0]);
            if slope > 0.0 {
                1.0
            } else if slope < 0.0 {
                -1.0
            } else {
                0.0
            }
        }
        _ => correlation::pearson(&xs, &ys)
            .map(|c| c.r)
            .filter(|r| r.is_finite())
            .unwrap_or(0.0),
    }
}

// ── Matrix ───────────────────────────────────────────────────────────

/// One cell of the correlation matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CorrelationEntry {
    pub x: Metric,
    pub y: Metric,
    pub value: f64,
    pub strength: CorrelationStrength,
}

/// One unordered metric pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CorrelationPair {
    pub a: Metric,
    pub b: Metric,
    pub r: f64,
    pub strength: CorrelationStrength,
}

/// Symmetric 3×3 correlation matrix in two shapes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    /// All nine cells, row-major over `Metric::ALL`.
    pub entries: Vec<CorrelationEntry>,
    /// `outer → inner → r`, keyed by metric JSON keys.
    pub matrix: BTreeMap<String, BTreeMap<String, f64>>,
    /// The three off-diagonal pairs, sorted by |r| descending.
    pub pairs: Vec<CorrelationPair>,
}

impl CorrelationMatrix {
    /// Coefficient for `(a, b)`; `1.0` on the diagonal.
    pub fn get(&self, a: Metric, b: Metric) -> f64 {
        self.matrix
            .get(a.key())
            .and_then(|row| row.get(b.key()))
            .copied()
            .unwrap_or(0.0)
    }
}

fn metric_index(m: Metric) -> usize {
    match m {
        Metric::Flowrate => 0,
        Metric::Pressure => 1,
        Metric::Temperature => 2,
    }
}

/// Computes the correlation matrix of the three metrics.
pub fn correlation_matrix(table: &EquipmentTable<'_>) -> CorrelationMatrix {
    let columns: Vec<Vec<Option<f64>>> = Metric::ALL.iter().map(|&m| table.column(m)).collect();

    // One computation per unordered pair feeds both shapes.
    let mut r = [[1.0_f64; 3]; 3];
    let mut pairs = Vec::with_capacity(3);
    for (i, &a) in Metric::ALL.iter().enumerate() {
        for (j, &b) in Metric::ALL.iter().enumerate().skip(i + 1) {
            let v = pearson(&columns[i], &columns[j]);
            r[i][j] = v;
            r[j][i] = v;
            pairs.push(CorrelationPair {
                a,
                b,
                r: v,
                strength: CorrelationStrength::from_r(v),
            });
        }
    }
    pairs.sort_by(|p, q| q.r.abs().total_cmp(&p.r.abs()));

    let mut entries = Vec::with_capacity(9);
    let mut matrix: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
    for &x in &Metric::ALL {
        for &y in &Metric::ALL {
            let value = r[metric_index(x)][metric_index(y)];
            entries.push(CorrelationEntry {
                x,
                y,
                value,
                strength: CorrelationStrength::from_r(value),
            });
            matrix
                .entry(x.key().to_string())
                .or_default()
                .insert(y.key().to_string(), value);
        }
    }

    CorrelationMatrix {
        entries,
        matrix,
        pairs,
    }
}

// ── Tests ────────────────────────────────────────────────────────────
