//! Reproducible scatter sampling.
//!
//! Large batches are thinned to a fixed number of scatter points by a
//! Fisher-Yates shuffle driven by a seeded `SmallRng`, so the same input
//! and seed always yield the same points. Selected points keep their
//! input order.

use rand::Rng;
use serde::Serialize;
use u_numflow::random::shuffled_indices;

pub use u_numflow::random::create_rng;

use crate::record::EquipmentTable;

/// One point of the flowrate/pressure scatter, coloured by temperature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub t: Option<f64>,
}

/// Picks `k` distinct indices from `[0, n)`, returned in ascending order.
///
/// Returns all indices when `k >= n`.
///
/// ```
/// use equip_insight::sampling::{create_rng, sample_indices};
///
/// let idx = sample_indices(1000, 10, &mut create_rng(42));
/// assert_eq!(idx.len(), 10);
/// assert!(idx.windows(2).all(|w| w[0] < w[1]));
/// assert_eq!(sample_indices(3, 10, &mut create_rng(42)), vec![0, 1, 2]);
/// ```
pub fn sample_indices<R: Rng>(n: usize, k: usize, rng: &mut R) -> Vec<usize> {
    if k >= n {
        return (0..n).collect();
    }
    let mut indices = shuffled_indices(n, rng);
    indices.truncate(k);
    indices.sort_unstable();
    indices
}

/// Samples at most `max_points` scatter points with the given seed.
pub fn scatter_sample(table: &EquipmentTable<'_>, max_points: usize, seed: u64) -> Vec<ScatterPoint> {
    let records = table.records();
    let mut rng = create_rng(seed);
    sample_indices(records.len(), max_points, &mut rng)
        .into_iter()
        .map(|i| {
            let r = &records[i];
            ScatterPoint {
                x: r.flowrate,
                y: r.pressure,
                t: r.temperature,
            }
        })
        .collect()
}

// ── Tests ────────────────────────────────────────────────────────────
