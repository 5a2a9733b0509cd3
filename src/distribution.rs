//! Quantile and outlier analysis.
//!
//! Everything here is derived from the five-number summary of
//! [`describe`](crate::stats::describe):
//!
//! - **Histogram**: `k` equal-width bins over the flowrate range, with the
//!   temperature column binned on its own edges or on the shared flowrate
//!   axis
//! - **Outliers**: Tukey fences `[Q1 − 1.5·IQR, Q3 + 1.5·IQR]`; values
//!   strictly outside are reported, never removed
//! - **Boxplots**: per metric and per category × metric
//! - **Distribution analysis**: median, IQR, range and skew direction
//!
//! # Example
//!
//! ```
//! use equip_insight::distribution::{histogram, HistogramConfig};
//!
//! let flow = [0.0, 2.5, 5.0, 7.5, 10.0];
//! let temp = [20.0, 30.0];
//! let h = histogram(&flow, &temp, &HistogramConfig::default()).unwrap();
//!
//! assert_eq!(h.bin_edges, vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
//! assert_eq!(h.flow_counts, vec![1, 1, 1, 1, 1]);
//! assert_eq!(h.labels[4], "[8.00, 10.00]");
//! assert_eq!(h.temp_counts.iter().sum::<usize>(), 2);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::InsightError;
use crate::grouped::CategoryGroups;
use crate::record::{EquipmentTable, Metric, PerMetric};
use crate::stats::{describe, DescriptiveStats};

/// Tukey fence multiplier.
pub const IQR_MULTIPLIER: f64 = 1.5;

// ── Histogram ────────────────────────────────────────────────────────

/// Configuration for the flowrate/temperature histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramConfig {
    /// Number of equal-width bins. Default: 5.
    pub bins: usize,
    /// Bin temperature on the flowrate edges instead of its own. Default: false.
    pub shared_axis: bool,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            bins: 5,
            shared_axis: false,
        }
    }
}

impl HistogramConfig {
    pub fn bins(mut self, bins: usize) -> Self {
        self.bins = bins;
        self
    }

    pub fn shared_axis(mut self, shared: bool) -> Self {
        self.shared_axis = shared;
        self
    }
}

/// Flowrate histogram with a companion temperature histogram.
///
/// Bins are closed-left/open-right except the last, which is closed on
/// both ends, so every flowrate value lands in exactly one bin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    /// Flowrate bin edges (length = bins + 1), empty when there is no flowrate.
    pub bin_edges: Vec<f64>,
    /// Human-readable flowrate bin labels.
    pub labels: Vec<String>,
    pub flow_counts: Vec<usize>,
    pub temp_counts: Vec<usize>,
    /// Temperature's own edges; `None` when binned on the shared axis.
    pub temp_bin_edges: Option<Vec<f64>>,
    pub temp_labels: Option<Vec<String>>,
    /// Temperature values outside the shared flowrate range.
    pub temp_out_of_range: usize,
}

/// Computes `bins + 1` equal-width edges over the range of `values`.
///
/// A constant column is widened to `[v − 0.5, v + 0.5]`. Returns an empty
/// vector when `values` is empty.
pub fn equal_width_edges(values: &[f64], bins: usize) -> Vec<f64> {
    let mut finite = values.iter().copied().filter(|v| v.is_finite());
    let Some(first) = finite.next() else {
        return Vec::new();
    };
    let (mut lo, mut hi) = finite.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let k = bins as f64;
    let width = (hi - lo) / k;
    let mut edges: Vec<f64> = (0..bins)
        .map(|i| {
            if width.is_finite() {
                lo + width * i as f64
            } else {
                // The span itself overflows; interpolate without forming it.
                let t = i as f64 / k;
                lo * (1.0 - t) + hi * t
            }
        })
        .collect();
    edges.push(hi);
    edges
}

/// Finds the bin of `v`, or `None` if it lies outside the edges.
fn bin_index(v: f64, edges: &[f64]) -> Option<usize> {
    let k = edges.len().checked_sub(1).filter(|&k| k > 0)?;
    let (lo, hi) = (edges[0], edges[k]);
    if !(lo..=hi).contains(&v) {
        return None;
    }
    if v == hi {
        return Some(k - 1);
    }

    let fraction = if (hi - lo).is_finite() {
        (v - lo) / (hi - lo)
    } else {
        let s = lo.abs().max(hi.abs());
        (v / s - lo / s) / (hi / s - lo / s)
    };
    let mut idx = ((fraction * k as f64).floor() as usize).min(k - 1);
    // Snap to the edges actually reported.
    while idx > 0 && v < edges[idx] {
        idx -= 1;
    }
    while idx + 1 < k && v >= edges[idx + 1] {
        idx += 1;
    }
    Some(idx)
}

/// Counts values per bin. Returns `(counts, out_of_range)`.
fn bin_counts(values: &[f64], edges: &[f64], bins: usize) -> (Vec<usize>, usize) {
    let mut counts = vec![0usize; bins];
    let mut outside = 0usize;
    for &v in values {
        match bin_index(v, edges) {
            Some(i) => counts[i] += 1,
            None => outside += 1,
        }
    }
    (counts, outside)
}

/// Labels `"[a, b)"` for each bin, with the last bin closed: `"[a, b]"`.
pub fn bin_labels(edges: &[f64]) -> Vec<String> {
    let k = edges.len().saturating_sub(1);
    edges
        .windows(2)
        .enumerate()
        .map(|(i, w)| {
            let close = if i + 1 == k { ']' } else { ')' };
            format!("[{:.2}, {:.2}{close}", w[0], w[1])
        })
        .collect()
}

/// Builds the flowrate histogram and the temperature companion.
///
/// # Errors
///
/// [`InsightError::InvalidConfig`] if `config.bins` is zero.
pub fn histogram(
    flow: &[f64],
    temp: &[f64],
    config: &HistogramConfig,
) -> Result<Histogram, InsightError> {
    let bins = config.bins;
    if bins == 0 {
        return Err(InsightError::InvalidConfig(
            "histogram bins must be at least 1".into(),
        ));
    }

    let bin_edges = equal_width_edges(flow, bins);
    let (flow_counts, _) = bin_counts(flow, &bin_edges, bins);

    let (temp_counts, temp_out_of_range, temp_bin_edges) = if config.shared_axis {
        let (counts, outside) = bin_counts(temp, &bin_edges, bins);
        (counts, outside, None)
    } else {
        let edges = equal_width_edges(temp, bins);
        let (counts, _) = bin_counts(temp, &edges, bins);
        (counts, 0, Some(edges))
    };

    Ok(Histogram {
        labels: bin_labels(&bin_edges),
        temp_labels: temp_bin_edges.as_deref().map(bin_labels),
        bin_edges,
        flow_counts,
        temp_counts,
        temp_bin_edges,
        temp_out_of_range,
    })
}

// ── Outliers ─────────────────────────────────────────────────────────

/// Tukey fence `[q1 − 1.5·IQR, q3 + 1.5·IQR]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutlierFence {
    pub lower: f64,
    pub upper: f64,
}

impl OutlierFence {
    /// Builds the fence from the quartiles of `stats`, or `None` if empty.
    pub fn from_stats(stats: &DescriptiveStats) -> Option<Self> {
        let (q1, q3) = (stats.q1?, stats.q3?);
        let iqr = q3 - q1;
        Some(Self {
            lower: q1 - IQR_MULTIPLIER * iqr,
            upper: q3 + IQR_MULTIPLIER * iqr,
        })
    }

    /// `true` if `v` lies strictly outside the fence.
    pub fn is_outlier(&self, v: f64) -> bool {
        v < self.lower || v > self.upper
    }
}

/// Outliers of one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierReport {
    pub fence: Option<OutlierFence>,
    /// Positions of outliers in the input column.
    pub indices: Vec<usize>,
    /// Outlier values, in input order.
    pub values: Vec<f64>,
    pub count: usize,
    /// Percentage of outliers among present values.
    pub pct: f64,
}

/// Detects IQR outliers in a column with absent positions preserved.
///
/// ```
/// use equip_insight::distribution::detect_outliers;
///
/// let col = [Some(1.0), Some(2.0), None, Some(3.0), Some(2.5), Some(100.0), Some(2.0)];
/// let report = detect_outliers(&col);
/// assert_eq!(report.indices, vec![5]);
/// assert_eq!(report.values, vec![100.0]);
/// ```
pub fn detect_outliers(column: &[Option<f64>]) -> OutlierReport {
    let present: Vec<f64> = column.iter().flatten().copied().collect();
    let stats = describe(&present);
    detect_with_stats(column, &stats)
}

fn detect_with_stats(column: &[Option<f64>], stats: &DescriptiveStats) -> OutlierReport {
    let fence = OutlierFence::from_stats(stats);
    let (indices, values): (Vec<usize>, Vec<f64>) = match fence {
        Some(f) => column
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.filter(|&v| f.is_outlier(v)).map(|v| (i, v)))
            .unzip(),
        None => (Vec::new(), Vec::new()),
    };
    let count = indices.len();
    let pct = if stats.count > 0 {
        (count as f64 / stats.count as f64) * 100.0
    } else {
        0.0
    };
    OutlierReport {
        fence,
        indices,
        values,
        count,
        pct,
    }
}

// ── Boxplots ─────────────────────────────────────────────────────────

/// Five-number summary of one column plus its outliers.
///
/// Outliers are listed separately and still included in the summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxplotSummary {
    pub label: String,
    pub count: usize,
    /// `[min, q1, median, q3, max]`, `None` for an empty column.
    pub five_number: Option<[f64; 5]>,
    pub fence: Option<OutlierFence>,
    pub outliers: Vec<f64>,
}

/// Builds a boxplot for one column.
pub fn boxplot(label: &str, column: &[Option<f64>]) -> BoxplotSummary {
    let present: Vec<f64> = column.iter().flatten().copied().collect();
    let stats = describe(&present);
    let report = detect_with_stats(column, &stats);
    BoxplotSummary {
        label: label.to_string(),
        count: stats.count,
        five_number: stats.five_number(),
        fence: report.fence,
        outliers: report.values,
    }
}

/// One boxplot per metric, labelled `Flowrate`, `Pressure`, `Temperature`.
pub fn metric_boxplots(table: &EquipmentTable<'_>) -> Vec<BoxplotSummary> {
    Metric::ALL
        .iter()
        .map(|&m| boxplot(m.label(), &table.column(m)))
        .collect()
}

/// One boxplot per category × metric.
pub fn category_boxplots(groups: &CategoryGroups<'_>) -> BTreeMap<String, PerMetric<BoxplotSummary>> {
    groups
        .iter()
        .map(|(category, records)| {
            let per_metric = PerMetric::from_fn(|m| {
                let column: Vec<Option<f64>> = records.iter().map(|r| r.metric(m)).collect();
                boxplot(m.label(), &column)
            });
            (category.clone(), per_metric)
        })
        .collect()
}

// ── Distribution analysis ────────────────────────────────────────────

/// Which way a distribution leans, judged from its quartile spreads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkewDirection {
    /// Upper spread `q3 − median` exceeds lower spread `median − q1`.
    RightSkewed,
    LeftSkewed,
    Symmetric,
}

impl SkewDirection {
    /// Classifies from quartiles. Spreads equal within a relative
    /// tolerance count as symmetric.
    pub fn from_quartiles(q1: f64, median: f64, q3: f64) -> Self {
        let upper = q3 - median;
        let lower = median - q1;
        let scale = q1.abs().max(q3.abs()).max(1.0);
        if (upper - lower).abs() <= 1e-12 * scale {
            Self::Symmetric
        } else if upper > lower {
            Self::RightSkewed
        } else {
            Self::LeftSkewed
        }
    }
}

/// Shape summary of one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionAnalysis {
    pub count: usize,
    pub median: Option<f64>,
    pub iqr: Option<f64>,
    pub range: Option<f64>,
    pub skew: Option<SkewDirection>,
    pub outliers: OutlierReport,
}

/// Analyzes the shape of one column.
pub fn distribution_analysis(column: &[Option<f64>]) -> DistributionAnalysis {
    let present: Vec<f64> = column.iter().flatten().copied().collect();
    let stats = describe(&present);
    let skew = match (stats.q1, stats.median, stats.q3) {
        (Some(q1), Some(median), Some(q3)) => Some(SkewDirection::from_quartiles(q1, median, q3)),
        _ => None,
    };
    DistributionAnalysis {
        count: stats.count,
        median: stats.median,
        iqr: stats.iqr(),
        range: stats.range(),
        skew,
        outliers: detect_with_stats(column, &stats),
    }
}

/// Distribution analysis for every metric.
pub fn analyze_distributions(table: &EquipmentTable<'_>) -> PerMetric<DistributionAnalysis> {
    PerMetric::from_fn(|m| distribution_analysis(&table.column(m)))
}

// ── Tests ────────────────────────────────────────────────────────────
