//! End-to-end analysis: raw rows in, one sanitized summary out.
//!
//! [`analyze`] normalizes the batch once and runs every analytic stage over
//! the same immutable table. The stages never see each other's output.
//! [`EquipmentSummary::to_json`] is the single egress point where the
//! sanitizer runs.
//!
//! # Example
//!
//! ```
//! use equip_insight::summary::{analyze_json, SummaryConfig};
//!
//! let payload = r#"[
//!     {"Equipment Name": "P-1", "Type": "Pump",  "Flowrate": 10, "Pressure": 2, "Temperature": 50},
//!     {"Equipment Name": "P-2", "Type": "Pump",  "Flowrate": 20, "Pressure": 4, "Temperature": 60},
//!     {"Equipment Name": "V-1", "Type": "Valve", "Flowrate": 30, "Pressure": 6, "Temperature": 70}
//! ]"#;
//! let json = analyze_json(payload, &SummaryConfig::default()).unwrap();
//! let summary: serde_json::Value = serde_json::from_str(&json).unwrap();
//!
//! assert_eq!(summary["total_count"], 3);
//! assert_eq!(summary["avg_flowrate"], 20.0);
//! assert_eq!(summary["type_distribution"]["Pump"], 2);
//! assert_eq!(summary["ranking"][0]["name"], "V-1");
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::correlation::{correlation_matrix, CorrelationMatrix};
use crate::csv_parser::CsvReader;
use crate::distribution::{
    analyze_distributions, category_boxplots, histogram, metric_boxplots, BoxplotSummary,
    DistributionAnalysis, Histogram, HistogramConfig,
};
use crate::error::InsightError;
use crate::grouped::{
    conditional_analytics, describe_groups, partition_by_category, CategoryPolicy, Condition,
    ConditionalAnalytics, GroupedAnalytics,
};
use crate::profiling::{categories_in_order, category_distribution, profile_coverage, CoverageProfile};
use crate::ranking::{rank_categories, rank_records, CategoryRankingEntry, RankingEntry};
use crate::record::{
    normalize, validate_payload, CoercionWarning, EquipmentRecord, EquipmentTable, Metric,
    PerMetric, RawRow,
};
use crate::sampling::{scatter_sample, ScatterPoint};
use crate::sanitize::{sanitize, SanitizePolicy, MAX_DECIMALS};
use crate::stats::{describe, DescriptiveStats};

// ── Configuration ────────────────────────────────────────────────────

/// Configuration for [`analyze`].
///
/// Deserializes from JSON with every field optional:
///
/// ```
/// use equip_insight::summary::SummaryConfig;
///
/// let config: SummaryConfig = serde_json::from_str(r#"{"bins": 10, "seed": 7}"#).unwrap();
/// assert_eq!(config.bins, 10);
/// assert_eq!(config.sample_size, 200);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// Histogram bin count. Default: 5.
    pub bins: usize,
    /// Bin temperature on the flowrate axis. Default: false.
    pub shared_axis: bool,
    /// Maximum scatter points. Default: 200.
    pub sample_size: usize,
    /// Scatter sampling seed. Default: 42.
    pub seed: u64,
    /// Normalized records echoed in the preview. Default: 20.
    pub preview_rows: usize,
    /// Egress rounding; `None` keeps full precision. Default: 2.
    pub round_decimals: Option<u32>,
    /// Egress rounding of correlation coefficients. Default: 4.
    pub correlation_decimals: Option<u32>,
    /// Treatment of uncategorized records in grouped views. Default: keep.
    pub category_policy: CategoryPolicy,
    /// Conditional subset. Default: pressure above mean.
    pub condition: Condition,
    /// Metric ranked on. Default: flowrate.
    pub ranking_metric: Metric,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            bins: 5,
            shared_axis: false,
            sample_size: 200,
            seed: 42,
            preview_rows: 20,
            round_decimals: Some(2),
            correlation_decimals: Some(4),
            category_policy: CategoryPolicy::Keep,
            condition: Condition::default(),
            ranking_metric: Metric::Flowrate,
        }
    }
}

impl SummaryConfig {
    pub fn bins(mut self, bins: usize) -> Self {
        self.bins = bins;
        self
    }

    pub fn shared_axis(mut self, shared: bool) -> Self {
        self.shared_axis = shared;
        self
    }

    pub fn sample_size(mut self, n: usize) -> Self {
        self.sample_size = n;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn preview_rows(mut self, n: usize) -> Self {
        self.preview_rows = n;
        self
    }

    pub fn round_decimals(mut self, decimals: Option<u32>) -> Self {
        self.round_decimals = decimals;
        self
    }

    pub fn correlation_decimals(mut self, decimals: Option<u32>) -> Self {
        self.correlation_decimals = decimals;
        self
    }

    pub fn category_policy(mut self, policy: CategoryPolicy) -> Self {
        self.category_policy = policy;
        self
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }

    pub fn ranking_metric(mut self, metric: Metric) -> Self {
        self.ranking_metric = metric;
        self
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), InsightError> {
        if self.bins == 0 {
            return Err(InsightError::InvalidConfig(
                "histogram bins must be at least 1".into(),
            ));
        }
        for (field, decimals) in [
            ("round_decimals", self.round_decimals),
            ("correlation_decimals", self.correlation_decimals),
        ] {
            if let Some(d) = decimals.filter(|&d| d > MAX_DECIMALS) {
                return Err(InsightError::InvalidConfig(format!(
                    "{field} must be at most {MAX_DECIMALS}, got {d}"
                )));
            }
        }
        Ok(())
    }

    pub fn histogram_config(&self) -> HistogramConfig {
        HistogramConfig::default()
            .bins(self.bins)
            .shared_axis(self.shared_axis)
    }

    pub fn sanitize_policy(&self) -> SanitizePolicy {
        SanitizePolicy::default().round_decimals(self.round_decimals)
    }

    pub fn correlation_policy(&self) -> SanitizePolicy {
        SanitizePolicy::default().round_decimals(self.correlation_decimals)
    }
}

// ── Summary ──────────────────────────────────────────────────────────

/// The complete analytical summary of one batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquipmentSummary {
    pub total_count: usize,
    pub avg_flowrate: Option<f64>,
    pub avg_pressure: Option<f64>,
    pub avg_temperature: Option<f64>,
    /// Record count per category.
    pub type_distribution: BTreeMap<String, usize>,
    pub coverage: CoverageProfile,
    pub scatter_points: Vec<ScatterPoint>,
    pub histogram: Histogram,
    pub boxplot: Vec<BoxplotSummary>,
    pub category_boxplot: BTreeMap<String, PerMetric<BoxplotSummary>>,
    pub distribution: PerMetric<DistributionAnalysis>,
    pub statistical_summary: PerMetric<DescriptiveStats>,
    pub correlation: CorrelationMatrix,
    pub grouped_analytics: GroupedAnalytics,
    pub conditional_analysis: ConditionalAnalytics,
    pub ranking: Vec<RankingEntry>,
    pub category_ranking: Vec<CategoryRankingEntry>,
    /// First normalized records.
    pub preview: Vec<EquipmentRecord>,
    pub warning_count: usize,
    #[serde(skip)]
    pub warnings: Vec<CoercionWarning>,
    #[serde(skip)]
    policy: SanitizePolicy,
    #[serde(skip)]
    correlation_policy: SanitizePolicy,
}

impl EquipmentSummary {
    /// Sanitized JSON view of the summary.
    ///
    /// Correlation coefficients are rounded with their own precision.
    pub fn to_json(&self) -> Result<Value, InsightError> {
        let mut value = sanitize(self, &self.policy)?;
        if let Value::Object(fields) = &mut value {
            let correlation = sanitize(&self.correlation, &self.correlation_policy)?;
            fields.insert("correlation".to_string(), correlation);
        }
        Ok(value)
    }

    /// Sanitized JSON text of the summary.
    pub fn to_json_string(&self) -> Result<String, InsightError> {
        let value = self.to_json()?;
        serde_json::to_string(&value).map_err(|e| InsightError::Serialization(e.to_string()))
    }
}

/// Analyzes a batch of raw rows.
///
/// Row-level coercion problems are collected as warnings; only an empty
/// batch or an invalid configuration fails.
pub fn analyze(rows: &[RawRow], config: &SummaryConfig) -> Result<EquipmentSummary, InsightError> {
    config.validate()?;
    let batch = normalize(rows)?;
    let table = EquipmentTable::new(&batch.records);
    debug!(
        rows = table.len(),
        warnings = batch.warnings.len(),
        "batch normalized"
    );

    let statistical_summary = PerMetric::from_fn(|m| describe(&table.values(m)));
    let histogram = histogram(
        &table.values(Metric::Flowrate),
        &table.values(Metric::Temperature),
        &config.histogram_config(),
    )?;
    let groups = partition_by_category(&table, config.category_policy);
    let category_order: Vec<&str> = categories_in_order(&table)
        .into_iter()
        .filter(|c| groups.contains_key(*c))
        .collect();

    let summary = EquipmentSummary {
        total_count: table.len(),
        avg_flowrate: statistical_summary.flowrate.mean,
        avg_pressure: statistical_summary.pressure.mean,
        avg_temperature: statistical_summary.temperature.mean,
        type_distribution: category_distribution(&table),
        coverage: profile_coverage(&table),
        scatter_points: scatter_sample(&table, config.sample_size, config.seed),
        histogram,
        boxplot: metric_boxplots(&table),
        category_boxplot: category_boxplots(&groups),
        distribution: analyze_distributions(&table),
        statistical_summary,
        correlation: correlation_matrix(&table),
        grouped_analytics: describe_groups(&groups),
        conditional_analysis: conditional_analytics(&table, &config.condition),
        ranking: rank_records(&table, config.ranking_metric),
        category_ranking: rank_categories(&groups, &category_order, config.ranking_metric),
        preview: batch.records.iter().take(config.preview_rows).cloned().collect(),
        warning_count: batch.warnings.len(),
        warnings: batch.warnings.clone(),
        policy: config.sanitize_policy(),
        correlation_policy: config.correlation_policy(),
    };

    info!(
        records = summary.total_count,
        categories = summary.type_distribution.len(),
        warnings = summary.warning_count,
        "equipment summary computed"
    );
    Ok(summary)
}

/// Validates a JSON payload strictly, analyzes it and returns sanitized JSON text.
///
/// # Errors
///
/// [`InsightError::InvalidJson`] for malformed JSON; the payload validation
/// errors of [`validate_payload`]; [`InsightError::InvalidConfig`].
pub fn analyze_json(payload: &str, config: &SummaryConfig) -> Result<String, InsightError> {
    let value: Value = serde_json::from_str(payload)?;
    let rows = validate_payload(value)?;
    analyze(&rows, config)?.to_json_string()
}

/// Parses CSV text, validates it like a JSON payload, analyzes it and
/// returns sanitized JSON text.
pub fn analyze_csv(csv: &str, config: &SummaryConfig) -> Result<String, InsightError> {
    let rows = CsvReader::new().read_str(csv)?;
    let rows = validate_payload(Value::Array(rows.into_iter().map(Value::Object).collect()))?;
    analyze(&rows, config)?.to_json_string()
}

// ── Tests ────────────────────────────────────────────────────────────
