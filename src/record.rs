//! Record normalization: raw heterogeneous rows into typed equipment records.
//!
//! The normalizer tolerates dirty data. Numeric fields that are missing or
//! cannot be parsed become absent (`None`) and are reported as
//! [`CoercionWarning`]s; a single malformed row never aborts the batch.
//! Only an empty batch is an error.
//!
//! [`validate_payload`] is the strict counterpart used at the JSON boundary:
//! it rejects a batch whose rows are not objects or lack a required field.
//!
//! # Example
//!
//! ```
//! use equip_insight::record::{normalize, RawRow};
//!
//! let rows: Vec<RawRow> = serde_json::from_str(r#"[
//!     {"Equipment Name": "P-101", "Type": "Pump", "Flowrate": 120.5, "Pressure": "5.2", "Temperature": "n/a"}
//! ]"#).unwrap();
//! let batch = normalize(&rows).unwrap();
//!
//! let rec = &batch.records[0];
//! assert_eq!(rec.name, "P-101");
//! assert_eq!(rec.category.as_deref(), Some("Pump"));
//! assert_eq!(rec.flowrate, Some(120.5));
//! assert_eq!(rec.pressure, Some(5.2));
//! assert_eq!(rec.temperature, None);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::InsightError;

/// One raw input row: an arbitrary JSON object.
pub type RawRow = Map<String, Value>;

/// Label rendered for records whose category is missing or blank.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Strings treated as "no value" in numeric fields.
pub(crate) const NULL_MARKERS: &[&str] = &[
    "", "NA", "N/A", "na", "n/a", "null", "NULL", "Null", "None", "none", ".", "-", "NaN",
    "nan", "NAN", "#N/A", "#NA",
];

// ── Metric ────────────────────────────────────────────────────────────

/// The three numeric measurements carried by every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Flowrate,
    Pressure,
    Temperature,
}

impl Metric {
    /// All metrics in canonical order.
    pub const ALL: [Metric; 3] = [Metric::Flowrate, Metric::Pressure, Metric::Temperature];

    /// Lower-case key used in JSON output (`"flowrate"`).
    pub fn key(self) -> &'static str {
        match self {
            Self::Flowrate => "flowrate",
            Self::Pressure => "pressure",
            Self::Temperature => "temperature",
        }
    }

    /// Display label used by charts and tables (`"Flowrate"`).
    pub fn label(self) -> &'static str {
        match self {
            Self::Flowrate => "Flowrate",
            Self::Pressure => "Pressure",
            Self::Temperature => "Temperature",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One value per metric.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PerMetric<T> {
    pub flowrate: T,
    pub pressure: T,
    pub temperature: T,
}

impl<T> PerMetric<T> {
    /// Builds a value for each metric from `f`.
    pub fn from_fn(mut f: impl FnMut(Metric) -> T) -> Self {
        Self {
            flowrate: f(Metric::Flowrate),
            pressure: f(Metric::Pressure),
            temperature: f(Metric::Temperature),
        }
    }

    pub fn get(&self, metric: Metric) -> &T {
        match metric {
            Metric::Flowrate => &self.flowrate,
            Metric::Pressure => &self.pressure,
            Metric::Temperature => &self.temperature,
        }
    }
}

// ── EquipmentRecord ───────────────────────────────────────────────────

/// A normalized equipment measurement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquipmentRecord {
    pub name: String,
    /// `None` when the source row had no usable category.
    #[serde(serialize_with = "serialize_category")]
    pub category: Option<String>,
    pub flowrate: Option<f64>,
    pub pressure: Option<f64>,
    pub temperature: Option<f64>,
}

impl EquipmentRecord {
    /// Returns the value of `metric`, or `None` if absent.
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Flowrate => self.flowrate,
            Metric::Pressure => self.pressure,
            Metric::Temperature => self.temperature,
        }
    }

    /// `true` if the category was missing in the source row.
    pub fn is_uncategorized(&self) -> bool {
        self.category.is_none()
    }

    /// The category, or [`UNCATEGORIZED`] when it was missing.
    pub fn category_label(&self) -> &str {
        self.category.as_deref().unwrap_or(UNCATEGORIZED)
    }
}

fn serialize_category<S: Serializer>(category: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(category.as_deref().unwrap_or(UNCATEGORIZED))
}

// ── Coercion warnings ─────────────────────────────────────────────────

/// Why a numeric field became absent.
#[derive(Debug, Clone, PartialEq)]
pub enum CoercionKind {
    /// The row has no key for the field.
    Missing,
    /// The value exists but is not a finite number.
    Unparseable { raw: String },
}

/// Non-fatal notice that a row's numeric field was coerced to absent.
#[derive(Debug, Clone, PartialEq)]
pub struct CoercionWarning {
    /// Zero-based row index in the input batch.
    pub row: usize,
    pub field: Metric,
    pub kind: CoercionKind,
}

impl fmt::Display for CoercionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            CoercionKind::Missing => write!(f, "row {}: {} missing", self.row, self.field),
            CoercionKind::Unparseable { raw } => {
                write!(f, "row {}: {} value '{raw}' is not numeric", self.row, self.field)
            }
        }
    }
}

// ── Field resolution ──────────────────────────────────────────────────

/// Logical input fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Category,
    Numeric(Metric),
}

impl Field {
    const ALL: [Field; 5] = [
        Field::Name,
        Field::Category,
        Field::Numeric(Metric::Flowrate),
        Field::Numeric(Metric::Pressure),
        Field::Numeric(Metric::Temperature),
    ];

    /// Label reported when the field is missing from a payload row.
    fn source_label(self) -> &'static str {
        match self {
            Self::Name => "Equipment Name",
            Self::Category => "Type",
            Self::Numeric(m) => m.label(),
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        let folded: String = key
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();
        match folded.as_str() {
            "name" | "equipmentname" | "equipment" => Some(Self::Name),
            "type" | "category" | "equipmenttype" => Some(Self::Category),
            "flowrate" | "flow" => Some(Self::Numeric(Metric::Flowrate)),
            "pressure" => Some(Self::Numeric(Metric::Pressure)),
            "temperature" | "temp" => Some(Self::Numeric(Metric::Temperature)),
            _ => None,
        }
    }
}

/// Finds the value for `field`, accepting any label variant.
///
/// The first matching key in the row wins.
fn lookup(row: &RawRow, field: Field) -> Option<&Value> {
    row.iter()
        .find(|(k, _)| Field::from_key(k) == Some(field))
        .map(|(_, v)| v)
}

// ── Coercion ──────────────────────────────────────────────────────────

enum Coerced {
    Value(f64),
    Null,
    Invalid,
}

fn is_null_marker(s: &str) -> bool {
    NULL_MARKERS.contains(&s)
}

fn coerce_number(value: &Value) -> Coerced {
    match value {
        Value::Null => Coerced::Null,
        Value::Number(n) => match n.as_f64() {
            Some(v) if v.is_finite() => Coerced::Value(v),
            _ => Coerced::Invalid,
        },
        Value::String(s) => {
            let trimmed = s.trim();
            if is_null_marker(trimmed) {
                return Coerced::Null;
            }
            match trimmed.parse::<f64>() {
                Ok(v) if v.is_finite() => Coerced::Value(v),
                _ => Coerced::Invalid,
            }
        }
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => Coerced::Invalid,
    }
}

fn coerce_text(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

fn raw_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ── Normalization ─────────────────────────────────────────────────────

/// Output of [`normalize`]: the typed records plus non-fatal warnings.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedBatch {
    pub records: Vec<EquipmentRecord>,
    pub warnings: Vec<CoercionWarning>,
}

/// Normalizes a single row. Warnings are appended to `warnings`.
pub fn normalize_row(
    row_idx: usize,
    row: &RawRow,
    warnings: &mut Vec<CoercionWarning>,
) -> EquipmentRecord {
    let mut numeric = |metric: Metric| -> Option<f64> {
        let kind = match lookup(row, Field::Numeric(metric)) {
            None => CoercionKind::Missing,
            Some(value) => match coerce_number(value) {
                Coerced::Value(v) => return Some(v),
                Coerced::Null => return None,
                Coerced::Invalid => CoercionKind::Unparseable {
                    raw: raw_text(value),
                },
            },
        };
        let warning = CoercionWarning {
            row: row_idx,
            field: metric,
            kind,
        };
        debug!(%warning, "numeric field coerced to absent");
        warnings.push(warning);
        None
    };

    let flowrate = numeric(Metric::Flowrate);
    let pressure = numeric(Metric::Pressure);
    let temperature = numeric(Metric::Temperature);

    EquipmentRecord {
        name: coerce_text(lookup(row, Field::Name)).unwrap_or_default(),
        category: coerce_text(lookup(row, Field::Category)),
        flowrate,
        pressure,
        temperature,
    }
}

/// Normalizes a batch of raw rows.
///
/// Fails only with [`InsightError::EmptyInput`] when `rows` is empty.
pub fn normalize(rows: &[RawRow]) -> Result<NormalizedBatch, InsightError> {
    if rows.is_empty() {
        return Err(InsightError::EmptyInput);
    }

    let mut warnings = Vec::new();
    let records: Vec<EquipmentRecord> = rows
        .iter()
        .enumerate()
        .map(|(idx, row)| normalize_row(idx, row, &mut warnings))
        .collect();

    if !warnings.is_empty() {
        warn!(
            rows = records.len(),
            warnings = warnings.len(),
            "numeric fields coerced to absent during normalization"
        );
    }

    Ok(NormalizedBatch { records, warnings })
}

// ── Payload validation ────────────────────────────────────────────────

/// Validates a raw JSON payload and returns its rows.
///
/// The payload must be a non-empty array of objects, each providing all
/// five logical fields (name, type, flowrate, pressure, temperature) under
/// any accepted label. Field *values* are not checked here; unparseable
/// numbers are the normalizer's concern.
///
/// ```
/// use equip_insight::error::InsightError;
/// use equip_insight::record::validate_payload;
///
/// let ok = serde_json::json!([{"name": "V-1", "type": "Valve", "flowrate": 1, "pressure": 2, "temperature": 3}]);
/// assert_eq!(validate_payload(ok).unwrap().len(), 1);
///
/// let bad = serde_json::json!([{"name": "V-1"}]);
/// assert!(matches!(validate_payload(bad), Err(InsightError::MissingFields { row: 0, .. })));
/// ```
pub fn validate_payload(payload: Value) -> Result<Vec<RawRow>, InsightError> {
    let Value::Array(items) = payload else {
        return Err(InsightError::NotAnArray);
    };
    if items.is_empty() {
        return Err(InsightError::EmptyInput);
    }

    items
        .into_iter()
        .enumerate()
        .map(|(row, item)| {
            let Value::Object(obj) = item else {
                return Err(InsightError::RowNotObject { row });
            };
            let missing: Vec<String> = Field::ALL
                .iter()
                .filter(|&&field| lookup(&obj, field).is_none())
                .map(|field| field.source_label().to_string())
                .collect();
            if missing.is_empty() {
                Ok(obj)
            } else {
                Err(InsightError::MissingFields { row, missing })
            }
        })
        .collect()
}

// ── EquipmentTable ────────────────────────────────────────────────────

/// Read-only view over normalized records with column accessors.
#[derive(Debug, Clone, Copy)]
pub struct EquipmentTable<'a> {
    records: &'a [EquipmentRecord],
}

impl<'a> EquipmentTable<'a> {
    pub fn new(records: &'a [EquipmentRecord]) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &'a [EquipmentRecord] {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The metric column with absent positions preserved.
    pub fn column(&self, metric: Metric) -> Vec<Option<f64>> {
        self.records.iter().map(|r| r.metric(metric)).collect()
    }

    /// The non-absent values of `metric` in record order.
    pub fn values(&self, metric: Metric) -> Vec<f64> {
        self.records.iter().filter_map(|r| r.metric(metric)).collect()
    }

    /// Number of non-absent values of `metric`.
    pub fn valid_count(&self, metric: Metric) -> usize {
        self.records
            .iter()
            .filter(|r| r.metric(metric).is_some())
            .count()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────
