//! Egress sanitization into JSON-safe values.
//!
//! The typed summary is serialized into a [`serde_json::Value`] tree and
//! walked once. Every float passes through [`sanitize_float`]:
//!
//! - `NaN` and `±∞` become `null`
//! - values are rounded to the policy's decimal places (2 by default)
//! - `-0.0` becomes `0.0`
//!
//! Integers, strings, booleans and nulls pass through unchanged. Applying
//! the sanitizer to its own output changes nothing.
//!
//! # Example
//!
//! ```
//! use equip_insight::sanitize::{sanitize_value, SanitizePolicy};
//! use serde_json::json;
//!
//! let v = sanitize_value(json!({"mean": 3.14159, "count": 7, "neg": -0.001}), &SanitizePolicy::default());
//! assert_eq!(v, json!({"mean": 3.14, "count": 7, "neg": 0.0}));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::error::InsightError;

/// How floats are rendered at egress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizePolicy {
    /// Decimal places to round to; `None` keeps full precision. Default: 2.
    pub round_decimals: Option<u32>,
}

impl Default for SanitizePolicy {
    fn default() -> Self {
        Self {
            round_decimals: Some(2),
        }
    }
}

impl SanitizePolicy {
    /// Keeps full precision.
    pub fn exact() -> Self {
        Self {
            round_decimals: None,
        }
    }

    pub fn round_decimals(mut self, decimals: Option<u32>) -> Self {
        self.round_decimals = decimals;
        self
    }
}

/// Largest supported rounding precision; `10^15` is still exact in f64.
pub const MAX_DECIMALS: u32 = 15;

/// The leaf rule: canonical finite float or `None`.
///
/// ```
/// use equip_insight::sanitize::{sanitize_float, SanitizePolicy};
///
/// let p = SanitizePolicy::default();
/// assert_eq!(sanitize_float(f64::NAN, &p), None);
/// assert_eq!(sanitize_float(1.005e2, &p), Some(100.5));
/// assert_eq!(sanitize_float(2.675, &SanitizePolicy::exact()), Some(2.675));
/// ```
pub fn sanitize_float(v: f64, policy: &SanitizePolicy) -> Option<f64> {
    if !v.is_finite() {
        return None;
    }
    let rounded = match policy.round_decimals {
        Some(d) => {
            let factor = 10f64.powi(d.min(MAX_DECIMALS) as i32);
            let scaled = v * factor;
            // Values too large to scale are already coarser than the precision.
            if scaled.is_finite() {
                scaled.round() / factor
            } else {
                v
            }
        }
        None => v,
    };
    // Folds -0.0 into 0.0.
    Some(rounded + 0.0)
}

fn sanitize_number(n: Number, policy: &SanitizePolicy) -> Value {
    if n.is_i64() || n.is_u64() {
        return Value::Number(n);
    }
    n.as_f64()
        .and_then(|v| sanitize_float(v, policy))
        .and_then(Number::from_f64)
        .map_or(Value::Null, Value::Number)
}

/// Recursively sanitizes a JSON value.
pub fn sanitize_value(value: Value, policy: &SanitizePolicy) -> Value {
    match value {
        Value::Number(n) => sanitize_number(n, policy),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|v| sanitize_value(v, policy))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, sanitize_value(v, policy)))
                .collect(),
        ),
        other => other,
    }
}

/// Serializes `value` and sanitizes the resulting tree.
pub fn sanitize<T: Serialize>(value: &T, policy: &SanitizePolicy) -> Result<Value, InsightError> {
    let raw = serde_json::to_value(value)
        .map_err(|e| InsightError::Serialization(e.to_string()))?;
    Ok(sanitize_value(raw, policy))
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn non_finite_becomes_none() {
        let p = SanitizePolicy::default();
        assert_eq!(sanitize_float(f64::NAN, &p), None);
        assert_eq!(sanitize_float(f64::INFINITY, &p), None);
        assert_eq!(sanitize_float(f64::NEG_INFINITY, &p), None);
    }

    #[test]
    fn rounds_to_two_decimals_by_default() {
        let p = SanitizePolicy::default();
        assert_eq!(sanitize_float(1.23456, &p), Some(1.23));
        assert_eq!(sanitize_float(-7.899, &p), Some(-7.9));
        assert_eq!(sanitize_float(42.0, &p), Some(42.0));
    }

    #[test]
    fn negative_zero_is_canonical() {
        let p = SanitizePolicy::default();
        let v = sanitize_float(-0.0001, &p).unwrap();
        assert_eq!(v, 0.0);
        assert!(v.is_sign_positive());
        assert!(sanitize_float(-0.0, &SanitizePolicy::exact()).unwrap().is_sign_positive());
    }

    #[test]
    fn huge_values_survive_rounding() {
        let p = SanitizePolicy::default();
        assert_eq!(sanitize_float(1e307, &p), Some(1e307));
        assert_eq!(sanitize_float(f64::MAX, &p), Some(f64::MAX));
    }

    #[test]
    fn integers_and_strings_pass_through() {
        let v = sanitize_value(
            json!({"n": 12, "u": u64::MAX, "s": "Pump", "b": true, "z": null}),
            &SanitizePolicy::default(),
        );
        assert_eq!(v, json!({"n": 12, "u": u64::MAX, "s": "Pump", "b": true, "z": null}));
    }

    #[test]
    fn nested_structures_are_walked() {
        let v = sanitize_value(
            json!({"a": [1.111, {"b": 2.222}], "c": {"d": [3.333]}}),
            &SanitizePolicy::default(),
        );
        assert_eq!(v, json!({"a": [1.11, {"b": 2.22}], "c": {"d": [3.33]}}));
    }

    #[test]
    fn serialized_nan_becomes_null() {
        #[derive(Serialize)]
        struct S {
            x: f64,
            y: Option<f64>,
        }
        let v = sanitize(&S { x: f64::NAN, y: Some(0.125) }, &SanitizePolicy::exact()).unwrap();
        assert_eq!(v, json!({"x": null, "y": 0.125}));
    }

    #[test]
    fn sanitizing_twice_is_identity() {
        let p = SanitizePolicy::default();
        let once = sanitize_value(json!([0.1 + 0.2, -0.0, 1e-9, 2.675, 123.456]), &p);
        let twice = sanitize_value(once.clone(), &p);
        assert_eq!(once, twice);
    }
}
