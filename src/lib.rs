//! # equip-insight
//!
//! Deterministic statistical summary engine for equipment measurement
//! batches, with C FFI bindings.
//!
//! equip-insight turns a batch of heterogeneous equipment rows (name,
//! type, flowrate, pressure, temperature) into one JSON-safe analytical
//! summary. The engine is pure: the same rows and configuration always
//! produce byte-identical output.
//!
//! - **Normalization** tolerates dirty data; unparseable numbers become
//!   absent and are reported as warnings
//! - **Analysis** runs independent stages over the normalized table
//! - **Sanitization** happens once, at egress
//!
//! ## Modules
//!
//! - [`record`] — Record normalization, label folding, payload validation
//! - [`csv_parser`] — RFC 4180 CSV reader producing raw rows
//! - [`stats`] — Descriptive statistics (compensated mean, Welford std, R-7 quantiles)
//! - [`profiling`] — Metric coverage and category distribution
//! - [`distribution`] — Histogram, IQR outliers, boxplots, skew direction
//! - [`correlation`] — Pairwise Pearson correlation matrix with strength labels
//! - [`grouped`] — Category-grouped statistics and above/below-mean subsets
//! - [`ranking`] — Record and category performance ranking
//! - [`sampling`] — Seeded scatter sampling
//! - [`sanitize`] — NaN-free, rounded JSON output
//! - [`summary`] — End-to-end pipeline and configuration
//! - [`ffi`] — C FFI bindings (JSON in, JSON out, auto-generated C header via cbindgen)
//! - [`error`] — Error types
//!
//! ## Quick Start
//!
//! ```
//! use equip_insight::csv_parser::CsvReader;
//! use equip_insight::summary::{analyze, SummaryConfig};
//!
//! let csv = "Equipment Name,Type,Flowrate,Pressure,Temperature\n\
//!            Pump-1,Pump,120.5,5.2,110\n\
//!            Pump-2,Pump,98.1,4.8,n/a\n\
//!            Valve-1,Valve,60.0,3.9,95\n";
//! let rows = CsvReader::new().read_str(csv).unwrap();
//! let summary = analyze(&rows, &SummaryConfig::default()).unwrap();
//!
//! assert_eq!(summary.total_count, 3);
//! assert_eq!(summary.statistical_summary.temperature.count, 2);
//! assert_eq!(summary.ranking[0].name, "Pump-1");
//!
//! let json = summary.to_json().unwrap();
//! assert_eq!(json["type_distribution"]["Pump"], 2);
//! ```

pub mod correlation;
pub mod csv_parser;
pub mod distribution;
pub mod error;
pub mod ffi;
pub mod grouped;
pub mod profiling;
pub mod ranking;
pub mod record;
pub mod sampling;
pub mod sanitize;
pub mod stats;
pub mod summary;

pub use error::InsightError;
pub use record::{EquipmentRecord, Metric, RawRow};
pub use summary::{analyze, analyze_csv, analyze_json, EquipmentSummary, SummaryConfig};
