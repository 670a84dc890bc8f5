//! JSON output formats
//!
//! Two shapes: a plain array mirroring the input with the derived fields
//! appended, and a versioned report carrying groups, totals and diagnostics.

use crate::engine::Computation;
use crate::stats::GroupTotal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Format identifier written into every report
pub const REPORT_FORMAT: &str = "huella-json-v1";

/// A diagnostic in flattened `{kind, message, index}` form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonDiagnostic {
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

/// Emissions grouped by one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonGroups {
    /// Field the records were grouped by (e.g. "component")
    pub field: String,
    pub totals: Vec<GroupTotal>,
}

/// Run-level summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonSummary {
    /// Records successfully enriched
    pub records: usize,
    /// Records excluded as invalid
    pub skipped: usize,
    /// Records computed with the fallback factor
    pub fallbacks: usize,
    /// kg
    pub total_mass: f64,
    /// kg CO2e
    pub total_carbon_emissions: f64,
    pub distinct_materials: usize,
}

/// Root JSON report structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonReport {
    /// Crate version that produced the report
    pub version: String,
    /// Format name
    pub format: String,
    /// Enriched records, same shape as `--format json`
    pub records: Vec<Map<String, Value>>,
    pub groups: JsonGroups,
    pub summary: JsonSummary,
    pub diagnostics: Vec<JsonDiagnostic>,
}

impl JsonReport {
    /// Build a report from a computation, grouping by `group_field`
    pub fn new(computation: &Computation, group_field: &str) -> Self {
        let totals = computation.totals();
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: REPORT_FORMAT.to_string(),
            records: computation.enriched.iter().map(|r| r.to_fields()).collect(),
            groups: JsonGroups {
                field: group_field.to_string(),
                totals: computation.group_by(group_field),
            },
            summary: JsonSummary {
                records: totals.records,
                skipped: computation.skipped(),
                fallbacks: computation.fallbacks(),
                total_mass: totals.total_mass,
                total_carbon_emissions: totals.total_carbon_emissions,
                distinct_materials: totals.distinct_materials,
            },
            diagnostics: computation
                .diagnostics
                .iter()
                .map(|d| JsonDiagnostic {
                    kind: d.kind().to_string(),
                    message: d.message(),
                    index: d.index(),
                })
                .collect(),
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Enriched records as a pretty-printed JSON array
pub fn records_to_json(computation: &Computation) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&computation.enriched)
}
