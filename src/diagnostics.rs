//! Per-record diagnostics reported alongside a computation
//!
//! Diagnostics are a side channel: they never end up inside the enriched
//! records and never abort a batch.

use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Diagnostic category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticKind {
    /// Record lacked a required field or had a wrongly typed one; excluded
    SkippedInvalidRecord,
    /// (material, sub-type) not in the table; the fallback factor was applied
    FallbackFactorUsed,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::SkippedInvalidRecord => "SkippedInvalidRecord",
            DiagnosticKind::FallbackFactorUsed => "FallbackFactorUsed",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-fatal problem found while processing one input record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum Diagnostic {
    SkippedInvalidRecord {
        /// Position in the input sequence
        index: usize,
        reasons: Vec<String>,
        /// The offending record as supplied
        record: Value,
    },
    FallbackFactorUsed {
        index: usize,
        material: String,
        material_type: String,
        factor: f64,
    },
}

impl Diagnostic {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Diagnostic::SkippedInvalidRecord { .. } => DiagnosticKind::SkippedInvalidRecord,
            Diagnostic::FallbackFactorUsed { .. } => DiagnosticKind::FallbackFactorUsed,
        }
    }

    /// Input index of the record this diagnostic refers to
    pub fn index(&self) -> Option<usize> {
        match self {
            Diagnostic::SkippedInvalidRecord { index, .. }
            | Diagnostic::FallbackFactorUsed { index, .. } => Some(*index),
        }
    }

    /// One-line human-readable message
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::SkippedInvalidRecord {
                index,
                reasons,
                record,
            } => write!(
                f,
                "Skipping invalid entry #{}: {} ({})",
                index,
                reasons.join("; "),
                record
            ),
            Diagnostic::FallbackFactorUsed {
                index,
                material,
                material_type,
                factor,
            } => write!(
                f,
                "No emission factor for {} ({}) in entry #{}. Using default {}",
                material, material_type, index, factor
            ),
        }
    }
}
