//! Embodied-carbon computation over a batch of material records
//!
//! `compute` is a pure function of (records, factor table, record policy):
//! no I/O, no clock, no state kept between calls. Malformed records and
//! unknown materials are reported as diagnostics; neither aborts the batch.

use crate::config::RecordPolicy;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::factors::{EmissionFactorTable, FactorLookup};
use crate::input::{self, InputFormatError};
use crate::record::{EnrichedRecord, MaterialRecord};
use crate::stats::{self, GroupTotal, Totals};
use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Output of one `compute` call
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Computation {
    /// Valid records in input order, with derived fields
    pub enriched: Vec<EnrichedRecord>,
    /// Side-channel warnings, in the order they were found
    pub diagnostics: Vec<Diagnostic>,
}

impl Computation {
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind() == kind).count()
    }

    pub fn skipped(&self) -> usize {
        self.count(DiagnosticKind::SkippedInvalidRecord)
    }

    pub fn fallbacks(&self) -> usize {
        self.count(DiagnosticKind::FallbackFactorUsed)
    }

    /// Grand totals over the enriched records
    pub fn totals(&self) -> Totals {
        stats::totals(&self.enriched)
    }

    /// Carbon emissions grouped by a field, first-occurrence order
    pub fn group_by(&self, field: &str) -> Vec<GroupTotal> {
        stats::group_by(&self.enriched, field)
    }
}

/// Maps material records to mass and embodied carbon
///
/// Cheap to clone and safe to share across threads: the factor table is
/// immutable and held behind an `Arc`.
///
/// # Example
/// ```
/// use huella::engine::EmissionsEngine;
/// use serde_json::json;
///
/// let engine = EmissionsEngine::with_builtin_factors()?;
/// let result = engine.compute(&[json!({
///     "component": "core",
///     "material": "concrete",
///     "material_type": "high_performance",
///     "density": 2.4,
///     "volume": 50
/// })]);
///
/// let record = &result.enriched[0];
/// assert!((record.mass - 120.0).abs() < 1e-9);
/// assert_eq!(record.emission_factor, 0.15);
/// assert!((record.carbon_emissions - 18.0).abs() < 1e-9);
/// assert!(result.diagnostics.is_empty());
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct EmissionsEngine {
    table: Arc<EmissionFactorTable>,
    policy: RecordPolicy,
}

impl EmissionsEngine {
    pub fn new(table: Arc<EmissionFactorTable>, policy: RecordPolicy) -> Self {
        Self { table, policy }
    }

    /// Engine over the embedded default table with default options
    pub fn with_builtin_factors() -> Result<Self> {
        Ok(Self::new(
            Arc::new(EmissionFactorTable::builtin()?),
            RecordPolicy::default(),
        ))
    }

    pub fn table(&self) -> &EmissionFactorTable {
        &self.table
    }

    pub fn policy(&self) -> &RecordPolicy {
        &self.policy
    }

    /// Validate and enrich every record, preserving input order
    pub fn compute(&self, records: &[Value]) -> Computation {
        let mut computation = Computation {
            enriched: Vec::with_capacity(records.len()),
            diagnostics: Vec::new(),
        };

        for (index, value) in records.iter().enumerate() {
            let record = match MaterialRecord::from_value(value, &self.policy) {
                Ok(record) => record,
                Err(reasons) => {
                    tracing::debug!(index, ?reasons, "skipping invalid record");
                    computation.diagnostics.push(Diagnostic::SkippedInvalidRecord {
                        index,
                        reasons,
                        record: value.clone(),
                    });
                    continue;
                }
            };

            let (enriched, lookup) = self.enrich(record);
            if !enriched.mass.is_finite() || !enriched.carbon_emissions.is_finite() {
                let reasons = vec![format!(
                    "derived mass ({}) or carbon_emissions ({}) overflows f64",
                    enriched.mass, enriched.carbon_emissions
                )];
                tracing::debug!(index, ?reasons, "skipping record with non-finite result");
                computation.diagnostics.push(Diagnostic::SkippedInvalidRecord {
                    index,
                    reasons,
                    record: value.clone(),
                });
                continue;
            }
            if lookup.used_fallback {
                tracing::debug!(
                    index,
                    material = enriched.material(),
                    material_type = %enriched.material_type,
                    factor = lookup.factor,
                    "no emission factor, using fallback"
                );
                computation.diagnostics.push(Diagnostic::FallbackFactorUsed {
                    index,
                    material: enriched.material().to_string(),
                    material_type: enriched.material_type.clone(),
                    factor: lookup.factor,
                });
            }
            computation.enriched.push(enriched);
        }

        tracing::info!(
            input = records.len(),
            enriched = computation.enriched.len(),
            skipped = computation.skipped(),
            fallbacks = computation.fallbacks(),
            "emissions computed"
        );
        computation
    }

    /// Same as `compute`, for records built in memory
    pub fn compute_records<I>(&self, records: I) -> Computation
    where
        I: IntoIterator<Item = MaterialRecord>,
    {
        let values: Vec<Value> = records.into_iter().map(|r| r.to_value()).collect();
        self.compute(&values)
    }

    /// Decode a JSON array and compute over it
    ///
    /// # Errors
    /// `InputFormatError` when the text is not a JSON array; nothing is computed.
    pub fn compute_json(&self, input: &str) -> std::result::Result<Computation, InputFormatError> {
        let records = input::parse_json(input)?;
        Ok(self.compute(&records))
    }

    /// Derive mass, factor and emissions for one validated record
    pub fn enrich(&self, record: MaterialRecord) -> (EnrichedRecord, FactorLookup) {
        let material_type = record
            .material_type()
            .unwrap_or(self.policy.default_material_type.as_str())
            .to_string();
        let quantity = record.quantity().unwrap_or(1.0);
        let lookup = self.table.lookup(record.material(), &material_type);

        let mass = record.density() * record.volume() * quantity;
        let carbon_emissions = mass * lookup.factor;

        let enriched = EnrichedRecord {
            record,
            material_type,
            quantity,
            mass,
            emission_factor: lookup.factor,
            carbon_emissions,
        };
        (enriched, lookup)
    }
}
