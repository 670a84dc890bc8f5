//! Huella - embodied-carbon calculation for building material take-offs
//!
//! This library maps building materials (by name and sub-type) to emission
//! factors, computes mass and embodied carbon for each material record, and
//! aggregates the results by component, category or material.
//!
//! ```
//! use huella::engine::EmissionsEngine;
//! use huella::record::MaterialRecord;
//!
//! let engine = EmissionsEngine::with_builtin_factors()?;
//! let result = engine.compute_records(vec![
//!     MaterialRecord::new("steel", 7.85, 20.0)
//!         .with_material_type("low_carbon")
//!         .with_component("structural_core"),
//! ]);
//! assert!((result.totals().total_carbon_emissions - 157.0).abs() < 1e-9);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cli;
pub mod config;
pub mod csv_output;
pub mod diagnostics;
pub mod engine;
pub mod factors;
pub mod input;
pub mod json_output;
pub mod record;
pub mod sample;
pub mod stats;
