// Emission-factor reference data
//
// Maps a material name and sub-type to kg CO2e per kg of material. The table
// is configuration, not code: the default set is an embedded TOML file and a
// project can supply its own without recompiling.
//
// Lookup never fails. A miss on the material or the sub-type resolves to the
// conservative fallback factor and is flagged so callers can warn.

mod definition;
mod registry;

pub use definition::{MaterialFactors, MaterialFamily, STANDARD_TYPE};
pub use registry::{EmissionFactorTable, FactorLookup};
