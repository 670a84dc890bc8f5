use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sub-type key used when a material lists a single `factor` or a record
/// omits `material_type`.
pub const STANDARD_TYPE: &str = "standard";

/// Broad material family, used for listing and reporting only
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(rename_all = "lowercase")]
pub enum MaterialFamily {
    Structural,
    Facade,
    Insulation,
    Specialty,
    #[default]
    Generic,
}

impl MaterialFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialFamily::Structural => "structural",
            MaterialFamily::Facade => "facade",
            MaterialFamily::Insulation => "insulation",
            MaterialFamily::Specialty => "specialty",
            MaterialFamily::Generic => "generic",
        }
    }
}

/// Emission factors for one material, loaded from TOML
///
/// A material either lists its sub-types explicitly or gives a single
/// `factor`, which is stored under the implicit `"standard"` sub-type.
///
/// # Example TOML
/// ```toml
/// [[material]]
/// name = "steel"
/// family = "structural"
/// [material.types]
/// standard = 2.0
/// recycled = 0.5
///
/// [[material]]
/// name = "copper"
/// factor = 2.71
/// ```
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MaterialFactors {
    /// Lookup key (e.g., "concrete", "carbon_fiber")
    pub name: String,

    #[serde(default)]
    pub family: MaterialFamily,

    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Single factor stored as the "standard" sub-type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factor: Option<f64>,

    /// kg CO2e per kg of material, keyed by sub-type
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub types: BTreeMap<String, f64>,
}

impl MaterialFactors {
    /// Material with a single "standard" factor
    pub fn standard(name: impl Into<String>, factor: f64) -> Self {
        Self {
            name: name.into(),
            family: MaterialFamily::Generic,
            description: None,
            factor: Some(factor),
            types: BTreeMap::new(),
        }
    }

    pub fn with_family(mut self, family: MaterialFamily) -> Self {
        self.family = family;
        self
    }

    pub fn with_type(mut self, material_type: impl Into<String>, factor: f64) -> Self {
        self.types.insert(material_type.into(), factor);
        self
    }

    /// All (sub-type, factor) pairs, with `factor` expanded to "standard"
    ///
    /// An explicit `standard` entry in `types` wins over `factor`.
    pub fn sub_types(&self) -> BTreeMap<String, f64> {
        let mut out = self.types.clone();
        if let Some(factor) = self.factor {
            out.entry(STANDARD_TYPE.to_string()).or_insert(factor);
        }
        out
    }
}
