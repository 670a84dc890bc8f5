use crate::config::LookupOptions;
use crate::factors::MaterialFactors;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Result of resolving a (material, sub-type) pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactorLookup {
    /// kg CO2e per kg of material
    pub factor: f64,
    /// True when the pair was not in the table and the fallback factor was used
    pub used_fallback: bool,
}

/// Immutable two-level mapping: material → sub-type → emission factor
///
/// Built once (from the embedded default table or a TOML file) and then only
/// read. To change factors at run time, build a new table and swap the
/// `Arc` held by the engine.
///
/// # Example Usage
/// ```
/// use huella::factors::EmissionFactorTable;
///
/// let table = EmissionFactorTable::builtin()?;
/// let hit = table.lookup("concrete", "high_performance");
/// assert_eq!(hit.factor, 0.15);
/// assert!(!hit.used_fallback);
///
/// let miss = table.lookup("unobtainium", "x");
/// assert_eq!(miss.factor, 0.5);
/// assert!(miss.used_fallback);
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct EmissionFactorTable {
    /// Definitions in declaration order
    materials: Vec<MaterialFactors>,

    /// Fast lookup on (possibly case-folded) keys
    factors: HashMap<String, HashMap<String, f64>>,

    options: LookupOptions,
}

#[derive(serde::Deserialize)]
struct FactorFile {
    #[serde(default)]
    material: Vec<MaterialFactors>,
}

impl EmissionFactorTable {
    /// Build a table from definitions
    ///
    /// # Errors
    /// Returns error for an empty material name, a material without any
    /// sub-type, a negative or non-finite factor, a duplicate material name
    /// (after case folding when lookups are case-insensitive), or an invalid
    /// fallback factor.
    pub fn from_definitions(definitions: Vec<MaterialFactors>, options: LookupOptions) -> Result<Self> {
        options.validate().map_err(anyhow::Error::msg)?;

        let mut factors: HashMap<String, HashMap<String, f64>> = HashMap::new();
        for material in &definitions {
            if material.name.trim().is_empty() {
                anyhow::bail!("Material with empty name in factor table");
            }

            let sub_types = material.sub_types();
            if sub_types.is_empty() {
                anyhow::bail!(
                    "Material '{}' defines no factor (give `factor` or [material.types])",
                    material.name
                );
            }

            let mut by_type = HashMap::with_capacity(sub_types.len());
            for (material_type, factor) in sub_types {
                if !factor.is_finite() || factor < 0.0 {
                    anyhow::bail!(
                        "Invalid emission factor {} for {} ({}): must be finite and >= 0",
                        factor,
                        material.name,
                        material_type
                    );
                }
                let key = options.normalize(&material_type).into_owned();
                if by_type.insert(key, factor).is_some() {
                    anyhow::bail!(
                        "Duplicate sub-type '{}' for material '{}'",
                        material_type,
                        material.name
                    );
                }
            }

            if factors
                .insert(options.normalize(&material.name).into_owned(), by_type)
                .is_some()
            {
                anyhow::bail!("Duplicate material '{}' in factor table", material.name);
            }
        }

        Ok(Self {
            materials: definitions,
            factors,
            options,
        })
    }

    /// Parse a factor table from TOML text
    pub fn from_toml_str(content: &str, options: LookupOptions) -> Result<Self> {
        let file: FactorFile =
            toml::from_str(content).context("Failed to parse TOML emission factor table")?;
        Self::from_definitions(file.material, options)
    }

    /// Load a factor table from a TOML file
    ///
    /// # Example TOML
    /// ```toml
    /// [[material]]
    /// name = "concrete"
    /// family = "structural"
    /// [material.types]
    /// base = 0.272
    /// high_performance = 0.15
    /// ```
    pub fn from_toml<P: AsRef<Path>>(path: P, options: LookupOptions) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read factor table: {}", path.as_ref().display())
        })?;
        Self::from_toml_str(&content, options)
            .with_context(|| format!("Invalid factor table: {}", path.as_ref().display()))
    }

    /// Built-in table with default lookup options
    pub fn builtin() -> Result<Self> {
        Self::builtin_with(LookupOptions::default())
    }

    /// Built-in table (embedded factors-default.toml) with custom lookup options
    pub fn builtin_with(options: LookupOptions) -> Result<Self> {
        const DEFAULT_TOML: &str = include_str!("../../factors-default.toml");
        Self::from_toml_str(DEFAULT_TOML, options)
            .context("Failed to parse embedded factors-default.toml")
    }

    /// Resolve the factor for a material and sub-type
    ///
    /// Never fails: a miss on either level yields the fallback factor with
    /// `used_fallback` set so the caller can warn.
    pub fn lookup(&self, material: &str, material_type: &str) -> FactorLookup {
        match self.get(material, material_type) {
            Some(factor) => FactorLookup {
                factor,
                used_fallback: false,
            },
            None => FactorLookup {
                factor: self.options.fallback_factor,
                used_fallback: true,
            },
        }
    }

    /// Exact factor for a pair, without fallback
    pub fn get(&self, material: &str, material_type: &str) -> Option<f64> {
        self.factors
            .get(self.options.normalize(material).as_ref())?
            .get(self.options.normalize(material_type).as_ref())
            .copied()
    }

    pub fn contains_material(&self, material: &str) -> bool {
        self.factors
            .contains_key(self.options.normalize(material).as_ref())
    }

    /// Get material definition by name
    pub fn get_material(&self, name: &str) -> Option<&MaterialFactors> {
        let key = self.options.normalize(name);
        self.materials
            .iter()
            .find(|m| self.options.normalize(&m.name) == key)
    }

    /// All definitions in declaration order
    pub fn materials(&self) -> &[MaterialFactors] {
        &self.materials
    }

    pub fn options(&self) -> &LookupOptions {
        &self.options
    }

    pub fn fallback_factor(&self) -> f64 {
        self.options.fallback_factor
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}
