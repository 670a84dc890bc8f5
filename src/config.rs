// Engine configuration
//
// Replaces module-level constant tables with an explicit, immutable value
// passed in at construction time. Loadable from TOML so a project can pin its
// own factor table and record policy.

use crate::engine::EmissionsEngine;
use crate::factors::{EmissionFactorTable, STANDARD_TYPE};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Conservative default factor for pairs missing from the table (kg CO2e/kg)
pub const DEFAULT_FALLBACK_FACTOR: f64 = 0.5;

/// How the factor table resolves keys
///
/// # Example
/// ```
/// use huella::config::LookupOptions;
///
/// let options = LookupOptions::default();
/// assert_eq!(options.fallback_factor, 0.5);
/// assert!(!options.case_insensitive);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupOptions {
    /// Factor applied when a (material, sub-type) pair is not in the table
    ///
    /// Default: 0.5
    pub fallback_factor: f64,

    /// Fold material and sub-type keys to lowercase before matching
    ///
    /// Default: false (exact, case-sensitive keys)
    pub case_insensitive: bool,
}

impl Default for LookupOptions {
    fn default() -> Self {
        Self {
            fallback_factor: DEFAULT_FALLBACK_FACTOR,
            case_insensitive: false,
        }
    }
}

impl LookupOptions {
    /// Key as stored and matched in the table
    pub fn normalize<'a>(&self, key: &'a str) -> Cow<'a, str> {
        if self.case_insensitive && key.chars().any(char::is_uppercase) {
            Cow::Owned(key.to_lowercase())
        } else {
            Cow::Borrowed(key)
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.fallback_factor.is_finite() || self.fallback_factor < 0.0 {
            return Err(format!(
                "fallback_factor must be finite and >= 0, got {}",
                self.fallback_factor
            ));
        }
        Ok(())
    }
}

/// Which fields a record needs before it is processed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordPolicy {
    /// Sub-type assumed when a record has no `material_type`
    ///
    /// Default: "standard"
    pub default_material_type: String,

    /// Skip records without a `component` string
    ///
    /// Off by default: `component`/`category` are descriptive labels only.
    pub require_component: bool,
}

impl Default for RecordPolicy {
    fn default() -> Self {
        Self {
            default_material_type: STANDARD_TYPE.to_string(),
            require_component: false,
        }
    }
}

impl RecordPolicy {
    /// Stricter variant: `component` is a required field
    pub fn strict() -> Self {
        Self {
            require_component: true,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.default_material_type.trim().is_empty() {
            return Err("default_material_type must not be empty".to_string());
        }
        Ok(())
    }
}

/// Complete engine configuration
///
/// # Example TOML
/// ```toml
/// factors = "project-factors.toml"
///
/// [lookup]
/// fallback_factor = 0.5
/// case_insensitive = true
///
/// [records]
/// default_material_type = "standard"
/// require_component = false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Factor table file; the embedded table is used when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factors: Option<PathBuf>,

    pub lookup: LookupOptions,

    pub records: RecordPolicy,
}

impl EngineConfig {
    /// Load configuration from a TOML file
    ///
    /// A relative `factors` path is resolved against the config file's directory.
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config: EngineConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        if let (Some(factors), Some(dir)) = (config.factors.as_mut(), path.parent()) {
            if factors.is_relative() {
                *factors = dir.join(&*factors);
            }
        }

        config.validate().map_err(anyhow::Error::msg)?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        self.lookup.validate()?;
        self.records.validate()
    }

    /// Factor table described by this configuration
    pub fn load_table(&self) -> Result<EmissionFactorTable> {
        match &self.factors {
            Some(path) => EmissionFactorTable::from_toml(path, self.lookup.clone()),
            None => EmissionFactorTable::builtin_with(self.lookup.clone()),
        }
    }

    /// Build an engine from this configuration
    pub fn build_engine(&self) -> Result<EmissionsEngine> {
        self.validate().map_err(anyhow::Error::msg)?;
        let table = self.load_table()?;
        Ok(EmissionsEngine::new(Arc::new(table), self.records.clone()))
    }
}
