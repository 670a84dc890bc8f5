//! Sample take-off data for trying the engine without a model export

use clap::ValueEnum;
use serde_json::{json, Value};

/// Size of the generated sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Complexity {
    Low,
    #[default]
    Medium,
    High,
}

impl Complexity {
    /// Volume multiplier applied to every sample record
    pub fn multiplier(&self) -> f64 {
        match self {
            Complexity::Low => 0.5,
            Complexity::Medium => 1.0,
            Complexity::High => 2.0,
        }
    }
}

/// Three representative records: core concrete, facade glass, core steel
pub fn generate(complexity: Complexity) -> Vec<Value> {
    let m = complexity.multiplier();
    vec![
        json!({
            "component": "structural_core",
            "material": "concrete",
            "material_type": "high_performance",
            "density": 2.4,
            "volume": 50.0 * m,
            "location": "central_core"
        }),
        json!({
            "component": "external_facade",
            "material": "glass",
            "material_type": "low_e",
            "density": 2.5,
            "volume": 30.0 * m,
            "energy_efficiency_rating": "high"
        }),
        json!({
            "component": "structural_core",
            "material": "steel",
            "material_type": "low_carbon",
            "density": 7.85,
            "volume": 20.0 * m,
            "recycled_content_percentage": 50
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EmissionsEngine;

    #[test]
    fn test_volumes_scale_with_complexity() {
        let low = generate(Complexity::Low);
        let high = generate(Complexity::High);
        assert_eq!(low[0]["volume"], json!(25.0));
        assert_eq!(high[0]["volume"], json!(100.0));
        assert_eq!(high[2]["volume"], json!(40.0));
    }

    #[test]
    fn test_sample_uses_known_factors() {
        let engine = EmissionsEngine::with_builtin_factors().unwrap();
        let result = engine.compute(&generate(Complexity::default()));

        assert_eq!(result.enriched.len(), 3);
        assert!(result.diagnostics.is_empty());
        let factors: Vec<_> = result.enriched.iter().map(|r| r.emission_factor).collect();
        assert_eq!(factors, vec![0.15, 1.2, 1.0]);
    }
}
