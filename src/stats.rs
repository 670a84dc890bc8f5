//! Aggregation over enriched records
//!
//! Pure reductions: grouped emission sums, grand totals, and the text
//! summary table printed by the CLI.

use crate::record::EnrichedRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt::Write;

/// Group label for records without a value in the grouping field
pub const UNSPECIFIED_GROUP: &str = "unspecified";

/// Emissions summed over one value of the grouping field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupTotal {
    pub key: String,
    pub records: usize,
    /// kg
    pub mass: f64,
    /// kg CO2e
    pub carbon_emissions: f64,
}

impl GroupTotal {
    /// Percentage of `total` carbon emissions attributable to this group
    pub fn share(&self, total: f64) -> f64 {
        if total > 0.0 {
            (self.carbon_emissions / total) * 100.0
        } else {
            0.0
        }
    }
}

/// Grand totals for a set of enriched records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub records: usize,
    /// kg
    pub total_mass: f64,
    /// kg CO2e
    pub total_carbon_emissions: f64,
    pub distinct_materials: usize,
}

/// Accumulates per-group sums, keeping first-occurrence order
#[derive(Debug)]
pub struct GroupTracker {
    field: String,
    groups: Vec<GroupTotal>,
    /// Map from group key to position in `groups`
    index: HashMap<String, usize>,
}

impl GroupTracker {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            groups: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// Add one record to its group
    pub fn record(&mut self, record: &EnrichedRecord) {
        let key = group_key(record, &self.field);
        let position = match self.index.get(&key) {
            Some(&position) => position,
            None => {
                self.groups.push(GroupTotal {
                    key: key.clone(),
                    records: 0,
                    mass: 0.0,
                    carbon_emissions: 0.0,
                });
                self.index.insert(key, self.groups.len() - 1);
                self.groups.len() - 1
            }
        };

        let group = &mut self.groups[position];
        group.records += 1;
        group.mass += record.mass;
        group.carbon_emissions += record.carbon_emissions;
    }

    pub fn groups(&self) -> &[GroupTotal] {
        &self.groups
    }

    pub fn into_groups(self) -> Vec<GroupTotal> {
        self.groups
    }
}

/// Group label of a record: strings as-is, other values as JSON text
pub fn group_key(record: &EnrichedRecord, field: &str) -> String {
    match record.field(field).as_deref() {
        None | Some(Value::Null) => UNSPECIFIED_GROUP.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Sum of carbon emissions (and mass) per distinct value of `field`
pub fn group_by(records: &[EnrichedRecord], field: &str) -> Vec<GroupTotal> {
    let mut tracker = GroupTracker::new(field);
    for record in records {
        tracker.record(record);
    }
    tracker.into_groups()
}

/// Total mass, total emissions and distinct material count
pub fn totals(records: &[EnrichedRecord]) -> Totals {
    let materials: HashSet<&str> = records.iter().map(|r| r.material()).collect();
    Totals {
        records: records.len(),
        total_mass: records.iter().map(|r| r.mass).sum(),
        total_carbon_emissions: records.iter().map(|r| r.carbon_emissions).sum(),
        distinct_materials: materials.len(),
    }
}

/// Render the summary table, groups sorted by emissions (descending)
pub fn render_summary(groups: &[GroupTotal], totals: &Totals, field: &str) -> String {
    let mut out = String::new();
    if totals.records == 0 {
        out.push_str("No records processed.\n");
        return out;
    }

    let mut sorted: Vec<_> = groups.iter().collect();
    sorted.sort_by(|a, b| b.carbon_emissions.total_cmp(&a.carbon_emissions));

    // Writing to a String cannot fail
    let _ = writeln!(
        out,
        "{:>8} {:>18} {:>16} {:>9} {}",
        "% carbon", "kg CO2e", "mass (kg)", "records", field
    );
    let _ = writeln!(
        out,
        "-------- ------------------ ---------------- --------- ----------------"
    );
    for group in sorted {
        let _ = writeln!(
            out,
            "{:>8.2} {:>18.2} {:>16.2} {:>9} {}",
            group.share(totals.total_carbon_emissions),
            group.carbon_emissions,
            group.mass,
            group.records,
            group.key
        );
    }
    let _ = writeln!(
        out,
        "-------- ------------------ ---------------- --------- ----------------"
    );
    let _ = writeln!(
        out,
        "{:>8.2} {:>18.2} {:>16.2} {:>9} total",
        100.0, totals.total_carbon_emissions, totals.total_mass, totals.records
    );
    let _ = writeln!(out, "\nDistinct materials: {}", totals.distinct_materials);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::MaterialRecord;

    fn enriched(component: Option<&str>, material: &str, mass: f64, factor: f64) -> EnrichedRecord {
        let mut record = MaterialRecord::new(material, mass, 1.0);
        if let Some(component) = component {
            record = record.with_component(component);
        }
        EnrichedRecord {
            record,
            material_type: "standard".to_string(),
            quantity: 1.0,
            mass,
            emission_factor: factor,
            carbon_emissions: mass * factor,
        }
    }

    fn sample() -> Vec<EnrichedRecord> {
        vec![
            enriched(Some("structural_core"), "concrete", 120.0, 0.15),
            enriched(Some("external_facade"), "glass", 75.0, 1.2),
            enriched(Some("structural_core"), "steel", 157.0, 1.0),
            enriched(None, "steel", 10.0, 2.0),
        ]
    }

    #[test]
    fn test_group_by_first_occurrence_order() {
        let groups = group_by(&sample(), "component");
        let keys: Vec<_> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["structural_core", "external_facade", "unspecified"]);

        assert_eq!(groups[0].records, 2);
        assert!((groups[0].carbon_emissions - (18.0 + 157.0)).abs() < 1e-9);
        assert!((groups[0].mass - 277.0).abs() < 1e-9);
    }

    #[test]
    fn test_group_by_material() {
        let groups = group_by(&sample(), "material");
        let keys: Vec<_> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["concrete", "glass", "steel"]);
        assert!((groups[2].carbon_emissions - 177.0).abs() < 1e-9);
    }

    #[test]
    fn test_group_by_numeric_field_uses_json_text() {
        let groups = group_by(&sample(), "volume");
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, "1.0");
    }

    #[test]
    fn test_groups_sum_to_total() {
        let records = sample();
        let totals = totals(&records);
        for field in ["component", "material", "material_type", "missing_field"] {
            let sum: f64 = group_by(&records, field)
                .iter()
                .map(|g| g.carbon_emissions)
                .sum();
            assert!((sum - totals.total_carbon_emissions).abs() < 1e-9, "{field}");
        }
    }

    #[test]
    fn test_totals() {
        let totals = totals(&sample());
        assert_eq!(totals.records, 4);
        assert_eq!(totals.distinct_materials, 3);
        assert!((totals.total_mass - 362.0).abs() < 1e-9);
        assert!((totals.total_carbon_emissions - 285.0).abs() < 1e-9);
    }

    #[test]
    fn test_totals_empty() {
        assert_eq!(totals(&[]), Totals::default());
    }

    #[test]
    fn test_share() {
        let group = GroupTotal {
            key: "core".to_string(),
            records: 1,
            mass: 1.0,
            carbon_emissions: 25.0,
        };
        assert_eq!(group.share(100.0), 25.0);
        assert_eq!(group.share(0.0), 0.0);
    }

    #[test]
    fn test_render_summary_sorted_by_emissions() {
        let records = sample();
        let groups = group_by(&records, "component");
        let text = render_summary(&groups, &totals(&records), "component");

        let core = text.find("structural_core").unwrap();
        let facade = text.find("external_facade").unwrap();
        assert!(core < facade);
        assert!(text.contains("kg CO2e"));
        assert!(text.contains("Distinct materials: 3"));
        assert!(text.contains("285.00"));
    }

    #[test]
    fn test_render_summary_empty() {
        assert_eq!(
            render_summary(&[], &Totals::default(), "component"),
            "No records processed.\n"
        );
    }
}
