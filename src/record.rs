//! Material records: the typed input line-item and its enriched output
//!
//! A record is a JSON object with a fixed required subset (`material`,
//! `density`, `volume`), a few optional interpreted fields (`material_type`,
//! `quantity`, `component`, `category`) and any number of passthrough fields
//! that are carried to the output untouched.

use crate::config::RecordPolicy;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::borrow::Cow;

/// Fields the engine appends to every processed record
pub const DERIVED_FIELDS: [&str; 3] = ["mass", "emission_factor", "carbon_emissions"];

/// Interpreted fields that hold labels, never numbers
pub const TEXT_FIELDS: [&str; 4] = ["component", "category", "material", "material_type"];

/// Fields the engine reads; everything else is passthrough
pub const INTERPRETED_FIELDS: [&str; 7] = [
    "component",
    "category",
    "material",
    "material_type",
    "density",
    "volume",
    "quantity",
];

/// One quantity of building material placed in a component
///
/// Keeps the supplied object verbatim (field order included) next to the
/// typed view, so output can mirror input exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialRecord {
    material: String,
    material_type: Option<String>,
    density: f64,
    volume: f64,
    quantity: Option<f64>,
    component: Option<String>,
    category: Option<String>,
    fields: Map<String, Value>,
}

impl MaterialRecord {
    /// Build a record in memory
    ///
    /// # Example
    /// ```
    /// use huella::record::MaterialRecord;
    ///
    /// let record = MaterialRecord::new("steel", 7.85, 20.0)
    ///     .with_component("structural_core")
    ///     .with_material_type("low_carbon")
    ///     .with_field("recycled_content_percentage", 50);
    /// assert_eq!(record.material(), "steel");
    /// assert_eq!(record.extra().count(), 1);
    /// ```
    pub fn new(material: impl Into<String>, density: f64, volume: f64) -> Self {
        let material = material.into();
        let mut fields = Map::new();
        fields.insert("material".to_string(), Value::from(material.clone()));
        fields.insert("density".to_string(), Value::from(density));
        fields.insert("volume".to_string(), Value::from(volume));
        Self {
            material,
            material_type: None,
            density,
            volume,
            quantity: None,
            component: None,
            category: None,
            fields,
        }
    }

    pub fn with_material_type(mut self, material_type: impl Into<String>) -> Self {
        let material_type = material_type.into();
        self.fields
            .insert("material_type".to_string(), Value::from(material_type.clone()));
        self.material_type = Some(material_type);
        self
    }

    pub fn with_quantity(mut self, quantity: f64) -> Self {
        self.fields
            .insert("quantity".to_string(), Value::from(quantity));
        self.quantity = Some(quantity);
        self
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        let component = component.into();
        self.fields
            .insert("component".to_string(), Value::from(component.clone()));
        self.component = Some(component);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        let category = category.into();
        self.fields
            .insert("category".to_string(), Value::from(category.clone()));
        self.category = Some(category);
        self
    }

    /// Attach a passthrough field
    ///
    /// Interpreted field names are ignored here; use the typed setters.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if !INTERPRETED_FIELDS.contains(&key.as_str()) {
            self.fields.insert(key, value.into());
        }
        self
    }

    /// Validate a decoded JSON value against the record schema
    ///
    /// Every problem found is returned, so a rejected record can be reported
    /// once with all its reasons.
    pub fn from_value(value: &Value, policy: &RecordPolicy) -> Result<Self, Vec<String>> {
        let Some(object) = value.as_object() else {
            return Err(vec![format!(
                "record must be a JSON object, found {}",
                json_type(value)
            )]);
        };

        let mut reasons = Vec::new();
        let material = required_str(object, "material", &mut reasons);
        let density = required_number(object, "density", &mut reasons);
        let volume = required_number(object, "volume", &mut reasons);
        let material_type = optional_str(object, "material_type", &mut reasons);
        let quantity = optional_number(object, "quantity", &mut reasons);
        let component = if policy.require_component {
            required_str(object, "component", &mut reasons)
        } else {
            optional_str(object, "component", &mut reasons)
        };
        let category = optional_str(object, "category", &mut reasons);

        match (material, density, volume) {
            (Some(material), Some(density), Some(volume)) if reasons.is_empty() => Ok(Self {
                material,
                material_type,
                density,
                volume,
                quantity,
                component,
                category,
                fields: object.clone(),
            }),
            _ => Err(reasons),
        }
    }

    pub fn material(&self) -> &str {
        &self.material
    }

    /// Sub-type as supplied (None when absent or null)
    pub fn material_type(&self) -> Option<&str> {
        self.material_type.as_deref()
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Multiplier as supplied (None when absent or null)
    pub fn quantity(&self) -> Option<f64> {
        self.quantity
    }

    pub fn component(&self) -> Option<&str> {
        self.component.as_deref()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// All fields as supplied, in input order
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Passthrough fields the engine does not interpret
    pub fn extra(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields
            .iter()
            .filter(|(key, _)| !INTERPRETED_FIELDS.contains(&key.as_str()))
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

/// A processed record: the input plus mass, factor and emissions
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    pub record: MaterialRecord,
    /// Sub-type used for the lookup (default applied)
    pub material_type: String,
    /// Multiplier used for the mass (default applied)
    pub quantity: f64,
    /// kg: density × volume × quantity
    pub mass: f64,
    /// kg CO2e per kg, as resolved from the table (possibly the fallback)
    pub emission_factor: f64,
    /// kg CO2e: mass × emission_factor
    pub carbon_emissions: f64,
}

impl EnrichedRecord {
    pub fn material(&self) -> &str {
        self.record.material()
    }

    /// Field value by name, including derived fields and resolved defaults
    pub fn field(&self, key: &str) -> Option<Cow<'_, Value>> {
        match key {
            "mass" => Some(Cow::Owned(Value::from(self.mass))),
            "emission_factor" => Some(Cow::Owned(Value::from(self.emission_factor))),
            "carbon_emissions" => Some(Cow::Owned(Value::from(self.carbon_emissions))),
            "material_type" if self.record.material_type.is_none() => {
                Some(Cow::Owned(Value::from(self.material_type.clone())))
            }
            "quantity" if self.record.quantity.is_none() => {
                Some(Cow::Owned(Value::from(self.quantity)))
            }
            _ => self
                .record
                .fields
                .get(key)
                .filter(|v| !v.is_null())
                .map(Cow::Borrowed),
        }
    }

    /// Input fields in order, followed by the three derived fields
    ///
    /// An input field named like a derived field is overwritten in place.
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = self.record.fields.clone();
        fields.insert("mass".to_string(), Value::from(self.mass));
        fields.insert(
            "emission_factor".to_string(),
            Value::from(self.emission_factor),
        );
        fields.insert(
            "carbon_emissions".to_string(),
            Value::from(self.carbon_emissions),
        );
        fields
    }
}

impl Serialize for EnrichedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_fields().serialize(serializer)
    }
}

/// JSON type name for messages
pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn present<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    object.get(key).filter(|v| !v.is_null())
}

fn required_str(object: &Map<String, Value>, key: &str, reasons: &mut Vec<String>) -> Option<String> {
    match present(object, key) {
        None => {
            reasons.push(format!("missing required field `{}`", key));
            None
        }
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Value::String(_)) => {
            reasons.push(format!("`{}` must not be empty", key));
            None
        }
        Some(other) => {
            reasons.push(format!("`{}` must be a string, found {}", key, json_type(other)));
            None
        }
    }
}

fn optional_str(object: &Map<String, Value>, key: &str, reasons: &mut Vec<String>) -> Option<String> {
    match present(object, key) {
        None => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            reasons.push(format!("`{}` must be a string, found {}", key, json_type(other)));
            None
        }
    }
}

fn number(key: &str, value: &Value, reasons: &mut Vec<String>) -> Option<f64> {
    match value.as_f64() {
        Some(n) if n.is_finite() && n >= 0.0 => Some(n),
        Some(n) => {
            reasons.push(format!("`{}` must be a non-negative number, got {}", key, n));
            None
        }
        None => {
            reasons.push(format!("`{}` must be a number, found {}", key, json_type(value)));
            None
        }
    }
}

fn required_number(object: &Map<String, Value>, key: &str, reasons: &mut Vec<String>) -> Option<f64> {
    match present(object, key) {
        None => {
            reasons.push(format!("missing required field `{}`", key));
            None
        }
        Some(value) => number(key, value, reasons),
    }
}

fn optional_number(object: &Map<String, Value>, key: &str, reasons: &mut Vec<String>) -> Option<f64> {
    present(object, key).and_then(|value| number(key, value, reasons))
}
