//! CSV export of enriched records and group totals
//!
//! Flattened tabular form for spreadsheet analysis: one row per record,
//! header = union of field names in first-occurrence order.

use crate::record::EnrichedRecord;
use crate::stats::GroupTotal;
use serde_json::{Map, Value};

/// CSV output formatter for enriched records
#[derive(Debug, Default)]
pub struct CsvOutput {
    columns: Vec<String>,
    rows: Vec<Map<String, Value>>,
}

impl CsvOutput {
    /// Create a new CSV output formatter
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: &[EnrichedRecord]) -> Self {
        let mut output = Self::new();
        for record in records {
            output.add_record(record);
        }
        output
    }

    /// Add a record, extending the header with any new field names
    pub fn add_record(&mut self, record: &EnrichedRecord) {
        let fields = record.to_fields();
        for key in fields.keys() {
            if !self.columns.iter().any(|c| c == key) {
                self.columns.push(key.clone());
            }
        }
        self.rows.push(fields);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    fn header(&self) -> String {
        self.columns
            .iter()
            .map(|c| Self::escape_field(c))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Escape CSV field (handle commas, quotes, newlines)
    fn escape_field(field: &str) -> String {
        if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    /// Cell text: strings raw, null empty, everything else as JSON text
    fn format_value(value: &Value) -> String {
        match value {
            Value::Null => String::new(),
            Value::String(s) => Self::escape_field(s),
            other => Self::escape_field(&other.to_string()),
        }
    }

    fn format_row(&self, row: &Map<String, Value>) -> String {
        self.columns
            .iter()
            .map(|column| row.get(column).map(Self::format_value).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Generate CSV output as string
    pub fn to_csv(&self) -> String {
        let mut output = String::new();
        if self.columns.is_empty() {
            return output;
        }

        output.push_str(&self.header());
        output.push('\n');

        for row in &self.rows {
            output.push_str(&self.format_row(row));
            output.push('\n');
        }

        output
    }
}

/// CSV statistics output formatter for grouped totals
#[derive(Debug)]
pub struct CsvStatsOutput {
    field: String,
    groups: Vec<GroupTotal>,
}

impl CsvStatsOutput {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            groups: Vec::new(),
        }
    }

    pub fn add_group(&mut self, group: GroupTotal) {
        self.groups.push(group);
    }

    /// Generate CSV output; `share_percent` is relative to the sum of groups
    pub fn to_csv(&self) -> String {
        let total: f64 = self.groups.iter().map(|g| g.carbon_emissions).sum();
        let mut output = String::new();

        output.push_str(&CsvOutput::escape_field(&self.field));
        output.push_str(",records,mass,carbon_emissions,share_percent\n");

        for group in &self.groups {
            output.push_str(&CsvOutput::escape_field(&group.key));
            output.push(',');
            output.push_str(&group.records.to_string());
            output.push(',');
            output.push_str(&group.mass.to_string());
            output.push(',');
            output.push_str(&group.carbon_emissions.to_string());
            output.push(',');
            output.push_str(&format!("{:.2}", group.share(total)));
            output.push('\n');
        }

        output
    }
}
