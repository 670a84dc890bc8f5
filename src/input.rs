//! Decoding raw input into a sequence of record values
//!
//! The only fatal failure of a run lives here: if the bytes cannot be read
//! as a sequence of records at all, nothing is computed.

use crate::record::{json_type, TEXT_FIELDS};
use clap::ValueEnum;
use serde_json::{Map, Value};
use std::fs;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Input cannot be decoded into a sequence of records
#[derive(Error, Debug)]
pub enum InputFormatError {
    #[error("Invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected a JSON array of material records, found {found}")]
    NotAnArray { found: &'static str },

    #[error("Invalid CSV input at line {line}: {reason}")]
    Csv { line: usize, reason: String },

    #[error("Failed to read input {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Raw input encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// JSON array of objects
    Json,
    /// Header row plus one row per record
    Csv,
}

impl InputFormat {
    /// Guess from the file extension; anything but `.csv` is JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => InputFormat::Csv,
            _ => InputFormat::Json,
        }
    }
}

/// Parse a JSON array of records
pub fn parse_json(input: &str) -> Result<Vec<Value>, InputFormatError> {
    match serde_json::from_str::<Value>(input)? {
        Value::Array(records) => Ok(records),
        other => Err(InputFormatError::NotAnArray {
            found: json_type(&other),
        }),
    }
}

/// Parse CSV text into record objects
///
/// Cells are trimmed and empty ones omitted. Numeric cells become numbers,
/// except in label columns (`component`, `material`, ...) which always stay
/// strings.
pub fn parse_csv(input: &str) -> Result<Vec<Value>, InputFormatError> {
    let rows = split_rows(input)?;
    let mut rows = rows.into_iter();

    let Some((header_line, header)) = rows.next() else {
        return Ok(Vec::new());
    };
    let header: Vec<String> = header.iter().map(|name| name.trim().to_string()).collect();
    for (i, name) in header.iter().enumerate() {
        if name.is_empty() {
            return Err(InputFormatError::Csv {
                line: header_line,
                reason: format!("empty column name at position {}", i + 1),
            });
        }
        if header[..i].contains(name) {
            return Err(InputFormatError::Csv {
                line: header_line,
                reason: format!("duplicate column '{}'", name),
            });
        }
    }

    let mut records = Vec::new();
    for (line, cells) in rows {
        if cells.len() > header.len() {
            return Err(InputFormatError::Csv {
                line,
                reason: format!(
                    "row has {} fields but header has {}",
                    cells.len(),
                    header.len()
                ),
            });
        }

        let mut object = Map::new();
        for (name, cell) in header.iter().zip(cells) {
            let cell = cell.trim();
            if cell.is_empty() {
                continue;
            }
            object.insert(name.clone(), cell_value(name, cell));
        }
        records.push(Value::Object(object));
    }
    Ok(records)
}

/// Parse records in the given format
pub fn parse(input: &str, format: InputFormat) -> Result<Vec<Value>, InputFormatError> {
    match format {
        InputFormat::Json => parse_json(input),
        InputFormat::Csv => parse_csv(input),
    }
}

/// Read and parse records from a file, or stdin when the path is `-`
///
/// Without an explicit format the file extension decides.
pub fn read_records(path: &Path, format: Option<InputFormat>) -> Result<Vec<Value>, InputFormatError> {
    let io_error = |source: std::io::Error| InputFormatError::Io {
        path: path.display().to_string(),
        source,
    };

    let content = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).map_err(io_error)?;
        buf
    } else {
        fs::read_to_string(path).map_err(io_error)?
    };

    let format = format.unwrap_or_else(|| InputFormat::from_path(path));
    tracing::debug!(path = %path.display(), ?format, bytes = content.len(), "read input");
    parse(&content, format)
}

fn cell_value(column: &str, cell: &str) -> Value {
    if TEXT_FIELDS.contains(&column) {
        return Value::String(cell.to_string());
    }
    if let Ok(n) = cell.parse::<i64>() {
        return Value::from(n);
    }
    match cell.parse::<f64>() {
        Ok(n) if n.is_finite() => Value::from(n),
        _ => Value::String(cell.to_string()),
    }
}

/// Split CSV text into rows of unescaped cells, with 1-based start lines
///
/// Quoted fields may contain commas, doubled quotes and newlines. Blank
/// lines are skipped.
fn split_rows(input: &str) -> Result<Vec<(usize, Vec<String>)>, InputFormatError> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut row_line = 1;
    let mut row_has_content = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => {
                in_quotes = true;
                row_has_content = true;
            }
            ',' => {
                row.push(std::mem::take(&mut field));
                row_has_content = true;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                if row_has_content || !field.is_empty() {
                    row.push(std::mem::take(&mut field));
                    rows.push((row_line, std::mem::take(&mut row)));
                }
                row_has_content = false;
                line += 1;
                row_line = line;
            }
            _ => {
                field.push(c);
                row_has_content = true;
            }
        }
    }

    if in_quotes {
        return Err(InputFormatError::Csv {
            line: row_line,
            reason: "unterminated quoted field".to_string(),
        });
    }
    if row_has_content || !field.is_empty() {
        row.push(field);
        rows.push((row_line, row));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_json_array() {
        let records = parse_json(r#"[{"material": "steel"}, 3]"#).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1], json!(3));
    }

    #[test]
    fn test_parse_json_invalid() {
        let err = parse_json("[{").unwrap_err();
        assert!(matches!(err, InputFormatError::Json(_)));
        assert!(err.to_string().starts_with("Invalid JSON input"));
    }

    #[test]
    fn test_parse_json_not_array() {
        let err = parse_json(r#"{"material": "steel"}"#).unwrap_err();
        assert!(matches!(err, InputFormatError::NotAnArray { found: "object" }));
    }

    #[test]
    fn test_parse_csv_basic() {
        let csv = "component,material,material_type,density,volume\n\
                   structural_core,concrete,high_performance,2.4,50\n";
        let records = parse_csv(csv).unwrap();
        assert_eq!(
            records,
            vec![json!({
                "component": "structural_core",
                "material": "concrete",
                "material_type": "high_performance",
                "density": 2.4,
                "volume": 50
            })]
        );
    }

    #[test]
    fn test_parse_csv_quotes_and_empty_cells() {
        let csv = "material,density,volume,note\r\n\
                   glass,2.5,,\"south, \"\"low-e\"\"\nfacade\"\r\n\
                   \r\n\
                   steel,7.85,10,\n";
        let records = parse_csv(csv).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0],
            json!({"material": "glass", "density": 2.5, "note": "south, \"low-e\"\nfacade"})
        );
        assert!(records[0].get("volume").is_none());
        assert_eq!(records[1], json!({"material": "steel", "density": 7.85, "volume": 10}));
    }

    #[test]
    fn test_parse_csv_too_many_fields() {
        let err = parse_csv("material,density\nsteel,1,2\n").unwrap_err();
        match err {
            InputFormatError::Csv { line, reason } => {
                assert_eq!(line, 2);
                assert!(reason.contains("3 fields"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_parse_csv_unterminated_quote() {
        let err = parse_csv("material\n\"steel\n").unwrap_err();
        assert!(err.to_string().contains("unterminated"));
    }

    #[test]
    fn test_parse_csv_duplicate_header() {
        let err = parse_csv("material,material\nsteel,steel\n").unwrap_err();
        assert!(err.to_string().contains("duplicate column"));
    }

    #[test]
    fn test_parse_csv_duplicate_header_after_trim() {
        let err = parse_csv("material, material\nsteel,steel\n").unwrap_err();
        assert!(err.to_string().contains("duplicate column 'material'"));
    }

    #[test]
    fn test_parse_csv_trims_string_cells() {
        let records = parse_csv("material , material_type,density,volume\n steel , recycled ,7.85, 10\n").unwrap();
        assert_eq!(
            records,
            vec![json!({"material": "steel", "material_type": "recycled", "density": 7.85, "volume": 10})]
        );
    }

    #[test]
    fn test_parse_csv_label_columns_stay_strings() {
        let csv = "component,category,material,material_type,density,volume,level\n\
                   101,7,steel,recycled,7.85,10,3\n";
        let records = parse_csv(csv).unwrap();
        assert_eq!(records[0]["component"], json!("101"));
        assert_eq!(records[0]["category"], json!("7"));
        assert_eq!(records[0]["level"], json!(3));

        let result = crate::engine::EmissionsEngine::with_builtin_factors()
            .unwrap()
            .compute(&records);
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.enriched.len(), 1);
        assert_eq!(result.enriched[0].emission_factor, 0.5);
        assert_eq!(result.group_by("component")[0].key, "101");
    }

    #[test]
    fn test_parse_csv_empty() {
        assert!(parse_csv("").unwrap().is_empty());
        assert!(parse_csv("material,density,volume\n").unwrap().is_empty());
    }

    #[test]
    fn test_non_finite_cells_stay_strings() {
        let records = parse_csv("material,density\nsteel,NaN\n").unwrap();
        assert_eq!(records[0]["density"], json!("NaN"));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(InputFormat::from_path(Path::new("take-off.CSV")), InputFormat::Csv);
        assert_eq!(InputFormat::from_path(Path::new("take-off.json")), InputFormat::Json);
        assert_eq!(InputFormat::from_path(Path::new("take-off")), InputFormat::Json);
    }

    #[test]
    fn test_read_records_missing_file() {
        let err = read_records(Path::new("/nonexistent/records.json"), None).unwrap_err();
        assert!(matches!(err, InputFormatError::Io { .. }));
    }

    #[test]
    fn test_read_records_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.csv");
        fs::write(&path, "material,density,volume\ncopper,8.96,0.2\n").unwrap();
        let records = read_records(&path, None).unwrap();
        assert_eq!(records, vec![json!({"material": "copper", "density": 8.96, "volume": 0.2})]);
    }
}
