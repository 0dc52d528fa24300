// Memgate - Text Extraction
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Renders uploaded documents as text for the `view` command.
// Format is chosen by extension. Structured formats become indented JSON,
// tabular data is capped at a fixed row count, PDFs are split per page.

use calamine::{open_workbook_auto, Data, Reader};
use serde_json::{json, Map, Value};
use std::path::Path;
use thiserror::Error;

/// Maximum number of tabular rows rendered per table
pub const DEFAULT_ROW_CAP: usize = 1000;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file type: {extension}")]
    Unsupported { extension: String },

    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("invalid PDF: {0}")]
    Pdf(#[from] lopdf::Error),
}

/// Converts a concrete file into a textual rendering
pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<String, ExtractError>;
}

/// Extension-dispatched extractor for the supported document formats
#[derive(Debug, Clone)]
pub struct FormatExtractor {
    row_cap: usize,
}

impl Default for FormatExtractor {
    fn default() -> Self {
        Self { row_cap: DEFAULT_ROW_CAP }
    }
}

impl FormatExtractor {
    pub fn with_row_cap(row_cap: usize) -> Self {
        Self { row_cap }
    }
}

impl TextExtractor for FormatExtractor {
    fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let extension = path.extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "txt" | "md" => read_text(path),
            "json" => read_json(path),
            "xml" => read_xml(path),
            "csv" => read_csv(path, self.row_cap),
            "xlsx" | "xls" => read_spreadsheet(path, self.row_cap),
            "pdf" => read_pdf(path),
            "" => Err(ExtractError::Unsupported { extension: "(none)".to_string() }),
            other => Err(ExtractError::Unsupported { extension: format!(".{}", other) }),
        }
    }
}

fn read_text(path: &Path) -> Result<String, ExtractError> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn read_json(path: &Path) -> Result<String, ExtractError> {
    let bytes = std::fs::read(path)?;
    let value: Value = serde_json::from_slice(&bytes)?;
    Ok(serde_json::to_string_pretty(&value)?)
}

// ============================================================================
// XML
// ============================================================================

fn read_xml(path: &Path) -> Result<String, ExtractError> {
    let text = std::fs::read_to_string(path)?;
    let doc = roxmltree::Document::parse(&text)?;
    let root = doc.root_element();

    let mut top = Map::new();
    top.insert(root.tag_name().name().to_string(), element_to_value(root));
    Ok(serde_json::to_string_pretty(&Value::Object(top))?)
}

/// Attributes go under `@attributes`, text under `#text`. An element holding
/// only text collapses to a string; repeated child tags become arrays.
fn element_to_value(node: roxmltree::Node<'_, '_>) -> Value {
    let text = node.text().map(str::trim).filter(|t| !t.is_empty());
    let children: Vec<_> = node.children().filter(|c| c.is_element()).collect();
    let has_attributes = node.attributes().next().is_some();

    if let Some(t) = text {
        if children.is_empty() && !has_attributes {
            return Value::String(t.to_string());
        }
    }

    let mut map = Map::new();
    if has_attributes {
        let attrs: Map<String, Value> = node.attributes()
            .map(|a| (a.name().to_string(), Value::String(a.value().to_string())))
            .collect();
        map.insert("@attributes".to_string(), Value::Object(attrs));
    }
    if let Some(t) = text {
        map.insert("#text".to_string(), Value::String(t.to_string()));
    }

    for child in children {
        let tag = child.tag_name().name().to_string();
        let value = element_to_value(child);
        match map.get_mut(&tag) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(tag, value);
            }
        }
    }

    Value::Object(map)
}

// ============================================================================
// TABULAR
// ============================================================================

fn read_csv(path: &Path, row_cap: usize) -> Result<String, ExtractError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)?;
    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut total = 0usize;
    let mut data = Vec::new();
    for record in reader.records() {
        // Malformed rows are skipped
        let Ok(record) = record else { continue };
        total += 1;
        if data.len() < row_cap {
            let row: Map<String, Value> = columns.iter()
                .zip(record.iter())
                .map(|(col, cell)| (col.clone(), infer_cell(cell)))
                .collect();
            data.push(Value::Object(row));
        }
    }

    let mut result = json!({
        "metadata": {
            "rows": total,
            "columns": columns,
            "shape": [total, columns.len()],
        },
        "data": data,
    });
    if total > row_cap {
        result["note"] = json!(truncation_note(row_cap, total));
    }
    Ok(serde_json::to_string_pretty(&result)?)
}

fn read_spreadsheet(path: &Path, row_cap: usize) -> Result<String, ExtractError> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet_names = workbook.sheet_names();

    let mut sheets = Map::new();
    for name in &sheet_names {
        let range = workbook.worksheet_range(name)?;
        let (height, width) = range.get_size();
        let mut rows = range.rows();

        let columns: Vec<String> = rows.next()
            .map(|header| header.iter().map(|c| c.to_string()).collect())
            .unwrap_or_default();
        let body_rows = height.saturating_sub(1);

        let data: Vec<Value> = rows
            .take(row_cap)
            .map(|row| {
                let obj: Map<String, Value> = columns.iter()
                    .zip(row.iter())
                    .map(|(col, cell)| (col.clone(), cell_to_value(cell)))
                    .collect();
                Value::Object(obj)
            })
            .collect();

        let mut sheet = json!({
            "shape": [body_rows, width],
            "columns": columns,
            "rows": data,
        });
        if body_rows > row_cap {
            sheet["note"] = json!(truncation_note(row_cap, body_rows));
        }
        sheets.insert(name.clone(), sheet);
    }

    let result = json!({
        "metadata": {
            "sheets": sheet_names,
            "total_sheets": sheet_names.len(),
        },
        "data": sheets,
    });
    Ok(serde_json::to_string_pretty(&result)?)
}

fn truncation_note(shown: usize, total: usize) -> String {
    format!("Showing first {} of {} rows", shown, total)
}

/// Numbers become JSON numbers, empty cells null, the rest strings
fn infer_cell(cell: &str) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return json!(i);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if f.is_finite() {
            return json!(f);
        }
    }
    Value::String(cell.to_string())
}

fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::Int(i) => json!(i),
        Data::Float(f) if f.is_finite() => json!(f),
        Data::Bool(b) => json!(b),
        Data::String(s) => Value::String(s.clone()),
        other => Value::String(other.to_string()),
    }
}

// ============================================================================
// PDF
// ============================================================================

fn read_pdf(path: &Path) -> Result<String, ExtractError> {
    let doc = lopdf::Document::load(path)?;

    let mut pages = Vec::new();
    for page_number in doc.get_pages().keys() {
        let text = doc.extract_text(&[*page_number])?;
        if !text.trim().is_empty() {
            pages.push(format!("--- Page {} ---\n{}", page_number, text));
        }
    }

    Ok(pages.join("\n\n"))
}

// ============================================================================
// TESTS
// ============================================================================
