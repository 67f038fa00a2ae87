//! JSON grid documents.
//!
//! ```json
//! {
//!   "rows": [["Region", "Q1"], ["North", 10]],
//!   "mergedCells": [{"rowStart": 0, "rowEnd": 0, "colStart": 0, "colEnd": 1}]
//! }
//! ```
//!
//! Numbers, booleans and nulls keep their JSON type; strings go through
//! [`CellValue::parse`] like CSV fields.

use crate::error::Result;
use crate::LoadedSheet;
use serde::Deserialize;
use serde_json::Value;
use sheetsense_core::{CellValue, Grid, MergedCellRange};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GridDocument {
    rows: Vec<Vec<Value>>,
    #[serde(default)]
    merged_cells: Vec<MergedCellRange>,
}

pub(crate) fn load(path: &Path, name: String) -> Result<LoadedSheet> {
    let file = File::open(path)?;
    let (grid, merged_cells) = read_document(BufReader::new(file))?;
    tracing::debug!(
        sheet = %name,
        rows = grid.height(),
        cols = grid.width(),
        merged = merged_cells.len(),
        "json loaded"
    );
    Ok(LoadedSheet {
        name,
        grid,
        merged_cells,
    })
}

pub(crate) fn read_document<R: Read>(reader: R) -> Result<(Grid, Vec<MergedCellRange>)> {
    let document: GridDocument = serde_json::from_reader(reader)?;
    let rows: Vec<Vec<CellValue>> = document
        .rows
        .iter()
        .map(|row| row.iter().map(json_value_to_cell).collect())
        .collect();
    Ok((Grid::from_values(rows), document.merged_cells))
}

fn json_value_to_cell(value: &Value) -> CellValue {
    match value {
        Value::Null => CellValue::Null,
        Value::Bool(b) => CellValue::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Int(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        Value::String(s) => CellValue::parse(s),
        // Nested structures are kept as their JSON text
        Value::Array(_) | Value::Object(_) => CellValue::String(value.to_string()),
    }
}
