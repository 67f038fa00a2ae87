//! Excel and OpenDocument workbooks via `calamine`.

use crate::error::Result;
use crate::{LoadedSheet, SheetSelector};
use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use sheetsense_core::{CellValue, Grid, MergedCellRange};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

type Workbook = Sheets<BufReader<File>>;

pub(crate) fn load_sheet(path: &Path, selector: &SheetSelector) -> Result<LoadedSheet> {
    let mut workbook = open(path)?;
    let name = selector.resolve(&workbook.sheet_names())?;
    read_sheet(&mut workbook, name)
}

pub(crate) fn load_all(path: &Path) -> Result<Vec<LoadedSheet>> {
    let mut workbook = open(path)?;
    workbook
        .sheet_names()
        .into_iter()
        .map(|name| read_sheet(&mut workbook, name))
        .collect()
}

fn open(path: &Path) -> Result<Workbook> {
    let mut workbook = open_workbook_auto(path)?;
    if let Sheets::Xlsx(xlsx) = &mut workbook {
        xlsx.load_merged_regions().map_err(calamine::Error::from)?;
    }
    Ok(workbook)
}

fn read_sheet(workbook: &mut Workbook, name: String) -> Result<LoadedSheet> {
    let range = workbook.worksheet_range(&name)?;
    let merged_cells = merged_cells(workbook, &name);
    let grid = range_to_grid(&range);
    tracing::debug!(
        sheet = %name,
        rows = grid.height(),
        cols = grid.width(),
        merged = merged_cells.len(),
        "sheet loaded"
    );
    Ok(LoadedSheet {
        name,
        grid,
        merged_cells,
    })
}

/// Merged regions in sheet coordinates. Only the xlsx reader exposes them.
fn merged_cells(workbook: &Workbook, name: &str) -> Vec<MergedCellRange> {
    match workbook {
        Sheets::Xlsx(xlsx) => xlsx
            .merged_regions_by_sheet(name)
            .into_iter()
            .map(|(_, _, dimensions)| {
                MergedCellRange::new(
                    dimensions.start.0 as usize,
                    dimensions.end.0 as usize,
                    dimensions.start.1 as usize,
                    dimensions.end.1 as usize,
                )
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Build a grid anchored at A1.
///
/// `calamine` trims leading empty rows and columns from a range; they are
/// restored here so grid coordinates match merged-region coordinates.
fn range_to_grid(range: &Range<Data>) -> Grid {
    let (row_offset, col_offset) = range
        .start()
        .map(|(row, col)| (row as usize, col as usize))
        .unwrap_or_default();

    let mut rows: Vec<Vec<CellValue>> = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut values = vec![CellValue::Null; col_offset];
        values.extend(row.iter().map(data_to_cell_value));
        rows.push(values);
    }
    Grid::from_values(rows)
}

/// Convert calamine Data to CellValue
fn data_to_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Null,
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) => CellValue::String(s.clone()),
        Data::DateTime(dt) if dt.is_duration() => CellValue::Float(dt.as_f64()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map_or_else(|| CellValue::Float(dt.as_f64()), CellValue::Date),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::parse(s),
        Data::Error(e) => CellValue::String(format!("#ERROR: {e:?}")),
    }
}
