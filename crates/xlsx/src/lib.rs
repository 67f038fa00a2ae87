//! Grid loaders for sheetsense.
//!
//! Turns a spreadsheet file into the [`Grid`] and merged-cell ranges the
//! structure detector consumes. The format is picked from the file
//! extension:
//!
//! - `.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`: read with `calamine`; merged
//!   regions are reported for `.xlsx`/`.xlsm` only
//! - `.csv`, `.tsv`: one sheet named after the file, no merges
//! - `.json`: `{"rows": [[...]], "mergedCells": [...]}`
//!
//! ```no_run
//! use sheetsense_xlsx::{load_sheet, SheetSelector};
//!
//! let sheet = load_sheet("report.xlsx", &SheetSelector::Name("Q1".into())).unwrap();
//! println!("{} rows, {} merges", sheet.grid.height(), sheet.merged_cells.len());
//! ```

mod csv;
mod error;
mod json;
mod workbook;

pub use crate::csv::CsvOptions;
pub use error::{LoadError, Result};

use sheetsense_core::{Grid, MergedCellRange};
use std::path::Path;

/// One worksheet, ready for detection.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSheet {
    pub name: String,
    pub grid: Grid,
    pub merged_cells: Vec<MergedCellRange>,
}

/// Which sheet of a workbook to load.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SheetSelector {
    #[default]
    First,
    /// Zero-based position in the workbook.
    Index(usize),
    Name(String),
}

impl SheetSelector {
    /// Pick a sheet name out of `names`.
    pub(crate) fn resolve(&self, names: &[String]) -> Result<String> {
        let found = match self {
            SheetSelector::First => names.first(),
            SheetSelector::Index(index) => names.get(*index),
            SheetSelector::Name(name) => names.iter().find(|candidate| *candidate == name),
        };
        found.cloned().ok_or_else(|| LoadError::SheetNotFound {
            name: self.to_string(),
        })
    }
}

impl std::fmt::Display for SheetSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetSelector::First => write!(f, "first sheet"),
            SheetSelector::Index(index) => write!(f, "#{index}"),
            SheetSelector::Name(name) => write!(f, "{name}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Workbook,
    Flat(FlatFormat),
}

/// Formats that always hold exactly one sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlatFormat {
    Csv,
    Tsv,
    Json,
}

fn format_of(path: &Path) -> Result<Format> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "xla" | "ods" => Ok(Format::Workbook),
        "csv" => Ok(Format::Flat(FlatFormat::Csv)),
        "tsv" => Ok(Format::Flat(FlatFormat::Tsv)),
        "json" => Ok(Format::Flat(FlatFormat::Json)),
        _ => Err(LoadError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Sheet name for single-sheet formats.
fn stem_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Sheet1")
        .to_string()
}

/// Load one sheet.
///
/// CSV and JSON files hold a single sheet, which every selector except a
/// non-matching name or a non-zero index selects.
pub fn load_sheet<P: AsRef<Path>>(path: P, selector: &SheetSelector) -> Result<LoadedSheet> {
    let path = path.as_ref();
    let format = format_of(path)?;
    tracing::debug!(path = %path.display(), ?format, %selector, "loading sheet");

    match format {
        Format::Workbook => workbook::load_sheet(path, selector),
        Format::Flat(flat) => {
            let sheet = load_flat(path, flat)?;
            selector.resolve(std::slice::from_ref(&sheet.name))?;
            Ok(sheet)
        }
    }
}

/// Load every sheet, in workbook order.
pub fn load_workbook<P: AsRef<Path>>(path: P) -> Result<Vec<LoadedSheet>> {
    let path = path.as_ref();
    let format = format_of(path)?;
    tracing::debug!(path = %path.display(), ?format, "loading workbook");

    match format {
        Format::Workbook => workbook::load_all(path),
        Format::Flat(flat) => Ok(vec![load_flat(path, flat)?]),
    }
}

fn load_flat(path: &Path, format: FlatFormat) -> Result<LoadedSheet> {
    let name = stem_name(path);
    match format {
        FlatFormat::Csv => csv::load(path, name, &CsvOptions::default()),
        FlatFormat::Tsv => csv::load(path, name, &CsvOptions::tsv()),
        FlatFormat::Json => json::load(path, name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["Summary".to_string(), "Detail".to_string()]
    }

    #[test]
    fn test_selector_resolution() {
        assert_eq!(SheetSelector::First.resolve(&names()).unwrap(), "Summary");
        assert_eq!(SheetSelector::Index(1).resolve(&names()).unwrap(), "Detail");
        assert_eq!(
            SheetSelector::Name("Detail".into()).resolve(&names()).unwrap(),
            "Detail"
        );
    }

    #[test]
    fn test_selector_not_found() {
        let err = SheetSelector::Index(5).resolve(&names()).unwrap_err();
        assert!(matches!(err, LoadError::SheetNotFound { ref name } if name == "#5"));

        let err = SheetSelector::First.resolve(&[]).unwrap_err();
        assert!(matches!(err, LoadError::SheetNotFound { .. }));
    }

    #[test]
    fn test_format_by_extension() {
        assert_eq!(format_of(Path::new("a.XLSX")).unwrap(), Format::Workbook);
        assert_eq!(format_of(Path::new("a.ods")).unwrap(), Format::Workbook);
        assert_eq!(
            format_of(Path::new("a.csv")).unwrap(),
            Format::Flat(FlatFormat::Csv)
        );
        assert_eq!(
            format_of(Path::new("a.tsv")).unwrap(),
            Format::Flat(FlatFormat::Tsv)
        );
        assert_eq!(
            format_of(Path::new("a.json")).unwrap(),
            Format::Flat(FlatFormat::Json)
        );
        assert!(matches!(
            format_of(Path::new("a.pdf")),
            Err(LoadError::UnsupportedFormat(_))
        ));
        assert!(format_of(Path::new("noext")).is_err());
    }
}
