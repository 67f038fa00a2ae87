use crate::error::Result;
use crate::LoadedSheet;
use sheetsense_core::{CellValue, Grid};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// CSV reader options
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field delimiter (default: ',')
    pub delimiter: u8,
    /// Quote character (default: '"')
    pub quote: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            delimiter: b',',
            quote: b'"',
        }
    }
}

impl CsvOptions {
    /// Create options for TSV (tab-separated values)
    #[must_use]
    pub fn tsv() -> Self {
        CsvOptions {
            delimiter: b'\t',
            ..Default::default()
        }
    }

    /// Set the delimiter
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

pub(crate) fn load(path: &Path, name: String, options: &CsvOptions) -> Result<LoadedSheet> {
    let file = File::open(path)?;
    let grid = read_grid(BufReader::new(file), options)?;
    tracing::debug!(sheet = %name, rows = grid.height(), cols = grid.width(), "csv loaded");
    Ok(LoadedSheet {
        name,
        grid,
        merged_cells: Vec::new(),
    })
}

/// Read every record as a grid row. Title lines usually carry fewer fields
/// than the table below them, so ragged records are accepted. Blank lines
/// become empty rows, keeping row indices equal to line numbers.
pub(crate) fn read_grid<R: Read>(mut reader: R, options: &CsvOptions) -> Result<Grid> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;

    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .quote(options.quote)
        .has_headers(false)
        .flexible(true)
        .from_reader(data.as_slice());

    let mut lines = LineCounter::new(&data);
    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    let mut record = csv::StringRecord::new();
    while csv_reader.read_record(&mut record)? {
        // The reader skips blank lines before a record without reporting them.
        let offset = record.position().map_or(0, |p| p.byte() as usize);
        let line = lines.record_line(offset);
        rows.resize_with(rows.len() + line.saturating_sub(lines.next), Vec::new);
        rows.push(record.iter().map(CellValue::parse).collect());
        let embedded: usize = record.iter().map(|field| field.matches('\n').count()).sum();
        lines.next = line + 1 + embedded;
    }

    Ok(Grid::from_values(rows))
}

/// Maps record byte offsets to zero-based line numbers.
struct LineCounter<'a> {
    data: &'a [u8],
    scanned: usize,
    line: usize,
    /// Line right after the last record read.
    next: usize,
}

impl<'a> LineCounter<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            scanned: 0,
            line: 0,
            next: 0,
        }
    }

    /// Line holding the first byte of a record whose read began at `offset`.
    fn record_line(&mut self, offset: usize) -> usize {
        let rest = self.data.get(offset..).unwrap_or_default();
        let start = offset + rest.iter().take_while(|&&b| matches!(b, b'\r' | b'\n')).count();
        let start = start.min(self.data.len()).max(self.scanned);
        self.line += self.data[self.scanned..start]
            .iter()
            .filter(|&&b| b == b'\n')
            .count();
        self.scanned = start;
        self.line
    }
}
