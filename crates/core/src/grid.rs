//! The rectangular cell grid handed to the detector, plus merged-cell ranges.

use crate::cell::{Cell, CellValue, ValueKind};
use serde::{Deserialize, Serialize};

/// Immutable, rectangular grid of cells.
///
/// Short rows are padded with empty cells up to the width of the longest
/// row, so every row has exactly [`Grid::width`] cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    rows: Vec<Vec<Cell>>,
    width: usize,
}

impl Grid {
    pub fn new(mut rows: Vec<Vec<Cell>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize_with(width, Cell::empty);
        }
        Self { rows, width }
    }

    /// Build a grid from typed values.
    ///
    /// ```
    /// use sheetsense_core::{Grid, ValueKind};
    ///
    /// let grid = Grid::from_values(vec![vec!["Name", "Qty"], vec!["Bolt", "12"]]);
    /// assert_eq!(grid.width(), 2);
    /// assert_eq!(grid.cell(1, 1).unwrap().kind(), ValueKind::Number);
    /// ```
    pub fn from_values<T: Into<CellValue>>(rows: Vec<Vec<T>>) -> Self {
        Self::new(
            rows.into_iter()
                .map(|row| row.into_iter().map(Cell::new).collect())
                .collect(),
        )
    }

    /// Build a grid from raw text, running [`CellValue::parse`] on each field.
    pub fn parse_rows<R, S>(rows: R) -> Self
    where
        R: IntoIterator<Item = Vec<S>>,
        S: AsRef<str>,
    {
        Self::new(
            rows.into_iter()
                .map(|row| {
                    row.iter()
                        .map(|field| Cell::new(CellValue::parse(field.as_ref())))
                        .collect()
                })
                .collect(),
        )
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[Cell]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Trimmed display text at `(row, col)`; empty when out of bounds.
    pub fn text(&self, row: usize, col: usize) -> String {
        self.cell(row, col).map(Cell::text).unwrap_or_default()
    }

    /// Number of rows up to and including the last row holding a value.
    pub fn content_height(&self) -> usize {
        self.rows
            .iter()
            .rposition(|row| row.iter().any(|cell| !cell.is_empty()))
            .map_or(0, |last| last + 1)
    }

    /// True when there is nothing to analyze.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.content_height() == 0
    }
}

/// Inclusive, 0-indexed rectangle of merged cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedCellRange {
    pub row_start: usize,
    pub row_end: usize,
    pub col_start: usize,
    pub col_end: usize,
}

impl MergedCellRange {
    pub fn new(row_start: usize, row_end: usize, col_start: usize, col_end: usize) -> Self {
        Self {
            row_start,
            row_end,
            col_start,
            col_end,
        }
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.covers_row(row) && self.covers_col(col)
    }

    pub fn covers_row(&self, row: usize) -> bool {
        (self.row_start..=self.row_end).contains(&row)
    }

    pub fn covers_col(&self, col: usize) -> bool {
        (self.col_start..=self.col_end).contains(&col)
    }

    pub fn spans_columns(&self) -> bool {
        self.col_end > self.col_start
    }

    /// Stable group identifier derived from the top-left coordinate.
    pub fn group_id(&self) -> String {
        format!("r{}c{}", self.row_start, self.col_start)
    }

    fn is_well_formed(&self, grid: &Grid) -> bool {
        self.row_start <= self.row_end
            && self.col_start <= self.col_end
            && self.row_end < grid.height()
            && self.col_end < grid.width()
    }

    fn is_single_cell(&self) -> bool {
        self.row_start == self.row_end && self.col_start == self.col_end
    }
}

/// Drop merged ranges that are inverted, fall outside the grid, or cover a
/// single cell. Order of the remaining ranges is preserved.
pub(crate) fn sanitize_merges(grid: &Grid, merged: &[MergedCellRange]) -> Vec<MergedCellRange> {
    merged
        .iter()
        .filter(|range| {
            if !range.is_well_formed(grid) {
                tracing::warn!(?range, "ignoring merged range outside the grid");
                return false;
            }
            if range.is_single_cell() {
                tracing::debug!(?range, "ignoring single-cell merged range");
                return false;
            }
            true
        })
        .copied()
        .collect()
}

/// Kind counts for one row.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct RowProfile {
    pub non_empty: usize,
    pub text: usize,
    pub numeric: usize,
}

impl RowProfile {
    pub fn of(row: &[Cell]) -> Self {
        row.iter().fold(Self::default(), |mut acc, cell| {
            match cell.kind() {
                ValueKind::Empty => return acc,
                ValueKind::Text => acc.text += 1,
                ValueKind::Number | ValueKind::Date => acc.numeric += 1,
            }
            acc.non_empty += 1;
            acc
        })
    }

    /// Share of non-empty cells holding text.
    pub fn text_density(&self) -> f64 {
        ratio(self.text, self.non_empty)
    }

    /// Share of non-empty cells holding numbers or dates.
    pub fn numeric_density(&self) -> f64 {
        ratio(self.numeric, self.non_empty)
    }
}

pub(crate) fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_are_padded() {
        let grid = Grid::parse_rows(vec![vec!["a", "b", "c"], vec!["d"]]);
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.row(1).unwrap().len(), 3);
        assert!(grid.cell(1, 2).unwrap().is_empty());
    }

    #[test]
    fn test_content_height_ignores_trailing_blank_rows() {
        let grid = Grid::parse_rows(vec![vec!["a"], vec!["b"], vec![""], vec![""]]);
        assert_eq!(grid.height(), 4);
        assert_eq!(grid.content_height(), 2);
        assert!(!grid.is_empty());
        assert!(Grid::parse_rows(vec![vec!["", ""]]).is_empty());
        assert!(Grid::default().is_empty());
    }

    #[test]
    fn test_merged_range_geometry() {
        let range = MergedCellRange::new(0, 1, 2, 4);
        assert!(range.contains(1, 3));
        assert!(!range.contains(2, 3));
        assert!(range.spans_columns());
        assert_eq!(range.group_id(), "r0c2");
    }

    #[test]
    fn test_sanitize_merges() {
        let grid = Grid::parse_rows(vec![vec!["a", "b", "c"], vec!["d", "e", "f"]]);
        let merged = vec![
            MergedCellRange::new(0, 0, 0, 1),
            MergedCellRange::new(0, 0, 2, 2),
            MergedCellRange::new(0, 5, 0, 1),
            MergedCellRange::new(1, 0, 0, 1),
        ];
        assert_eq!(
            sanitize_merges(&grid, &merged),
            vec![MergedCellRange::new(0, 0, 0, 1)]
        );
    }

    #[test]
    fn test_row_profile() {
        let grid = Grid::parse_rows(vec![vec!["Region", "10", "", "2024-01-01"]]);
        let profile = RowProfile::of(grid.row(0).unwrap());
        assert_eq!(profile.non_empty, 3);
        assert_eq!(profile.text, 1);
        assert_eq!(profile.numeric, 2);
        assert!((profile.numeric_density() - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(RowProfile::default().text_density(), 0.0);
    }
}
