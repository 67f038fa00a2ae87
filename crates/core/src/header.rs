//! Header block detection.

use crate::config::DetectorConfig;
use crate::grid::{Grid, MergedCellRange, RowProfile};

/// Outcome of header classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderBlock {
    /// Number of header rows starting at the data start row, at least 1.
    pub row_count: usize,
    /// A text row followed by a numeric row was found.
    pub density_shift: bool,
    /// Merged group labels pushed the block past the density-shift result.
    pub merge_extended: bool,
}

/// Decide how many rows starting at `data_start` form the header.
///
/// A row is the last header row when it is mostly text and the row below it
/// is mostly numbers or dates. Text rows above that point belong to the
/// header too. Merged ranges spanning several columns in the first two rows
/// stretch the block down to the leaf row beneath them.
pub fn classify_header(
    grid: &Grid,
    data_start: usize,
    merged: &[MergedCellRange],
    config: &DetectorConfig,
) -> HeaderBlock {
    let available = grid.content_height().saturating_sub(data_start);
    let max_rows = config.max_header_rows.min(available).max(1);

    let mut row_count = 1;
    let mut density_shift = false;
    for offset in 0..max_rows {
        let row = data_start + offset;
        let (Some(current), Some(next)) = (grid.row(row), grid.row(row + 1)) else {
            break;
        };
        let current = RowProfile::of(current);
        if current.text_density() < config.header_text_threshold {
            break;
        }
        let next = RowProfile::of(next);
        if next.numeric_density() >= config.header_data_shift_threshold {
            row_count = offset + 1;
            density_shift = true;
            break;
        }
    }

    let mut merge_extended = false;
    if let Some(span) = merged_header_span(grid, data_start, merged, config) {
        let span = span.min(max_rows);
        if span > row_count {
            tracing::debug!(span, row_count, "merged header cells extend header block");
            row_count = span;
            merge_extended = true;
        }
    }

    HeaderBlock {
        row_count,
        density_shift,
        merge_extended,
    }
}

/// Rows covered by group-label merges near the top of the table, plus the
/// leaf row below them. Only counts merges whose next row reads as labels.
fn merged_header_span(
    grid: &Grid,
    data_start: usize,
    merged: &[MergedCellRange],
    config: &DetectorConfig,
) -> Option<usize> {
    merged
        .iter()
        .filter(|m| m.spans_columns() && m.row_start <= data_start + 1 && m.row_end >= data_start)
        .filter(|m| {
            grid.row(m.row_end + 1)
                .map(RowProfile::of)
                .is_some_and(|leaf| leaf.text_density() >= config.header_text_threshold)
        })
        .map(|m| m.row_end + 2 - data_start)
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(rows: Vec<Vec<&str>>, merged: &[MergedCellRange]) -> HeaderBlock {
        classify_header(&Grid::parse_rows(rows), 0, merged, &DetectorConfig::default())
    }

    #[test]
    fn test_single_header_row() {
        let block = classify(
            vec![vec!["Name", "Qty"], vec!["Bolt", "3"], vec!["Nut", "5"]],
            &[],
        );
        assert_eq!(block.row_count, 1);
        assert!(block.density_shift);
        assert!(!block.merge_extended);
    }

    #[test]
    fn test_two_text_rows_before_numbers() {
        let block = classify(
            vec![
                vec!["", "Sales", "Sales"],
                vec!["Dept", "East", "West"],
                vec!["Ops", "1", "2"],
            ],
            &[],
        );
        assert_eq!(block.row_count, 2);
        assert!(block.density_shift);
    }

    #[test]
    fn test_all_text_falls_back_to_one_row() {
        let block = classify(
            vec![vec!["Name", "City"], vec!["Ann", "Oslo"], vec!["Bob", "Rome"]],
            &[],
        );
        assert_eq!(block.row_count, 1);
        assert!(!block.density_shift);
    }

    #[test]
    fn test_merge_extends_header() {
        // Group labels over a text leaf row above a text-only body: the
        // density rule never fires, the merge still marks a two-row header.
        let block = classify(
            vec![
                vec!["", "Contact", ""],
                vec!["Name", "Email", "Phone"],
                vec!["Ann", "ann@example.com", "n/a"],
            ],
            &[MergedCellRange::new(0, 0, 1, 2)],
        );
        assert_eq!(block.row_count, 2);
        assert!(!block.density_shift);
        assert!(block.merge_extended);
    }

    #[test]
    fn test_merge_in_leaf_row_does_not_extend() {
        let block = classify(
            vec![vec!["Region", "Sales", ""], vec!["North", "1", "2"]],
            &[MergedCellRange::new(0, 0, 1, 2)],
        );
        assert_eq!(block.row_count, 1);
    }

    #[test]
    fn test_tall_merge_capped_to_max_header_rows() {
        let rows = vec![
            vec!["", "FY 2024", "", ""],
            vec!["", "", "", ""],
            vec!["", "", "", ""],
            vec!["", "", "", ""],
            vec!["Dept", "Q1", "Q2", "Q3"],
            vec!["Ops", "1", "2", "3"],
            vec!["Sales", "4", "5", "6"],
        ];
        let merged = [MergedCellRange::new(0, 3, 1, 3)];

        let block = classify(rows.clone(), &merged);
        assert_eq!(block.row_count, 3);
        assert!(block.merge_extended);

        let config = DetectorConfig {
            max_header_rows: 6,
            ..DetectorConfig::default()
        };
        let block = classify_header(&Grid::parse_rows(rows), 0, &merged, &config);
        assert_eq!(block.row_count, 5);
    }

    #[test]
    fn test_header_capped_to_grid() {
        let block = classify(vec![vec!["Name", "Qty"]], &[]);
        assert_eq!(block.row_count, 1);
    }
}
